//! # Item Types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Field name to JSON value
pub type ItemValue = Map<String, Value>;

/// The (wallet, app, model) triple every store operation is scoped to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemScope {
    pub wallet_id: String,
    pub app: String,
    pub model: String,
}

impl ItemScope {
    pub fn new(wallet_id: impl Into<String>, app: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            wallet_id: wallet_id.into(),
            app: app.into(),
            model: model.into(),
        }
    }

    /// Same wallet and app, different model
    pub fn sibling(&self, model: impl Into<String>) -> Self {
        Self {
            wallet_id: self.wallet_id.clone(),
            app: self.app.clone(),
            model: model.into(),
        }
    }

    /// Stable hex digest of the scope, usable as a file name
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        for part in [&self.wallet_id, &self.app, &self.model] {
            hasher.update((part.len() as u64).to_be_bytes());
            hasher.update(part.as_bytes());
        }
        format!("{:x}", hasher.finalize())
    }
}

/// One record instance of a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub wallet_id: String,
    pub app: String,
    pub model: String,
    pub key: String,
    pub value: ItemValue,
}

impl Item {
    pub fn new(scope: &ItemScope, key: impl Into<String>, value: ItemValue) -> Self {
        Self {
            wallet_id: scope.wallet_id.clone(),
            app: scope.app.clone(),
            model: scope.model.clone(),
            key: key.into(),
            value,
        }
    }
}

/// Persisted form of an item inside a scope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredItem {
    pub key: String,
    pub value: ItemValue,
    pub updated_at: DateTime<Utc>,
}

impl StoredItem {
    pub fn new(key: impl Into<String>, value: ItemValue) -> Self {
        Self {
            key: key.into(),
            value,
            updated_at: Utc::now(),
        }
    }

    pub fn to_item(&self, scope: &ItemScope) -> Item {
        Item::new(scope, self.key.clone(), self.value.clone())
    }
}

/// Upsert into an ordered item list; new keys append, existing keys keep their slot.
pub(crate) fn upsert(items: &mut Vec<StoredItem>, key: &str, value: ItemValue) {
    match items.iter_mut().find(|i| i.key == key) {
        Some(existing) => {
            existing.value = value;
            existing.updated_at = Utc::now();
        }
        None => items.push(StoredItem::new(key, value)),
    }
}
