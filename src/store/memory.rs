//! # In-memory Item Store

use std::collections::HashMap;
use std::sync::RwLock;

use super::errors::{StoreError, StoreResult};
use super::item::{upsert, Item, ItemScope, ItemValue, StoredItem};
use super::{new_key, ItemStore};

/// Item store held entirely in memory
#[derive(Debug, Default)]
pub struct MemoryItemStore {
    scopes: RwLock<HashMap<ItemScope, Vec<StoredItem>>>,
}

impl MemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of items across all scopes
    pub fn len(&self) -> usize {
        self.scopes
            .read()
            .map(|s| s.values().map(Vec::len).sum())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ItemStore for MemoryItemStore {
    fn get(&self, scope: &ItemScope, key: &str) -> StoreResult<Option<ItemValue>> {
        let scopes = self.scopes.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(scopes
            .get(scope)
            .and_then(|items| items.iter().find(|i| i.key == key))
            .map(|i| i.value.clone()))
    }

    fn set(&self, scope: &ItemScope, key: &str, value: ItemValue) -> StoreResult<()> {
        let mut scopes = self.scopes.write().map_err(|_| StoreError::LockPoisoned)?;
        upsert(scopes.entry(scope.clone()).or_default(), key, value);
        Ok(())
    }

    fn add(&self, scope: &ItemScope, value: ItemValue) -> StoreResult<String> {
        let key = new_key();
        let mut scopes = self.scopes.write().map_err(|_| StoreError::LockPoisoned)?;
        scopes
            .entry(scope.clone())
            .or_default()
            .push(StoredItem::new(key.clone(), value));
        Ok(key)
    }

    fn delete(&self, scope: &ItemScope, key: &str) -> StoreResult<()> {
        let mut scopes = self.scopes.write().map_err(|_| StoreError::LockPoisoned)?;
        if let Some(items) = scopes.get_mut(scope) {
            items.retain(|i| i.key != key);
        }
        Ok(())
    }

    fn list(&self, scope: &ItemScope) -> StoreResult<Vec<Item>> {
        let scopes = self.scopes.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(scopes
            .get(scope)
            .map(|items| items.iter().map(|i| i.to_item(scope)).collect())
            .unwrap_or_default())
    }
}
