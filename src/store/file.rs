//! # File-backed Item Store
//!
//! One file per scope under the store root, named by the scope digest.
//!
//! File layout:
//!
//! ```text
//! <crc32 of payload, 8 hex digits>\n
//! <payload: JSON array of StoredItem>
//! ```
//!
//! Writes go to a temporary sibling and are renamed into place, so readers
//! observe either the old or the new file, never a partial one.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::checksum::{compute_checksum, verify_checksum};
use super::errors::{StoreError, StoreResult};
use super::item::{upsert, Item, ItemScope, ItemValue, StoredItem};
use super::{new_key, ItemStore};

/// JSON file item store
#[derive(Debug)]
pub struct FileItemStore {
    root: PathBuf,
    /// Serializes read-modify-write cycles within this process
    write_lock: Mutex<()>,
}

impl FileItemStore {
    /// Opens (creating if needed) a store rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file holding `scope`
    pub fn scope_path(&self, scope: &ItemScope) -> PathBuf {
        self.root.join(format!("{}.json", scope.digest()))
    }

    fn load(&self, scope: &ItemScope) -> StoreResult<Vec<StoredItem>> {
        let path = self.scope_path(scope);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path)?;
        if content.is_empty() {
            return Ok(Vec::new());
        }

        let corrupted = || StoreError::Corrupted {
            path: path.display().to_string(),
        };

        let (header, payload) = content.split_once('\n').ok_or_else(corrupted)?;
        let expected = u32::from_str_radix(header.trim(), 16).map_err(|_| corrupted())?;
        if !verify_checksum(payload.as_bytes(), expected) {
            return Err(corrupted());
        }

        Ok(serde_json::from_str(payload)?)
    }

    fn save(&self, scope: &ItemScope, items: &[StoredItem]) -> StoreResult<()> {
        let path = self.scope_path(scope);
        let payload = serde_json::to_string(items)?;
        let content = format!("{:08x}\n{}", compute_checksum(payload.as_bytes()), payload);

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn modify<T>(
        &self,
        scope: &ItemScope,
        f: impl FnOnce(&mut Vec<StoredItem>) -> T,
    ) -> StoreResult<T> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::LockPoisoned)?;
        let mut items = self.load(scope)?;
        let out = f(&mut items);
        self.save(scope, &items)?;
        Ok(out)
    }
}

impl ItemStore for FileItemStore {
    fn get(&self, scope: &ItemScope, key: &str) -> StoreResult<Option<ItemValue>> {
        Ok(self
            .load(scope)?
            .into_iter()
            .find(|i| i.key == key)
            .map(|i| i.value))
    }

    fn set(&self, scope: &ItemScope, key: &str, value: ItemValue) -> StoreResult<()> {
        self.modify(scope, |items| upsert(items, key, value))
    }

    fn add(&self, scope: &ItemScope, value: ItemValue) -> StoreResult<String> {
        let key = new_key();
        self.modify(scope, |items| items.push(StoredItem::new(key.clone(), value)))?;
        Ok(key)
    }

    fn delete(&self, scope: &ItemScope, key: &str) -> StoreResult<()> {
        if !self.scope_path(scope).exists() {
            return Ok(());
        }
        self.modify(scope, |items| items.retain(|i| i.key != key))
    }

    fn list(&self, scope: &ItemScope) -> StoreResult<Vec<Item>> {
        Ok(self
            .load(scope)?
            .iter()
            .map(|i| i.to_item(scope))
            .collect())
    }
}
