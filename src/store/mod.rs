//! Item store for app data
//!
//! Generic persistence of `(wallet, app, model, key) -> value` records.
//!
//! # Contract
//!
//! - Every operation is scoped to an `ItemScope`
//! - Stores perform no schema checks; callers validate first
//! - `delete` is idempotent
//! - `list` preserves insertion order
//! - Each call is atomic; no partial writes are observable

mod checksum;
mod errors;
mod file;
mod item;
mod memory;

pub use errors::{StoreError, StoreResult};
pub use file::FileItemStore;
pub use item::{Item, ItemScope, ItemValue, StoredItem};
pub use memory::MemoryItemStore;

use std::fmt::Debug;

/// Persistence contract consumed by validation and orchestration
pub trait ItemStore: Send + Sync + Debug {
    /// Point lookup. Absence is not an error.
    fn get(&self, scope: &ItemScope, key: &str) -> StoreResult<Option<ItemValue>>;

    /// Insert or replace the item at `key`
    fn set(&self, scope: &ItemScope, key: &str, value: ItemValue) -> StoreResult<()>;

    /// Insert under a store-assigned key and return it
    fn add(&self, scope: &ItemScope, value: ItemValue) -> StoreResult<String>;

    /// Remove the item at `key`, if any
    fn delete(&self, scope: &ItemScope, key: &str) -> StoreResult<()>;

    /// All items in the scope, in insertion order
    fn list(&self, scope: &ItemScope) -> StoreResult<Vec<Item>>;
}

/// Generates a fresh item key
pub(crate) fn new_key() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
