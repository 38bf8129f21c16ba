//! Schema subsystem for app data
//!
//! Apps declare their data models in a settings document. This module parses
//! and validates those documents and checks item payloads against them.
//!
//! # Design Principles
//!
//! - Settings are validated before an app is served
//! - Items are validated before any store mutation
//! - Validation is fail-fast: first violation wins
//! - No coercion: JSON types must match declared types exactly
//! - Settings are passed explicitly, never cached globally

mod errors;
mod loader;
mod types;
mod validator;

pub use errors::{ErrorClass, SchemaError, SchemaErrorCode, SchemaResult, ValidationDetails};
pub use loader::{AppManifest, AppManifestLoader, SettingsSource, StaticSettings};
pub use types::{Field, FieldType, Model, ScriptHook, Settings};
pub use validator::{ItemValidator, JsonKind, MAX_MSATOSHI};
