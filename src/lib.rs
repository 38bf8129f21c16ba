//! walletapps - per-wallet app data with declared schemas and scripts
//!
//! Apps declare models in a settings document; items are validated against
//! them on write and run through computed fields and filters on read.

pub mod apps;
pub mod cli;
pub mod config;
pub mod observability;
pub mod schema;
pub mod scripting;
pub mod store;
