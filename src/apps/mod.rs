//! # Wallet Apps
//!
//! Orchestration of app settings, item storage and scripts.
//!
//! - `pipeline`: stateless read/write steps taking settings explicitly
//! - `service`: `AppService`, the entry points a transport calls
//! - `errors`: `AppError` and its status mapping

pub mod errors;
pub mod pipeline;
pub mod service;

pub use errors::{AppError, AppResult, ErrorEnvelope, SCRIPT_FAILURE_STATUS};
pub use service::AppService;
