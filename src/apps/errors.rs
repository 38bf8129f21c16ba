//! # App Errors
//!
//! Every failure that reaches a caller is one of these. `status_code()` maps
//! them onto the status a transport reports.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::SchemaError;
use crate::scripting::ScriptError;
use crate::store::StoreError;

/// Result type for app operations
pub type AppResult<T> = Result<T, AppError>;

/// Status reported for failed actions
pub const SCRIPT_FAILURE_STATUS: u16 = 470;

/// App errors
#[derive(Debug, Error)]
pub enum AppError {
    /// The app's settings are missing or malformed
    #[error("Configuration error: {0}")]
    Configuration(SchemaError),

    /// An item payload was rejected
    #[error("Validation error: {0}")]
    Validation(SchemaError),

    /// Unknown app, model, action or item key
    #[error("Not found: {0}")]
    NotFound(String),

    /// A script failed while running an action
    #[error("Script error: {0}")]
    Script(#[from] ScriptError),

    /// Persistence failed
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl AppError {
    /// Route a schema error to the variant its class calls for
    pub fn from_schema(err: SchemaError) -> Self {
        if err.is_configuration() {
            AppError::Configuration(err)
        } else {
            AppError::Validation(err)
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        AppError::NotFound(what.into())
    }

    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::Configuration(_) => 400,
            AppError::Validation(_) => 400,
            AppError::NotFound(_) => 404,
            AppError::Script(_) => SCRIPT_FAILURE_STATUS,
            AppError::Store(_) => 500,
        }
    }

    /// The caller-facing form of this error
    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            status: self.status_code(),
            message: self.to_string(),
        }
    }
}

impl From<SchemaError> for AppError {
    fn from(err: SchemaError) -> Self {
        AppError::from_schema(err)
    }
}

/// Status plus message, as reported to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub status: u16,
    pub message: String,
}
