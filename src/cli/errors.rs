//! CLI-specific error types
//!
//! CLI errors end the process with a non-zero exit code. Request failures
//! have already been reported on stdout by the time they surface here.

use std::fmt;
use std::io;

use crate::config::ConfigError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (stdin/stdout)
    IoError,
    /// Boot failed
    BootFailed,
    /// The request was answered with an error envelope
    RequestFailed,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "APPS_CLI_CONFIG_ERROR",
            Self::IoError => "APPS_CLI_IO_ERROR",
            Self::BootFailed => "APPS_CLI_BOOT_FAILED",
            Self::RequestFailed => "APPS_CLI_REQUEST_FAILED",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Config error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    /// I/O error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    /// Boot failed
    pub fn boot_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::BootFailed, msg)
    }

    /// Request answered with status `status`
    pub fn request_failed(status: u16) -> Self {
        Self::new(
            CliErrorCode::RequestFailed,
            format!("request failed with status {}", status),
        )
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::config_error(e.to_string())
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_code() {
        let err = CliError::request_failed(404);
        assert_eq!(err.code(), &CliErrorCode::RequestFailed);
        assert_eq!(err.to_string(), "APPS_CLI_REQUEST_FAILED: request failed with status 404");
    }

    #[test]
    fn test_config_error_conversion() {
        let err: CliError = ConfigError::Invalid("fuel_per_call must be > 0".into()).into();
        assert_eq!(err.code_str(), "APPS_CLI_CONFIG_ERROR");
        assert!(err.message().contains("fuel_per_call"));
    }
}
