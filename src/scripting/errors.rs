//! # Script Errors

use thiserror::Error;

/// Result type for script operations
pub type ScriptResult<T> = Result<T, ScriptError>;

/// Script errors
#[derive(Debug, Clone, Error)]
pub enum ScriptError {
    #[error("Function not found: {app} has no '{function}'")]
    FunctionNotFound { app: String, function: String },

    #[error("No script loaded for app {0}")]
    AppNotLoaded(String),

    #[error("Script ran out of fuel after {0} units")]
    Timeout(u64),

    #[error("Memory limit exceeded: {0} bytes")]
    MemoryExceeded(usize),

    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("Invalid script output: {0}")]
    InvalidOutput(String),

    #[error("Compilation error: {0}")]
    Compilation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ScriptError {
    pub fn function_not_found(app: impl Into<String>, function: impl Into<String>) -> Self {
        ScriptError::FunctionNotFound {
            app: app.into(),
            function: function.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ScriptError::function_not_found("https://a.example", "filter:task");
        assert!(err.to_string().contains("filter:task"));
        assert!(ScriptError::Timeout(10).to_string().contains("10"));
    }
}
