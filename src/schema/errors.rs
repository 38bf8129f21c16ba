//! Schema error types
//!
//! Error codes:
//! - APP_INVALID_SETTINGS (configuration)
//! - APP_UNKNOWN_APP (configuration)
//! - APP_UNKNOWN_MODEL (validation)
//! - APP_UNEXPECTED_FIELD (validation)
//! - APP_TYPE_MISMATCH (validation)
//! - APP_INVALID_MSATOSHI (validation)
//! - APP_INVALID_REF (validation)
//! - APP_UNREADABLE_ITEM (validation)

use std::fmt;

/// Which side of the schema an error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The app's settings document is unusable
    Configuration,
    /// An item payload was rejected
    Validation,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorClass::Configuration => write!(f, "CONFIGURATION"),
            ErrorClass::Validation => write!(f, "VALIDATION"),
        }
    }
}

/// Schema-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorCode {
    /// Settings document violates a structural invariant
    InvalidSettings,
    /// No settings could be obtained for the app
    UnknownApp,
    /// Item targets a model with no declared fields
    UnknownModel,
    /// Item carries a field its model does not declare
    UnexpectedField,
    /// Item field has the wrong JSON type
    TypeMismatch,
    /// Millisatoshi value is fractional or too large
    InvalidMsatoshi,
    /// Ref value does not point at an existing item
    InvalidRef,
    /// Item payload could not be read or decoded
    UnreadableItem,
}

impl SchemaErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorCode::InvalidSettings => "APP_INVALID_SETTINGS",
            SchemaErrorCode::UnknownApp => "APP_UNKNOWN_APP",
            SchemaErrorCode::UnknownModel => "APP_UNKNOWN_MODEL",
            SchemaErrorCode::UnexpectedField => "APP_UNEXPECTED_FIELD",
            SchemaErrorCode::TypeMismatch => "APP_TYPE_MISMATCH",
            SchemaErrorCode::InvalidMsatoshi => "APP_INVALID_MSATOSHI",
            SchemaErrorCode::InvalidRef => "APP_INVALID_REF",
            SchemaErrorCode::UnreadableItem => "APP_UNREADABLE_ITEM",
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            SchemaErrorCode::InvalidSettings | SchemaErrorCode::UnknownApp => {
                ErrorClass::Configuration
            }
            _ => ErrorClass::Validation,
        }
    }
}

impl fmt::Display for SchemaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Validation failure details
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationDetails {
    /// Field name
    pub field: String,
    /// Expected type or condition
    pub expected: String,
    /// Actual value or type found
    pub actual: String,
}

impl ValidationDetails {
    pub fn new(field: impl Into<String>, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn extra_field(field: impl Into<String>) -> Self {
        Self::new(field, "no undeclared fields", "extra field present")
    }
}

impl fmt::Display for ValidationDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "field '{}': expected {}, got {}", self.field, self.expected, self.actual)
    }
}

/// Schema error with full context
#[derive(Debug, Clone)]
pub struct SchemaError {
    code: SchemaErrorCode,
    message: String,
    model: Option<String>,
    details: Option<ValidationDetails>,
}

impl SchemaError {
    /// Settings document is malformed
    pub fn invalid_settings(reason: impl Into<String>) -> Self {
        Self {
            code: SchemaErrorCode::InvalidSettings,
            message: reason.into(),
            model: None,
            details: None,
        }
    }

    /// Settings for the app could not be obtained
    pub fn unknown_app(app: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            code: SchemaErrorCode::UnknownApp,
            message: format!("failed to get app settings for '{}': {}", app.into(), reason.into()),
            model: None,
            details: None,
        }
    }

    /// Item payload is missing or is not JSON
    pub fn unreadable_item(reason: impl Into<String>) -> Self {
        Self {
            code: SchemaErrorCode::UnreadableItem,
            message: format!("failed to read data: {}", reason.into()),
            model: None,
            details: None,
        }
    }

    /// Item targets a model without fields
    pub fn unknown_model(model: impl Into<String>) -> Self {
        let model = model.into();
        Self {
            code: SchemaErrorCode::UnknownModel,
            message: format!("unknown model '{}'", model),
            model: Some(model),
            details: None,
        }
    }

    /// Item carries an undeclared field
    pub fn unexpected_field(model: impl Into<String>, field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            code: SchemaErrorCode::UnexpectedField,
            message: format!("unexpected field {}", field),
            model: Some(model.into()),
            details: Some(ValidationDetails::extra_field(field)),
        }
    }

    /// Item field failed a type check
    pub fn type_mismatch(model: impl Into<String>, details: ValidationDetails) -> Self {
        Self::with_details(SchemaErrorCode::TypeMismatch, model, details)
    }

    /// Millisatoshi value out of range or fractional
    pub fn invalid_msatoshi(model: impl Into<String>, details: ValidationDetails) -> Self {
        Self::with_details(SchemaErrorCode::InvalidMsatoshi, model, details)
    }

    /// Ref value does not resolve
    pub fn invalid_ref(model: impl Into<String>, details: ValidationDetails) -> Self {
        Self::with_details(SchemaErrorCode::InvalidRef, model, details)
    }

    fn with_details(code: SchemaErrorCode, model: impl Into<String>, details: ValidationDetails) -> Self {
        Self {
            code,
            message: format!("item validation failed: {}", details),
            model: Some(model.into()),
            details: Some(details),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> SchemaErrorCode {
        self.code
    }

    pub fn class(&self) -> ErrorClass {
        self.code.class()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the model name if applicable
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// Returns validation details if applicable
    pub fn details(&self) -> Option<&ValidationDetails> {
        self.details.as_ref()
    }

    pub fn is_configuration(&self) -> bool {
        self.class() == ErrorClass::Configuration
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for SchemaError {}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;
