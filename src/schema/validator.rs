//! Item validator
//!
//! Validation semantics:
//! - The model must declare at least one field
//! - No undeclared fields exist
//! - Field types exactly match declared types
//! - msatoshi amounts are integral and within `MAX_MSATOSHI`
//! - ref values point at an existing item of the referenced model
//!
//! Validation is fail-fast: the first violation is returned and nothing else
//! is checked. The validator never mutates the item or the store.

use serde_json::{Number, Value};

use super::errors::{SchemaError, SchemaResult, ValidationDetails};
use super::types::{FieldType, Model};
use crate::store::{ItemScope, ItemStore, ItemValue};

/// Sanity ceiling for msatoshi fields (1 BTC = 100,000,000,000 msat).
pub const MAX_MSATOSHI: i64 = 100_000_000_000;

/// Tagged view over a decoded JSON value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JsonKind<'a> {
    Null,
    Bool(bool),
    Number(&'a Number),
    String(&'a str),
    Array,
    Object,
}

impl<'a> JsonKind<'a> {
    pub fn of(value: &'a Value) -> Self {
        match value {
            Value::Null => JsonKind::Null,
            Value::Bool(b) => JsonKind::Bool(*b),
            Value::Number(n) => JsonKind::Number(n),
            Value::String(s) => JsonKind::String(s),
            Value::Array(_) => JsonKind::Array,
            Value::Object(_) => JsonKind::Object,
        }
    }

    /// Returns the JSON type name for error messages.
    pub fn name(&self) -> &'static str {
        match self {
            JsonKind::Null => "null",
            JsonKind::Bool(_) => "boolean",
            JsonKind::Number(_) => "number",
            JsonKind::String(_) => "string",
            JsonKind::Array => "array",
            JsonKind::Object => "object",
        }
    }
}

/// Validates item values against a model, resolving refs through a store.
pub struct ItemValidator<'a> {
    store: &'a dyn ItemStore,
}

impl<'a> ItemValidator<'a> {
    /// Creates a validator that resolves refs through `store`.
    pub fn new(store: &'a dyn ItemStore) -> Self {
        Self { store }
    }

    /// Validates an item value for `model` within `scope`.
    ///
    /// `scope` supplies the wallet and app that ref lookups are confined to.
    pub fn validate_item(&self, model: &Model, scope: &ItemScope, value: &ItemValue) -> SchemaResult<()> {
        if model.is_empty() {
            return Err(SchemaError::unknown_model(&scope.model));
        }

        for (name, field_value) in value {
            let field = model
                .field(name)
                .ok_or_else(|| SchemaError::unexpected_field(&model.name, name))?;

            self.validate_value(model, scope, name, &field.field_type, field.ref_model.as_deref(), field_value)?;
        }

        Ok(())
    }

    fn validate_value(
        &self,
        model: &Model,
        scope: &ItemScope,
        name: &str,
        field_type: &FieldType,
        ref_model: Option<&str>,
        value: &Value,
    ) -> SchemaResult<()> {
        let kind = JsonKind::of(value);

        match (field_type, kind) {
            (FieldType::String | FieldType::Url, JsonKind::String(_)) => Ok(()),
            (FieldType::Number, JsonKind::Number(_)) => Ok(()),
            (FieldType::Boolean, JsonKind::Bool(_)) => Ok(()),
            (FieldType::Msatoshi, JsonKind::Number(n)) => check_msatoshi(model, name, n),
            (FieldType::Ref, JsonKind::String(key)) => {
                // Settings validation guarantees a target for ref fields
                let target = ref_model.unwrap_or_default();
                match self.store.get(&scope.sibling(target), key) {
                    Ok(Some(_)) => Ok(()),
                    Ok(None) => Err(SchemaError::invalid_ref(
                        &model.name,
                        ValidationDetails::new(name, format!("key of an existing {}", target), format!("'{}'", key)),
                    )),
                    Err(e) => Err(SchemaError::invalid_ref(
                        &model.name,
                        ValidationDetails::new(name, format!("key of an existing {}", target), format!("lookup failed: {}", e)),
                    )),
                }
            }
            (expected, actual) => Err(SchemaError::type_mismatch(
                &model.name,
                ValidationDetails::new(name, expected_name(expected), actual.name()),
            )),
        }
    }
}

fn expected_name(field_type: &FieldType) -> &str {
    match field_type {
        FieldType::Ref => "ref string",
        FieldType::Url => "string",
        other => other.type_name(),
    }
}

fn check_msatoshi(model: &Model, name: &str, n: &Number) -> SchemaResult<()> {
    let msat = if let Some(i) = n.as_i64() {
        i
    } else if n.is_u64() {
        // Larger than i64::MAX, so certainly over the ceiling
        i64::MAX
    } else {
        let f = n.as_f64().unwrap_or(f64::NAN);
        if f.fract() != 0.0 || !f.is_finite() {
            return Err(SchemaError::invalid_msatoshi(
                &model.name,
                ValidationDetails::new(name, "integer", n.to_string()),
            ));
        }
        f as i64
    };

    if msat > MAX_MSATOSHI {
        return Err(SchemaError::invalid_msatoshi(
            &model.name,
            ValidationDetails::new(name, format!("at most {} msatoshi", MAX_MSATOSHI), n.to_string()),
        ));
    }

    Ok(())
}
