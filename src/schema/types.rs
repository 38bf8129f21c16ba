//! App settings type definitions
//!
//! Supported field types:
//! - string: UTF-8 string
//! - number: any JSON number
//! - boolean: Boolean
//! - ref: key of an item in another model of the same app
//! - msatoshi: integral millisatoshi amount
//! - url: UTF-8 string holding a URL

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use super::errors::{SchemaError, SchemaResult};

/// Field types recognized by `Settings::validate`.
///
/// Unrecognized type names decode into `Other` so that they are reported by
/// validation rather than by the JSON decoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    /// UTF-8 string
    String,
    /// JSON number
    Number,
    /// Boolean
    Boolean,
    /// Reference to another model's item key
    Ref,
    /// Integral millisatoshi amount
    Msatoshi,
    /// URL string
    Url,
    /// Anything else; rejected by validation
    Other(String),
}

impl FieldType {
    /// The recognized type names, in the order they are reported.
    pub const KNOWN: [&'static str; 6] = ["string", "number", "boolean", "ref", "msatoshi", "url"];

    /// Returns the type name for error messages
    pub fn type_name(&self) -> &str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Ref => "ref",
            FieldType::Msatoshi => "msatoshi",
            FieldType::Url => "url",
            FieldType::Other(name) => name,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, FieldType::Other(_))
    }
}

impl From<String> for FieldType {
    fn from(name: String) -> Self {
        match name.as_str() {
            "string" => FieldType::String,
            "number" => FieldType::Number,
            "boolean" => FieldType::Boolean,
            "ref" => FieldType::Ref,
            "msatoshi" => FieldType::Msatoshi,
            "url" => FieldType::Url,
            _ => FieldType::Other(name),
        }
    }
}

impl From<FieldType> for String {
    fn from(field_type: FieldType) -> Self {
        match field_type {
            FieldType::Other(name) => name,
            known => known.type_name().to_string(),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Stand-in for a script function declared by the app.
///
/// Only presence matters; the value itself is whatever the settings document
/// carried (often `true` or the function source).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScriptHook(pub Value);

impl ScriptHook {
    pub fn declared() -> Self {
        Self(Value::Bool(true))
    }
}

/// Field definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Field name; may be empty only for computed display-only fields
    #[serde(default)]
    pub name: String,
    /// Display label
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub display: String,
    /// Field data type
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Whether clients should always provide the field
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
    /// Value clients should prefill
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Target model name, for `ref` fields
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub ref_model: Option<String>,
    /// Whether clients should hide the field
    #[serde(default, skip_serializing_if = "is_false")]
    pub hidden: bool,
    /// Present when a script computes this field at read time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computed: Option<ScriptHook>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Field {
    /// Create a plain stored field
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            display: String::new(),
            field_type,
            required: false,
            default: None,
            ref_model: None,
            hidden: false,
            computed: None,
        }
    }

    /// Create a `ref` field pointing at `model`
    pub fn reference(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            ref_model: Some(model.into()),
            ..Self::new(name, FieldType::Ref)
        }
    }

    /// Mark the field as computed by a script
    pub fn computed(mut self) -> Self {
        self.computed = Some(ScriptHook::declared());
        self
    }

    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = display.into();
        self
    }

    pub fn is_computed(&self) -> bool {
        self.computed.is_some()
    }

    /// Whether the field exists only for presentation (computed, no name).
    pub fn is_virtual(&self) -> bool {
        self.name.is_empty() && self.is_computed() && !self.display.is_empty()
    }

    /// Key under which this field's value lives in an item.
    pub fn output_key(&self) -> &str {
        if self.name.is_empty() {
            &self.display
        } else {
            &self.name
        }
    }
}

/// Model definition
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Model {
    /// Model name, unique within the app
    #[serde(default)]
    pub name: String,
    /// Display label
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub display: String,
    /// Ordered field definitions
    #[serde(default)]
    pub fields: Vec<Field>,
    /// Present when a script filters listed items
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<ScriptHook>,
}

impl Model {
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            display: String::new(),
            fields,
            filter: None,
        }
    }

    /// The sentinel returned for unknown model names. Has no fields.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Mark the model as filtered by a script
    pub fn filtered(mut self) -> Self {
        self.filter = Some(ScriptHook::declared());
        self
    }

    /// True for the `empty()` sentinel (or any model without fields).
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field an item key resolves to. Virtual fields have no key.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| !f.is_virtual() && f.name == name)
    }

    /// Computed fields in declaration order
    pub fn computed_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.is_computed())
    }
}

/// Settings document supplied by an app
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Ordered model definitions
    #[serde(default)]
    pub models: Vec<Model>,
    /// Trigger name to script function
    #[serde(default)]
    pub triggers: BTreeMap<String, ScriptHook>,
    /// Action name to script function
    #[serde(default)]
    pub actions: BTreeMap<String, ScriptHook>,
}

impl Settings {
    pub fn new(models: Vec<Model>) -> Self {
        Self {
            models,
            ..Default::default()
        }
    }

    /// Declare an action by name
    pub fn with_action(mut self, name: impl Into<String>) -> Self {
        self.actions.insert(name.into(), ScriptHook::declared());
        self
    }

    /// Returns the named model, or the empty sentinel when there is none.
    pub fn get_model(&self, name: &str) -> &Model {
        static EMPTY: Model = Model {
            name: String::new(),
            display: String::new(),
            fields: Vec::new(),
            filter: None,
        };
        self.model(name).unwrap_or(&EMPTY)
    }

    /// Returns the named model, if declared.
    pub fn model(&self, name: &str) -> Option<&Model> {
        self.models.iter().find(|m| m.name == name)
    }

    pub fn action(&self, name: &str) -> Option<&ScriptHook> {
        self.actions.get(name)
    }

    pub fn trigger(&self, name: &str) -> Option<&ScriptHook> {
        self.triggers.get(name)
    }

    /// Validates the settings structure, failing on the first violation.
    pub fn validate(&self) -> SchemaResult<()> {
        let mut seen = HashSet::new();

        for (m, model) in self.models.iter().enumerate() {
            if model.name.is_empty() {
                return Err(SchemaError::invalid_settings(format!(
                    "models[{}].name is not provided",
                    m
                )));
            }

            if !seen.insert(model.name.as_str()) {
                return Err(SchemaError::invalid_settings(format!(
                    "model {} is declared more than once",
                    model.name
                )));
            }

            if model.fields.is_empty() {
                return Err(SchemaError::invalid_settings(format!(
                    "model {} has no fields",
                    model.name
                )));
            }

            for (f, field) in model.fields.iter().enumerate() {
                if field.name.is_empty() && !field.is_virtual() {
                    return Err(SchemaError::invalid_settings(format!(
                        "models[{}].fields[{}].name is not provided",
                        m, f
                    )));
                }

                if !field.field_type.is_known() {
                    return Err(SchemaError::invalid_settings(format!(
                        "{}.{}'s type cannot be '{}', must be one of {:?}",
                        model.name,
                        field.name,
                        field.field_type,
                        FieldType::KNOWN
                    )));
                }

                if field.field_type == FieldType::Ref {
                    let target = match field.ref_model.as_deref() {
                        Some(target) if !target.is_empty() => target,
                        _ => {
                            return Err(SchemaError::invalid_settings(format!(
                                "{}.{}'s ref not provided",
                                model.name, field.name
                            )))
                        }
                    };

                    if self.model(target).is_none() {
                        return Err(SchemaError::invalid_settings(format!(
                            "{}.{}'s ref '{}' doesn't exist",
                            model.name, field.name, target
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}
