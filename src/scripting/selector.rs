//! Script function addressing
//!
//! A selector names one script function inside an app:
//!
//! | Selector | Export name |
//! |---|---|
//! | `Computed { model, field }` | `computed:<model>:<field>` |
//! | `Filter { model }` | `filter:<model>` |
//! | `Action { name }` | `action:<name>` |

use std::fmt;

/// Address of a script function within an app
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    /// Computes one field of one item
    Computed { model: String, field: String },
    /// Decides whether one item is listed
    Filter { model: String },
    /// Named operation invoked by a client
    Action { name: String },
}

impl Selector {
    pub fn computed(model: impl Into<String>, field: impl Into<String>) -> Self {
        Selector::Computed {
            model: model.into(),
            field: field.into(),
        }
    }

    pub fn filter(model: impl Into<String>) -> Self {
        Selector::Filter { model: model.into() }
    }

    pub fn action(name: impl Into<String>) -> Self {
        Selector::Action { name: name.into() }
    }

    /// The name under which a script module exports this function
    pub fn export_name(&self) -> String {
        match self {
            Selector::Computed { model, field } => format!("computed:{}:{}", model, field),
            Selector::Filter { model } => format!("filter:{}", model),
            Selector::Action { name } => format!("action:{}", name),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.export_name())
    }
}
