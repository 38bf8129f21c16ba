//! # Script Runtime
//!
//! Execution abstraction for app scripts. The host never interprets script
//! code itself; it hands an `Invocation` to a `ScriptRuntime` and gets JSON back.

use serde_json::{json, Map, Value};

use super::errors::ScriptResult;
use super::selector::Selector;

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Fuel granted to each call; exhausting it aborts the call
    pub fuel_per_call: u64,

    /// Maximum linear memory per call in bytes
    pub max_memory_bytes: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            fuel_per_call: 50_000_000,
            max_memory_bytes: 32 * 1024 * 1024, // 32 MB
        }
    }
}

/// One call into an app script
#[derive(Debug, Clone)]
pub struct Invocation<'a> {
    /// App URL whose script is called
    pub app: &'a str,

    /// Function within the app
    pub selector: &'a Selector,

    /// Values injected as script globals for this call only
    pub globals: Map<String, Value>,

    /// Wallet the call runs on behalf of
    pub wallet_id: Option<&'a str>,
}

impl<'a> Invocation<'a> {
    pub fn new(app: &'a str, selector: &'a Selector) -> Self {
        Self {
            app,
            selector,
            globals: Map::new(),
            wallet_id: None,
        }
    }

    pub fn with_global(mut self, name: impl Into<String>, value: Value) -> Self {
        self.globals.insert(name.into(), value);
        self
    }

    pub fn with_wallet(mut self, wallet_id: &'a str) -> Self {
        self.wallet_id = Some(wallet_id);
        self
    }

    /// JSON envelope handed to sandboxed scripts: `{"globals": {...}, "wallet": ...}`
    pub fn envelope(&self) -> Value {
        json!({
            "globals": self.globals,
            "wallet": self.wallet_id,
        })
    }
}

/// Trait for script runtime implementations
pub trait ScriptRuntime: Send + Sync {
    /// Run the selected function with the invocation's globals
    ///
    /// Every call starts from fresh state; nothing survives between calls.
    fn execute(&self, invocation: Invocation<'_>) -> ScriptResult<Value>;

    /// Get runtime name for logging
    fn name(&self) -> &'static str;
}
