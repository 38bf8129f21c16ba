//! # Native Runtime
//!
//! Script functions implemented as Rust closures, registered per app and
//! selector. Each call receives a fresh `ScriptScope` built from the
//! invocation alone.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use serde_json::{Map, Value};

use super::errors::{ScriptError, ScriptResult};
use super::runtime::{Invocation, ScriptRuntime};
use super::selector::Selector;

/// Per-call view a native function runs against
#[derive(Debug, Clone, Default)]
pub struct ScriptScope {
    globals: Map<String, Value>,
    wallet_id: Option<String>,
}

impl ScriptScope {
    fn from_invocation(invocation: &Invocation<'_>) -> Self {
        Self {
            globals: invocation.globals.clone(),
            wallet_id: invocation.wallet_id.map(str::to_string),
        }
    }

    /// An injected global, if present
    pub fn global(&self, name: &str) -> Option<&Value> {
        self.globals.get(name)
    }

    /// The injected `item` global as an object
    pub fn item(&self) -> ScriptResult<&Map<String, Value>> {
        self.global("item")
            .and_then(Value::as_object)
            .ok_or_else(|| ScriptError::Runtime("global 'item' is not an object".into()))
    }

    pub fn wallet_id(&self) -> Option<&str> {
        self.wallet_id.as_deref()
    }
}

type NativeFn = dyn Fn(&ScriptScope) -> ScriptResult<Value> + Send + Sync;

/// Runtime backed by registered Rust closures
#[derive(Default)]
pub struct NativeRuntime {
    apps: RwLock<HashMap<String, HashMap<String, Arc<NativeFn>>>>,
}

impl NativeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `f` as `selector` for `app`, replacing any previous registration
    pub fn register<F>(&self, app: impl Into<String>, selector: Selector, f: F) -> ScriptResult<()>
    where
        F: Fn(&ScriptScope) -> ScriptResult<Value> + Send + Sync + 'static,
    {
        let mut apps = self
            .apps
            .write()
            .map_err(|_| ScriptError::Internal("native registry lock poisoned".into()))?;
        apps.entry(app.into())
            .or_default()
            .insert(selector.export_name(), Arc::new(f));
        Ok(())
    }

    /// Builder-style `register`
    pub fn with<F>(self, app: impl Into<String>, selector: Selector, f: F) -> Self
    where
        F: Fn(&ScriptScope) -> ScriptResult<Value> + Send + Sync + 'static,
    {
        // A fresh runtime's lock cannot be poisoned
        let _ = self.register(app, selector, f);
        self
    }

    fn lookup(&self, app: &str, selector: &Selector) -> ScriptResult<Arc<NativeFn>> {
        let apps = self
            .apps
            .read()
            .map_err(|_| ScriptError::Internal("native registry lock poisoned".into()))?;
        let functions = apps
            .get(app)
            .ok_or_else(|| ScriptError::AppNotLoaded(app.to_string()))?;
        let export = selector.export_name();
        functions
            .get(&export)
            .cloned()
            .ok_or_else(|| ScriptError::function_not_found(app, export))
    }
}

impl fmt::Debug for NativeRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let apps = self.apps.read().map(|a| a.len()).unwrap_or(0);
        f.debug_struct("NativeRuntime").field("apps", &apps).finish()
    }
}

impl ScriptRuntime for NativeRuntime {
    fn execute(&self, invocation: Invocation<'_>) -> ScriptResult<Value> {
        let function = self.lookup(invocation.app, invocation.selector)?;
        let scope = ScriptScope::from_invocation(&invocation);
        function(&scope)
    }

    fn name(&self) -> &'static str {
        "native"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const APP: &str = "https://notes.example";

    #[test]
    fn test_execute_registered_function() {
        let runtime = NativeRuntime::new().with(APP, Selector::computed("note", "len"), |scope| {
            let text = scope.item()?.get("text").and_then(Value::as_str).unwrap_or("");
            Ok(json!(text.len()))
        });

        let selector = Selector::computed("note", "len");
        let result = runtime
            .execute(Invocation::new(APP, &selector).with_global("item", json!({"text": "hello"})))
            .unwrap();
        assert_eq!(result, json!(5));
    }

    #[test]
    fn test_wallet_is_bound() {
        let runtime = NativeRuntime::new().with(APP, Selector::action("whoami"), |scope| {
            Ok(json!(scope.wallet_id()))
        });

        let selector = Selector::action("whoami");
        let result = runtime
            .execute(Invocation::new(APP, &selector).with_wallet("w7"))
            .unwrap();
        assert_eq!(result, json!("w7"));
    }

    #[test]
    fn test_unknown_app_and_function() {
        let runtime = NativeRuntime::new().with(APP, Selector::action("a"), |_| Ok(Value::Null));

        let selector = Selector::action("b");
        match runtime.execute(Invocation::new(APP, &selector)) {
            Err(ScriptError::FunctionNotFound { function, .. }) => assert_eq!(function, "action:b"),
            other => panic!("expected FunctionNotFound, got {:?}", other),
        }

        match runtime.execute(Invocation::new("https://other.example", &selector)) {
            Err(ScriptError::AppNotLoaded(app)) => assert_eq!(app, "https://other.example"),
            other => panic!("expected AppNotLoaded, got {:?}", other),
        }
    }

    #[test]
    fn test_calls_do_not_share_globals() {
        let runtime = NativeRuntime::new().with(APP, Selector::action("peek"), |scope| {
            Ok(scope.global("secret").cloned().unwrap_or(Value::Null))
        });
        let selector = Selector::action("peek");

        let first = runtime
            .execute(Invocation::new(APP, &selector).with_global("secret", json!(1)))
            .unwrap();
        let second = runtime.execute(Invocation::new(APP, &selector)).unwrap();

        assert_eq!(first, json!(1));
        assert_eq!(second, Value::Null);
    }

    #[test]
    fn test_item_global_must_be_object() {
        let scope = ScriptScope::default();
        assert!(scope.item().is_err());
    }
}
