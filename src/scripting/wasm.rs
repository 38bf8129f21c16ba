//! # Wasmtime Runtime
//!
//! Runs app scripts compiled to WebAssembly.
//!
//! Module ABI:
//! - exports `memory`
//! - exports `alloc(len: i32) -> i32`, returning a writable region of `len` bytes
//! - exports one function per selector (see `Selector::export_name`) with
//!   signature `(ptr: i32, len: i32) -> i64`
//!
//! The host writes the invocation envelope as UTF-8 JSON into an `alloc`ed
//! region and calls the export. The return value packs `(out_ptr << 32) | out_len`
//! pointing at the UTF-8 JSON result.
//!
//! Every call instantiates the module into a fresh `Store` with its own fuel
//! budget and memory ceiling, so no state carries over between calls.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::RwLock;

use serde_json::Value;
use wasmtime::{Engine, Instance, Module, ResourceLimiter, Store, Trap};

use super::errors::{ScriptError, ScriptResult};
use super::runtime::{Invocation, RuntimeConfig, ScriptRuntime};
use crate::observability::{log_event_with_fields, Event};

/// Memory limiter that remembers whether it denied a growth request
struct CallLimiter {
    max_memory: usize,
    exceeded: bool,
}

impl CallLimiter {
    fn new(max_memory: usize) -> Self {
        Self {
            max_memory,
            exceeded: false,
        }
    }
}

impl ResourceLimiter for CallLimiter {
    fn memory_growing(
        &mut self,
        _current: usize,
        desired: usize,
        _maximum: Option<usize>,
    ) -> wasmtime::Result<bool> {
        if desired <= self.max_memory {
            Ok(true)
        } else {
            self.exceeded = true;
            Ok(false)
        }
    }

    fn table_growing(
        &mut self,
        _current: usize,
        _desired: usize,
        _maximum: Option<usize>,
    ) -> wasmtime::Result<bool> {
        Ok(true)
    }
}

/// WebAssembly runtime, one compiled module per app
pub struct WasmtimeRuntime {
    engine: Engine,
    config: RuntimeConfig,
    modules: RwLock<HashMap<String, Module>>,
}

impl WasmtimeRuntime {
    pub fn new(config: RuntimeConfig) -> ScriptResult<Self> {
        let mut engine_config = wasmtime::Config::new();
        engine_config.consume_fuel(true);

        let engine = Engine::new(&engine_config)
            .map_err(|e| ScriptError::Internal(format!("failed to create engine: {}", e)))?;

        Ok(Self {
            engine,
            config,
            modules: RwLock::new(HashMap::new()),
        })
    }

    /// Compile `bytes` (binary wasm or WAT text) as the script module for `app`
    pub fn register_module(&self, app: &str, bytes: impl AsRef<[u8]>) -> ScriptResult<()> {
        let module = Module::new(&self.engine, bytes)
            .map_err(|e| ScriptError::Compilation(format!("{}: {:#}", app, e)))?;
        self.install(app, module, "bytes")
    }

    /// Compile the module file at `path` for `app`
    pub fn register_file(&self, app: &str, path: &Path) -> ScriptResult<()> {
        let module = Module::from_file(&self.engine, path)
            .map_err(|e| ScriptError::Compilation(format!("{}: {:#}", path.display(), e)))?;
        self.install(app, module, &path.display().to_string())
    }

    fn install(&self, app: &str, module: Module, origin: &str) -> ScriptResult<()> {
        self.modules
            .write()
            .map_err(|_| ScriptError::Internal("module registry lock poisoned".into()))?
            .insert(app.to_string(), module);

        log_event_with_fields(Event::ModuleLoaded, &[("app", app), ("origin", origin)]);
        Ok(())
    }

    pub fn has_module(&self, app: &str) -> bool {
        self.modules
            .read()
            .map(|m| m.contains_key(app))
            .unwrap_or(false)
    }

    fn module(&self, app: &str) -> ScriptResult<Module> {
        self.modules
            .read()
            .map_err(|_| ScriptError::Internal("module registry lock poisoned".into()))?
            .get(app)
            .cloned()
            .ok_or_else(|| ScriptError::AppNotLoaded(app.to_string()))
    }

    /// Instantiate `module` fresh and run `export` over `input`
    fn call(&self, app: &str, module: &Module, export: &str, input: &[u8]) -> ScriptResult<Vec<u8>> {
        let mut store = Store::new(&self.engine, CallLimiter::new(self.config.max_memory_bytes));
        store.limiter(|limiter| limiter);
        store
            .set_fuel(self.config.fuel_per_call)
            .map_err(|e| ScriptError::Internal(format!("failed to set fuel: {}", e)))?;

        let instance = Instance::new(&mut store, module, &[])
            .map_err(|e| self.classify(store.data(), e))?;

        let function = instance
            .get_func(&mut store, export)
            .ok_or_else(|| ScriptError::function_not_found(app, export))?
            .typed::<(i32, i32), i64>(&store)
            .map_err(|e| ScriptError::Runtime(format!("export '{}' has the wrong signature: {}", export, e)))?;

        let alloc = instance
            .get_typed_func::<i32, i32>(&mut store, "alloc")
            .map_err(|e| ScriptError::Runtime(format!("module has no usable 'alloc' export: {}", e)))?;

        let memory = instance
            .get_memory(&mut store, "memory")
            .ok_or_else(|| ScriptError::Runtime("module does not export 'memory'".into()))?;

        let len = i32::try_from(input.len())
            .map_err(|_| ScriptError::Internal(format!("input of {} bytes is too large", input.len())))?;

        let ptr = alloc
            .call(&mut store, len)
            .map_err(|e| self.classify(store.data(), e))?;

        memory
            .write(&mut store, ptr as u32 as usize, input)
            .map_err(|e| self.memory_fault(store.data(), format!("alloc returned an unusable region: {}", e)))?;

        let packed = function
            .call(&mut store, (ptr, len))
            .map_err(|e| self.classify(store.data(), e))? as u64;

        let out_ptr = (packed >> 32) as usize;
        let out_len = (packed & 0xffff_ffff) as usize;

        // Bounds are checked against guest memory before the host copies anything
        let output = out_ptr
            .checked_add(out_len)
            .and_then(|end| memory.data(&store).get(out_ptr..end))
            .ok_or_else(|| {
                ScriptError::InvalidOutput(format!("result range {}+{} is out of bounds", out_ptr, out_len))
            })?;

        Ok(output.to_vec())
    }

    fn classify(&self, limiter: &CallLimiter, err: wasmtime::Error) -> ScriptError {
        if matches!(err.downcast_ref::<Trap>(), Some(Trap::OutOfFuel)) {
            ScriptError::Timeout(self.config.fuel_per_call)
        } else if limiter.exceeded {
            ScriptError::MemoryExceeded(self.config.max_memory_bytes)
        } else {
            ScriptError::Runtime(format!("{:#}", err))
        }
    }

    fn memory_fault(&self, limiter: &CallLimiter, reason: String) -> ScriptError {
        if limiter.exceeded {
            ScriptError::MemoryExceeded(self.config.max_memory_bytes)
        } else {
            ScriptError::Runtime(reason)
        }
    }
}

impl fmt::Debug for WasmtimeRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let modules = self.modules.read().map(|m| m.len()).unwrap_or(0);
        f.debug_struct("WasmtimeRuntime")
            .field("config", &self.config)
            .field("modules", &modules)
            .finish()
    }
}

impl ScriptRuntime for WasmtimeRuntime {
    fn execute(&self, invocation: Invocation<'_>) -> ScriptResult<Value> {
        let module = self.module(invocation.app)?;
        let export = invocation.selector.export_name();
        let input = serde_json::to_vec(&invocation.envelope())
            .map_err(|e| ScriptError::Internal(format!("failed to encode globals: {}", e)))?;

        let output = self.call(invocation.app, &module, &export, &input)?;

        serde_json::from_slice(&output).map_err(|e| ScriptError::InvalidOutput(e.to_string()))
    }

    fn name(&self) -> &'static str {
        "wasmtime"
    }
}
