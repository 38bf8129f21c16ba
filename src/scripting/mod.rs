//! # App Scripting
//!
//! Bridge between app settings and the code that computes fields, filters
//! lists and runs actions. Two runtimes implement `ScriptRuntime`:
//!
//! - `NativeRuntime`: Rust closures, for embedders and tests
//! - `WasmtimeRuntime`: sandboxed WebAssembly modules with fuel and memory limits

mod errors;
mod native;
mod runtime;
mod selector;
mod wasm;

pub use errors::{ScriptError, ScriptResult};
pub use native::{NativeRuntime, ScriptScope};
pub use runtime::{Invocation, RuntimeConfig, ScriptRuntime};
pub use selector::Selector;
pub use wasm::WasmtimeRuntime;
