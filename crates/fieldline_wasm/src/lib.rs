//! WASM bindings for tracing field lines with a host-provided field engine.

mod engine;
mod shared;
mod system;

pub use system::WasmSpecBfield;

