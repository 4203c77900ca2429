//! Embedded Lua host for the quill template compiler.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                 CompilerPool                        │
//! │   free: Mutex<Vec<usize>> + Condvar                 │
//! │  ┌───────────────────────────────────────────────┐  │
//! │  │  Compiler (one per slot)                      │  │
//! │  │    engine: EngineHandle (mlua::Lua)           │  │
//! │  │    module / ssr / dom / reset: RegistryKey    │  │
//! │  │    program: Arc<str>  (kept for rebuilds)     │  │
//! │  └───────────────────────────────────────────────┘  │
//! │                         │                           │
//! │                         ▼                           │
//! │  ┌───────────────────────────────────────────────┐  │
//! │  │        compiler program (.lua)                │  │
//! │  │  return {                                     │  │
//! │  │    ssr = function(filename, source, opts),    │  │
//! │  │    dom = function(filename, source, opts),    │  │
//! │  │    reset = function(),                        │  │
//! │  │  }                                            │  │
//! │  └───────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Lifecycle
//!
//! [`EngineHandle::start`] creates a sandboxed engine; [`Compiler::load`]
//! consumes it and binds a program. A failed compile returns a
//! [`CompileError`](quill_types::CompileError) and leaves the compiler ready
//! for the next request.
//!
//! # Example
//!
//! ```
//! use quill_types::CompileRequest;
//!
//! let mut compiler = quill_lua::load().expect("bundled compiler loads");
//!
//! let bad = CompileRequest::new("App.quill", "<h1>hi world!</h1></h1>");
//! let err = compiler.compile_ssr(&bad).unwrap_err();
//! assert!(err.message.contains("attempted to close an element that was not open"));
//!
//! let good = CompileRequest::new("App.quill", "<h1>hi world!</h1>");
//! let ok = compiler.compile_ssr(&good).expect("recovered");
//! assert!(ok.code.contains("hi world!"));
//! ```

pub mod embedded;
mod engine;
mod error;
mod host_fns;
mod invoker;
mod loader;
mod marshal;
mod pool;

pub use engine::{CallOutcome, EngineHandle, EngineOptions};
pub use error::{EngineError, LoadError, PoolError};
pub use loader::Compiler;
pub use pool::{CompilerPool, PooledCompiler};

/// Starts a default engine and binds the bundled compiler program.
///
/// # Errors
///
/// Returns [`LoadError`] if the engine cannot start or the program fails
/// to load.
pub fn load() -> Result<Compiler, LoadError> {
    let engine = EngineHandle::start(EngineOptions::default())?;
    Compiler::bundled(engine)
}
