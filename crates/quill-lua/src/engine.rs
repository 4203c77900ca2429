//! Engine handle: one sandboxed Lua state.
//!
//! An [`EngineHandle`] is created by [`EngineHandle::start`] and released by
//! [`EngineHandle::close`] or by dropping it. Every operation borrows the
//! handle, so it can never be closed while a call is running on it.
//!
//! # Sandbox
//!
//! ```text
//! loaded libraries : base, string, table, math, utf8, coroutine
//! removed globals  : load, loadfile, dofile, collectgarbage
//! replaced globals : print (logs through tracing)
//! host bindings    : quill.log, quill.version
//! ```
//!
//! `io`, `os`, `package`/`require` and `debug` are never opened.

use crate::error::{format_lua_error, EngineError};
use crate::host_fns;
use mlua::{Function, IntoLuaMulti, Lua, LuaOptions, RegistryKey, StdLib, Value};
use std::fmt;

/// Libraries opened in every engine.
fn safe_libs() -> StdLib {
    StdLib::STRING | StdLib::TABLE | StdLib::MATH | StdLib::UTF8 | StdLib::COROUTINE
}

/// Base-library globals removed after startup.
const REMOVED_GLOBALS: &[&str] = &["load", "loadfile", "dofile", "collectgarbage"];

/// Chunk name used by [`EngineHandle::eval`].
const EVAL_CHUNK: &str = "=eval";

/// Engine startup options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineOptions {
    /// Upper bound on Lua heap size in bytes.
    pub memory_limit: Option<usize>,
}

impl EngineOptions {
    /// Sets the memory limit.
    #[must_use]
    pub fn with_memory_limit(mut self, bytes: usize) -> Self {
        self.memory_limit = Some(bytes);
        self
    }
}

/// Result of a protected call into the engine.
#[derive(Debug)]
pub enum CallOutcome {
    /// The function returned; its first return value.
    Returned(Value),
    /// The function raised; the error object exactly as thrown.
    Raised(Value),
}

/// One isolated Lua execution context.
pub struct EngineHandle {
    lua: Lua,
    /// `pcall` captured before any script runs, so scripts cannot shadow it.
    pcall: RegistryKey,
    options: EngineOptions,
}

impl fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineHandle")
            .field("options", &self.options)
            .field("used_memory", &self.lua.used_memory())
            .finish()
    }
}

impl EngineHandle {
    /// Allocates a fresh sandboxed engine.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Init`] if the state cannot be created or the
    /// sandbox cannot be installed.
    pub fn start(options: EngineOptions) -> Result<Self, EngineError> {
        let init = |e: mlua::Error| EngineError::Init(format_lua_error(&e));

        let lua = Lua::new_with(safe_libs(), LuaOptions::default()).map_err(init)?;

        let pcall: Function = lua.globals().get("pcall").map_err(init)?;
        let pcall = lua.create_registry_value(pcall).map_err(init)?;

        sandbox_globals(&lua).map_err(init)?;
        host_fns::register(&lua).map_err(init)?;

        if let Some(limit) = options.memory_limit {
            lua.set_memory_limit(limit).map_err(init)?;
        }

        tracing::debug!(
            memory_limit = ?options.memory_limit,
            used_memory = lua.used_memory(),
            "Engine started"
        );

        Ok(Self {
            lua,
            pcall,
            options,
        })
    }

    /// Starts an engine with default options.
    ///
    /// # Errors
    ///
    /// See [`EngineHandle::start`].
    pub fn start_default() -> Result<Self, EngineError> {
        Self::start(EngineOptions::default())
    }

    /// Evaluates script text and returns its value.
    ///
    /// # Errors
    ///
    /// Returns the syntax, runtime or memory error raised by the script.
    pub fn eval(&mut self, script: &str) -> Result<Value, EngineError> {
        self.eval_named(EVAL_CHUNK, script)
    }

    /// Evaluates script text under a chunk name used in error messages.
    ///
    /// # Errors
    ///
    /// Returns the syntax, runtime or memory error raised by the script.
    pub fn eval_named(&mut self, chunk: &str, script: &str) -> Result<Value, EngineError> {
        self.lua
            .load(script)
            .set_name(chunk)
            .eval::<Value>()
            .map_err(|e| EngineError::from_lua(chunk, e))
    }

    /// Calls `func` through the engine's own `pcall`.
    ///
    /// A raised error object is returned intact as
    /// [`CallOutcome::Raised`], so structured diagnostics survive the
    /// boundary.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] only for faults outside the protected call,
    /// such as argument conversion failures.
    pub fn call_protected(
        &self,
        func: &Function,
        args: impl IntoLuaMulti,
    ) -> Result<CallOutcome, EngineError> {
        let pcall: Function = self.lua.registry_value(&self.pcall)?;
        let mut call_args = args.into_lua_multi(&self.lua)?;
        call_args.push_front(Value::Function(func.clone()));

        let (ok, value): (bool, Value) = pcall.call(call_args)?;
        Ok(if ok {
            CallOutcome::Returned(value)
        } else {
            CallOutcome::Raised(value)
        })
    }

    /// Bytes currently allocated by the Lua heap.
    #[must_use]
    pub fn used_memory(&self) -> usize {
        self.lua.used_memory()
    }

    /// Options the engine was started with.
    #[must_use]
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Releases the engine.
    pub fn close(self) {
        drop(self);
    }

    pub(crate) fn lua(&self) -> &Lua {
        &self.lua
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        tracing::trace!(used_memory = self.lua.used_memory(), "Engine closed");
    }
}

/// Removes base-library globals that load code from strings or files.
fn sandbox_globals(lua: &Lua) -> mlua::Result<()> {
    let globals = lua.globals();
    for name in REMOVED_GLOBALS {
        globals.set(*name, Value::Nil)?;
    }
    Ok(())
}
