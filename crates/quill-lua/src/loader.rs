//! Binding a compiler program to an engine.
//!
//! [`Compiler::load`] consumes an [`EngineHandle`], evaluates the program
//! once and resolves its entry points:
//!
//! ```lua
//! local M = {}
//! function M.ssr(filename, source, options) return { code = "..." } end
//! function M.dom(filename, source, options) return { code = "..." } end
//! function M.reset() end -- optional
//! return M
//! ```
//!
//! The module table stays in the registry so entry points can be resolved
//! again after a failed compile, and the program text is retained so the
//! whole engine can be rebuilt.

use crate::embedded;
use crate::engine::EngineHandle;
use crate::error::LoadError;
use mlua::{Function, Lua, RegistryKey, Table, Value};
use quill_types::{CompileOptions, Target};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Chunk name for the program; errors read `compiler:<line>: ...`.
pub(crate) const PROGRAM_CHUNK: &str = "=compiler";

/// Registry references to the program's exported functions.
pub(crate) struct EntryPoints {
    ssr: RegistryKey,
    dom: RegistryKey,
    reset: Option<RegistryKey>,
}

impl EntryPoints {
    /// Resolves `ssr`, `dom` and the optional `reset` from a module table.
    pub(crate) fn resolve(lua: &Lua, module: &Table) -> Result<Self, LoadError> {
        Ok(Self {
            ssr: required(lua, module, "ssr")?,
            dom: required(lua, module, "dom")?,
            reset: optional(lua, module, "reset")?,
        })
    }

    pub(crate) fn entry(&self, lua: &Lua, target: Target) -> mlua::Result<Function> {
        match target {
            Target::Ssr => lua.registry_value(&self.ssr),
            Target::Dom => lua.registry_value(&self.dom),
        }
    }

    pub(crate) fn reset(&self, lua: &Lua) -> mlua::Result<Option<Function>> {
        self.reset.as_ref().map(|key| lua.registry_value(key)).transpose()
    }
}

fn required(lua: &Lua, module: &Table, name: &'static str) -> Result<RegistryKey, LoadError> {
    optional(lua, module, name)?.ok_or(LoadError::MissingEntryPoint { name })
}

fn optional(
    lua: &Lua,
    module: &Table,
    name: &'static str,
) -> Result<Option<RegistryKey>, LoadError> {
    match module.get::<Value>(name)? {
        Value::Nil => Ok(None),
        Value::Function(f) => Ok(Some(lua.create_registry_value(f)?)),
        other => Err(LoadError::InvalidEntryPoint {
            name,
            found: other.type_name(),
        }),
    }
}

/// A compiler program bound to the engine it owns.
///
/// Created by [`Compiler::load`]; compile with
/// [`compile_ssr`](Compiler::compile_ssr) and
/// [`compile_dom`](Compiler::compile_dom).
pub struct Compiler {
    pub(crate) engine: EngineHandle,
    pub(crate) program: Arc<str>,
    pub(crate) module: RegistryKey,
    pub(crate) entries: EntryPoints,
    pub(crate) options: CompileOptions,
    pub(crate) recoveries: u64,
    /// Set when recovery could not restore a working engine.
    pub(crate) unavailable: Option<String>,
}

impl fmt::Debug for Compiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compiler")
            .field("engine", &self.engine)
            .field("program_len", &self.program.len())
            .field("options", &self.options)
            .field("has_reset_hook", &self.has_reset_hook())
            .field("recoveries", &self.recoveries)
            .field("unavailable", &self.unavailable)
            .finish()
    }
}

impl Compiler {
    /// Evaluates `program` in `engine` and binds its entry points.
    ///
    /// The engine is consumed; on error it is discarded.
    ///
    /// # Errors
    ///
    /// - [`LoadError::EmptyProgram`] for blank program text
    /// - [`LoadError::Evaluate`] if the program fails to parse or run
    /// - [`LoadError::NotAModule`] if it returns something other than a table
    /// - [`LoadError::MissingEntryPoint`] / [`LoadError::InvalidEntryPoint`]
    pub fn load(engine: EngineHandle, program: &str) -> Result<Self, LoadError> {
        Self::bind(engine, Arc::from(program))
    }

    /// Binds the bundled compiler program.
    ///
    /// # Errors
    ///
    /// See [`Compiler::load`].
    pub fn bundled(engine: EngineHandle) -> Result<Self, LoadError> {
        Self::load(engine, embedded::COMPILER)
    }

    /// Reads a compiler program from disk and binds it.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::ReadProgram`] if the file cannot be read, then
    /// as [`Compiler::load`].
    pub fn from_file(engine: EngineHandle, path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let program = std::fs::read_to_string(path).map_err(|source| LoadError::ReadProgram {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "Loading compiler program from file");
        Self::load(engine, &program)
    }

    pub(crate) fn bind(mut engine: EngineHandle, program: Arc<str>) -> Result<Self, LoadError> {
        if program.trim().is_empty() {
            return Err(LoadError::EmptyProgram);
        }

        let value = engine
            .eval_named(PROGRAM_CHUNK, &program)
            .map_err(LoadError::Evaluate)?;
        let Value::Table(module) = value else {
            return Err(LoadError::NotAModule {
                found: value.type_name(),
            });
        };

        let (module, entries) = {
            let lua = engine.lua();
            let entries = EntryPoints::resolve(lua, &module)?;
            (lua.create_registry_value(module)?, entries)
        };

        tracing::debug!(
            program_len = program.len(),
            has_reset_hook = entries.reset.is_some(),
            used_memory = engine.used_memory(),
            "Compiler program loaded"
        );

        Ok(Self {
            engine,
            program,
            module,
            entries,
            options: CompileOptions::default(),
            recoveries: 0,
            unavailable: None,
        })
    }

    /// Sets the options forwarded to every compile call.
    #[must_use]
    pub fn with_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    /// Replaces the options forwarded to every compile call.
    pub fn set_options(&mut self, options: CompileOptions) {
        self.options = options;
    }

    /// Options forwarded to every compile call.
    #[must_use]
    pub fn options(&self) -> CompileOptions {
        self.options
    }

    /// Number of failed compiles this compiler has recovered from.
    #[must_use]
    pub fn recoveries(&self) -> u64 {
        self.recoveries
    }

    /// `false` once recovery has failed and every call reports
    /// `engine-unavailable`.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.unavailable.is_none()
    }

    /// Whether the program exports a `reset` hook.
    #[must_use]
    pub fn has_reset_hook(&self) -> bool {
        self.entries.reset.is_some()
    }

    /// The program text this compiler was loaded from.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// The engine this compiler owns.
    #[must_use]
    pub fn engine(&self) -> &EngineHandle {
        &self.engine
    }

    /// Releases the compiler and its engine.
    pub fn close(self) {
        tracing::trace!(recoveries = self.recoveries, "Compiler closed");
        drop(self);
    }
}
