//! Compile calls and post-error recovery.
//!
//! Every call returns exactly one of a result or a [`CompileError`]. After
//! any failure the compiler is put back in a state where the next request
//! behaves as on a freshly loaded compiler:
//!
//! 1. call the program's `reset` hook, if exported
//! 2. resolve `ssr` / `dom` / `reset` again from the retained module table
//! 3. if either step fails, start a new engine and reload the program text
//!
//! If the rebuild fails as well, the compiler answers every later call with
//! an `engine-unavailable` diagnostic.

use crate::engine::{CallOutcome, EngineHandle};
use crate::error::{EngineError, LoadError};
use crate::loader::{Compiler, EntryPoints};
use crate::marshal;
use mlua::{LuaSerdeExt, Table};
use quill_types::{kinds, CompileError, CompileRequest, DomResult, SsrResult, Target};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// Third argument passed to an entry point.
#[derive(Serialize)]
struct EntryOptions<'a> {
    generate: Target,
    filename: &'a str,
    dev: bool,
}

impl Compiler {
    /// Compiles a template into a server-side rendering module.
    ///
    /// # Errors
    ///
    /// Returns the compiler's diagnostic, or a host diagnostic for invalid
    /// UTF-8, malformed output, engine faults and an unavailable engine.
    pub fn compile_ssr(&mut self, request: &CompileRequest) -> Result<SsrResult, CompileError> {
        self.compile(Target::Ssr, request).map(SsrResult::new)
    }

    /// Compiles a template into a client-side DOM module.
    ///
    /// # Errors
    ///
    /// See [`Compiler::compile_ssr`].
    pub fn compile_dom(&mut self, request: &CompileRequest) -> Result<DomResult, CompileError> {
        self.compile(Target::Dom, request).map(DomResult::new)
    }

    /// Compiles for `target` and returns the generated code.
    ///
    /// # Errors
    ///
    /// See [`Compiler::compile_ssr`].
    pub fn compile(&mut self, target: Target, request: &CompileRequest) -> Result<String, CompileError> {
        let filename = request.filename.as_str();

        if let Some(reason) = &self.unavailable {
            return Err(CompileError::new(filename, format!("compiler is unavailable: {reason}"))
                .with_kind(kinds::ENGINE_UNAVAILABLE));
        }

        let source = request.source_text().map_err(|e| {
            CompileError::new(filename, format!("template source is not valid UTF-8: {e}"))
                .with_kind(kinds::INVALID_UTF8)
        })?;

        let started = Instant::now();
        let result = match self.invoke(target, filename, source) {
            Ok(CallOutcome::Returned(value)) => marshal::generated_code(filename, &value),
            Ok(CallOutcome::Raised(value)) => Err(marshal::diagnostic(filename, &value)),
            Err(e) => Err(marshal::engine_fault(filename, &e)),
        };

        match &result {
            Ok(code) => tracing::debug!(
                filename,
                target = %target,
                bytes = code.len(),
                elapsed_us = started.elapsed().as_micros() as u64,
                "Compiled"
            ),
            Err(err) => {
                tracing::debug!(
                    filename,
                    target = %target,
                    kind = err.kind.as_deref().unwrap_or("unknown"),
                    "Compile failed: {}",
                    err.message
                );
                self.recover();
            }
        }

        result
    }

    fn invoke(&self, target: Target, filename: &str, source: &str) -> Result<CallOutcome, EngineError> {
        let lua = self.engine.lua();
        let entry = self.entries.entry(lua, target)?;
        let options = lua.to_value(&EntryOptions {
            generate: target,
            filename,
            dev: self.options.dev,
        })?;
        self.engine.call_protected(&entry, (filename, source, options))
    }

    /// Restores a ready state after a failed compile.
    fn recover(&mut self) {
        self.recoveries += 1;

        let err = match self.reset_and_rebind() {
            Ok(()) => {
                tracing::debug!(recoveries = self.recoveries, "Compiler recovered");
                return;
            }
            Err(e) => e,
        };

        tracing::warn!(error = %err, "In-place recovery failed, rebuilding engine");
        match self.rebuild() {
            Ok(()) => tracing::info!(recoveries = self.recoveries, "Compiler engine rebuilt"),
            Err(e) => {
                tracing::error!(error = %e, "Engine rebuild failed, compiler is unavailable");
                self.unavailable = Some(e.to_string());
            }
        }
    }

    /// Replaces the engine of an unavailable compiler and makes it usable
    /// again.
    pub(crate) fn restart(&mut self) -> Result<(), LoadError> {
        self.rebuild()?;
        if let Some(reason) = self.unavailable.take() {
            tracing::info!(previous = %reason, "Unavailable compiler restarted");
        }
        Ok(())
    }

    fn reset_and_rebind(&mut self) -> Result<(), LoadError> {
        let lua = self.engine.lua();

        if let Some(reset) = self.entries.reset(lua)? {
            if let CallOutcome::Raised(value) = self.engine.call_protected(&reset, ())? {
                return Err(LoadError::ResetFailed(marshal::describe(&value)));
            }
        }

        let module: Table = lua.registry_value(&self.module)?;
        self.entries = EntryPoints::resolve(lua, &module)?;
        lua.expire_registry_values();
        Ok(())
    }

    fn rebuild(&mut self) -> Result<(), LoadError> {
        let engine = EngineHandle::start(self.engine.options().clone())?;
        let fresh = Compiler::bind(engine, Arc::clone(&self.program))?;

        self.engine = fresh.engine;
        self.module = fresh.module;
        self.entries = fresh.entries;
        Ok(())
    }
}
