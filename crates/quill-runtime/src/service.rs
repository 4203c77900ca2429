//! Shared compile service backed by a compiler pool.

use crate::config::QuillConfig;
use crate::program::ProgramSource;
use quill_lua::{CompilerPool, EngineOptions, LoadError, PoolError};
use quill_types::{
    CompileError, CompileOptions, CompileRequest, DomResult, ErrorCode, SsrResult, Target,
};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while building a [`CompileService`].
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The compiler program could not be read.
    #[error("failed to read compiler program: {0}")]
    Program(#[source] LoadError),

    /// A pool member failed to load.
    #[error(transparent)]
    Pool(#[from] PoolError),
}

impl ErrorCode for ServiceError {
    fn code(&self) -> &'static str {
        match self {
            Self::Program(_) => "SERVICE_PROGRAM",
            Self::Pool(_) => "SERVICE_POOL",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}

/// Compiles templates through a pool of independently loaded compilers.
///
/// Cheap to share: clone the `Arc` around it or the pool inside.
#[derive(Debug)]
pub struct CompileService {
    pool: Arc<CompilerPool>,
    source: ProgramSource,
}

impl CompileService {
    /// Builds the pool described by `config.compiler`.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::Program`] if the program file cannot be read
    /// - [`ServiceError::Pool`] if any member fails to load
    pub fn new(config: &QuillConfig, root: &Path) -> Result<Self, ServiceError> {
        let compiler = &config.compiler;
        let source = ProgramSource::from_config(compiler, root);
        let program = source.read().map_err(ServiceError::Program)?;

        let mut engine_options = EngineOptions::default();
        if let Some(limit) = compiler.memory_limit {
            engine_options = engine_options.with_memory_limit(limit);
        }

        let pool = CompilerPool::with_program(compiler.pool_size, &engine_options, &program)?
            .with_options(CompileOptions { dev: compiler.dev });

        tracing::info!(
            program = %source,
            pool_size = compiler.pool_size,
            dev = compiler.dev,
            "Compile service ready"
        );

        Ok(Self {
            pool: Arc::new(pool),
            source,
        })
    }

    /// Wraps an existing pool.
    #[must_use]
    pub fn from_pool(pool: Arc<CompilerPool>, source: ProgramSource) -> Self {
        Self { pool, source }
    }

    /// Compiles `request` for `target`.
    ///
    /// # Errors
    ///
    /// Returns the compiler's [`CompileError`] diagnostic.
    pub fn compile(&self, target: Target, request: &CompileRequest) -> Result<String, CompileError> {
        self.pool.compile(target, request)
    }

    /// Compiles `request` to a server-render module.
    ///
    /// # Errors
    ///
    /// See [`CompileService::compile`].
    pub fn compile_ssr(&self, request: &CompileRequest) -> Result<SsrResult, CompileError> {
        self.pool.compile_ssr(request)
    }

    /// Compiles `request` to a client DOM module.
    ///
    /// # Errors
    ///
    /// See [`CompileService::compile`].
    pub fn compile_dom(&self, request: &CompileRequest) -> Result<DomResult, CompileError> {
        self.pool.compile_dom(request)
    }

    /// The underlying pool.
    #[must_use]
    pub fn pool(&self) -> &Arc<CompilerPool> {
        &self.pool
    }

    /// Where the program came from.
    #[must_use]
    pub fn source(&self) -> &ProgramSource {
        &self.source
    }
}
