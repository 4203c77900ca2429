//! Error types for engine startup, evaluation and program loading.
//!
//! Both error families here are fatal for the handle that produced them:
//! the caller discards it and may start a new one. Compile diagnostics are
//! not errors of this module; they are [`quill_types::CompileError`] values.

use quill_types::ErrorCode;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the embedded engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The Lua state could not be created or configured.
    #[error("engine initialization failed: {0}")]
    Init(String),

    /// Script text failed to parse.
    #[error("syntax error in {chunk}: {message}")]
    Syntax { chunk: String, message: String },

    /// Script raised an error while running.
    #[error("error in {chunk}: {message}")]
    Runtime { chunk: String, message: String },

    /// The engine hit its memory limit.
    #[error("engine out of memory: {0}")]
    Memory(String),

    /// A host-side engine operation failed (conversion, registry access).
    #[error("engine call failed: {0}")]
    Call(String),
}

impl EngineError {
    /// Classifies an mlua error raised while running `chunk`.
    pub(crate) fn from_lua(chunk: &str, err: mlua::Error) -> Self {
        match err {
            mlua::Error::SyntaxError { message, .. } => Self::Syntax {
                chunk: chunk.to_string(),
                message,
            },
            mlua::Error::MemoryError(msg) => Self::Memory(msg),
            other => Self::Runtime {
                chunk: chunk.to_string(),
                message: format_lua_error(&other),
            },
        }
    }
}

impl From<mlua::Error> for EngineError {
    fn from(err: mlua::Error) -> Self {
        match err {
            mlua::Error::MemoryError(msg) => Self::Memory(msg),
            other => Self::Call(format_lua_error(&other)),
        }
    }
}

impl ErrorCode for EngineError {
    fn code(&self) -> &'static str {
        match self {
            Self::Init(_) => "ENGINE_INIT",
            Self::Syntax { .. } => "ENGINE_SYNTAX",
            Self::Runtime { .. } => "ENGINE_RUNTIME",
            Self::Memory(_) => "ENGINE_MEMORY",
            Self::Call(_) => "ENGINE_CALL",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}

/// Errors raised while binding a compiler program to an engine.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The program text is empty.
    #[error("compiler program is empty")]
    EmptyProgram,

    /// The program file could not be read.
    #[error("failed to read compiler program '{path}': {source}")]
    ReadProgram {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Evaluating the program raised an error.
    #[error("compiler program failed to evaluate: {0}")]
    Evaluate(#[source] EngineError),

    /// The program did not return a module table.
    #[error("compiler program must return a table, got {found}")]
    NotAModule { found: &'static str },

    /// A required entry point is not exported.
    #[error("compiler program does not export '{name}'")]
    MissingEntryPoint { name: &'static str },

    /// An export with an entry-point name is not a function.
    #[error("compiler export '{name}' must be a function, got {found}")]
    InvalidEntryPoint {
        name: &'static str,
        found: &'static str,
    },

    /// The program's reset hook raised an error.
    #[error("compiler reset hook failed: {0}")]
    ResetFailed(String),

    /// Engine failure while binding.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl From<mlua::Error> for LoadError {
    fn from(err: mlua::Error) -> Self {
        Self::Engine(err.into())
    }
}

impl ErrorCode for LoadError {
    fn code(&self) -> &'static str {
        match self {
            Self::EmptyProgram => "LOAD_EMPTY_PROGRAM",
            Self::ReadProgram { .. } => "LOAD_READ_PROGRAM",
            Self::Evaluate(_) => "LOAD_EVALUATE",
            Self::NotAModule { .. } => "LOAD_NOT_A_MODULE",
            Self::MissingEntryPoint { .. } => "LOAD_MISSING_ENTRY_POINT",
            Self::InvalidEntryPoint { .. } => "LOAD_INVALID_ENTRY_POINT",
            Self::ResetFailed(_) => "LOAD_RESET_FAILED",
            Self::Engine(_) => "LOAD_ENGINE",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}

/// Errors raised while building a [`CompilerPool`](crate::CompilerPool).
#[derive(Debug, Error)]
pub enum PoolError {
    /// A pool needs at least one member.
    #[error("compiler pool size must be at least 1")]
    Empty,

    /// A pool member failed to start or load.
    #[error("failed to load pool member {index}: {source}")]
    Member {
        index: usize,
        #[source]
        source: LoadError,
    },
}

impl ErrorCode for PoolError {
    fn code(&self) -> &'static str {
        match self {
            Self::Empty => "POOL_EMPTY",
            Self::Member { .. } => "POOL_MEMBER",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}

/// Formats an mlua error without the callback wrapping noise.
pub(crate) fn format_lua_error(err: &mlua::Error) -> String {
    match err {
        mlua::Error::RuntimeError(msg) => msg.clone(),
        mlua::Error::CallbackError { cause, .. } => format_lua_error(cause),
        mlua::Error::SyntaxError { message, .. } => format!("syntax error: {message}"),
        mlua::Error::MemoryError(msg) => format!("out of memory: {msg}"),
        _ => err.to_string(),
    }
}
