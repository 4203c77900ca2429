//! Compile diagnostics.
//!
//! A [`CompileError`] is the only failure shape a compile call produces.
//! Diagnostics raised by the compiler program carry the program's own
//! `kind` (for example `invalid-closing-tag`); failures detected by the host
//! use the kinds in [`kinds`].

use crate::error::ErrorCode;
use serde::Serialize;
use thiserror::Error;

/// Diagnostic kinds produced by the host rather than the compiler program.
pub mod kinds {
    /// Source bytes were not valid UTF-8.
    pub const INVALID_UTF8: &str = "invalid-utf8";
    /// The compiler returned a value without generated code.
    pub const MALFORMED_OUTPUT: &str = "malformed-output";
    /// The engine faulted outside the compiler's own error path.
    pub const ENGINE_FAULT: &str = "engine-fault";
    /// Recovery failed and the compiler can no longer serve requests.
    pub const ENGINE_UNAVAILABLE: &str = "engine-unavailable";
}

/// 1-based position of a diagnostic in the template source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Location {
    /// Line number, starting at 1.
    pub line: u32,
    /// Column number, starting at 1.
    pub column: u32,
}

impl Location {
    /// Creates a location.
    #[must_use]
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// A failed compilation.
///
/// Never accompanies a successful result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{filename}{}: {message}{}", render_location(.location), render_snippet(.snippet))]
pub struct CompileError {
    /// Human-readable description.
    pub message: String,
    /// Source excerpt implicated by the diagnostic (empty when unknown).
    pub snippet: String,
    /// Filename from the request.
    pub filename: String,
    /// Diagnostic kind, e.g. `invalid-closing-tag`.
    pub kind: Option<String>,
    /// Start of the offending region.
    pub location: Option<Location>,
}

fn render_location(location: &Option<Location>) -> String {
    location.map_or_else(String::new, |loc| format!(":{}:{}", loc.line, loc.column))
}

fn render_snippet(snippet: &str) -> String {
    if snippet.is_empty() {
        String::new()
    } else {
        format!("\n{snippet}")
    }
}

impl CompileError {
    /// Creates a diagnostic with only a message.
    #[must_use]
    pub fn new(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            snippet: String::new(),
            filename: filename.into(),
            kind: None,
            location: None,
        }
    }

    /// Sets the offending snippet.
    #[must_use]
    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = snippet.into();
        self
    }

    /// Sets the diagnostic kind.
    #[must_use]
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Sets the location.
    #[must_use]
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Returns `true` if the diagnostic kind equals `kind`.
    #[must_use]
    pub fn is_kind(&self, kind: &str) -> bool {
        self.kind.as_deref() == Some(kind)
    }
}

impl ErrorCode for CompileError {
    fn code(&self) -> &'static str {
        match self.kind.as_deref() {
            Some(kinds::INVALID_UTF8) => "COMPILE_INVALID_UTF8",
            Some(kinds::MALFORMED_OUTPUT) => "COMPILE_MALFORMED_OUTPUT",
            Some(kinds::ENGINE_FAULT) => "COMPILE_ENGINE_FAULT",
            Some(kinds::ENGINE_UNAVAILABLE) => "COMPILE_ENGINE_UNAVAILABLE",
            _ => "COMPILE_DIAGNOSTIC",
        }
    }

    fn is_recoverable(&self) -> bool {
        !self.is_kind(kinds::ENGINE_UNAVAILABLE)
    }
}
