//! Successful compile outputs.

use serde::Serialize;

/// Generated server-render module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SsrResult {
    /// Module source text.
    pub code: String,
}

/// Generated client DOM module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomResult {
    /// Module source text.
    pub code: String,
}

impl SsrResult {
    /// Wraps generated code.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }
}

impl DomResult {
    /// Wraps generated code.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }
}
