//! Compile requests and options.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A template submitted for compilation.
///
/// `filename` only labels diagnostics; it does not have to exist on disk
/// and never influences the generated code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileRequest {
    /// Name reported in diagnostics.
    pub filename: String,
    /// Raw template bytes, expected to be UTF-8.
    pub source: Vec<u8>,
}

impl CompileRequest {
    /// Creates a request from a filename and source bytes.
    #[must_use]
    pub fn new(filename: impl Into<String>, source: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            source: source.into(),
        }
    }

    /// Returns the source as text, or the UTF-8 error.
    ///
    /// # Errors
    ///
    /// Returns [`std::str::Utf8Error`] if the bytes are not valid UTF-8.
    pub fn source_text(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.source)
    }
}

/// Which compiler entry point a request is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    /// Server-side render module.
    Ssr,
    /// Client DOM-patching module.
    Dom,
}

impl Target {
    /// Name of the entry point exported by the compiler program.
    #[must_use]
    pub fn entry_point(self) -> &'static str {
        match self {
            Self::Ssr => "ssr",
            Self::Dom => "dom",
        }
    }

    /// Both targets, SSR first.
    #[must_use]
    pub fn all() -> [Target; 2] {
        [Self::Ssr, Self::Dom]
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.entry_point())
    }
}

/// Options forwarded to the compiler program as its third argument.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Emit development-flavoured output.
    pub dev: bool,
}

impl CompileOptions {
    /// Options with development output enabled.
    #[must_use]
    pub fn dev() -> Self {
        Self { dev: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_from_str_and_bytes() {
        let a = CompileRequest::new("a.quill", "<p>x</p>");
        let b = CompileRequest::new(String::from("a.quill"), b"<p>x</p>".to_vec());
        assert_eq!(a, b);
        assert_eq!(a.source_text(), Ok("<p>x</p>"));
    }

    #[test]
    fn invalid_utf8_is_reported() {
        let req = CompileRequest::new("bad.quill", vec![0x3c, 0xff, 0xfe]);
        assert!(req.source_text().is_err());
    }

    #[test]
    fn target_entry_points() {
        assert_eq!(Target::Ssr.entry_point(), "ssr");
        assert_eq!(Target::Dom.to_string(), "dom");
        assert_eq!(Target::all(), [Target::Ssr, Target::Dom]);
    }

    #[test]
    fn target_serializes_lowercase() {
        let json = serde_json::to_string(&Target::Dom).expect("serialize target");
        assert_eq!(json, "\"dom\"");
    }

    #[test]
    fn options_default_is_production() {
        assert!(!CompileOptions::default().dev);
        assert!(CompileOptions::dev().dev);
    }
}
