//! Where the compiler program comes from.

use crate::config::CompilerConfig;
use quill_lua::{embedded, LoadError};
use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};

/// Source of the compiler program text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgramSource {
    /// The program compiled into the binary.
    Bundled,
    /// A program file on disk.
    File(PathBuf),
}

impl ProgramSource {
    /// Picks the source named by `config`.
    ///
    /// A relative `compiler.program` path is resolved against `root`.
    #[must_use]
    pub fn from_config(config: &CompilerConfig, root: &Path) -> Self {
        match &config.program {
            Some(path) if path.is_absolute() => Self::File(path.clone()),
            Some(path) => Self::File(root.join(path)),
            None => Self::Bundled,
        }
    }

    /// Reads the program text.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::ReadProgram`] if the file cannot be read.
    pub fn read(&self) -> Result<Cow<'static, str>, LoadError> {
        match self {
            Self::Bundled => Ok(Cow::Borrowed(embedded::COMPILER)),
            Self::File(path) => std::fs::read_to_string(path)
                .map(Cow::Owned)
                .map_err(|source| LoadError::ReadProgram {
                    path: path.clone(),
                    source,
                }),
        }
    }
}

impl fmt::Display for ProgramSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bundled => f.write_str("bundled"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}
