//! Workspace root discovery.
//!
//! A workspace is the nearest ancestor directory (inclusive) of the starting
//! point that contains the marker file, `quill.toml` by default.
//!
//! ```text
//! /site/quill.toml        ← marker
//! /site/src/pages/        ← start
//!
//! find_workspace_root("/site/src/pages") == "/site"
//! ```

use crate::config::PROJECT_CONFIG_FILE;
use quill_types::ErrorCode;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Errors from workspace discovery.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    /// No ancestor of `start` contains the marker.
    #[error("no {marker} found in {start} or any parent directory")]
    NotFound { start: PathBuf, marker: String },

    /// A candidate could not be inspected for a reason other than absence.
    #[error("failed to inspect {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ErrorCode for WorkspaceError {
    fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "WORKSPACE_NOT_FOUND",
            Self::Io { .. } => "WORKSPACE_IO",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}

/// Finds the workspace root containing `start`, using `quill.toml` as the
/// marker.
///
/// # Errors
///
/// See [`WorkspaceFinder::find`].
pub fn find_workspace_root(start: impl AsRef<Path>) -> Result<PathBuf, WorkspaceError> {
    WorkspaceFinder::new().find(start)
}

/// Upward search for a marker file.
#[derive(Debug, Clone)]
pub struct WorkspaceFinder {
    marker: String,
}

impl Default for WorkspaceFinder {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkspaceFinder {
    /// Creates a finder looking for `quill.toml`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            marker: PROJECT_CONFIG_FILE.to_string(),
        }
    }

    /// Uses a different marker file name.
    #[must_use]
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    /// The marker file name.
    #[must_use]
    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Walks from `start` towards the filesystem root and returns the first
    /// directory holding the marker, as an absolute path.
    ///
    /// `.` and `..` in `start` are resolved lexically before the walk, so
    /// `a/b/..` searches from `a`.
    ///
    /// Only a missing marker continues the walk. Any other failure to
    /// inspect a candidate (permissions, I/O) is returned immediately.
    ///
    /// # Errors
    ///
    /// - [`WorkspaceError::NotFound`] when the root is reached without a match
    /// - [`WorkspaceError::Io`] when a candidate cannot be inspected
    pub fn find(&self, start: impl AsRef<Path>) -> Result<PathBuf, WorkspaceError> {
        let start = start.as_ref();
        let absolute = std::path::absolute(start)
            .map(|path| normalize(&path))
            .map_err(|source| WorkspaceError::Io {
                path: start.to_path_buf(),
                source,
            })?;

        for dir in absolute.ancestors() {
            let candidate = dir.join(&self.marker);
            match std::fs::metadata(&candidate) {
                Ok(_) => {
                    tracing::debug!(root = %dir.display(), marker = %self.marker, "Workspace root found");
                    return Ok(dir.to_path_buf());
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(source) => {
                    return Err(WorkspaceError::Io {
                        path: candidate,
                        source,
                    })
                }
            }
        }

        Err(WorkspaceError::NotFound {
            start: absolute,
            marker: self.marker.clone(),
        })
    }
}

/// Drops `.` components and lets `..` remove the preceding one, without
/// touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}
