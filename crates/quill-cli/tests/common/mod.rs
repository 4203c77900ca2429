//! Shared E2E test helpers for `quill` binary tests.

#![allow(dead_code)]

use assert_cmd::cargo::cargo_bin_cmd;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

/// Default timeout for CLI tests.
pub const TIMEOUT_BASIC: Duration = Duration::from_secs(20);

/// Environment variables read by the config loader.
const QUILL_ENV_VARS: &[&str] = &[
    "QUILL_DEBUG",
    "QUILL_VERBOSE",
    "QUILL_COLOR",
    "QUILL_DEV",
    "QUILL_COMPILER",
    "QUILL_POOL_SIZE",
    "QUILL_MEMORY_LIMIT",
    "QUILL_OUT_DIR",
    "QUILL_LOG_FILE",
    "QUILL_LOG_LEVEL",
    "RUST_LOG",
];

/// A workspace in a temp dir, with its own HOME so the developer's
/// global config never leaks into tests.
pub struct Site {
    pub dir: TempDir,
    pub home: TempDir,
}

impl Site {
    /// Creates a workspace with an empty `quill.toml`.
    pub fn new() -> Self {
        let site = Self::bare();
        site.write("quill.toml", "");
        site
    }

    /// Creates a directory without a `quill.toml`.
    pub fn bare() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create site dir"),
            home: tempfile::tempdir().expect("create home dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, rel: &str, content: &str) {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dir");
        }
        std::fs::write(path, content).expect("write file");
    }

    pub fn read(&self, rel: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(rel)).expect("read file")
    }

    /// `quill` running inside the workspace root.
    pub fn cmd(&self) -> assert_cmd::Command {
        self.cmd_in(self.dir.path())
    }

    /// `quill` running in `cwd` with this site's HOME.
    pub fn cmd_in(&self, cwd: &Path) -> assert_cmd::Command {
        let mut cmd: assert_cmd::Command = cargo_bin_cmd!("quill");
        cmd.timeout(TIMEOUT_BASIC);
        for var in QUILL_ENV_VARS {
            cmd.env_remove(var);
        }
        cmd.env("HOME", self.home.path());
        cmd.env("QUILL_COLOR", "false");
        cmd.current_dir(cwd);
        cmd
    }
}
