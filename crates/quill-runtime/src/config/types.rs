//! Configuration types.
//!
//! All types implement [`Default`] for compile-time fallback values.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure.
///
/// This is the unified configuration after merging all layers. Fields with
/// `#[serde(default)]` are optional in the config file.
///
/// # Example
///
/// ```
/// use quill_runtime::config::QuillConfig;
///
/// let config = QuillConfig::default();
/// assert!(!config.debug);
/// assert_eq!(config.templates.extension, "quill");
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct QuillConfig {
    /// Enable debug mode (verbose logging, diagnostics).
    pub debug: bool,

    /// Compiler host configuration.
    pub compiler: CompilerConfig,

    /// Template discovery and output.
    pub templates: TemplatesConfig,

    /// File logging.
    pub logging: LoggingConfig,

    /// UI configuration.
    pub ui: UiConfig,
}

impl QuillConfig {
    /// Creates a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deserializes from TOML string.
    ///
    /// # Errors
    ///
    /// Returns error if deserialization fails.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Merges another config into this one.
    ///
    /// Values from `other` override values in `self` only if they
    /// differ from the default.
    pub fn merge(&mut self, other: &Self) {
        let default = Self::default();

        if other.debug != default.debug {
            self.debug = other.debug;
        }

        self.compiler.merge(&other.compiler);
        self.templates.merge(&other.templates);
        self.logging.merge(&other.logging);
        self.ui.merge(&other.ui);
    }
}

/// Compiler host configuration.
///
/// ```toml
/// [compiler]
/// program = "tools/compiler.lua"   # omit for the bundled compiler
/// pool_size = 4
/// memory_limit = 67108864
/// dev = true
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CompilerConfig {
    /// Compiler program file, relative to the workspace root.
    pub program: Option<PathBuf>,

    /// Number of independently loaded compilers.
    pub pool_size: usize,

    /// Per-engine memory limit in bytes.
    pub memory_limit: Option<usize>,

    /// Compile in development mode.
    pub dev: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            program: None,
            pool_size: 2,
            memory_limit: None,
            dev: false,
        }
    }
}

impl CompilerConfig {
    fn merge(&mut self, other: &Self) {
        let default = Self::default();

        if other.program.is_some() {
            self.program = other.program.clone();
        }
        if other.pool_size != default.pool_size {
            self.pool_size = other.pool_size;
        }
        if other.memory_limit.is_some() {
            self.memory_limit = other.memory_limit;
        }
        if other.dev != default.dev {
            self.dev = other.dev;
        }
    }
}

/// Template discovery and output configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TemplatesConfig {
    /// Directory scanned for templates, relative to the workspace root.
    pub dir: PathBuf,

    /// Directory generated modules are written to.
    pub out_dir: PathBuf,

    /// Template file extension, without the dot.
    pub extension: String,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("src"),
            out_dir: PathBuf::from("build"),
            extension: "quill".into(),
        }
    }
}

impl TemplatesConfig {
    fn merge(&mut self, other: &Self) {
        let default = Self::default();

        if other.dir != default.dir {
            self.dir = other.dir.clone();
        }
        if other.out_dir != default.out_dir {
            self.out_dir = other.out_dir.clone();
        }
        if other.extension != default.extension {
            self.extension = other.extension.clone();
        }
    }

    /// Template directory resolved against `root`.
    #[must_use]
    pub fn resolved_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.dir)
    }

    /// Output directory resolved against `root`.
    #[must_use]
    pub fn resolved_out_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.out_dir)
    }
}

/// File logging configuration.
///
/// The terminal filter comes from CLI flags; the file layer has its own
/// level so a quiet terminal can still leave a detailed log behind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Write logs to `<file_path>/quill.log`.
    pub file: bool,

    /// Log directory (defaults to `~/.quill/logs`).
    pub file_path: Option<PathBuf>,

    /// Level for the file layer.
    pub file_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: false,
            file_path: None,
            file_level: "debug".into(),
        }
    }
}

impl LoggingConfig {
    fn merge(&mut self, other: &Self) {
        let default = Self::default();

        if other.file != default.file {
            self.file = other.file;
        }
        if other.file_path.is_some() {
            self.file_path = other.file_path.clone();
        }
        if other.file_level != default.file_level {
            self.file_level = other.file_level.clone();
        }
    }

    /// Log directory, falling back to `~/.quill/logs`.
    #[must_use]
    pub fn resolved_file_path(&self) -> PathBuf {
        self.file_path
            .clone()
            .unwrap_or_else(|| super::default_config_dir().join("logs"))
    }

    /// `EnvFilter` directive for the file layer.
    ///
    /// quill's own targets log at `file_level`; everything else at warn.
    #[must_use]
    pub fn file_filter_directive(&self) -> String {
        format!("warn,quill={level}", level = self.file_level)
    }
}

/// UI configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UiConfig {
    /// Verbose output mode.
    pub verbose: bool,

    /// Enable color output.
    pub color: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            color: true,
        }
    }
}

impl UiConfig {
    fn merge(&mut self, other: &Self) {
        let default = Self::default();

        if other.verbose != default.verbose {
            self.verbose = other.verbose;
        }
        if other.color != default.color {
            self.color = other.color;
        }
    }
}
