//! Configuration loader with hierarchical merging.
//!
//! # Load Order
//!
//! 1. Default values (compile-time)
//! 2. Global config (`~/.quill/config.toml`)
//! 3. Project config (`<root>/quill.toml`)
//! 4. Environment variables (`QUILL_*`)
//!
//! Each layer overrides the previous.

use super::{default_config_path, ConfigError, QuillConfig, PROJECT_CONFIG_FILE};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Parses a boolean environment variable into `$field`.
macro_rules! parse_env_bool {
    ($field:expr, $var:literal) => {
        if let Ok(val) = std::env::var($var) {
            $field = parse_bool(&val)
                .ok_or_else(|| ConfigError::invalid_env_var($var, "expected bool"))?;
        }
    };
}

/// Parses an unsigned integer environment variable into `$field`.
macro_rules! parse_env_usize {
    ($field:expr, $var:literal) => {
        if let Ok(val) = std::env::var($var) {
            $field = val
                .trim()
                .parse::<usize>()
                .map_err(|e| ConfigError::invalid_env_var($var, e.to_string()))?;
        }
    };
}

/// Configuration loader with builder pattern.
///
/// # Example
///
/// ```no_run
/// use quill_runtime::config::ConfigLoader;
///
/// let config = ConfigLoader::new()
///     .with_project_root("/path/to/site")
///     .skip_env_vars()
///     .load()?;
/// # Ok::<(), quill_runtime::config::ConfigError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    /// Global config file path (defaults to `~/.quill/config.toml`).
    global_config_path: Option<PathBuf>,

    /// Workspace root; the project config is `<root>/quill.toml`.
    project_root: Option<PathBuf>,

    skip_env: bool,
    skip_global: bool,
    skip_project: bool,
}

impl ConfigLoader {
    /// Creates a new loader with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a custom global config path.
    #[must_use]
    pub fn with_global_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.global_config_path = Some(path.into());
        self
    }

    /// Sets the workspace root directory.
    #[must_use]
    pub fn with_project_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.project_root = Some(path.into());
        self
    }

    /// Skips environment variable loading.
    ///
    /// Useful for testing with deterministic config.
    #[must_use]
    pub fn skip_env_vars(mut self) -> Self {
        self.skip_env = true;
        self
    }

    /// Skips global config loading.
    #[must_use]
    pub fn skip_global_config(mut self) -> Self {
        self.skip_global = true;
        self
    }

    /// Skips project config loading.
    #[must_use]
    pub fn skip_project_config(mut self) -> Self {
        self.skip_project = true;
        self
    }

    /// Loads and merges configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a config file exists but cannot be parsed,
    /// an environment variable is malformed, or the merged config is
    /// invalid. Missing config files are ignored.
    pub fn load(&self) -> Result<QuillConfig, ConfigError> {
        let mut config = QuillConfig::default();

        if !self.skip_global {
            let global_path = self
                .global_config_path
                .clone()
                .unwrap_or_else(default_config_path);

            if let Some(global_config) = self.load_file(&global_path)? {
                debug!(path = %global_path.display(), "Loaded global config");
                config.merge(&global_config);
            }
        }

        if !self.skip_project {
            if let Some(ref project_root) = self.project_root {
                let project_config_path = project_root.join(PROJECT_CONFIG_FILE);

                if let Some(project_config) = self.load_file(&project_config_path)? {
                    debug!(
                        path = %project_config_path.display(),
                        project = %project_root.display(),
                        "Loaded project config"
                    );
                    config.merge(&project_config);
                }
            }
        }

        if !self.skip_env {
            self.apply_env_vars(&mut config)?;
        }

        validate(&config)?;
        Ok(config)
    }

    /// Loads a config file, returning None if it doesn't exist.
    fn load_file(&self, path: &Path) -> Result<Option<QuillConfig>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let config =
            QuillConfig::from_toml(&content).map_err(|e| ConfigError::parse_toml(path, e))?;

        Ok(Some(config))
    }

    /// Applies environment variable overrides.
    fn apply_env_vars(&self, config: &mut QuillConfig) -> Result<(), ConfigError> {
        parse_env_bool!(config.debug, "QUILL_DEBUG");
        parse_env_bool!(config.ui.verbose, "QUILL_VERBOSE");
        parse_env_bool!(config.ui.color, "QUILL_COLOR");
        parse_env_bool!(config.compiler.dev, "QUILL_DEV");

        parse_env_usize!(config.compiler.pool_size, "QUILL_POOL_SIZE");
        if std::env::var("QUILL_MEMORY_LIMIT").is_ok() {
            let mut limit = 0;
            parse_env_usize!(limit, "QUILL_MEMORY_LIMIT");
            config.compiler.memory_limit = Some(limit);
        }

        if let Ok(val) = std::env::var("QUILL_COMPILER") {
            config.compiler.program = Some(PathBuf::from(val));
        }
        if let Ok(val) = std::env::var("QUILL_OUT_DIR") {
            config.templates.out_dir = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("QUILL_LOG_FILE") {
            config.logging.file = true;
            config.logging.file_path = Some(PathBuf::from(val));
        }
        if let Ok(val) = std::env::var("QUILL_LOG_LEVEL") {
            config.logging.file_level = val;
        }

        Ok(())
    }
}

fn validate(config: &QuillConfig) -> Result<(), ConfigError> {
    if config.compiler.pool_size == 0 {
        return Err(ConfigError::invalid_value(
            "compiler.pool_size",
            "must be at least 1",
        ));
    }
    if config.templates.extension.is_empty() || config.templates.extension.starts_with('.') {
        return Err(ConfigError::invalid_value(
            "templates.extension",
            "must be non-empty and given without the leading dot",
        ));
    }
    Ok(())
}

/// Parses a boolean from string.
///
/// Accepts: "true", "false", "1", "0", "yes", "no", "on", "off"
/// (case-insensitive).
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
