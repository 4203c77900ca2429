//! Configuration management with hierarchical layering.
//!
//! # Architecture
//!
//! ```text
//! Priority (highest to lowest):
//!
//! ┌──────────────────────────────────────────┐
//! │  1. Resolver overrides (CLI flags)       │
//! ├──────────────────────────────────────────┤
//! │  2. Environment Variables (QUILL_*)      │
//! ├──────────────────────────────────────────┤
//! │  3. Project Config (<root>/quill.toml)   │
//! ├──────────────────────────────────────────┤
//! │  4. Global Config (~/.quill/config.toml) │
//! ├──────────────────────────────────────────┤
//! │  5. Default Values (compile-time)        │
//! └──────────────────────────────────────────┘
//! ```
//!
//! `quill.toml` doubles as the workspace marker, so the project config is
//! always read from the discovered workspace root.
//!
//! # Environment Variables
//!
//! | Variable | Field | Type |
//! |----------|-------|------|
//! | `QUILL_DEBUG` | `debug` | bool |
//! | `QUILL_VERBOSE` | `ui.verbose` | bool |
//! | `QUILL_COLOR` | `ui.color` | bool |
//! | `QUILL_DEV` | `compiler.dev` | bool |
//! | `QUILL_COMPILER` | `compiler.program` | path |
//! | `QUILL_POOL_SIZE` | `compiler.pool_size` | integer |
//! | `QUILL_MEMORY_LIMIT` | `compiler.memory_limit` | integer (bytes) |
//! | `QUILL_OUT_DIR` | `templates.out_dir` | path |
//! | `QUILL_LOG_FILE` | `logging.file_path` (enables file logging) | path |
//! | `QUILL_LOG_LEVEL` | `logging.file_level` | string |
//!
//! # Example
//!
//! ```toml
//! debug = false
//!
//! [compiler]
//! pool_size = 4
//! dev = true
//!
//! [templates]
//! dir = "src"
//! out_dir = "build"
//! ```

mod error;
mod loader;
mod resolver;
mod types;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use resolver::{ConfigResolver, NoOpResolver};
pub use types::{CompilerConfig, LoggingConfig, QuillConfig, TemplatesConfig, UiConfig};

use std::path::PathBuf;

/// Default global config directory (`~/.quill`).
pub fn default_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".quill")
}

/// Default global config file path.
pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.toml")
}

/// Project config file name, also the workspace marker.
pub const PROJECT_CONFIG_FILE: &str = "quill.toml";
