//! Configuration resolver trait for layered overrides.
//!
//! # Architecture
//!
//! ```text
//! ConfigLoader.load()  →  QuillConfig (files + env)
//!                              │
//!                              ▼
//!                  ConfigResolver.resolve()  ←  CLI flags, embedder settings
//!                              │
//!                              ▼
//!                     QuillConfig (final)
//! ```

use super::{ConfigError, QuillConfig};

/// Produces the final configuration for a run.
///
/// Implementors typically call [`ConfigLoader`](super::ConfigLoader) and then
/// apply their own highest-priority overrides on top of the result.
pub trait ConfigResolver {
    /// Resolves the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if any underlying layer fails to load.
    fn resolve(&self) -> Result<QuillConfig, ConfigError>;
}

/// Resolver that returns the compile-time defaults.
///
/// Useful for embedders that do not read config files, and for testing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpResolver;

impl ConfigResolver for NoOpResolver {
    fn resolve(&self) -> Result<QuillConfig, ConfigError> {
        Ok(QuillConfig::default())
    }
}
