//! The bundled compiler program.
//!
//! It is embedded at compile time using `include_str!`, so the
//! binary works without a scripts directory on disk.

/// Bundled template compiler.
pub const COMPILER: &str = include_str!("../scripts/compiler.lua");
