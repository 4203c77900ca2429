//! Unified error interface for quill.
//!
//! Every error type that crosses a crate boundary implements [`ErrorCode`]
//! so that callers can branch on a stable, machine-readable code and decide
//! whether a retry on the same resource makes sense.
//!
//! # Recoverability in quill
//!
//! | Error | Recoverable | Reason |
//! |-------|-------------|--------|
//! | compile diagnostic | yes | the compiler stays usable, fix the template |
//! | engine start failure | no | discard the handle, start a new one |
//! | program load failure | no | the program text is broken |
//!
//! # Example
//!
//! ```
//! use quill_types::ErrorCode;
//!
//! #[derive(Debug)]
//! enum PoolError {
//!     Exhausted,
//!     Poisoned,
//! }
//!
//! impl ErrorCode for PoolError {
//!     fn code(&self) -> &'static str {
//!         match self {
//!             Self::Exhausted => "POOL_EXHAUSTED",
//!             Self::Poisoned => "POOL_POISONED",
//!         }
//!     }
//!
//!     fn is_recoverable(&self) -> bool {
//!         matches!(self, Self::Exhausted)
//!     }
//! }
//!
//! assert_eq!(PoolError::Exhausted.code(), "POOL_EXHAUSTED");
//! assert!(!PoolError::Poisoned.is_recoverable());
//! ```

/// Machine-readable error classification.
///
/// Codes are UPPER_SNAKE_CASE, prefixed with the owning domain
/// (`ENGINE_`, `LOAD_`, `POOL_`, `COMPILE_`, `CONFIG_`, `WORKSPACE_`,
/// `SERVICE_`, `GENERATE_`, `RUN_`) and stable
/// across releases.
pub trait ErrorCode {
    /// Returns the stable error code.
    fn code(&self) -> &'static str;

    /// Returns whether the resource that produced the error may be reused.
    ///
    /// - `true`: the same handle or compiler can serve the next request
    /// - `false`: the resource must be discarded and rebuilt
    fn is_recoverable(&self) -> bool;
}

/// Asserts that an error code follows quill conventions.
///
/// Intended for tests covering every variant of an error enum.
///
/// # Panics
///
/// Panics if the code is empty, lacks `expected_prefix`, or is not
/// UPPER_SNAKE_CASE.
///
/// # Example
///
/// ```
/// use quill_types::{assert_error_code, ErrorCode};
///
/// struct Missing;
///
/// impl ErrorCode for Missing {
///     fn code(&self) -> &'static str { "WORKSPACE_NOT_FOUND" }
///     fn is_recoverable(&self) -> bool { false }
/// }
///
/// assert_error_code(&Missing, "WORKSPACE_");
/// ```
pub fn assert_error_code<E: ErrorCode>(err: &E, expected_prefix: &str) {
    let code = err.code();

    assert!(!code.is_empty(), "Error code must not be empty");
    assert!(
        code.starts_with(expected_prefix),
        "Error code '{}' must start with prefix '{}'",
        code,
        expected_prefix
    );
    assert!(
        is_upper_snake_case(code),
        "Error code '{}' must be UPPER_SNAKE_CASE",
        code
    );
}

/// Validates several error codes at once.
pub fn assert_error_codes<E: ErrorCode>(errors: &[E], expected_prefix: &str) {
    for err in errors {
        assert_error_code(err, expected_prefix);
    }
}

fn is_upper_snake_case(s: &str) -> bool {
    if s.is_empty() || s.starts_with('_') || s.ends_with('_') || s.contains("__") {
        return false;
    }
    s.chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}
