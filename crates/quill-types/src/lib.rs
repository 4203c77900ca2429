//! Shared types for the quill compiler host.
//!
//! # Crate Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  quill-types   : requests, results, diagnostics  ◄── HERE    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  quill-lua     : engine handle, loader, invoker, pool        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  quill-runtime : config, workspace, generators, run          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  quill-cli     : `quill` binary                              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every compile call yields exactly one of a result ([`SsrResult`] /
//! [`DomResult`]) or a [`CompileError`]. All types compare structurally so
//! tests can assert on them directly.
//!
//! # Example
//!
//! ```
//! use quill_types::{CompileError, CompileRequest, Location, Target};
//!
//! let req = CompileRequest::new("hello.quill", "<h1>hi</h1>");
//! assert_eq!(req.source_text(), Ok("<h1>hi</h1>"));
//! assert_eq!(Target::Dom.entry_point(), "dom");
//!
//! let err = CompileError::new("hello.quill", "unexpected end of input")
//!     .with_location(Location::new(1, 12));
//! assert_eq!(err.to_string(), "hello.quill:1:12: unexpected end of input");
//! ```

pub mod diagnostic;
pub mod error;
pub mod output;
pub mod request;

pub use diagnostic::{kinds, CompileError, Location};
pub use error::{assert_error_code, assert_error_codes, ErrorCode};
pub use output::{DomResult, SsrResult};
pub use request::{CompileOptions, CompileRequest, Target};
