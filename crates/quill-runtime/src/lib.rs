//! quill runtime layer.
//!
//! Everything between the compiler host ([`quill_lua`]) and a frontend such
//! as the `quill` binary.
//!
//! # Modules
//!
//! - [`config`]: layered `QuillConfig` (defaults, global, project, env)
//! - [`workspace`]: upward search for the `quill.toml` marker
//! - [`program`]: bundled or on-disk compiler program
//! - [`service`]: `CompileService`, a config-built compiler pool
//! - [`generator`]: build steps, including [`TemplateGenerator`]
//! - [`run`]: the `run` command
//!
//! # Example
//!
//! ```no_run
//! use quill_runtime::config::ConfigLoader;
//! use quill_runtime::{find_workspace_root, CompileService};
//! use quill_types::{CompileRequest, Target};
//!
//! let root = find_workspace_root(".")?;
//! let config = ConfigLoader::new().with_project_root(&root).load()?;
//! let service = CompileService::new(&config, &root)?;
//!
//! let request = CompileRequest::new("src/index.quill", "<h1>hi</h1>");
//! let code = service.compile(Target::Ssr, &request)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod generator;
pub mod program;
pub mod run;
pub mod service;
pub mod workspace;

pub use generator::{GenerateContext, GenerateError, GenerateReport, Generator, TemplateGenerator};
pub use program::ProgramSource;
pub use run::{RunCommand, RunError, RunSummary};
pub use service::{CompileService, ServiceError};
pub use workspace::{find_workspace_root, WorkspaceError, WorkspaceFinder};
