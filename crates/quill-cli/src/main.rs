//! quill CLI - template compiler frontend
//!
//! # Configuration
//!
//! Configuration is loaded from multiple sources with priority:
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`QUILL_*`)
//! 3. Project config (`quill.toml` at the workspace root)
//! 4. Global config (`~/.quill/config.toml`)
//! 5. Default values (lowest priority)
//!
//! The workspace root is `-C DIR` when given, otherwise the nearest
//! ancestor of the current directory containing `quill.toml`.
//!
//! # Commands
//!
//! - `quill ssr FILE`: print the server-render module for one template
//! - `quill dom FILE`: print the client DOM module for one template
//! - `quill build`: compile every template into the output directory
//! - `quill run`: `build`, then the (unsupported) execute and watch steps
//!
//! Compile diagnostics go to stderr and the process exits with status 1.

mod tracing_writer;

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use quill_runtime::config::{ConfigError, ConfigLoader, ConfigResolver, QuillConfig};
use quill_runtime::{
    find_workspace_root, CompileService, GenerateContext, RunCommand, RunError, RunSummary,
    WorkspaceError,
};
use quill_types::{CompileError, CompileRequest, DomResult, SsrResult, Target};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// quill - compile component templates to JavaScript modules
#[derive(Parser, Debug)]
#[command(name = "quill")]
#[command(version, about, long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Workspace root (defaults to the nearest directory with quill.toml)
    #[arg(short = 'C', long, global = true)]
    project: Option<PathBuf>,

    /// Compiler program to load instead of the bundled one (also: QUILL_COMPILER)
    #[arg(long, value_name = "PATH", global = true)]
    compiler: Option<PathBuf>,

    /// Write logs to PATH/quill.log (also: QUILL_LOG_FILE)
    #[arg(long, value_name = "PATH", global = true)]
    log_file: Option<PathBuf>,

    /// File log level (also: QUILL_LOG_LEVEL, default: debug)
    #[arg(long, value_name = "LEVEL", global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile one template to a server-render module
    Ssr(CompileArgs),
    /// Compile one template to a client DOM module
    Dom(CompileArgs),
    /// Compile every template in the workspace
    Build,
    /// Build, then run the generated program
    Run {
        /// Reload on change
        #[arg(long)]
        hot: bool,
        /// Embed generated assets
        #[arg(long)]
        embed: bool,
    },
}

#[derive(ClapArgs, Debug)]
struct CompileArgs {
    /// Template file
    file: PathBuf,

    /// Compile in development mode
    #[arg(long)]
    dev: bool,

    /// Print the result (or diagnostic) as JSON
    #[arg(long)]
    json: bool,
}

/// CLI-based configuration resolver.
///
/// Merges file/env config via [`ConfigLoader`] and applies CLI argument
/// overrides as the highest-priority layer.
struct CliConfigResolver {
    /// Discovered or explicit workspace root; `None` outside a workspace.
    project_root: Option<PathBuf>,
    debug: bool,
    verbose: bool,
    dev: bool,
    compiler: Option<PathBuf>,
    log_file: Option<PathBuf>,
    log_level: Option<String>,
    /// Ignore `~/.quill/config.toml`.
    skip_global_config: bool,
    /// Ignore `QUILL_*` environment variables.
    skip_env_vars: bool,
}

impl CliConfigResolver {
    fn from_args(args: &Args) -> Result<Self, WorkspaceError> {
        let project_root = match &args.project {
            Some(dir) => Some(dir.clone()),
            None => match find_workspace_root(".") {
                Ok(root) => Some(root),
                Err(WorkspaceError::NotFound { .. }) => None,
                Err(e) => return Err(e),
            },
        };

        let dev = match &args.command {
            Command::Ssr(c) | Command::Dom(c) => c.dev,
            Command::Build | Command::Run { .. } => false,
        };

        Ok(Self {
            project_root,
            debug: args.debug,
            verbose: args.verbose,
            dev,
            compiler: args.compiler.clone(),
            log_file: args.log_file.clone(),
            log_level: args.log_level.clone(),
            skip_global_config: false,
            skip_env_vars: false,
        })
    }

    /// Workspace root, required by `build` and `run`.
    fn require_root(&self) -> Result<&Path> {
        self.project_root.as_deref().context(
            "no quill.toml found in the current directory or any parent; use -C to point at a workspace",
        )
    }

    /// Root used to resolve relative config paths.
    fn base_dir(&self) -> PathBuf {
        self.project_root
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

impl ConfigResolver for CliConfigResolver {
    fn resolve(&self) -> Result<QuillConfig, ConfigError> {
        let mut loader = ConfigLoader::new();
        if let Some(ref root) = self.project_root {
            loader = loader.with_project_root(root);
        }
        if self.skip_global_config {
            loader = loader.skip_global_config();
        }
        if self.skip_env_vars {
            loader = loader.skip_env_vars();
        }
        let mut config = loader.load()?;

        // CLI args override (highest priority)
        if self.debug {
            config.debug = true;
        }
        if self.verbose {
            config.ui.verbose = true;
        }
        if self.dev {
            config.compiler.dev = true;
        }
        if let Some(ref p) = self.compiler {
            // Relative to the invocation directory, not the workspace root.
            config.compiler.program = Some(std::path::absolute(p).unwrap_or_else(|_| p.clone()));
        }
        if let Some(ref p) = self.log_file {
            config.logging.file = true;
            config.logging.file_path = Some(p.clone());
        }
        if let Some(ref level) = self.log_level {
            config.logging.file_level.clone_from(level);
        }

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let resolver = CliConfigResolver::from_args(&args)?;
    let config = resolver
        .resolve()
        .map_err(|e| anyhow::anyhow!("Config error: {e}"))?;

    init_tracing(&args, &config);

    info!(
        root = %resolver.base_dir().display(),
        workspace = resolver.project_root.is_some(),
        "Project root"
    );

    match args.command {
        Command::Ssr(ref c) => compile_file(&resolver, config, Target::Ssr, c),
        Command::Dom(ref c) => compile_file(&resolver, config, Target::Dom, c),
        Command::Build => {
            let root = resolver.require_root()?;
            let ctx = context(root, config)?;
            let result = RunCommand::new(false, false)
                .with_default_generators()
                .generate(&ctx)
                .await;
            let summary = finish(result)?;
            println!("Wrote {} file(s)", summary.written.len());
            Ok(())
        }
        Command::Run { hot, embed } => {
            let root = resolver.require_root()?;
            let ctx = context(root, config)?;
            let result = RunCommand::new(hot, embed)
                .with_default_generators()
                .run(&ctx)
                .await;
            let summary = finish(result)?;
            println!("Wrote {} file(s)", summary.written.len());
            Ok(())
        }
    }
}

/// Terminal filter: --debug > --verbose > RUST_LOG env > default "warn".
/// File filter: `logging.file_level`, independent of the terminal.
fn init_tracing(args: &Args, config: &QuillConfig) {
    let terminal_filter = if args.debug || config.debug {
        EnvFilter::new("debug")
    } else if args.verbose || config.ui.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let terminal_layer = fmt::layer()
        .with_target(false)
        .with_ansi(config.ui.color)
        .with_writer(std::io::stderr);

    let log_file = if config.logging.file {
        tracing_writer::open_log_file(&config.logging.resolved_file_path())
    } else {
        None
    };

    if let Some(file) = log_file {
        let file_filter = EnvFilter::new(config.logging.file_filter_directive());
        let file_layer = fmt::layer()
            .with_ansi(false)
            .with_writer(tracing_writer::FileMakeWriter::new(file));

        tracing_subscriber::registry()
            .with(terminal_layer.with_filter(terminal_filter))
            .with(file_layer.with_filter(file_filter))
            .init();

        info!(
            path = %config.logging.resolved_file_path().join(tracing_writer::LOG_FILE_NAME).display(),
            level = %config.logging.file_level,
            "File logging enabled"
        );
    } else {
        tracing_subscriber::registry()
            .with(terminal_layer.with_filter(terminal_filter))
            .init();
    }
}

/// Compiles a single template and prints the module to stdout.
fn compile_file(
    resolver: &CliConfigResolver,
    mut config: QuillConfig,
    target: Target,
    args: &CompileArgs,
) -> Result<()> {
    let source = std::fs::read(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;

    // One template needs one compiler.
    config.compiler.pool_size = 1;
    let service = CompileService::new(&config, &resolver.base_dir())?;

    let request = CompileRequest::new(args.file.to_string_lossy(), source);
    let result = service.compile(target, &request);

    match (result, args.json) {
        (Ok(code), false) => {
            print!("{code}");
            Ok(())
        }
        (Ok(code), true) => {
            let json = match target {
                Target::Ssr => serde_json::to_string_pretty(&SsrResult::new(code))?,
                Target::Dom => serde_json::to_string_pretty(&DomResult::new(code))?,
            };
            println!("{json}");
            Ok(())
        }
        (Err(err), json) => {
            report_diagnostic(&err, json)?;
            std::process::exit(1);
        }
    }
}

fn report_diagnostic(err: &CompileError, json: bool) -> Result<()> {
    if json {
        eprintln!("{}", serde_json::to_string_pretty(err)?);
    } else {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn context(root: &Path, config: QuillConfig) -> Result<GenerateContext> {
    let service = CompileService::new(&config, root)?;
    Ok(GenerateContext {
        root: root.to_path_buf(),
        config,
        service: Arc::new(service),
    })
}

/// Prints collected diagnostics and exits 1 on compile failures.
fn finish(result: Result<RunSummary, RunError>) -> Result<RunSummary> {
    match result {
        Ok(summary) => Ok(summary),
        Err(RunError::Compile(failures)) => {
            for failure in &failures {
                report_diagnostic(failure, false)?;
            }
            eprintln!("{} template compilation(s) failed", failures.len());
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}
