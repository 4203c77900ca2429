//! The `run` command: generate, then (eventually) execute and watch.

use crate::generator::{GenerateContext, GenerateError, GenerateReport, Generator, TemplateGenerator};
use quill_types::{CompileError, ErrorCode};
use std::path::PathBuf;
use thiserror::Error;

/// Errors from [`RunCommand::run`].
#[derive(Debug, Error)]
pub enum RunError {
    /// A generator stopped with an error.
    #[error("generator '{name}' failed: {source}")]
    Generate {
        name: String,
        #[source]
        source: GenerateError,
    },

    /// Some templates failed to compile. Everything else was written.
    #[error("{} template compilation(s) failed", .0.len())]
    Compile(Vec<CompileError>),
}

impl ErrorCode for RunError {
    fn code(&self) -> &'static str {
        match self {
            Self::Generate { .. } => "RUN_GENERATE",
            Self::Compile(_) => "RUN_COMPILE",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::Compile(_))
    }
}

/// What a successful run produced.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Generators in the order they ran.
    pub generators: Vec<String>,
    /// Every file written.
    pub written: Vec<PathBuf>,
}

/// Runs registered generators, in name order.
///
/// `quill build` stops after [`RunCommand::generate`]. Executing the generated program and watching for changes are not
/// performed; `hot` and `embed` are recorded and logged only.
pub struct RunCommand {
    /// Reload on change.
    pub hot: bool,
    /// Embed generated assets into the program.
    pub embed: bool,
    generators: Vec<Box<dyn Generator>>,
}

impl std::fmt::Debug for RunCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunCommand")
            .field("hot", &self.hot)
            .field("embed", &self.embed)
            .field(
                "generators",
                &self.generators.iter().map(|g| g.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl RunCommand {
    /// Creates a command with no generators.
    #[must_use]
    pub fn new(hot: bool, embed: bool) -> Self {
        Self {
            hot,
            embed,
            generators: Vec::new(),
        }
    }

    /// Registers the built-in [`TemplateGenerator`].
    #[must_use]
    pub fn with_default_generators(self) -> Self {
        self.with_generator(TemplateGenerator)
    }

    /// Registers a generator.
    #[must_use]
    pub fn with_generator(mut self, generator: impl Generator + 'static) -> Self {
        self.generators.push(Box::new(generator));
        self
    }

    /// Names of the registered generators, in run order.
    #[must_use]
    pub fn generator_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.generators.iter().map(|g| g.name()).collect();
        names.sort_unstable();
        names
    }

    /// Runs every generator, then reports the skipped execute and watch
    /// steps.
    ///
    /// # Errors
    ///
    /// See [`RunCommand::generate`].
    pub async fn run(&self, ctx: &GenerateContext) -> Result<RunSummary, RunError> {
        tracing::info!(hot = self.hot, embed = self.embed, root = %ctx.root.display(), "Running");

        let summary = self.generate(ctx).await?;

        tracing::info!("Executing the generated program is not supported, skipping");
        if self.hot {
            tracing::info!("Watching for changes is not supported, skipping");
        }
        Ok(summary)
    }

    /// Runs every generator in name order.
    ///
    /// A generator error stops the run. Compile diagnostics do not: all
    /// generators run and the diagnostics are returned together.
    ///
    /// # Errors
    ///
    /// - [`RunError::Generate`] when a generator fails
    /// - [`RunError::Compile`] when any template failed to compile
    pub async fn generate(&self, ctx: &GenerateContext) -> Result<RunSummary, RunError> {
        let mut ordered: Vec<&dyn Generator> = self.generators.iter().map(|g| g.as_ref()).collect();
        ordered.sort_by(|a, b| a.name().cmp(b.name()));

        let mut summary = RunSummary::default();
        let mut combined = GenerateReport::default();
        for generator in ordered {
            let name = generator.name().to_string();
            tracing::debug!(generator = %name, "Generator started");

            let report = generator
                .generate(ctx)
                .await
                .map_err(|source| RunError::Generate {
                    name: name.clone(),
                    source,
                })?;

            tracing::debug!(
                generator = %name,
                written = report.written.len(),
                failed = report.failures.len(),
                "Generator finished"
            );
            combined.extend(report);
            summary.generators.push(name);
        }

        if !combined.is_success() {
            return Err(RunError::Compile(combined.failures));
        }
        summary.written = combined.written;
        Ok(summary)
    }
}
