//! Build-time generators.
//!
//! A [`Generator`] turns workspace inputs into files under the output
//! directory. [`TemplateGenerator`] is the built-in one: every template is
//! compiled for both targets.
//!
//! ```text
//! <root>/src/pages/index.quill
//!     ├─▶ <root>/build/ssr/pages/index.js
//!     └─▶ <root>/build/dom/pages/index.js
//! ```
//!
//! Compile diagnostics do not abort a run. They are collected in the
//! [`GenerateReport`] so one broken template never hides the others.

use crate::config::QuillConfig;
use crate::service::CompileService;
use async_trait::async_trait;
use quill_types::{CompileError, CompileRequest, ErrorCode, Target};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinSet;

/// Errors that stop a generator outright.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// The template directory does not exist.
    #[error("template directory not found: {0}")]
    MissingDir(PathBuf),

    /// Reading templates or writing output failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A compile task panicked or was cancelled.
    #[error("compile task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl GenerateError {
    fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl ErrorCode for GenerateError {
    fn code(&self) -> &'static str {
        match self {
            Self::MissingDir(_) => "GENERATE_MISSING_DIR",
            Self::Io { .. } => "GENERATE_IO",
            Self::Join(_) => "GENERATE_JOIN",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::MissingDir(_))
    }
}

/// Inputs shared by every generator in a run.
#[derive(Debug, Clone)]
pub struct GenerateContext {
    /// Workspace root.
    pub root: PathBuf,
    /// Resolved configuration.
    pub config: QuillConfig,
    /// Compile service shared across generators.
    pub service: Arc<CompileService>,
}

/// Outcome of one generator.
#[derive(Debug, Default)]
pub struct GenerateReport {
    /// Files written, in template order with SSR before DOM.
    pub written: Vec<PathBuf>,
    /// Diagnostics for templates that failed to compile.
    pub failures: Vec<CompileError>,
}

impl GenerateReport {
    /// Whether every template compiled.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Appends another report.
    pub fn extend(&mut self, other: GenerateReport) {
        self.written.extend(other.written);
        self.failures.extend(other.failures);
    }
}

/// A build step run by [`RunCommand`](crate::RunCommand).
#[async_trait]
pub trait Generator: Send + Sync {
    /// Name used in logs and for ordering.
    fn name(&self) -> &str;

    /// Runs the generator.
    async fn generate(&self, ctx: &GenerateContext) -> Result<GenerateReport, GenerateError>;
}

/// Compiles every template in the template directory for both targets.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateGenerator;

#[async_trait]
impl Generator for TemplateGenerator {
    fn name(&self) -> &str {
        "templates"
    }

    async fn generate(&self, ctx: &GenerateContext) -> Result<GenerateReport, GenerateError> {
        let templates_config = &ctx.config.templates;
        let src_dir = templates_config.resolved_dir(&ctx.root);
        let out_dir = templates_config.resolved_out_dir(&ctx.root);

        if !src_dir.is_dir() {
            return Err(GenerateError::MissingDir(src_dir));
        }

        let templates = discover(&src_dir, &templates_config.extension)?;
        tracing::info!(
            dir = %src_dir.display(),
            count = templates.len(),
            "Compiling templates"
        );

        let mut tasks = JoinSet::new();
        for (order, path) in templates.iter().enumerate() {
            let source = std::fs::read(path).map_err(|e| GenerateError::io(path, e))?;
            let relative = path.strip_prefix(&src_dir).unwrap_or(path);
            let filename = request_filename(&ctx.root, path);

            for target in Target::all() {
                let service = Arc::clone(&ctx.service);
                let request = CompileRequest::new(filename.clone(), source.clone());
                let out_path = out_dir
                    .join(target.to_string())
                    .join(relative)
                    .with_extension("js");

                tasks.spawn_blocking(move || {
                    let result = service.compile(target, &request);
                    (order, target, out_path, result)
                });
            }
        }

        let mut results = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            results.push(joined?);
        }
        // Completion order is arbitrary; report in discovery order.
        results.sort_by_key(|(order, target, _, _)| (*order, *target == Target::Dom));

        let mut report = GenerateReport::default();
        for (_, target, out_path, result) in results {
            match result {
                Ok(code) => {
                    write_output(&out_path, &code)?;
                    tracing::debug!(%target, path = %out_path.display(), "Wrote module");
                    report.written.push(out_path);
                }
                Err(err) => {
                    tracing::error!(
                        %target,
                        filename = %err.filename,
                        kind = err.kind.as_deref().unwrap_or("unknown"),
                        "{err}"
                    );
                    report.failures.push(err);
                }
            }
        }

        Ok(report)
    }
}

/// Finds templates with `extension` under `dir`, sorted by path.
fn discover(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, GenerateError> {
    let mut found = Vec::new();
    let mut pending = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        let entries = std::fs::read_dir(&current).map_err(|e| GenerateError::io(&current, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| GenerateError::io(&current, e))?;
            let path = entry.path();
            let file_type = entry.file_type().map_err(|e| GenerateError::io(&path, e))?;

            if file_type.is_dir() {
                pending.push(path);
            } else if path.extension().and_then(|e| e.to_str()) == Some(extension) {
                found.push(path);
            }
        }
    }

    found.sort();
    Ok(found)
}

/// Filename reported in diagnostics: root-relative with `/` separators.
fn request_filename(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn write_output(path: &Path, code: &str) -> Result<(), GenerateError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| GenerateError::io(parent, e))?;
    }
    std::fs::write(path, code).map_err(|e| GenerateError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_types::assert_error_codes;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        std::fs::write(path, content).expect("write");
    }

    fn context(root: &Path) -> GenerateContext {
        let mut config = QuillConfig::default();
        config.compiler.pool_size = 2;
        let service = CompileService::new(&config, root).expect("service");
        GenerateContext {
            root: root.to_path_buf(),
            config,
            service: Arc::new(service),
        }
    }

    #[test]
    fn discover_is_recursive_and_sorted() {
        let temp = TempDir::new().expect("tempdir");
        write(temp.path(), "b.quill", "");
        write(temp.path(), "a/z.quill", "");
        write(temp.path(), "a/notes.md", "");

        let found = discover(temp.path(), "quill").expect("discover");
        assert_eq!(
            found,
            vec![temp.path().join("a/z.quill"), temp.path().join("b.quill")]
        );
    }

    #[test]
    fn request_filename_is_root_relative() {
        let name = request_filename(Path::new("/site"), Path::new("/site/src/pages/index.quill"));
        assert_eq!(name, "src/pages/index.quill");
    }

    #[tokio::test]
    async fn writes_both_targets() {
        let temp = TempDir::new().expect("tempdir");
        write(temp.path(), "src/index.quill", "<h1>hi</h1>");
        write(temp.path(), "src/pages/about.quill", "<p>{name}</p>");

        let report = TemplateGenerator
            .generate(&context(temp.path()))
            .await
            .expect("generate");

        assert!(report.is_success());
        let build = temp.path().join("build");
        assert_eq!(
            report.written,
            vec![
                build.join("ssr/index.js"),
                build.join("dom/index.js"),
                build.join("ssr/pages/about.js"),
                build.join("dom/pages/about.js"),
            ]
        );
        let ssr = std::fs::read_to_string(build.join("ssr/index.js")).expect("read");
        assert!(ssr.contains("create_ssr_component"));
        let dom = std::fs::read_to_string(build.join("dom/pages/about.js")).expect("read");
        assert!(dom.contains("set_data"));
    }

    #[tokio::test]
    async fn broken_template_is_reported_not_fatal() {
        let temp = TempDir::new().expect("tempdir");
        write(temp.path(), "src/bad.quill", "<p></h1>");
        write(temp.path(), "src/good.quill", "<p>ok</p>");

        let report = TemplateGenerator
            .generate(&context(temp.path()))
            .await
            .expect("generate");

        assert_eq!(report.failures.len(), 2);
        assert!(report
            .failures
            .iter()
            .all(|err| err.filename == "src/bad.quill"));
        assert_eq!(report.written.len(), 2);
        assert!(temp.path().join("build/ssr/good.js").exists());
        assert!(!temp.path().join("build/ssr/bad.js").exists());
    }

    #[tokio::test]
    async fn missing_template_dir() {
        let temp = TempDir::new().expect("tempdir");
        let err = TemplateGenerator
            .generate(&context(temp.path()))
            .await
            .expect_err("should fail");
        assert!(matches!(err, GenerateError::MissingDir(_)));
    }

    #[test]
    fn error_codes() {
        assert_error_codes(
            &[
                GenerateError::MissingDir(PathBuf::from("src")),
                GenerateError::io("out", std::io::Error::other("full")),
            ],
            "GENERATE_",
        );
    }
}
