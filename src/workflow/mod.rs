//! Batch conversion of a source tree.
//!
//! ```text
//! discover ─▶ spawn one task per file ─▶ read ─▶ pipeline ─▶ write × 2
//! ```
//!
//! For `a/b.html` the task writes:
//!
//! - `dest/a/b.amp.html`: the untouched source
//! - `dest/a/b.html`: the transformed document, linking to the former
//!
//! Steps of one file run in order; files run concurrently in no particular
//! order. Already written files are never rolled back.

mod discover;
mod error;
mod write;


use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::debug;
use crate::logger::ProgressLine;
use crate::pipeline::{Pipeline, TransformOptions};
use crate::utils::glob::GlobPattern;
use crate::utils::path::to_slash;

pub use discover::discover;
pub use error::WorkflowError;
pub use write::write_file;

/// What happens to the rest of the batch when one file fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Abort every in-flight file and return the first error.
    #[default]
    FailFast,
    /// Record the failure in [`ConvertReport::failed`] and keep going.
    Isolate,
}

#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    pub failure_policy: FailurePolicy,
    /// Upper bound on files processed at once. `None` is unbounded.
    pub max_in_flight: Option<usize>,
    /// Show a progress line on stdout.
    pub progress: bool,
}

/// Outcome of a finished [`convert`] run. Paths are relative to the roots.
#[derive(Debug, Default)]
pub struct ConvertReport {
    pub converted: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, WorkflowError)>,
}

impl ConvertReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// One discovered source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTask {
    /// Path relative to the source root; the transformed output lands here.
    pub source: PathBuf,
    /// Renamed path; the untouched source lands here.
    pub rendered: PathBuf,
    pub content: String,
}

impl FileTask {
    pub fn new(source: PathBuf, content: String) -> Self {
        let rendered = rendered_path(&source);
        Self {
            source,
            rendered,
            content,
        }
    }

    /// The rendered path with forward slashes, e.g. `a/b.amp.html`.
    pub fn amp_url(&self) -> String {
        to_slash(&self.rendered)
    }
}

/// `a/b.html` -> `a/b.amp.html`; anything else gets `.amp.html` appended.
pub fn rendered_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_default();
    let renamed = match name.strip_suffix(".html") {
        Some(stem) => format!("{stem}.amp.html"),
        None => format!("{name}.amp.html"),
    };
    path.with_file_name(renamed)
}

/// Convert every file under `source_root` matching `pattern` into
/// `dest_root`.
///
/// Discovery errors are returned before any file is touched. Returns once
/// every spawned task finished (or was aborted under
/// [`FailurePolicy::FailFast`]).
pub async fn convert(
    source_root: &Path,
    dest_root: &Path,
    pattern: &str,
    pipeline: Arc<Pipeline>,
    options: &ConvertOptions,
) -> Result<ConvertReport, WorkflowError> {
    let pattern = GlobPattern::new(pattern).map_err(|e| WorkflowError::Pattern(e.to_string()))?;
    let files = discover(source_root, &pattern)?;
    debug!("convert"; "{} matched {} files", pattern.as_str(), files.len());

    let limit = options.max_in_flight.map(|n| Arc::new(Semaphore::new(n.max(1))));
    let progress = options
        .progress
        .then(|| ProgressLine::new("convert", files.len()));

    let mut join = JoinSet::new();
    for relative in files {
        let pipeline = Arc::clone(&pipeline);
        let limit = limit.clone();
        let source_root = source_root.to_path_buf();
        let dest_root = dest_root.to_path_buf();
        join.spawn(async move {
            let result = match limit {
                Some(semaphore) => match semaphore.acquire_owned().await {
                    Ok(_permit) => {
                        convert_file(&pipeline, &source_root, &dest_root, &relative).await
                    }
                    Err(e) => Err(WorkflowError::Task(e.to_string())),
                },
                None => convert_file(&pipeline, &source_root, &dest_root, &relative).await,
            };
            (relative, result)
        });
    }

    let mut report = ConvertReport::default();
    while let Some(joined) = join.join_next().await {
        let (relative, result) = match joined {
            Ok(done) => done,
            Err(e) => {
                join.abort_all();
                while join.join_next().await.is_some() {}
                return Err(WorkflowError::Task(e.to_string()));
            }
        };

        match result {
            Ok(()) => {
                debug!("convert"; "{}", to_slash(&relative));
                report.converted.push(relative);
            }
            Err(e) if options.failure_policy == FailurePolicy::Isolate => {
                report.failed.push((relative, e));
            }
            Err(e) => {
                join.abort_all();
                while join.join_next().await.is_some() {}
                return Err(e);
            }
        }
        if let Some(progress) = &progress {
            progress.inc();
        }
    }

    if let Some(progress) = progress {
        progress.finish();
    }
    report.converted.sort();
    report.failed.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(report)
}

/// Read, transform and write one file.
async fn convert_file(
    pipeline: &Pipeline,
    source_root: &Path,
    dest_root: &Path,
    relative: &Path,
) -> Result<(), WorkflowError> {
    let path = source_root.join(relative);
    let bytes = fs::read(&path)
        .await
        .map_err(|source| WorkflowError::Read { path, source })?;
    // Invalid UTF-8 sequences become U+FFFD instead of failing the file
    let content = String::from_utf8_lossy(&bytes).into_owned();

    let task = FileTask::new(relative.to_path_buf(), content);
    let params = pipeline.params_for(&TransformOptions {
        amp_url: Some(task.amp_url()),
    });
    let output = pipeline
        .run(&task.content, &params)
        .map_err(|source| WorkflowError::Pipeline {
            path: task.source.clone(),
            source,
        })?;

    write_file(&dest_root.join(&task.rendered), &task.content).await?;
    write_file(&dest_root.join(&task.source), &output).await?;
    Ok(())
}
