use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::pipeline::PipelineError;

/// Failure of a conversion run or of one file within it.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("cannot enumerate `{root}`: {reason}")]
    Discover { root: PathBuf, reason: String },

    #[error("{0}")]
    Pattern(String),

    #[error("failed to read `{path}`")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to create directory `{path}`")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write `{path}`")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to transform `{path}`")]
    Pipeline {
        path: PathBuf,
        #[source]
        source: PipelineError,
    },

    /// A conversion task panicked or was cancelled.
    #[error("conversion task failed: {0}")]
    Task(String),
}
