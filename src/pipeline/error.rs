//! Pipeline error types.

use thiserror::Error;

use crate::dom::DomError;

/// Failure while running the pipeline over one document.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The raw input could not be parsed into a tree.
    #[error("failed to parse document")]
    Parse(#[from] DomError),

    /// A named reference matched neither a registered nor a built-in unit.
    #[error("unknown transformer `{0}`")]
    UnknownTransformer(String),

    /// A unit returned an error; the remaining units were not run.
    #[error("transformer `{name}` failed")]
    Transform {
        name: String,
        #[source]
        source: anyhow::Error,
    },
}
