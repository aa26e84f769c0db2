//! Command-line interface module.

mod args;
pub mod convert;
pub mod list;
pub mod transform;

pub use args::{Cli, Commands, ConvertArgs, PipelineArgs, TransformArgs};
