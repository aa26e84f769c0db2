//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Server-side rendering for AMP pages
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (used when it exists)
    #[arg(short = 'C', long, global = true, default_value = "amp-ssr.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Convert every matching file of a source tree into a destination tree
    #[command(visible_alias = "c")]
    Convert {
        #[command(flatten)]
        args: ConvertArgs,
    },

    /// Transform a single file and print the result
    #[command(visible_alias = "t")]
    Transform {
        #[command(flatten)]
        args: TransformArgs,
    },

    /// List the built-in transformers in default order
    #[command(visible_alias = "l")]
    List,
}

/// Options shared by commands that run the pipeline.
#[derive(clap::Args, Debug, Clone)]
pub struct PipelineArgs {
    /// Serve AMP runtime URLs from this prefix instead of the runtime host
    #[arg(long = "amp-url-prefix", value_hint = clap::ValueHint::Url)]
    pub amp_url_prefix: Option<String>,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long)]
    pub verbose: bool,
}

/// Convert command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct ConvertArgs {
    /// Source directory
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub src: Option<PathBuf>,

    /// Destination directory
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub dist: Option<PathBuf>,

    /// Glob selecting source files, relative to the source directory
    #[arg(short, long)]
    pub glob: Option<String>,

    /// Keep converting other files when one fails
    #[arg(short, long)]
    pub isolate: bool,

    /// Maximum number of files processed at once
    #[arg(short, long)]
    pub jobs: Option<usize>,

    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

/// Transform command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct TransformArgs {
    /// HTML file to transform
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub file: PathBuf,

    /// URL of the pristine AMP document, linked from the output
    #[arg(short, long)]
    pub amp_url: Option<String>,

    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

impl Cli {
    /// Pipeline flags of the current command, if it runs the pipeline.
    pub const fn pipeline_args(&self) -> Option<&PipelineArgs> {
        match &self.command {
            Commands::Convert { args } => Some(&args.pipeline),
            Commands::Transform { args } => Some(&args.pipeline),
            Commands::List => None,
        }
    }
}
