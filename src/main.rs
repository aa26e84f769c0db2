//! amp-ssr - server-side rendering for AMP pages.

use amp_ssr::{
    cli::{Cli, Commands, convert::convert_site, list::list_transformers, transform::transform_file},
    config::AppConfig,
};
use anyhow::Result;
use clap::{ColorChoice, Parser};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = AppConfig::load(&cli)?;

    match &cli.command {
        Commands::Convert { .. } => convert_site(&config).await,
        Commands::Transform { args } => transform_file(&args.file, args.amp_url.as_deref(), &config),
        Commands::List => {
            list_transformers();
            Ok(())
        }
    }
}
