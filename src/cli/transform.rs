//! `amp-ssr transform`: one file to stdout.
//!
//! stdout carries only the document; log lines are moved to stderr.

use std::io::{Write, stdout};
use std::path::Path;

use anyhow::{Context, Result};

use crate::{
    config::AppConfig,
    debug,
    logger,
    pipeline::{Pipeline, TransformOptions, TransformerRegistry},
};

/// Run the configured pipeline over `file` and print the result.
pub fn transform_file(file: &Path, amp_url: Option<&str>, config: &AppConfig) -> Result<()> {
    logger::set_stderr(true);
    write_transformed(file, amp_url, config, &mut stdout().lock())
}

fn write_transformed(
    file: &Path,
    amp_url: Option<&str>,
    config: &AppConfig,
    out: &mut impl Write,
) -> Result<()> {
    let bytes = std::fs::read(file).with_context(|| format!("failed to read `{}`", file.display()))?;
    let raw = String::from_utf8_lossy(&bytes);

    let output = render(&raw, amp_url, config)
        .with_context(|| format!("failed to transform `{}`", file.display()))?;
    debug!("transform"; "{} -> {} bytes", raw.len(), output.len());

    out.write_all(output.as_bytes())?;
    out.flush()?;
    Ok(())
}

fn render(raw: &str, amp_url: Option<&str>, config: &AppConfig) -> Result<String> {
    let pipeline = Pipeline::new(config.pipeline_config(), TransformerRegistry::new());
    let params = pipeline.params_for(&TransformOptions {
        amp_url: amp_url.map(str::to_string),
    });
    Ok(pipeline.run(raw, &params)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_with_config() {
        let mut config = AppConfig::default();
        config.pipeline.transformers = vec!["AddAmpLink".to_string(), "RemoveAmpAttribute".to_string()];

        let out = render("<html amp><head></head></html>", Some("/p.amp.html"), &config).unwrap();
        assert_eq!(
            out,
            "<html><head><link rel=\"amphtml\" href=\"/p.amp.html\"></head></html>"
        );
    }

    #[test]
    fn test_verbose_output_holds_only_the_document() {
        let temp = tempfile::TempDir::new().unwrap();
        let file = temp.path().join("page.html");
        std::fs::write(&file, "<html amp><head></head></html>").unwrap();

        let mut config = AppConfig::default();
        config.pipeline.transformers = vec!["RemoveAmpAttribute".to_string()];

        logger::set_verbose(true);
        logger::set_stderr(true);
        let mut out = Vec::new();
        write_transformed(&file, None, &config, &mut out).unwrap();
        logger::set_verbose(false);
        logger::set_stderr(false);

        assert_eq!(String::from_utf8(out).unwrap(), "<html><head></head></html>");
    }
}
