//! `amp-ssr convert`: the whole source tree in one run.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Result, bail};

use crate::{
    config::AppConfig,
    log,
    pipeline::{Pipeline, TransformerRegistry},
    utils::{path::to_slash, plural_count},
    workflow::convert,
};

/// Convert `[convert].src` into `[convert].dist` with the configured pipeline.
pub async fn convert_site(config: &AppConfig) -> Result<()> {
    let pipeline = Pipeline::new(config.pipeline_config(), TransformerRegistry::new());
    pipeline.validate()?;

    let src = &config.convert.src;
    let dist = &config.convert.dist;
    log!("convert"; "{} -> {} ({})", src.display(), dist.display(), config.convert.glob);

    let started = Instant::now();
    let report = convert(
        src,
        dist,
        &config.convert.glob,
        Arc::new(pipeline),
        &config.convert_options(true),
    )
    .await?;

    for (path, err) in &report.failed {
        log!("error"; "{}: {}", to_slash(path), error_chain(err));
    }

    log!(
        "convert";
        "converted {} in {:.2?}",
        plural_count(report.converted.len(), "file"),
        started.elapsed()
    );

    if !report.is_success() {
        bail!("{} failed", plural_count(report.failed.len(), "file"));
    }
    Ok(())
}

/// `outer: inner: innermost`, following `source()` links.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        out.push_str(": ");
        out.push_str(&inner.to_string());
        source = inner.source();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::PipelineError;
    use crate::workflow::WorkflowError;
    use std::path::PathBuf;

    #[test]
    fn test_error_chain() {
        let err = WorkflowError::Pipeline {
            path: PathBuf::from("a.html"),
            source: PipelineError::UnknownTransformer("X".to_string()),
        };
        assert_eq!(
            error_chain(&err),
            "failed to transform `a.html`: unknown transformer `X`"
        );
    }
}
