//! `[pipeline]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [pipeline]
//! transformers = ["AddAmpLink", "ServerSideRendering", "RemoveAmpAttribute"]
//! amp_url_prefix = "/amp"                       # Rewrite runtime URLs to this prefix
//! runtime_host = "https://cdn.ampproject.org"   # Origin the runtime is served from
//! ```
//!
//! Without `transformers` every built-in runs, in default order.

use serde::{Deserialize, Serialize};

use crate::pipeline::transform::DEFAULT_RUNTIME_HOST;
use crate::pipeline::{BuiltinTransformer, PipelineConfig, PipelineOptions, TransformerRef};

/// Pipeline settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSectionConfig {
    /// Transformer names, in run order.
    pub transformers: Vec<String>,
    pub amp_url_prefix: Option<String>,
    pub runtime_host: String,
}

impl Default for PipelineSectionConfig {
    fn default() -> Self {
        Self {
            transformers: BuiltinTransformer::ALL
                .iter()
                .map(|builtin| builtin.name().to_string())
                .collect(),
            amp_url_prefix: None,
            runtime_host: DEFAULT_RUNTIME_HOST.to_string(),
        }
    }
}

impl PipelineSectionConfig {
    /// Names that are not built-in transformers.
    pub fn unknown_transformers(&self) -> Vec<&str> {
        self.transformers
            .iter()
            .map(String::as_str)
            .filter(|name| name.parse::<BuiltinTransformer>().is_err())
            .collect()
    }

    pub fn to_pipeline_config(&self) -> PipelineConfig {
        let transformers = self
            .transformers
            .iter()
            .map(|name| TransformerRef::from(name.as_str()))
            .collect();
        PipelineConfig::new(transformers).with_options(PipelineOptions {
            amp_url_prefix: self.amp_url_prefix.clone(),
            amp_runtime_host: self.runtime_host.clone(),
        })
    }
}
