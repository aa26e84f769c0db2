//! Pipeline configuration: the ordered unit list plus global options.

use super::transform::{BuiltinTransformer, DEFAULT_RUNTIME_HOST, TransformerRef};

/// Options copied into every run's [`TransformParams`](super::TransformParams).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Replacement origin for runtime URLs, see `RewriteAmpUrls`.
    pub amp_url_prefix: Option<String>,
    /// Origin the AMP runtime is served from.
    pub amp_runtime_host: String,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            amp_url_prefix: None,
            amp_runtime_host: DEFAULT_RUNTIME_HOST.to_string(),
        }
    }
}

/// Ordered list of units and the options they run with.
///
/// Order is significant and not validated; see the module docs of
/// [`transform`](super::transform) for the constraints between built-ins.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub transformers: Vec<TransformerRef>,
    pub options: PipelineOptions,
}

impl PipelineConfig {
    pub fn new(transformers: Vec<TransformerRef>) -> Self {
        Self {
            transformers,
            options: PipelineOptions::default(),
        }
    }

    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    /// Append a unit at the end of the list.
    pub fn push(&mut self, reference: impl Into<TransformerRef>) -> &mut Self {
        self.transformers.push(reference.into());
        self
    }

    /// The built-ins, in [`BuiltinTransformer::ALL`] order.
    pub fn default_transformers() -> Vec<TransformerRef> {
        BuiltinTransformer::ALL.into_iter().map(Into::into).collect()
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new(Self::default_transformers())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_order() {
        let config = PipelineConfig::default();
        let labels: Vec<_> = config.transformers.iter().map(TransformerRef::label).collect();
        assert_eq!(
            labels,
            [
                "AddAmpLink",
                "ServerSideRendering",
                "RemoveAmpAttribute",
                "AmpBoilerplateTransformer",
                "ReorderHeadTransformer",
                "RewriteAmpUrls",
            ]
        );
        assert_eq!(config.options.amp_runtime_host, DEFAULT_RUNTIME_HOST);
        assert!(config.options.amp_url_prefix.is_none());
    }

    #[test]
    fn test_push_appends() {
        let mut config = PipelineConfig::new(Vec::new());
        config.push("B").push(BuiltinTransformer::AddAmpLink);
        let labels: Vec<_> = config.transformers.iter().map(TransformerRef::label).collect();
        assert_eq!(labels, ["B", "AddAmpLink"]);
    }
}
