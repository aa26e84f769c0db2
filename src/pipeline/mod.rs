//! Document transformation pipeline.
//!
//! ```text
//! raw html ──parse──▶ DocumentTree ──unit 1──▶ … ──unit N──▶ render ──▶ html
//! ```
//!
//! - [`Pipeline::run`]: one document through the configured units
//! - [`transform_html`]: same, with the default units and registry
//!
//! Units run strictly in declared order on the same tree. The first unit
//! that fails aborts the document; nothing is retried.

mod config;
mod error;
mod registry;
pub mod transform;


use crate::debug;
use crate::dom::DocumentTree;

pub use config::{PipelineConfig, PipelineOptions};
pub use error::PipelineError;
pub use registry::TransformerRegistry;
pub use transform::{BuiltinTransformer, TransformParams, Transformer, TransformerRef};

/// Options of a single [`transform_html`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformOptions {
    /// URL of the pristine AMP document, linked via `<link rel=amphtml>`.
    pub amp_url: Option<String>,
}

/// Transform one document with the default units.
pub fn transform_html(raw: &str, options: &TransformOptions) -> Result<String, PipelineError> {
    let pipeline = Pipeline::default();
    let params = pipeline.params_for(options);
    pipeline.run(raw, &params)
}

/// Configured units plus the registry that resolves their names.
///
/// Read-only once built; share it as `Arc<Pipeline>` across tasks.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
    registry: TransformerRegistry,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, registry: TransformerRegistry) -> Self {
        Self { config, registry }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn registry(&self) -> &TransformerRegistry {
        &self.registry
    }

    /// Check that every named unit resolves, without running anything.
    pub fn validate(&self) -> Result<(), PipelineError> {
        for reference in &self.config.transformers {
            self.registry.resolve(reference)?;
        }
        Ok(())
    }

    /// Per-run parameters: the given options plus the global ones.
    pub fn params_for(&self, options: &TransformOptions) -> TransformParams {
        TransformParams {
            amp_url: options.amp_url.clone(),
            amp_url_prefix: self.config.options.amp_url_prefix.clone(),
            runtime_host: self.config.options.amp_runtime_host.clone(),
        }
    }

    /// Parse, apply every unit in order, serialize.
    pub fn run(&self, raw: &str, params: &TransformParams) -> Result<String, PipelineError> {
        let mut tree = DocumentTree::parse(raw)?;
        self.apply(&mut tree, params)?;
        Ok(tree.render())
    }

    /// Apply every unit in order to an already parsed tree.
    pub fn apply(&self, tree: &mut DocumentTree, params: &TransformParams) -> Result<(), PipelineError> {
        for reference in &self.config.transformers {
            let unit = self.registry.resolve(reference)?;
            debug!("pipeline"; "running {}", unit.name());
            unit.transform(tree, params)
                .map_err(|source| PipelineError::Transform {
                    name: unit.name().to_string(),
                    source,
                })?;
        }
        Ok(())
    }
}
