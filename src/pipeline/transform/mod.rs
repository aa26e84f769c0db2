//! Transformer units and their built-in implementations.
//!
//! Every unit mutates one [`DocumentTree`] in place. Units are either
//! built-in (named by [`BuiltinTransformer`]) or supplied by the caller as
//! an `Arc<dyn Transformer>`.
//!
//! # Built-ins
//!
//! | Name                        | Effect                                           | Run after              |
//! |-----------------------------|--------------------------------------------------|------------------------|
//! | `AddAmpLink`                | `<link rel=amphtml>` to the pristine AMP page     |                        |
//! | `ServerSideRendering`       | static AMP layout, boilerplate removal           |                        |
//! | `RemoveAmpAttribute`        | drops `⚡` / `amp` from `<html>`                  |                        |
//! | `AmpBoilerplateTransformer` | links the runtime stylesheet `v0.css`            | `ServerSideRendering`  |
//! | `ReorderHeadTransformer`    | sorts `<head>` children into AMP order           | `ServerSideRendering`  |
//! | `RewriteAmpUrls`            | serves runtime URLs from `amp_url_prefix`        | `ReorderHeadTransformer` |
//!
//! Ordering constraints are documented here and not checked at runtime.
//!
//! Contract shared by all built-ins: when `<html>` (or the element a unit
//! targets, such as `<head>`) is missing, the unit returns `Ok(())` without
//! touching the tree. Later units still run.

mod add_amp_link;
mod boilerplate;
mod remove_amp_attr;
mod reorder_head;
mod rewrite_urls;
mod ssr;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;

use crate::dom::{DocumentTree, NodeId};

use super::PipelineError;

pub use add_amp_link::AddAmpLink;
pub use boilerplate::AmpBoilerplate;
pub use remove_amp_attr::RemoveAmpAttribute;
pub use reorder_head::ReorderHead;
pub use rewrite_urls::RewriteAmpUrls;
pub use ssr::ServerSideRendering;

/// Origin the AMP runtime and extensions are served from by default.
pub const DEFAULT_RUNTIME_HOST: &str = "https://cdn.ampproject.org";

// =============================================================================
// Transformer Capability
// =============================================================================

/// A unit of document mutation.
///
/// Implementations must be shareable across the tasks of a batch
/// conversion, hence `Send + Sync`. A unit should keep no state between
/// calls.
pub trait Transformer: Send + Sync {
    /// Name used in logs and error messages.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Mutate `tree` in place.
    fn transform(&self, tree: &mut DocumentTree, params: &TransformParams) -> Result<()>;
}

/// Per-run parameters handed to every unit, immutable for the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformParams {
    /// URL of the pristine AMP document (written next to the rendered one).
    pub amp_url: Option<String>,
    /// Prefix that replaces [`TransformParams::runtime_host`] in runtime URLs.
    pub amp_url_prefix: Option<String>,
    /// Origin of the AMP runtime, e.g. `https://cdn.ampproject.org`.
    pub runtime_host: String,
}

impl Default for TransformParams {
    fn default() -> Self {
        Self {
            amp_url: None,
            amp_url_prefix: None,
            runtime_host: DEFAULT_RUNTIME_HOST.to_string(),
        }
    }
}

impl TransformParams {
    pub fn with_amp_url(mut self, amp_url: impl Into<String>) -> Self {
        self.amp_url = Some(amp_url.into());
        self
    }

    /// `{runtime_host}/{file}`
    pub fn runtime_url(&self, file: &str) -> String {
        format!("{}/{}", self.runtime_host.trim_end_matches('/'), file)
    }
}

/// Locate `<html>` under the document root.
///
/// Built-ins call this first and return early on `None`.
pub fn html_element(tree: &DocumentTree) -> Option<NodeId> {
    tree.first_child_by_tag(tree.root(), "html")
}

/// Extensions that hide the page until they ran.
const RENDER_DELAYING_EXTENSIONS: [&str; 3] =
    ["amp-dynamic-css-classes", "amp-experiment", "amp-story"];

/// Whether the `custom-element` named `name` delays first render.
pub fn is_render_delaying(name: &str) -> bool {
    RENDER_DELAYING_EXTENSIONS.contains(&name)
}

// =============================================================================
// Built-in Identifiers
// =============================================================================

/// The closed set of built-in units, in default pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinTransformer {
    AddAmpLink,
    ServerSideRendering,
    RemoveAmpAttribute,
    AmpBoilerplate,
    ReorderHead,
    RewriteAmpUrls,
}

impl BuiltinTransformer {
    pub const ALL: [Self; 6] = [
        Self::AddAmpLink,
        Self::ServerSideRendering,
        Self::RemoveAmpAttribute,
        Self::AmpBoilerplate,
        Self::ReorderHead,
        Self::RewriteAmpUrls,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::AddAmpLink => "AddAmpLink",
            Self::ServerSideRendering => "ServerSideRendering",
            Self::RemoveAmpAttribute => "RemoveAmpAttribute",
            Self::AmpBoilerplate => "AmpBoilerplateTransformer",
            Self::ReorderHead => "ReorderHeadTransformer",
            Self::RewriteAmpUrls => "RewriteAmpUrls",
        }
    }

    /// One-line description for `amp-ssr list`.
    pub const fn summary(self) -> &'static str {
        match self {
            Self::AddAmpLink => "link the rendered page to its pristine AMP version",
            Self::ServerSideRendering => "apply AMP layouts statically and drop the boilerplate",
            Self::RemoveAmpAttribute => "remove the amp attribute from <html>",
            Self::AmpBoilerplate => "link the AMP runtime stylesheet",
            Self::ReorderHead => "reorder <head> children into AMP order",
            Self::RewriteAmpUrls => "serve runtime URLs from a custom prefix",
        }
    }

    /// Construct a fresh unit.
    pub fn create(self) -> Arc<dyn Transformer> {
        match self {
            Self::AddAmpLink => Arc::new(AddAmpLink),
            Self::ServerSideRendering => Arc::new(ServerSideRendering),
            Self::RemoveAmpAttribute => Arc::new(RemoveAmpAttribute),
            Self::AmpBoilerplate => Arc::new(AmpBoilerplate),
            Self::ReorderHead => Arc::new(ReorderHead),
            Self::RewriteAmpUrls => Arc::new(RewriteAmpUrls),
        }
    }
}

impl fmt::Display for BuiltinTransformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BuiltinTransformer {
    type Err = PipelineError;

    /// Exact, case-sensitive match on [`BuiltinTransformer::name`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|builtin| builtin.name() == s)
            .ok_or_else(|| PipelineError::UnknownTransformer(s.to_string()))
    }
}

// =============================================================================
// References
// =============================================================================

/// An entry of the pipeline's transformer list.
#[derive(Clone)]
pub enum TransformerRef {
    /// Resolved through the registry by exact name.
    Named(String),
    /// Used as-is.
    Inline(Arc<dyn Transformer>),
}

impl TransformerRef {
    pub fn inline(unit: impl Transformer + 'static) -> Self {
        Self::Inline(Arc::new(unit))
    }

    /// Label for logs: the name for named refs, the unit's own name otherwise.
    pub fn label(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::Inline(unit) => unit.name(),
        }
    }
}

impl fmt::Debug for TransformerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Self::Inline(unit) => f.debug_tuple("Inline").field(&unit.name()).finish(),
        }
    }
}

impl From<&str> for TransformerRef {
    fn from(name: &str) -> Self {
        Self::Named(name.to_string())
    }
}

impl From<String> for TransformerRef {
    fn from(name: String) -> Self {
        Self::Named(name)
    }
}

impl From<BuiltinTransformer> for TransformerRef {
    fn from(builtin: BuiltinTransformer) -> Self {
        Self::Named(builtin.name().to_string())
    }
}

impl From<Arc<dyn Transformer>> for TransformerRef {
    fn from(unit: Arc<dyn Transformer>) -> Self {
        Self::Inline(unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_delaying_extensions() {
        assert!(is_render_delaying("amp-story"));
        assert!(is_render_delaying("amp-experiment"));
        assert!(!is_render_delaying("amp-carousel"));
        assert!(!is_render_delaying("AMP-STORY"));
    }

    #[test]
    fn test_builtin_names_roundtrip() {
        for builtin in BuiltinTransformer::ALL {
            assert_eq!(builtin.name().parse::<BuiltinTransformer>().unwrap(), builtin);
            assert_eq!(builtin.create().name(), builtin.name());
        }
    }

    #[test]
    fn test_builtin_lookup_is_exact() {
        assert!("addamplink".parse::<BuiltinTransformer>().is_err());
        assert!(matches!(
            "Nope".parse::<BuiltinTransformer>(),
            Err(PipelineError::UnknownTransformer(name)) if name == "Nope"
        ));
    }

    #[test]
    fn test_runtime_url() {
        let params = TransformParams::default();
        assert_eq!(params.runtime_url("v0.js"), "https://cdn.ampproject.org/v0.js");
    }

    #[test]
    fn test_ref_labels() {
        struct Noop;
        impl Transformer for Noop {
            fn name(&self) -> &str {
                "Noop"
            }
            fn transform(&self, _: &mut DocumentTree, _: &TransformParams) -> Result<()> {
                Ok(())
            }
        }

        assert_eq!(TransformerRef::from("AddAmpLink").label(), "AddAmpLink");
        assert_eq!(TransformerRef::inline(Noop).label(), "Noop");
        assert_eq!(
            TransformerRef::from(BuiltinTransformer::ReorderHead).label(),
            "ReorderHeadTransformer"
        );
    }
}
