//! Name -> unit resolution.
//!
//! Custom factories registered by the caller shadow built-ins of the same
//! name. Everything else falls through to [`BuiltinTransformer`].

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::PipelineError;
use super::transform::{BuiltinTransformer, Transformer, TransformerRef};

type Factory = Arc<dyn Fn() -> Arc<dyn Transformer> + Send + Sync>;

/// Resolves [`TransformerRef`]s to runnable units.
#[derive(Clone, Default)]
pub struct TransformerRegistry {
    custom: FxHashMap<String, Factory>,
}

impl TransformerRegistry {
    /// Registry that only knows the built-ins.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named custom unit. Re-registering a name replaces it.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> Arc<dyn Transformer> + Send + Sync + 'static,
    {
        self.custom.insert(name.into(), Arc::new(factory));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.custom.contains_key(name) || name.parse::<BuiltinTransformer>().is_ok()
    }

    /// Resolve one reference.
    ///
    /// Inline units are returned as-is. Names match exactly, custom
    /// registrations first.
    pub fn resolve(&self, reference: &TransformerRef) -> Result<Arc<dyn Transformer>, PipelineError> {
        match reference {
            TransformerRef::Inline(unit) => Ok(Arc::clone(unit)),
            TransformerRef::Named(name) => match self.custom.get(name) {
                Some(factory) => Ok(factory()),
                None => Ok(name.parse::<BuiltinTransformer>()?.create()),
            },
        }
    }

    /// Custom names, sorted.
    pub fn custom_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.custom.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for TransformerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformerRegistry")
            .field("custom", &self.custom_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::DocumentTree;
    use crate::pipeline::transform::TransformParams;

    struct Marker(&'static str);

    impl Transformer for Marker {
        fn name(&self) -> &str {
            self.0
        }

        fn transform(&self, _: &mut DocumentTree, _: &TransformParams) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_resolves_builtins() {
        let registry = TransformerRegistry::new();
        for builtin in BuiltinTransformer::ALL {
            let unit = registry.resolve(&builtin.into()).unwrap();
            assert_eq!(unit.name(), builtin.name());
        }
    }

    #[test]
    fn test_inline_is_returned_unchanged() {
        let registry = TransformerRegistry::new();
        let unit: Arc<dyn Transformer> = Arc::new(Marker("inline"));
        let resolved = registry.resolve(&TransformerRef::Inline(Arc::clone(&unit))).unwrap();
        assert!(Arc::ptr_eq(&unit, &resolved));
    }

    #[test]
    fn test_unknown_name() {
        let registry = TransformerRegistry::new();
        let err = registry.resolve(&"Missing".into()).err().unwrap();
        assert!(matches!(err, PipelineError::UnknownTransformer(name) if name == "Missing"));
    }

    #[test]
    fn test_custom_shadows_builtin() {
        let mut registry = TransformerRegistry::new();
        registry.register("AddAmpLink", || Arc::new(Marker("custom")));
        let unit = registry.resolve(&"AddAmpLink".into()).unwrap();
        assert_eq!(unit.name(), "custom");
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let mut registry = TransformerRegistry::new();
        registry.register("a", || Arc::new(Marker("a")));
        let first = registry.resolve(&"a".into()).unwrap();
        let second = registry.resolve(&"a".into()).unwrap();
        assert_eq!(first.name(), second.name());
    }

    #[test]
    fn test_registration_order_does_not_matter() {
        let mut forward = TransformerRegistry::new();
        forward
            .register("a", || Arc::new(Marker("a")))
            .register("b", || Arc::new(Marker("b")));

        let mut backward = TransformerRegistry::new();
        backward
            .register("b", || Arc::new(Marker("b")))
            .register("a", || Arc::new(Marker("a")));

        for name in ["a", "b", "ReorderHeadTransformer"] {
            let reference = TransformerRef::from(name);
            assert_eq!(
                forward.resolve(&reference).unwrap().name(),
                backward.resolve(&reference).unwrap().name()
            );
        }
        assert_eq!(forward.custom_names(), backward.custom_names());
    }

    #[test]
    fn test_last_registration_wins() {
        let mut registry = TransformerRegistry::new();
        registry
            .register("x", || Arc::new(Marker("first")))
            .register("x", || Arc::new(Marker("second")));
        assert_eq!(registry.resolve(&"x".into()).unwrap().name(), "second");
        assert!(registry.contains("x"));
        assert!(registry.contains("RewriteAmpUrls"));
        assert!(!registry.contains("y"));
    }
}
