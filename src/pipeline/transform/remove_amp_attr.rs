//! Strip the AMP marker attribute from `<html>`.

use anyhow::Result;

use super::{TransformParams, Transformer, html_element};
use crate::dom::DocumentTree;

/// Attributes that flag a document as AMP.
const AMP_ATTRIBUTES: [&str; 2] = ["⚡", "amp"];

pub struct RemoveAmpAttribute;

impl Transformer for RemoveAmpAttribute {
    fn name(&self) -> &str {
        "RemoveAmpAttribute"
    }

    fn transform(&self, tree: &mut DocumentTree, _params: &TransformParams) -> Result<()> {
        let Some(html) = html_element(tree) else {
            return Ok(());
        };
        for attr in AMP_ATTRIBUTES {
            tree.remove_attr(html, attr);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(input: &str) -> String {
        let mut tree = DocumentTree::parse(input).unwrap();
        RemoveAmpAttribute
            .transform(&mut tree, &TransformParams::default())
            .unwrap();
        tree.render()
    }

    #[test]
    fn test_removes_amp_attribute() {
        assert_eq!(run("<html amp lang=\"en\"></html>"), "<html lang=\"en\"></html>");
    }

    #[test]
    fn test_removes_lightning_attribute() {
        let mut tree = DocumentTree::new();
        let html = tree.create_element("html", [("⚡", ""), ("lang", "en")]);
        tree.append_child(tree.root(), html).unwrap();

        RemoveAmpAttribute
            .transform(&mut tree, &TransformParams::default())
            .unwrap();
        assert_eq!(tree.render(), "<html lang=\"en\"></html>");
    }

    #[test]
    fn test_leaves_nested_attributes() {
        let input = "<html><body><div amp></div></body></html>";
        assert_eq!(run(input), input);
    }
}
