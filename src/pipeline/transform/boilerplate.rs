//! Runtime stylesheet link for server-side rendered pages.
//!
//! Once the boilerplate is gone the page depends on `v0.css` being loaded
//! before first paint, so a `<link rel="stylesheet">` to it is added to
//! `<head>`. Pages that were not rendered by [`super::ServerSideRendering`]
//! (no `i-amphtml-layout` on `<html>`) are left alone.

use anyhow::Result;

use super::{TransformParams, Transformer, html_element};
use crate::dom::DocumentTree;

const RUNTIME_CSS: &str = "v0.css";

pub struct AmpBoilerplate;

impl Transformer for AmpBoilerplate {
    fn name(&self) -> &str {
        "AmpBoilerplateTransformer"
    }

    fn transform(&self, tree: &mut DocumentTree, params: &TransformParams) -> Result<()> {
        let Some(html) = html_element(tree) else {
            return Ok(());
        };
        if !tree.has_attr(html, "i-amphtml-layout") {
            return Ok(());
        }
        let Some(head) = tree.first_child_by_tag(html, "head") else {
            return Ok(());
        };

        let already_linked = tree.children(head).iter().any(|&child| {
            (tree.is_element(child, "style") && tree.has_attr(child, "amp-runtime"))
                || (tree.is_element(child, "link")
                    && tree
                        .attr(child, "href")
                        .is_some_and(|href| href.ends_with(&format!("/{RUNTIME_CSS}"))))
        });
        if already_linked {
            return Ok(());
        }

        let href = params.runtime_url(RUNTIME_CSS);
        let link = tree.create_element("link", [("rel", "stylesheet"), ("href", href.as_str())]);
        tree.append_child(head, link)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(input: &str) -> String {
        let mut tree = DocumentTree::parse(input).unwrap();
        AmpBoilerplate
            .transform(&mut tree, &TransformParams::default())
            .unwrap();
        tree.render()
    }

    #[test]
    fn test_links_runtime_css_after_ssr() {
        let out = run("<html i-amphtml-layout i-amphtml-no-boilerplate><head></head></html>");
        assert!(out.contains(
            "<link rel=\"stylesheet\" href=\"https://cdn.ampproject.org/v0.css\">"
        ));
    }

    #[test]
    fn test_skips_pages_without_ssr() {
        let input = "<html><head></head></html>";
        assert_eq!(run(input), input);
    }

    #[test]
    fn test_does_not_duplicate() {
        let input = "<html i-amphtml-layout><head><style amp-runtime></style></head></html>";
        assert_eq!(run(input), input);
    }
}
