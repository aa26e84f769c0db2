//! Reorder `<head>` children into the order AMP pages load fastest with.
//!
//! 1. `<meta charset>`
//! 2. `<style amp-runtime>` / runtime stylesheet link
//! 3. remaining `<meta>`
//! 4. runtime script (`v0.js`)
//! 5. render-delaying extension scripts
//! 6. other extension scripts (`custom-element` / `custom-template`)
//! 7. favicon links
//! 8. resource hints (`preconnect`, `dns-prefetch`, `preload`, `prefetch`)
//! 9. other stylesheets
//! 10. `<style amp-custom>`
//! 11. everything else (title, canonical, json scripts, comments, ...)
//! 12. `<style amp-boilerplate>` and its `<noscript>`
//!
//! The sort is stable: nodes of the same rank keep their relative order.
//! Whitespace-only text between head children is dropped.

use anyhow::Result;

use super::{TransformParams, Transformer, html_element, is_render_delaying};
use crate::dom::{DocumentTree, NodeId, NodeKind};

const RESOURCE_HINTS: [&str; 4] = ["preconnect", "dns-prefetch", "preload", "prefetch"];

pub struct ReorderHead;

impl Transformer for ReorderHead {
    fn name(&self) -> &str {
        "ReorderHeadTransformer"
    }

    fn transform(&self, tree: &mut DocumentTree, _params: &TransformParams) -> Result<()> {
        let Some(html) = html_element(tree) else {
            return Ok(());
        };
        let Some(head) = tree.first_child_by_tag(html, "head") else {
            return Ok(());
        };

        let mut children: Vec<(u8, NodeId)> = tree
            .take_children(head)
            .into_iter()
            .filter(|&id| !matches!(tree.kind(id), NodeKind::Text(t) if t.trim().is_empty()))
            .map(|id| (rank(tree, id), id))
            .collect();
        children.sort_by_key(|(rank, _)| *rank);

        for (_, child) in children {
            tree.append_child(head, child)?;
        }
        Ok(())
    }
}

fn rank(tree: &DocumentTree, id: NodeId) -> u8 {
    let Some(tag) = tree.tag(id) else {
        return 10;
    };
    let attr = |name: &str| tree.attr(id, name);
    let rel = attr("rel").map(str::to_ascii_lowercase).unwrap_or_default();

    match tag {
        "meta" if attr("charset").is_some() => 0,
        "style" if attr("amp-runtime").is_some() => 1,
        "link" if rel == "stylesheet" && attr("href").is_some_and(is_runtime_css) => 1,
        "meta" => 2,
        "script" if attr("src").is_some_and(is_runtime_script) => 3,
        "script" if attr("custom-element").is_some_and(is_render_delaying) => 4,
        "script" if attr("custom-element").is_some() || attr("custom-template").is_some() => 5,
        "link" if rel.split_whitespace().any(|r| r == "icon") => 6,
        "link" if RESOURCE_HINTS.contains(&rel.as_str()) => 7,
        "link" if rel == "stylesheet" => 8,
        "style" if attr("amp-custom").is_some() => 9,
        "style" if attr("amp-boilerplate").is_some() => 11,
        "noscript" => 11,
        _ => 10,
    }
}

fn is_runtime_script(src: &str) -> bool {
    src.ends_with("/v0.js") || src.ends_with("/v0.mjs")
}

fn is_runtime_css(href: &str) -> bool {
    href.ends_with("/v0.css")
}
