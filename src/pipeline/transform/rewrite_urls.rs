//! Serve the AMP runtime and extensions from a custom origin.
//!
//! `script[src]` and `link[href]` in `<head>` pointing at the runtime host
//! are rewritten to `amp_url_prefix` + path. Without a prefix the unit does
//! nothing.

use anyhow::Result;
use url::Url;

use super::{TransformParams, Transformer, html_element};
use crate::dom::{DocumentTree, NodeId};

pub struct RewriteAmpUrls;

impl Transformer for RewriteAmpUrls {
    fn name(&self) -> &str {
        "RewriteAmpUrls"
    }

    fn transform(&self, tree: &mut DocumentTree, params: &TransformParams) -> Result<()> {
        let Some(prefix) = params.amp_url_prefix.as_deref() else {
            return Ok(());
        };
        let Ok(host) = Url::parse(&params.runtime_host) else {
            anyhow::bail!("invalid runtime host `{}`", params.runtime_host);
        };
        let Some(html) = html_element(tree) else {
            return Ok(());
        };
        let Some(head) = tree.first_child_by_tag(html, "head") else {
            return Ok(());
        };

        let targets: Vec<(NodeId, &'static str)> = tree
            .children(head)
            .iter()
            .filter_map(|&child| match tree.tag(child) {
                Some("script") => Some((child, "src")),
                Some("link") => Some((child, "href")),
                _ => None,
            })
            .collect();

        for (node, attr) in targets {
            let Some(value) = tree.attr(node, attr) else {
                continue;
            };
            if let Some(rewritten) = rewrite(value, &host, prefix) {
                tree.set_attr(node, attr, rewritten);
            }
        }
        Ok(())
    }
}

/// `Some(prefix + path)` when `value` is served from the origin of `host`.
fn rewrite(value: &str, host: &Url, prefix: &str) -> Option<String> {
    let url = Url::parse(value).ok()?;
    if url.origin() != host.origin() {
        return None;
    }
    Some(format!(
        "{}{}",
        prefix.trim_end_matches('/'),
        &url[url::Position::BeforePath..]
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(input: &str, prefix: Option<&str>) -> String {
        let mut tree = DocumentTree::parse(input).unwrap();
        let params = TransformParams {
            amp_url_prefix: prefix.map(str::to_string),
            ..TransformParams::default()
        };
        RewriteAmpUrls.transform(&mut tree, &params).unwrap();
        tree.render()
    }

    #[test]
    fn test_rewrites_runtime_urls() {
        let out = run(
            concat!(
                "<html><head>",
                "<script async src=\"https://cdn.ampproject.org/v0.js\"></script>",
                "<link rel=\"stylesheet\" href=\"https://cdn.ampproject.org/v0.css?f=1\">",
                "</head></html>"
            ),
            Some("/amp/"),
        );
        assert!(out.contains("src=\"/amp/v0.js\""));
        assert!(out.contains("href=\"/amp/v0.css?f=1\""));
    }

    #[test]
    fn test_leaves_foreign_origins() {
        let input = concat!(
            "<html><head>",
            "<link rel=\"stylesheet\" href=\"https://fonts.example.com/a.css\">",
            "<script src=\"/local.js\"></script>",
            "</head></html>"
        );
        assert_eq!(run(input, Some("https://mirror.example.com")), input);
    }

    #[test]
    fn test_noop_without_prefix() {
        let input = "<html><head><script src=\"https://cdn.ampproject.org/v0.js\"></script></head></html>";
        assert_eq!(run(input, None), input);
    }
}
