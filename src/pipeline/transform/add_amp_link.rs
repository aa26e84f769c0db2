//! `<link rel="amphtml">` injection.
//!
//! Points the rendered document at the untouched AMP document written next
//! to it, so that crawlers can still discover the valid AMP version.

use anyhow::Result;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

use super::{TransformParams, Transformer, html_element};
use crate::dom::DocumentTree;

/// Characters escaped in the `href` (the path may contain spaces etc.).
const HREF_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'{')
    .add(b'}');

pub struct AddAmpLink;

impl Transformer for AddAmpLink {
    fn name(&self) -> &str {
        "AddAmpLink"
    }

    fn transform(&self, tree: &mut DocumentTree, params: &TransformParams) -> Result<()> {
        let Some(amp_url) = params.amp_url.as_deref() else {
            return Ok(());
        };
        let Some(html) = html_element(tree) else {
            return Ok(());
        };
        let Some(head) = tree.first_child_by_tag(html, "head") else {
            return Ok(());
        };

        let exists = tree.children(head).iter().any(|&child| {
            tree.is_element(child, "link")
                && tree
                    .attr(child, "rel")
                    .is_some_and(|rel| rel.eq_ignore_ascii_case("amphtml"))
        });
        if exists {
            return Ok(());
        }

        let href = utf8_percent_encode(amp_url, HREF_ENCODE_SET).to_string();
        let link = tree.create_element("link", [("rel", "amphtml"), ("href", href.as_str())]);
        tree.append_child(head, link)?;
        Ok(())
    }
}
