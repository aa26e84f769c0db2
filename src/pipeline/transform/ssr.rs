//! Server-side rendering of AMP layouts.
//!
//! For every `amp-*` element the layout the runtime would compute is
//! applied statically:
//!
//! - `i-amphtml-layout="<layout>"` attribute
//! - `i-amphtml-layout-<layout>` class, plus `i-amphtml-layout-size-defined`
//!   for layouts with a known size
//! - inline sizing (`width`/`height` style, or an `<i-amphtml-sizer>` child
//!   for ratio-based layouts)
//!
//! When every element could be laid out and no render-delaying extension is
//! present, `<html>` is marked with `i-amphtml-layout` and
//! `i-amphtml-no-boilerplate`, and the boilerplate `<style>`/`<noscript>`
//! are removed from `<head>`.

use anyhow::Result;

use super::{TransformParams, Transformer, html_element, is_render_delaying};
use crate::dom::{DocumentTree, NodeId};

/// Units accepted in `width` / `height`.
const LENGTH_UNITS: [&str; 8] = ["px", "em", "rem", "vh", "vw", "vmin", "vmax", ""];

pub struct ServerSideRendering;

impl Transformer for ServerSideRendering {
    fn name(&self) -> &str {
        "ServerSideRendering"
    }

    fn transform(&self, tree: &mut DocumentTree, _params: &TransformParams) -> Result<()> {
        let Some(html) = html_element(tree) else {
            return Ok(());
        };
        if tree.has_attr(html, "i-amphtml-layout") {
            // Already rendered
            return Ok(());
        }

        let amp_elements: Vec<NodeId> = tree
            .descendants(html)
            .filter(|&id| tree.tag(id).is_some_and(|tag| tag.starts_with("amp-")))
            .collect();

        let mut all_applied = true;
        for id in amp_elements {
            all_applied &= apply_layout(tree, id)?;
        }

        let head = tree.first_child_by_tag(html, "head");
        let delayed = head.is_some_and(|head| has_render_delaying_extension(tree, head));
        if !all_applied || delayed {
            return Ok(());
        }

        tree.set_attr(html, "i-amphtml-layout", "");
        tree.set_attr(html, "i-amphtml-no-boilerplate", "");
        if let Some(head) = head {
            remove_boilerplate(tree, head)?;
        }
        Ok(())
    }
}

// =============================================================================
// Layout
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    Nodisplay,
    Fixed,
    FixedHeight,
    Responsive,
    Container,
    Fill,
    FlexItem,
    Fluid,
    Intrinsic,
}

impl Layout {
    fn parse(s: &str) -> Option<Self> {
        Some(match s.trim().to_ascii_lowercase().as_str() {
            "nodisplay" => Self::Nodisplay,
            "fixed" => Self::Fixed,
            "fixed-height" => Self::FixedHeight,
            "responsive" => Self::Responsive,
            "container" => Self::Container,
            "fill" => Self::Fill,
            "flex-item" => Self::FlexItem,
            "fluid" => Self::Fluid,
            "intrinsic" => Self::Intrinsic,
            _ => return None,
        })
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Nodisplay => "nodisplay",
            Self::Fixed => "fixed",
            Self::FixedHeight => "fixed-height",
            Self::Responsive => "responsive",
            Self::Container => "container",
            Self::Fill => "fill",
            Self::FlexItem => "flex-item",
            Self::Fluid => "fluid",
            Self::Intrinsic => "intrinsic",
        }
    }

    fn is_size_defined(self) -> bool {
        matches!(
            self,
            Self::Fixed
                | Self::FixedHeight
                | Self::Responsive
                | Self::Fill
                | Self::FlexItem
                | Self::Intrinsic
        )
    }
}

/// A CSS length such as `300`, `300px` or `2.5rem`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Length<'a> {
    value: f64,
    unit: &'a str,
}

impl<'a> Length<'a> {
    fn parse(s: &'a str) -> Option<Self> {
        let s = s.trim();
        let split = s
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(s.len());
        let value: f64 = s[..split].parse().ok()?;
        let unit = &s[split..];
        LENGTH_UNITS
            .contains(&unit)
            .then_some(Self { value, unit })
    }

    fn css(self) -> String {
        let unit = if self.unit.is_empty() { "px" } else { self.unit };
        format!("{}{}", self.value, unit)
    }
}

/// Apply the computed layout to one element.
///
/// Returns `false` when the element's layout cannot be determined
/// statically; the element is then left untouched.
fn apply_layout(tree: &mut DocumentTree, id: NodeId) -> Result<bool> {
    let layout_attr = tree.attr(id, "layout").map(str::to_string);
    let width_attr = tree.attr(id, "width").map(str::to_string);
    let height_attr = tree.attr(id, "height").map(str::to_string);
    let has_sizes = tree.has_attr(id, "sizes") || tree.has_attr(id, "heights");

    let width = match width_attr.as_deref() {
        Some("auto") | None => None,
        Some(w) => match Length::parse(w) {
            Some(len) => Some(len),
            None => return Ok(false),
        },
    };
    let height = match height_attr.as_deref() {
        None => None,
        Some(h) => match Length::parse(h) {
            Some(len) => Some(len),
            None => return Ok(false),
        },
    };

    let layout = match layout_attr.as_deref() {
        Some(value) => match Layout::parse(value) {
            Some(layout) => layout,
            None => return Ok(false),
        },
        None => match (width, height) {
            (None, None) if width_attr.is_none() => Layout::Container,
            (_, Some(_)) if width.is_none() => Layout::FixedHeight,
            (Some(_), Some(_)) if has_sizes => Layout::Responsive,
            (Some(_), Some(_)) => Layout::Fixed,
            _ => return Ok(false),
        },
    };

    let mut style = None;
    let mut sizer_padding = None;
    match layout {
        Layout::Fixed => {
            let (Some(w), Some(h)) = (width, height) else {
                return Ok(false);
            };
            style = Some(format!("width:{};height:{};", w.css(), h.css()));
        }
        Layout::FixedHeight => {
            let Some(h) = height else {
                return Ok(false);
            };
            style = Some(format!("height:{};", h.css()));
        }
        Layout::Responsive | Layout::Intrinsic => {
            let (Some(w), Some(h)) = (width, height) else {
                return Ok(false);
            };
            if w.unit != h.unit || w.value <= 0.0 {
                return Ok(false);
            }
            sizer_padding = Some(h.value / w.value * 100.0);
        }
        _ => {}
    }

    let mut classes: Vec<String> = tree
        .attr(id, "class")
        .map(|c| c.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default();
    classes.push(format!("i-amphtml-layout-{}", layout.as_str()));
    if layout.is_size_defined() {
        classes.push("i-amphtml-layout-size-defined".to_string());
    }
    tree.set_attr(id, "class", classes.join(" "));
    tree.set_attr(id, "i-amphtml-layout", layout.as_str());

    if let Some(style) = style {
        let merged = match tree.attr(id, "style") {
            Some(existing) if !existing.trim().is_empty() => {
                format!("{};{}", existing.trim().trim_end_matches(';'), style)
            }
            _ => style,
        };
        tree.set_attr(id, "style", merged);
    }

    if layout == Layout::Nodisplay {
        tree.set_attr(id, "hidden", "");
    }

    if let Some(padding) = sizer_padding {
        let style = format!("display:block;padding-top:{padding:.4}%;");
        let sizer = tree.create_element("i-amphtml-sizer", [("style", style.as_str())]);
        tree.insert_child(id, 0, sizer)?;
    }

    Ok(true)
}

// =============================================================================
// Boilerplate
// =============================================================================

fn has_render_delaying_extension(tree: &DocumentTree, head: NodeId) -> bool {
    tree.children(head).iter().any(|&child| {
        tree.is_element(child, "script")
            && tree
                .attr(child, "custom-element")
                .is_some_and(is_render_delaying)
    })
}

/// Remove `<style amp-boilerplate>` and the `<noscript>` wrapping its
/// fallback copy.
fn remove_boilerplate(tree: &mut DocumentTree, head: NodeId) -> Result<()> {
    let doomed: Vec<NodeId> = tree
        .children(head)
        .iter()
        .copied()
        .filter(|&child| {
            let is_style = tree.is_element(child, "style") && tree.has_attr(child, "amp-boilerplate");
            let is_noscript = tree.is_element(child, "noscript")
                && tree.descendants(child).any(|inner| {
                    (tree.is_element(inner, "style") && tree.has_attr(inner, "amp-boilerplate"))
                        || tree.text_content(inner).contains("amp-boilerplate")
                });
            is_style || is_noscript
        })
        .collect();

    for node in doomed {
        tree.detach(node)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOILERPLATE: &str = "<style amp-boilerplate>body{visibility:hidden}</style><noscript><style amp-boilerplate>body{visibility:visible}</style></noscript>";

    fn run(input: &str) -> DocumentTree {
        let mut tree = DocumentTree::parse(input).unwrap();
        ServerSideRendering
            .transform(&mut tree, &TransformParams::default())
            .unwrap();
        tree
    }

    fn page(head: &str, body: &str) -> String {
        format!("<html amp><head>{head}</head><body>{body}</body></html>")
    }

    #[test]
    fn test_fixed_layout() {
        let tree = run(&page("", "<amp-img width=\"300\" height=\"200\" src=\"a.png\"></amp-img>"));
        let img = tree.find_first("amp-img").unwrap();
        assert_eq!(tree.attr(img, "i-amphtml-layout"), Some("fixed"));
        assert_eq!(tree.attr(img, "style"), Some("width:300px;height:200px;"));
        assert_eq!(
            tree.attr(img, "class"),
            Some("i-amphtml-layout-fixed i-amphtml-layout-size-defined")
        );
    }

    #[test]
    fn test_responsive_layout_inserts_sizer() {
        let tree = run(&page(
            "",
            "<amp-img layout=\"responsive\" width=\"400\" height=\"300\" class=\"hero\"></amp-img>",
        ));
        let img = tree.find_first("amp-img").unwrap();
        assert_eq!(tree.attr(img, "i-amphtml-layout"), Some("responsive"));
        assert!(tree.attr(img, "class").unwrap().starts_with("hero "));

        let sizer = tree.children(img)[0];
        assert_eq!(tree.tag(sizer), Some("i-amphtml-sizer"));
        assert_eq!(
            tree.attr(sizer, "style"),
            Some("display:block;padding-top:75.0000%;")
        );
    }

    #[test]
    fn test_inferred_layouts() {
        let tree = run(&page(
            "",
            "<amp-accordion></amp-accordion><amp-ad height=\"50\"></amp-ad>",
        ));
        let accordion = tree.find_first("amp-accordion").unwrap();
        let ad = tree.find_first("amp-ad").unwrap();
        assert_eq!(tree.attr(accordion, "i-amphtml-layout"), Some("container"));
        assert_eq!(tree.attr(ad, "i-amphtml-layout"), Some("fixed-height"));
        assert_eq!(tree.attr(ad, "style"), Some("height:50px;"));
    }

    #[test]
    fn test_removes_boilerplate_when_all_layouts_apply() {
        let tree = run(&page(BOILERPLATE, "<amp-img width=\"1\" height=\"1\"></amp-img>"));
        let html = tree.find_first("html").unwrap();
        assert!(tree.has_attr(html, "i-amphtml-no-boilerplate"));
        assert!(tree.has_attr(html, "i-amphtml-layout"));

        let rendered = tree.render();
        assert!(!rendered.contains("amp-boilerplate"));
        assert!(!rendered.contains("noscript"));
    }

    #[test]
    fn test_keeps_boilerplate_on_unknown_layout() {
        let tree = run(&page(BOILERPLATE, "<amp-img layout=\"bogus\"></amp-img>"));
        let html = tree.find_first("html").unwrap();
        assert!(!tree.has_attr(html, "i-amphtml-no-boilerplate"));
        assert!(tree.render().contains("amp-boilerplate"));
    }

    #[test]
    fn test_keeps_boilerplate_for_render_delaying_extension() {
        let head = format!(
            "<script async custom-element=\"amp-story\" src=\"https://cdn.ampproject.org/v0/amp-story-1.0.js\"></script>{BOILERPLATE}"
        );
        let tree = run(&page(&head, ""));
        assert!(tree.render().contains("amp-boilerplate"));
    }

    #[test]
    fn test_noop_without_html() {
        let input = "<amp-img width=\"1\" height=\"1\"></amp-img>";
        let tree = run(input);
        assert_eq!(tree.render(), input);
    }

    #[test]
    fn test_length_parse() {
        assert_eq!(Length::parse("300").unwrap().css(), "300px");
        assert_eq!(Length::parse("2.5rem").unwrap().css(), "2.5rem");
        assert!(Length::parse("10%").is_none());
        assert!(Length::parse("wide").is_none());
    }
}
