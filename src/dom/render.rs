//! `DocumentTree` -> HTML text.

use super::{DocumentTree, NodeId, NodeKind};
use crate::utils::html;

impl DocumentTree {
    /// Serialize the tree reachable from the root.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.nodes.len() * 16);
        self.render_into(self.root(), &mut out);
        out
    }

    /// Serialize a single subtree, `id` included.
    pub fn render_node(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.render_into(id, &mut out);
        out
    }

    fn render_into(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            NodeKind::Document => self.render_children(id, out),
            NodeKind::Doctype(name) => {
                out.push_str("<!doctype ");
                out.push_str(name);
                out.push('>');
            }
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            NodeKind::Element(elem) => {
                out.push('<');
                out.push_str(&elem.tag);
                for (name, value) in elem.attrs.iter() {
                    out.push(' ');
                    out.push_str(name);
                    if !value.is_empty() {
                        out.push_str("=\"");
                        out.push_str(&html::escape_attr(value));
                        out.push('"');
                    }
                }
                out.push('>');

                if html::is_void_element(&elem.tag) {
                    return;
                }

                self.render_children(id, out);
                out.push_str("</");
                out.push_str(&elem.tag);
                out.push('>');
            }
        }
    }

    fn render_children(&self, id: NodeId, out: &mut String) {
        for &child in self.children(id) {
            self.render_into(child, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Attrs;

    #[test]
    fn test_render_roundtrip_simple() {
        let input = "<!doctype html><html lang=\"en\"><head><meta charset=\"utf-8\"><title>A &amp; B</title></head><body><p>x</p></body></html>";
        let tree = DocumentTree::parse(input).unwrap();
        assert_eq!(tree.render(), input);
    }

    #[test]
    fn test_render_boolean_and_escaped_attrs() {
        let mut tree = DocumentTree::new();
        let html = tree.create_element("html", [("⚡", ""), ("data-x", "say \"hi\"")]);
        tree.append_child(tree.root(), html).unwrap();
        assert_eq!(
            tree.render(),
            "<html ⚡ data-x=\"say &quot;hi&quot;\"></html>"
        );
    }

    #[test]
    fn test_render_void_and_comment() {
        let mut tree = DocumentTree::new();
        let head = tree.create_element("head", Attrs::new());
        let link = tree.create_element("link", [("rel", "icon")]);
        let note = tree.create_comment(" note ");
        tree.append_child(tree.root(), head).unwrap();
        tree.append_child(head, link).unwrap();
        tree.append_child(head, note).unwrap();

        assert_eq!(tree.render(), "<head><link rel=\"icon\"><!-- note --></head>");
        assert_eq!(tree.render_node(link), "<link rel=\"icon\">");
    }

    #[test]
    fn test_detached_nodes_do_not_render() {
        let mut tree = DocumentTree::parse("<div><span>a</span><em>b</em></div>").unwrap();
        let span = tree.find_first("span").unwrap();
        tree.detach(span).unwrap();
        assert_eq!(tree.render(), "<div><em>b</em></div>");
    }
}
