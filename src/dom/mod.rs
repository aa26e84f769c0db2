//! Mutable in-memory document tree.
//!
//! # Architecture
//!
//! ```text
//! raw html --parse()--> DocumentTree --transformers--> DocumentTree --render()--> html
//!                       (arena of NodeData, root = NodeId(0))
//! ```
//!
//! Nodes live in an arena owned by the tree and are addressed by [`NodeId`].
//! Detached nodes stay in the arena but are unreachable from the root, so
//! they never render. A `NodeId` is only meaningful for the tree that
//! created it.
//!
//! Invariants kept by every mutation:
//! - exactly one root (the `Document` node), which never has a parent
//! - every attached non-root node has exactly one parent
//! - child order is document order, so tag lookups are order-stable

mod parse;
mod render;

use smallvec::SmallVec;
use thiserror::Error;

use crate::utils::html;

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum DomError {
    #[error("failed to parse document: {0}")]
    Parse(String),

    #[error("invalid tree operation: {0}")]
    InvalidOperation(String),
}

// =============================================================================
// Node Types
// =============================================================================

/// Handle to a node inside a [`DocumentTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Ordered attribute list. Valueless attributes hold an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attrs(SmallVec<[(String, String); 4]>);

impl Attrs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Set an attribute, replacing an existing value in place.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(&name)) {
            Some(slot) => slot.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let pos = self.0.iter().position(|(k, _)| k.eq_ignore_ascii_case(name))?;
        Some(self.0.remove(pos).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl IntoIterator for Attrs {
    type Item = (String, String);
    type IntoIter = smallvec::IntoIter<[(String, String); 4]>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attrs {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attrs = Self::new();
        for (k, v) in iter {
            attrs.set(k, v);
        }
        attrs
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Lowercased tag name.
    pub tag: String,
    pub attrs: Attrs,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Doctype(String),
    Element(Element),
    /// Markup kept as written: entities stay encoded, never re-escaped.
    Text(String),
    Comment(String),
}

impl NodeKind {
    fn can_have_children(&self) -> bool {
        matches!(self, NodeKind::Document | NodeKind::Element(_))
    }
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: SmallVec<[NodeId; 4]>,
}

// =============================================================================
// DocumentTree
// =============================================================================

/// One parsed document.
#[derive(Debug, Clone)]
pub struct DocumentTree {
    nodes: Vec<NodeData>,
}

impl Default for DocumentTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentTree {
    const ROOT: NodeId = NodeId(0);

    /// Create an empty document (root only).
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeData {
                kind: NodeKind::Document,
                parent: None,
                children: SmallVec::new(),
            }],
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        Self::ROOT
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: SmallVec::new(),
        });
        id
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes[id.0].kind {
            NodeKind::Element(elem) => Some(elem),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[id.0].kind {
            NodeKind::Element(elem) => Some(elem),
            _ => None,
        }
    }

    /// Tag name of an element node, `None` for any other kind.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.tag.as_str())
    }

    pub fn is_element(&self, id: NodeId, tag: &str) -> bool {
        self.tag(id).is_some_and(|t| t.eq_ignore_ascii_case(tag))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// First direct child element of `parent` named `tag`, in document order.
    pub fn first_child_by_tag(&self, parent: NodeId, tag: &str) -> Option<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|&child| self.is_element(child, tag))
    }

    /// Pre-order walk below `id` (excluding `id` itself).
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let mut stack: Vec<NodeId> = self.children(id).to_vec();
        stack.reverse();
        Descendants { tree: self, stack }
    }

    /// First element named `tag` anywhere in the document, in document order.
    pub fn find_first(&self, tag: &str) -> Option<NodeId> {
        self.descendants(self.root()).find(|&id| self.is_element(id, tag))
    }

    /// Shorthand for `<html>` then `<head>` lookups via `first_child_by_tag`.
    pub fn head(&self) -> Option<NodeId> {
        let html = self.first_child_by_tag(self.root(), "html")?;
        self.first_child_by_tag(html, "head")
    }

    pub fn body(&self) -> Option<NodeId> {
        let html = self.first_child_by_tag(self.root(), "html")?;
        self.first_child_by_tag(html, "body")
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.attrs.get(name)
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    /// Concatenated text below `id`, as written in the source.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for node in self.descendants(id) {
            if let NodeKind::Text(text) = self.kind(node) {
                out.push_str(text);
            }
        }
        out
    }

    fn is_ancestor_or_self(&self, candidate: NodeId, of: NodeId) -> bool {
        let mut current = Some(of);
        while let Some(id) = current {
            if id == candidate {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    /// Create an unattached element.
    pub fn create_element<I, K, V>(&mut self, tag: &str, attrs: I) -> NodeId
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.alloc(NodeKind::Element(Element {
            tag: tag.to_ascii_lowercase(),
            attrs: attrs.into_iter().collect(),
        }))
    }

    /// Create an unattached text node; `text` is escaped.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(NodeKind::Text(html::escape(text).into_owned()))
    }

    /// Create an unattached text node holding markup verbatim.
    pub fn create_raw_text(&mut self, markup: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::Text(markup.into()))
    }

    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::Comment(text.into()))
    }

    // -------------------------------------------------------------------------
    // Mutation
    // -------------------------------------------------------------------------

    /// Attach an unattached node as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, node: NodeId) -> Result<(), DomError> {
        let index = self.children(parent).len();
        self.insert_child(parent, index, node)
    }

    /// Attach an unattached node at `index` among the children of `parent`.
    ///
    /// `index` is clamped to the child count.
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        index: usize,
        node: NodeId,
    ) -> Result<(), DomError> {
        if node == self.root() {
            return Err(DomError::InvalidOperation(
                "the document root cannot be attached".into(),
            ));
        }
        if let Some(current) = self.parent(node) {
            return Err(DomError::InvalidOperation(format!(
                "node {:?} already has parent {:?}",
                node, current
            )));
        }
        if !self.kind(parent).can_have_children() {
            return Err(DomError::InvalidOperation(format!(
                "node {:?} cannot hold children",
                parent
            )));
        }
        if self.is_ancestor_or_self(node, parent) {
            return Err(DomError::InvalidOperation(format!(
                "attaching {:?} under {:?} would create a cycle",
                node, parent
            )));
        }

        let children = &mut self.nodes[parent.0].children;
        let index = index.min(children.len());
        children.insert(index, node);
        self.nodes[node.0].parent = Some(parent);
        Ok(())
    }

    /// Detach a node from its parent. Detaching an unattached node is a no-op.
    pub fn detach(&mut self, node: NodeId) -> Result<(), DomError> {
        if node == self.root() {
            return Err(DomError::InvalidOperation(
                "the document root cannot be detached".into(),
            ));
        }
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|child| *child != node);
        }
        Ok(())
    }

    /// Detach every child of `parent` and return them in order.
    pub fn take_children(&mut self, parent: NodeId) -> Vec<NodeId> {
        let children = std::mem::take(&mut self.nodes[parent.0].children);
        for child in &children {
            self.nodes[child.0].parent = None;
        }
        children.into_vec()
    }

    /// Set an attribute on an element. Returns `false` for non-element nodes.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) -> bool {
        match self.element_mut(id) {
            Some(elem) => {
                elem.attrs.set(name, value);
                true
            }
            None => false,
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> Option<String> {
        self.element_mut(id)?.attrs.remove(name)
    }

    // -------------------------------------------------------------------------
    // Comparison
    // -------------------------------------------------------------------------

    /// Compare two trees ignoring whitespace-only text and attribute order.
    pub fn same_structure(&self, other: &DocumentTree) -> bool {
        self.same_node(self.root(), other, other.root())
    }

    fn same_node(&self, a: NodeId, other: &DocumentTree, b: NodeId) -> bool {
        let kinds_match = match (self.kind(a), other.kind(b)) {
            (NodeKind::Element(x), NodeKind::Element(y)) => {
                x.tag == y.tag
                    && x.attrs.len() == y.attrs.len()
                    && x.attrs.iter().all(|(k, v)| y.attrs.get(k) == Some(v))
            }
            (NodeKind::Text(x), NodeKind::Text(y)) => x.trim() == y.trim(),
            (x, y) => x == y,
        };
        if !kinds_match {
            return false;
        }

        let significant = |tree: &DocumentTree, id: NodeId| -> Vec<NodeId> {
            tree.children(id)
                .iter()
                .copied()
                .filter(|&c| !matches!(tree.kind(c), NodeKind::Text(t) if t.trim().is_empty()))
                .collect()
        };
        let left = significant(self, a);
        let right = significant(other, b);

        left.len() == right.len()
            && left
                .iter()
                .zip(&right)
                .all(|(&x, &y)| self.same_node(x, other, y))
    }
}

/// Iterator returned by [`DocumentTree::descendants`].
pub struct Descendants<'a> {
    tree: &'a DocumentTree,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack.extend(self.tree.children(id).iter().rev().copied());
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skeleton() -> (DocumentTree, NodeId, NodeId, NodeId) {
        let mut tree = DocumentTree::new();
        let html = tree.create_element("html", [("lang", "en")]);
        let head = tree.create_element("head", Attrs::new());
        let body = tree.create_element("body", Attrs::new());
        tree.append_child(tree.root(), html).unwrap();
        tree.append_child(html, head).unwrap();
        tree.append_child(html, body).unwrap();
        (tree, html, head, body)
    }

    #[test]
    fn test_first_child_by_tag_is_direct_and_ordered() {
        let (mut tree, html, head, _) = skeleton();
        let first = tree.create_element("meta", [("name", "a")]);
        let second = tree.create_element("meta", [("name", "b")]);
        tree.append_child(head, first).unwrap();
        tree.append_child(head, second).unwrap();

        assert_eq!(tree.first_child_by_tag(tree.root(), "html"), Some(html));
        assert_eq!(tree.first_child_by_tag(head, "meta"), Some(first));
        assert_eq!(tree.first_child_by_tag(head, "META"), Some(first));
        // meta is a grandchild of html, not a direct child
        assert_eq!(tree.first_child_by_tag(html, "meta"), None);
    }

    #[test]
    fn test_create_element_is_unattached() {
        let (mut tree, _, head, _) = skeleton();
        let before = tree.render();
        let meta = tree.create_element("meta", [("charset", "utf-8")]);

        assert_eq!(tree.parent(meta), None);
        assert_eq!(tree.render(), before);

        tree.append_child(head, meta).unwrap();
        assert_eq!(tree.parent(meta), Some(head));
        assert_eq!(tree.children(head), &[meta]);
    }

    #[test]
    fn test_append_attached_node_fails() {
        let (mut tree, html, head, body) = skeleton();
        let err = tree.append_child(body, head).unwrap_err();
        assert!(matches!(err, DomError::InvalidOperation(_)));
        // Tree unchanged
        assert_eq!(tree.children(html), &[head, body]);
    }

    #[test]
    fn test_append_rejects_cycles_and_leaf_parents() {
        let (mut tree, _, head, _) = skeleton();
        let div = tree.create_element("div", Attrs::new());
        let text = tree.create_text("hello");

        assert!(tree.append_child(div, div).is_err());
        assert!(tree.append_child(text, div).is_err());
        assert!(tree.append_child(head, tree.root()).is_err());
    }

    #[test]
    fn test_detach_and_reinsert() {
        let (mut tree, html, head, body) = skeleton();
        tree.detach(body).unwrap();
        assert_eq!(tree.children(html), &[head]);
        assert_eq!(tree.parent(body), None);

        tree.insert_child(html, 0, body).unwrap();
        assert_eq!(tree.children(html), &[body, head]);
        assert!(tree.detach(tree.root()).is_err());
    }

    #[test]
    fn test_find_first_in_document_order() {
        let (mut tree, _, head, body) = skeleton();
        let late = tree.create_element("script", [("id", "late")]);
        let early = tree.create_element("script", [("id", "early")]);
        tree.append_child(body, late).unwrap();
        tree.append_child(head, early).unwrap();

        assert_eq!(tree.find_first("script"), Some(early));
        assert_eq!(tree.head(), Some(head));
        assert_eq!(tree.body(), Some(body));
    }

    #[test]
    fn test_attrs_roundtrip() {
        let (mut tree, html, _, _) = skeleton();
        assert_eq!(tree.attr(html, "lang"), Some("en"));
        assert!(tree.set_attr(html, "lang", "de"));
        assert_eq!(tree.attr(html, "LANG"), Some("de"));
        assert_eq!(tree.remove_attr(html, "lang"), Some("de".to_string()));
        assert!(!tree.has_attr(html, "lang"));

        let text = tree.create_text("x");
        assert!(!tree.set_attr(text, "lang", "en"));
    }

    #[test]
    fn test_create_text_escapes() {
        let (mut tree, _, _, body) = skeleton();
        let text = tree.create_text("a < b");
        tree.append_child(body, text).unwrap();
        assert_eq!(tree.text_content(body), "a &lt; b");
    }
}
