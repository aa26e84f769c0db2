//! HTML text -> `DocumentTree`, using `tl` as the tokenizer.
//!
//! `tl` tokenizes `<` everywhere, including inside `<script>` and `<style>`.
//! Before handing the input over, the bodies of raw-text elements are
//! replaced by index markers and put back verbatim while the tree is built.

use std::borrow::Cow;

use super::{DocumentTree, DomError, NodeId, NodeKind};
use crate::utils::html;

/// Delimits the index of a hidden raw-text body (a private use codepoint).
const HIDDEN_MARK: char = '\u{E000}';

impl DocumentTree {
    /// Parse a complete document.
    ///
    /// A leading `<!doctype ...>` is kept as a `Doctype` node, also when
    /// comments precede it. A byte order mark is dropped. Whitespace text is
    /// preserved so that rendering an untouched tree stays close to the
    /// input.
    pub fn parse(input: &str) -> Result<Self, DomError> {
        let input = input.strip_prefix('\u{FEFF}').unwrap_or(input);
        let (prolog, doctype, body) = split_doctype(input);
        let (source, hidden) = hide_raw_text(body);

        let dom = tl::parse(&source, tl::ParserOptions::default())
            .map_err(|e| DomError::Parse(format!("{e:?}")))?;

        let mut builder = Builder {
            tree: DocumentTree::new(),
            parser: dom.parser(),
            hidden: &hidden,
        };
        let root = builder.tree.root();

        for item in prolog {
            let node = match item {
                Prolog::Text(text) => builder.tree.create_raw_text(text),
                Prolog::Comment(text) => builder.tree.create_comment(text),
            };
            builder.tree.append_child(root, node)?;
        }
        if let Some(doctype) = doctype {
            let node = builder.tree.alloc(NodeKind::Doctype(doctype.to_string()));
            builder.tree.append_child(root, node)?;
        }

        for handle in dom.children() {
            builder.import(*handle, root)?;
        }

        Ok(builder.tree)
    }
}

// =============================================================================
// Tree Building
// =============================================================================

struct Builder<'p, 's, 'h> {
    tree: DocumentTree,
    parser: &'p tl::Parser<'s>,
    hidden: &'h [&'h str],
}

impl<'h> Builder<'_, '_, 'h> {
    /// Convert a tl node (and its subtree) and attach it under `parent`.
    fn import(&mut self, handle: tl::NodeHandle, parent: NodeId) -> Result<(), DomError> {
        let Some(node) = handle.get(self.parser) else {
            return Ok(());
        };

        let id = match node {
            tl::Node::Tag(tag) => {
                let tag_name = tag.name().as_utf8_str().to_ascii_lowercase();
                let mut attrs: Vec<(String, String)> = tag
                    .attributes()
                    .iter()
                    .map(|(key, value)| {
                        let key = key.to_ascii_lowercase();
                        let value = value
                            .map(|v| html::unescape(&v).into_owned())
                            .unwrap_or_default();
                        (key, value)
                    })
                    .collect();
                restore_source_order(&tag.raw().as_utf8_str(), &mut attrs);

                let parent = self.implied_parent(parent, &tag_name);
                let id = self.tree.create_element(&tag_name, attrs);
                self.tree.append_child(parent, id)?;

                for child in tag.children().top().iter() {
                    self.import(*child, id)?;
                }
                return Ok(());
            }
            tl::Node::Raw(bytes) => {
                let text = bytes.as_utf8_str();
                match self.hidden_body(parent, &text) {
                    Some(body) => self.tree.create_raw_text(body),
                    None => self.tree.create_raw_text(text.into_owned()),
                }
            }
            tl::Node::Comment(bytes) => {
                let text = bytes.as_utf8_str();
                let inner = text
                    .strip_prefix("<!--")
                    .map(|t| t.strip_suffix("-->").unwrap_or(t))
                    .unwrap_or(&text[..]);
                self.tree.create_comment(inner.to_string())
            }
        };

        self.tree.append_child(parent, id)
    }

    /// `<p>` and `<li>` close an open element of the same kind, so the new
    /// element becomes its sibling instead of its child.
    fn implied_parent(&self, parent: NodeId, tag: &str) -> NodeId {
        if matches!(tag, "p" | "li") && self.tree.tag(parent) == Some(tag) {
            self.tree.parent(parent).unwrap_or(parent)
        } else {
            parent
        }
    }

    /// The original body behind a marker, if `parent` is a raw-text element.
    fn hidden_body(&self, parent: NodeId, text: &str) -> Option<&'h str> {
        let tag = self.tree.tag(parent)?;
        if !is_raw_text_tag(tag) {
            return None;
        }
        let index: usize = text
            .strip_prefix(HIDDEN_MARK)?
            .strip_suffix(HIDDEN_MARK)?
            .parse()
            .ok()?;
        self.hidden.get(index).copied()
    }
}

fn is_raw_text_tag(tag: &str) -> bool {
    html::is_raw_text_element(tag) || html::is_escapable_raw_text_element(tag)
}

// =============================================================================
// Raw Text Protection
// =============================================================================

/// Replace the body of every `script`, `style`, `textarea` and `title`
/// with a marker, returning the rewritten source and the bodies in order.
///
/// A body runs up to the matching end tag (any case) or to the end of the
/// input. Comments are skipped, so a `<script>` inside one stays a comment.
fn hide_raw_text(input: &str) -> (Cow<'_, str>, Vec<&str>) {
    let mut bodies = Vec::new();
    let mut out = String::new();
    let mut copied = 0;
    let mut pos = 0;

    while let Some(offset) = input[pos..].find('<') {
        let lt = pos + offset;
        let rest = &input[lt..];

        if let Some(comment) = rest.strip_prefix("<!--") {
            pos = comment.find("-->").map_or(input.len(), |end| lt + 4 + end + 3);
            continue;
        }

        let name_len = rest[1..]
            .bytes()
            .take_while(|b| b.is_ascii_alphanumeric() || *b == b'-')
            .count();
        if name_len == 0 {
            pos = lt + 1;
            continue;
        }
        let name = rest[1..=name_len].to_ascii_lowercase();

        let open = start_tag(rest);
        if !open.ends_with('>') {
            break;
        }
        let body_start = lt + open.len();
        if !is_raw_text_tag(&name) || open.ends_with("/>") {
            pos = body_start;
            continue;
        }

        let body_end = find_end_tag(&input[body_start..], &name)
            .map_or(input.len(), |end| body_start + end);
        if body_end > body_start {
            out.push_str(&input[copied..body_start]);
            out.push(HIDDEN_MARK);
            out.push_str(&bodies.len().to_string());
            out.push(HIDDEN_MARK);
            bodies.push(&input[body_start..body_end]);
            copied = body_end;
        }
        pos = body_end;
    }

    if bodies.is_empty() {
        return (Cow::Borrowed(input), bodies);
    }
    out.push_str(&input[copied..]);
    (Cow::Owned(out), bodies)
}

/// Offset of `</name` (any case) followed by whitespace, `/` or `>`.
fn find_end_tag(haystack: &str, name: &str) -> Option<usize> {
    haystack.match_indices("</").map(|(i, _)| i).find(|&i| {
        let after = &haystack[i + 2..];
        after
            .get(..name.len())
            .is_some_and(|n| n.eq_ignore_ascii_case(name))
            && after[name.len()..]
                .bytes()
                .next()
                .is_some_and(|b| matches!(b, b'>' | b'/') || b.is_ascii_whitespace())
    })
}

// =============================================================================
// Attributes
// =============================================================================

/// Sort `attrs` by where each name appears in the start tag of `raw`.
///
/// tl keeps attributes in a map that loses insertion order once a tag has
/// more than a few of them.
fn restore_source_order(raw: &str, attrs: &mut [(String, String)]) {
    if attrs.len() < 2 {
        return;
    }
    let start_tag = start_tag(raw).to_ascii_lowercase();
    attrs.sort_by_key(|(name, _)| attr_position(&start_tag, name).unwrap_or(usize::MAX));
}

/// `raw` up to and including the first `>` outside a quoted value.
///
/// Only a quote right after `=` opens a value, so `<p title=it's>` ends at
/// its `>`.
fn start_tag(raw: &str) -> &str {
    let mut quote = None;
    let mut after_eq = false;
    for (i, c) in raw.char_indices() {
        match (quote, c) {
            (None, '"' | '\'') if after_eq => quote = Some(c),
            (Some(q), c) if c == q => quote = None,
            (None, '>') => return &raw[..=i],
            _ => {}
        }
        if quote.is_none() && !c.is_whitespace() {
            after_eq = c == '=';
        }
    }
    raw
}

/// Offset of attribute `name` in a lowercased start tag.
fn attr_position(start_tag: &str, name: &str) -> Option<usize> {
    let bytes = start_tag.as_bytes();
    start_tag
        .match_indices(name)
        .map(|(i, _)| i)
        .find(|&i| {
            let before = i.checked_sub(1).map(|j| bytes[j]);
            let after = bytes.get(i + name.len()).copied();
            before.is_some_and(|b| b.is_ascii_whitespace())
                && after.is_none_or(|b| matches!(b, b'=' | b'>' | b'/') || b.is_ascii_whitespace())
        })
}

// =============================================================================
// Doctype
// =============================================================================

/// Nodes in front of the doctype.
#[derive(Debug, PartialEq, Eq)]
enum Prolog<'a> {
    Text(&'a str),
    Comment(&'a str),
}

/// Split off the doctype declaration, returning the comments and
/// whitespace before it, its name part and the rest.
///
/// `<!-- c --><!DOCTYPE html>x` -> `([Comment(" c ")], Some("html"), "x")`
///
/// Without a doctype the input is returned untouched.
fn split_doctype(input: &str) -> (Vec<Prolog<'_>>, Option<&str>, &str) {
    const PREFIX: &str = "<!doctype";

    let mut prolog = Vec::new();
    let mut rest = input;
    loop {
        let trimmed = rest.trim_start();
        let space = &rest[..rest.len() - trimmed.len()];

        if let Some(comment) = trimmed.strip_prefix("<!--") {
            let Some(end) = comment.find("-->") else {
                break;
            };
            if !space.is_empty() {
                prolog.push(Prolog::Text(space));
            }
            prolog.push(Prolog::Comment(&comment[..end]));
            rest = &comment[end + 3..];
            continue;
        }

        let is_doctype = trimmed
            .get(..PREFIX.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(PREFIX));
        if is_doctype && let Some(end) = trimmed.find('>') {
            return (
                prolog,
                Some(trimmed[PREFIX.len()..end].trim()),
                &trimmed[end + 1..],
            );
        }
        break;
    }

    (Vec::new(), None, input)
}
