//! HTML document model
//!
//! Reference pages are parsed with tree-sitter and copied into a small owned
//! arena so that the extractor can walk siblings, ask for ancestors and pull
//! plain text without holding on to the parse tree.

mod entities;

pub use entities::decode_entities;

use crate::error::{MedfinderError, Result};
use tree_sitter::{Node as TsNode, Parser};

/// Tags that separate words when their text is flattened
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "caption", "dd", "details", "div", "dl",
    "dt", "figcaption", "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr",
    "li", "main", "nav", "ol", "p", "pre", "section", "summary", "table", "tbody", "td", "tfoot",
    "th", "thead", "tr", "ul",
];

/// Pending tree-sitter children of one node being copied into the arena
struct Frame<'t> {
    pending: std::vec::IntoIter<TsNode<'t>>,
    parent: NodeId,
    prev_end: Option<usize>,
}

impl<'t> Frame<'t> {
    fn new(ts: TsNode<'t>, parent: NodeId) -> Self {
        let mut cursor = ts.walk();
        let pending: Vec<TsNode<'t>> = ts.children(&mut cursor).collect();
        Self {
            pending: pending.into_iter(),
            parent,
            prev_end: None,
        }
    }
}

/// Handle to a node inside an [`HtmlDocument`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
enum NodeKind {
    Document,
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Parsed HTML document
#[derive(Debug, Clone)]
pub struct HtmlDocument {
    nodes: Vec<NodeData>,
}

impl HtmlDocument {
    /// Parse raw HTML. Malformed markup is tolerated; only a parser failure errors.
    pub fn parse(source: &str) -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_html::LANGUAGE.into())
            .map_err(|e| MedfinderError::Parse(e.to_string()))?;
        let tree = parser
            .parse(source, None)
            .ok_or_else(|| MedfinderError::Parse("Failed to parse document".to_string()))?;

        let mut doc = Self {
            nodes: vec![NodeData {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
        };
        doc.copy_children(tree.root_node(), source.as_bytes(), doc.root());
        Ok(doc)
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn push(&mut self, kind: NodeKind, parent: NodeId) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Copy the tree-sitter tree into the arena without recursing, so nesting depth
    /// is bounded by the heap rather than the call stack
    fn copy_children(&mut self, ts: TsNode<'_>, src: &[u8], parent: NodeId) {
        let mut stack = vec![Frame::new(ts, parent)];

        while let Some(top) = stack.last_mut() {
            let Some(child) = top.pending.next() else {
                stack.pop();
                continue;
            };
            let parent = top.parent;
            let kind = child.kind();
            if matches!(kind, "start_tag" | "end_tag" | "self_closing_tag") {
                top.prev_end = Some(child.end_byte());
                continue;
            }

            // whitespace between siblings is an extra in the grammar, keep it as a separator
            let gap = top.prev_end.is_some_and(|end| {
                src[end.min(child.start_byte())..child.start_byte()]
                    .iter()
                    .any(|b| b.is_ascii_whitespace())
            });
            top.prev_end = Some(child.end_byte());
            if gap {
                self.push(NodeKind::Text(" ".to_string()), parent);
            }

            match kind {
                "element" | "script_element" | "style_element" => {
                    let (tag, attrs) = read_tag(child, src);
                    let id = self.push(NodeKind::Element { tag, attrs }, parent);
                    if kind == "element" {
                        stack.push(Frame::new(child, id));
                    }
                }
                "text" | "entity" => {
                    let raw = node_text(child, src);
                    self.push(NodeKind::Text(decode_entities(raw)), parent);
                }
                "doctype" | "comment" | "erroneous_end_tag" => {}
                _ => {
                    if child.child_count() > 0 {
                        stack.push(Frame::new(child, parent));
                    }
                }
            }
        }
    }

    /// Lowercased tag name, `None` for text and the document node
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Element { tag, .. } => Some(tag.as_str()),
            _ => None,
        }
    }

    /// Attribute value by (case-insensitive) name
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Element { attrs, .. } => attrs
                .iter()
                .find(|(n, _)| n.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Heading level for `h1`..`h6`
    pub fn heading_level(&self, id: NodeId) -> Option<u8> {
        let tag = self.tag(id)?;
        let bytes = tag.as_bytes();
        if bytes.len() == 2 && bytes[0] == b'h' && (b'1'..=b'6').contains(&bytes[1]) {
            Some(bytes[1] - b'0')
        } else {
            None
        }
    }

    /// Every node below `id` in document order (excluding `id`)
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Elements with the given tag, in document order
    pub fn elements_by_tag(&self, tag: &str) -> Vec<NodeId> {
        self.select(&[tag])
    }

    /// Elements matching any of `tags`, in document order
    pub fn select(&self, tags: &[&str]) -> Vec<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .filter(|id| self.tag(*id).is_some_and(|t| tags.contains(&t)))
            .collect()
    }

    /// Headings `h1`..`h6` in document order
    pub fn headings(&self) -> Vec<NodeId> {
        self.select(&["h1", "h2", "h3", "h4", "h5", "h6"])
    }

    /// Direct element children with the given tag
    pub fn child_elements(&self, id: NodeId, tag: &str) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|c| self.tag(*c) == Some(tag))
            .collect()
    }

    /// Siblings that follow `id` under the same parent
    pub fn following_siblings(&self, id: NodeId) -> &[NodeId] {
        match self.parent(id) {
            Some(parent) => {
                let siblings = self.children(parent);
                match siblings.iter().position(|s| *s == id) {
                    Some(pos) => &siblings[pos + 1..],
                    None => &[],
                }
            }
            None => &[],
        }
    }

    /// True when `id` or one of its ancestors satisfies `pred`
    pub fn has_ancestor_or_self(&self, id: NodeId, pred: impl Fn(NodeId) -> bool) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if pred(node) {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// Whitespace-normalized plain text of a node and everything under it
    pub fn text_content(&self, id: NodeId) -> String {
        let mut raw = String::new();
        self.collect_text(id, &mut raw);
        normalize_whitespace(&raw)
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        // `None` marks the separator that closes a block element
        let mut stack = vec![Some(id)];
        while let Some(step) = stack.pop() {
            let Some(id) = step else {
                out.push(' ');
                continue;
            };
            let node = &self.nodes[id.0];
            match &node.kind {
                NodeKind::Text(text) => out.push_str(text),
                NodeKind::Element { tag, .. } => {
                    if tag == "script" || tag == "style" {
                        continue;
                    }
                    if BLOCK_TAGS.contains(&tag.as_str()) {
                        out.push(' ');
                        stack.push(None);
                    }
                    stack.extend(node.children.iter().rev().map(|c| Some(*c)));
                }
                NodeKind::Document => {
                    stack.extend(node.children.iter().rev().map(|c| Some(*c)));
                }
            }
        }
    }

    /// Text of the first non-empty `<title>`
    pub fn title(&self) -> Option<String> {
        self.first_text_of("title")
    }

    /// Text of the first non-empty element with the given tag
    pub fn first_text_of(&self, tag: &str) -> Option<String> {
        self.elements_by_tag(tag)
            .into_iter()
            .map(|id| self.text_content(id))
            .find(|t| !t.is_empty())
    }

    /// `content` of `<meta name="...">`
    pub fn meta(&self, name: &str) -> Option<String> {
        self.elements_by_tag("meta")
            .into_iter()
            .filter(|id| {
                self.attr(*id, "name")
                    .is_some_and(|n| n.eq_ignore_ascii_case(name))
            })
            .filter_map(|id| self.attr(id, "content"))
            .map(|c| c.trim().to_string())
            .find(|c| !c.is_empty())
    }

    /// Plain text of `<body>`, or of the whole document when there is none
    pub fn body_text(&self) -> String {
        match self.elements_by_tag("body").first() {
            Some(body) => self.text_content(*body),
            None => self.text_content(self.root()),
        }
    }

    /// `href` targets of every anchor
    pub fn links(&self) -> Vec<String> {
        self.elements_by_tag("a")
            .into_iter()
            .filter_map(|id| self.attr(id, "href"))
            .map(|h| h.to_string())
            .collect()
    }
}

fn node_text<'a>(node: TsNode<'_>, src: &'a [u8]) -> &'a str {
    std::str::from_utf8(&src[node.start_byte()..node.end_byte()]).unwrap_or("")
}

fn read_tag(element: TsNode<'_>, src: &[u8]) -> (String, Vec<(String, String)>) {
    let mut tag = String::new();
    let mut attrs = Vec::new();
    let mut cursor = element.walk();

    let Some(start) = element
        .children(&mut cursor)
        .find(|c| matches!(c.kind(), "start_tag" | "self_closing_tag"))
    else {
        return (tag, attrs);
    };

    let mut cursor = start.walk();
    for part in start.children(&mut cursor) {
        match part.kind() {
            "tag_name" => tag = node_text(part, src).to_ascii_lowercase(),
            "attribute" => {
                let mut name = String::new();
                let mut value = String::new();
                let mut attr_cursor = part.walk();
                for piece in part.children(&mut attr_cursor) {
                    match piece.kind() {
                        "attribute_name" => name = node_text(piece, src).to_ascii_lowercase(),
                        "attribute_value" => value = decode_entities(node_text(piece, src)),
                        "quoted_attribute_value" => {
                            let raw = node_text(piece, src);
                            value = decode_entities(raw.trim_matches(|c| c == '"' || c == '\''));
                        }
                        _ => {}
                    }
                }
                if !name.is_empty() {
                    attrs.push((name, value));
                }
            }
            _ => {}
        }
    }
    (tag, attrs)
}

/// Collapse runs of whitespace into single spaces and trim
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>Phenylketonurie &Uuml;bersicht</title>
  <meta name="description" content="Grundlagen der PKU">
  <meta name="keywords" content="PKU, Phenylalanin">
  <style>body { color: red; }</style>
</head>
<body>
  <h1>Phenylketonurie</h1>
  <p>Die <b>Phenylketonurie</b> ist eine Aminos&auml;urest&ouml;rung.</p>
  <h2>Therapie</h2>
  <ul><li>Diät</li><li>BH4</li></ul>
  <script>var x = "<h1>nope</h1>";</script>
  <a href="teil2.html">Weiter</a>
</body>
</html>"#;

    #[test]
    fn test_title_and_meta() {
        let doc = HtmlDocument::parse(PAGE).unwrap();
        assert_eq!(doc.title().as_deref(), Some("Phenylketonurie Übersicht"));
        assert_eq!(doc.meta("description").as_deref(), Some("Grundlagen der PKU"));
        assert_eq!(doc.meta("KEYWORDS").as_deref(), Some("PKU, Phenylalanin"));
        assert_eq!(doc.meta("author"), None);
    }

    #[test]
    fn test_headings_in_order() {
        let doc = HtmlDocument::parse(PAGE).unwrap();
        let levels: Vec<u8> = doc
            .headings()
            .into_iter()
            .filter_map(|h| doc.heading_level(h))
            .collect();
        assert_eq!(levels, vec![1, 2]);
    }

    #[test]
    fn test_text_content_keeps_inline_words_apart() {
        let doc = HtmlDocument::parse(PAGE).unwrap();
        let p = doc.elements_by_tag("p")[0];
        assert_eq!(
            doc.text_content(p),
            "Die Phenylketonurie ist eine Aminosäurestörung."
        );
    }

    #[test]
    fn test_script_and_style_excluded() {
        let doc = HtmlDocument::parse(PAGE).unwrap();
        let body = doc.body_text();
        assert!(!body.contains("nope"));
        assert!(!body.contains("color"));
        assert!(body.contains("Diät BH4"));
    }

    #[test]
    fn test_following_siblings_and_links() {
        let doc = HtmlDocument::parse(PAGE).unwrap();
        let h2 = doc.elements_by_tag("h2")[0];
        let tags: Vec<&str> = doc
            .following_siblings(h2)
            .iter()
            .filter_map(|s| doc.tag(*s))
            .collect();
        assert_eq!(tags, vec!["ul", "script", "a"]);
        assert_eq!(doc.links(), vec!["teil2.html".to_string()]);
    }

    #[test]
    fn test_deeply_nested_markup() {
        let depth = 20_000;
        let html = format!(
            "<body>{}<p>Galaktosämie tief verschachtelt</p>{}</body>",
            "<div>".repeat(depth),
            "</div>".repeat(depth)
        );
        let doc = HtmlDocument::parse(&html).unwrap();
        assert!(doc.body_text().contains("Galaktosämie tief verschachtelt"));
        assert!(doc.elements_by_tag("div").len() > 1);
    }

    #[test]
    fn test_garbage_does_not_fail() {
        let doc = HtmlDocument::parse("<<<not html at all").unwrap();
        assert!(doc.title().is_none());
    }
}
