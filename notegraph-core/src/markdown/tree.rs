//! Owned document tree folded from the pulldown-cmark event stream.

use pulldown_cmark::{CowStr, Event, HeadingLevel, LinkType, Tag};
use std::ops::Range;

/// How a heading was written in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingStyle {
    /// `# Title`
    Atx,
    /// `Title` followed by a `===` or `---` underline.
    Setext,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Document,
    Heading {
        level: HeadingLevel,
        style: HeadingStyle,
        id: Option<String>,
        classes: Vec<String>,
        attrs: Vec<(String, Option<String>)>,
    },
    Link {
        link_type: LinkType,
        destination: String,
        title: String,
        id: String,
    },
    Image {
        link_type: LinkType,
        destination: String,
        title: String,
        id: String,
    },
    /// Any other container (paragraph, list, emphasis, code block, ...).
    Element(Tag<'static>),
    Text(String),
    Code(String),
    Html(String),
    InlineHtml(String),
    SoftBreak,
    HardBreak,
    Rule,
    /// `$$...$$`, payload kept verbatim.
    BlockMath(String),
    /// `$...$`, payload kept verbatim.
    InlineMath(String),
    /// Leaf events with no dedicated kind (footnote references, task markers).
    Leaf(Event<'static>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
        }
    }

    pub fn with_children(kind: NodeKind, children: Vec<Node>) -> Self {
        Self { kind, children }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(NodeKind::Text(text.into()))
    }

    pub fn is_setext_heading(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Heading {
                style: HeadingStyle::Setext,
                ..
            }
        )
    }

    /// Append a child, merging adjacent text runs.
    pub fn push(&mut self, child: Node) {
        if let NodeKind::Text(more) = &child.kind {
            if let Some(Node {
                kind: NodeKind::Text(text),
                ..
            }) = self.children.last_mut()
            {
                text.push_str(more);
                return;
            }
        }
        self.children.push(child);
    }

    /// Concatenated text content of this subtree.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match &self.kind {
            NodeKind::Text(text) | NodeKind::Code(text) => out.push_str(text),
            NodeKind::BlockMath(tex) => {
                out.push_str("$$");
                out.push_str(tex);
                out.push_str("$$");
            }
            NodeKind::InlineMath(tex) => {
                out.push('$');
                out.push_str(tex);
                out.push('$');
            }
            NodeKind::SoftBreak | NodeKind::HardBreak => out.push('\n'),
            _ => {}
        }
        for child in &self.children {
            child.collect_text(out);
        }
    }

    /// Copy of the document without front matter and thematic breaks.
    ///
    /// Only top-level children are filtered.
    pub fn without_front_matter(&self) -> Node {
        let children = self
            .children
            .iter()
            .filter(|child| !child.is_setext_heading() && child.kind != NodeKind::Rule)
            .cloned()
            .collect();
        Node::with_children(self.kind.clone(), children)
    }

    fn from_tag(tag: Tag<'static>, source: &str) -> Self {
        let kind = match tag {
            Tag::Heading {
                level,
                id,
                classes,
                attrs,
            } => NodeKind::Heading {
                level,
                style: heading_style(source),
                id: id.map(|s| s.to_string()),
                classes: classes.iter().map(|s| s.to_string()).collect(),
                attrs: attrs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.as_ref().map(|s| s.to_string())))
                    .collect(),
            },
            Tag::Link {
                link_type,
                dest_url,
                title,
                id,
            } => NodeKind::Link {
                link_type,
                destination: dest_url.to_string(),
                title: title.to_string(),
                id: id.to_string(),
            },
            Tag::Image {
                link_type,
                dest_url,
                title,
                id,
            } => NodeKind::Image {
                link_type,
                destination: dest_url.to_string(),
                title: title.to_string(),
                id: id.to_string(),
            },
            other => NodeKind::Element(other),
        };
        Node::new(kind)
    }

    fn from_leaf(event: Event<'static>) -> Self {
        let kind = match event {
            Event::Text(text) => NodeKind::Text(text.to_string()),
            Event::Code(code) => NodeKind::Code(code.to_string()),
            Event::Html(html) => NodeKind::Html(html.to_string()),
            Event::InlineHtml(html) => NodeKind::InlineHtml(html.to_string()),
            Event::SoftBreak => NodeKind::SoftBreak,
            Event::HardBreak => NodeKind::HardBreak,
            Event::Rule => NodeKind::Rule,
            other => NodeKind::Leaf(other),
        };
        Node::new(kind)
    }

    /// Tag this node opens when unfolded back into events, if any.
    pub(crate) fn tag(&self, destination: Option<&str>) -> Option<Tag<'static>> {
        let tag = match &self.kind {
            NodeKind::Heading {
                level,
                id,
                classes,
                attrs,
                ..
            } => Tag::Heading {
                level: *level,
                id: id.clone().map(CowStr::from),
                classes: classes.iter().cloned().map(CowStr::from).collect(),
                attrs: attrs
                    .iter()
                    .map(|(k, v)| (CowStr::from(k.clone()), v.clone().map(CowStr::from)))
                    .collect(),
            },
            NodeKind::Link {
                link_type,
                destination: original,
                title,
                id,
            } => Tag::Link {
                link_type: *link_type,
                dest_url: CowStr::from(destination.unwrap_or(original).to_string()),
                title: CowStr::from(title.clone()),
                id: CowStr::from(id.clone()),
            },
            NodeKind::Image {
                link_type,
                destination,
                title,
                id,
            } => Tag::Image {
                link_type: *link_type,
                dest_url: CowStr::from(destination.clone()),
                title: CowStr::from(title.clone()),
                id: CowStr::from(id.clone()),
            },
            NodeKind::Element(tag) => tag.clone(),
            _ => return None,
        };
        Some(tag)
    }
}

/// A heading whose last source line is an `=` or `-` underline is setext.
fn heading_style(source: &str) -> HeadingStyle {
    let underline = source.trim_end().lines().last().unwrap_or_default().trim();
    let is_underline = !underline.is_empty()
        && (underline.chars().all(|c| c == '=') || underline.chars().all(|c| c == '-'));
    if is_underline {
        HeadingStyle::Setext
    } else {
        HeadingStyle::Atx
    }
}

/// Fold an offset-annotated event stream into a tree rooted at a document node.
pub(crate) fn fold<'a, I>(source: &str, events: I) -> Node
where
    I: IntoIterator<Item = (Event<'a>, Range<usize>)>,
{
    let mut stack = vec![Node::new(NodeKind::Document)];

    for (event, range) in events {
        match event {
            Event::Start(tag) => {
                let span = source.get(range).unwrap_or_default();
                stack.push(Node::from_tag(tag.into_static(), span));
            }
            Event::End(_) => close(&mut stack),
            leaf => {
                if let Some(parent) = stack.last_mut() {
                    parent.push(Node::from_leaf(leaf.into_static()));
                }
            }
        }
    }

    while stack.len() > 1 {
        close(&mut stack);
    }
    stack
        .pop()
        .unwrap_or_else(|| Node::new(NodeKind::Document))
}

fn close(stack: &mut Vec<Node>) {
    if stack.len() < 2 {
        return;
    }
    if let Some(node) = stack.pop() {
        if let Some(parent) = stack.last_mut() {
            parent.children.push(node);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulldown_cmark::{Options, Parser};

    fn parse(source: &str) -> Node {
        fold(source, Parser::new_ext(source, Options::empty()).into_offset_iter())
    }

    #[test]
    fn test_heading_styles() {
        let doc = parse("# Atx\n\nSetext\n======\n");
        assert_eq!(doc.children.len(), 2);
        assert!(!doc.children[0].is_setext_heading());
        assert!(doc.children[1].is_setext_heading());
    }

    #[test]
    fn test_dash_underline_is_setext() {
        let doc = parse("title: Hello\n---\n");
        assert!(doc.children[0].is_setext_heading());
        assert_eq!(doc.children[0].plain_text(), "title: Hello");
    }

    #[test]
    fn test_setext_text_may_start_with_hash() {
        let doc = parse("\\#tag: x\n---\n\n# Atx ---\n\n#\n");
        assert!(doc.children[0].is_setext_heading());
        assert_eq!(doc.children[0].plain_text(), "#tag: x");
        assert!(!doc.children[1].is_setext_heading());
        assert!(!doc.children[2].is_setext_heading());
    }

    #[test]
    fn test_text_runs_are_merged() {
        // pulldown-cmark splits text around the escaped bracket.
        let doc = parse("a \\[b\\] c");
        let paragraph = &doc.children[0];
        assert_eq!(paragraph.children.len(), 1);
        assert_eq!(paragraph.children[0].kind, NodeKind::Text("a [b] c".into()));
    }

    #[test]
    fn test_link_node() {
        let doc = parse("see [other](other.md)");
        let paragraph = &doc.children[0];
        let link = &paragraph.children[1];
        match &link.kind {
            NodeKind::Link { destination, .. } => assert_eq!(destination, "other.md"),
            other => panic!("expected link, got {other:?}"),
        }
        assert_eq!(link.plain_text(), "other");
    }

    #[test]
    fn test_without_front_matter() {
        let doc = parse("title: x\n===\n\nbody\n\n***\n\n## kept\n");
        let body = doc.without_front_matter();
        assert_eq!(body.children.len(), 2);
        assert_eq!(body.children[0].plain_text(), "body");
        assert_eq!(body.children[1].plain_text(), "kept");
    }
}
