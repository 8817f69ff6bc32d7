//! Markdown processing with custom extensions.
//!
//! Parsing folds the pulldown-cmark event stream into an owned [`Node`]
//! tree and runs the registered extensions over its text. Rendering unfolds
//! the tree back into events for pulldown-cmark's HTML writer.

pub mod extension;
pub mod math;
pub mod tree;
pub mod visitor;

use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};
use std::collections::HashMap;

pub use extension::{ElementRenderer, Extension, InlineElement};
pub use math::math_extension;
pub use tree::{HeadingStyle, Node, NodeKind};
pub use visitor::Visitor;

/// Link destinations to replace at render time, keyed by the destination as
/// written in the source.
pub type LinkRewrites = HashMap<String, String>;

/// Markdown processor with custom extensions
pub struct MarkdownProcessor {
    options: Options,
    extensions: Vec<Extension>,
}

impl MarkdownProcessor {
    /// Processor with the math extension registered.
    pub fn new() -> Self {
        Self::bare().with_extension(math_extension())
    }

    /// Processor without any extension.
    pub fn bare() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);
        // Note: ENABLE_MATH is NOT enabled - `$` delimiters are matched by
        // the math extension on the raw source

        Self {
            options,
            extensions: Vec::new(),
        }
    }

    pub fn with_extension(mut self, extension: Extension) -> Self {
        self.extensions.push(extension);
        self
    }

    /// Parse markdown into a document tree.
    pub fn parse(&self, markdown: &str) -> Node {
        let mut elements: Vec<&dyn InlineElement> = self
            .extensions
            .iter()
            .flat_map(|ext| ext.elements.iter().map(|e| e.as_ref()))
            .collect();
        // Stable: equal priorities keep registration order.
        elements.sort_by_key(|e| std::cmp::Reverse(e.priority()));

        let masked = extension::mask(markdown, self.options, &elements);
        let parser = Parser::new_ext(&masked.source, self.options);
        let mut doc = tree::fold(&masked.source, parser.into_offset_iter());
        masked.restore(&mut doc);

        doc
    }

    /// Render a document tree to HTML, replacing link destinations found in
    /// `rewrites`.
    pub fn render(&self, doc: &Node, rewrites: &LinkRewrites) -> String {
        let mut events = Vec::new();
        self.unfold(doc, rewrites, &mut events);

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());
        html_output
    }

    /// Convert markdown to HTML without link rewriting
    #[cfg(test)]
    fn convert_simple(&self, markdown: &str) -> String {
        self.render(&self.parse(markdown), &LinkRewrites::new())
    }

    fn unfold(&self, node: &Node, rewrites: &LinkRewrites, out: &mut Vec<Event<'static>>) {
        match &node.kind {
            NodeKind::Document => self.unfold_children(node, rewrites, out),
            NodeKind::Element(Tag::Paragraph) if is_display_math_paragraph(node) => {
                // Display math is its own block; no <p> around it.
                self.unfold_children(node, rewrites, out);
            }
            NodeKind::Text(text) => out.push(Event::Text(CowStr::from(text.clone()))),
            NodeKind::Code(code) => out.push(Event::Code(CowStr::from(code.clone()))),
            NodeKind::Html(raw) => out.push(Event::Html(CowStr::from(raw.clone()))),
            NodeKind::InlineHtml(raw) => out.push(Event::InlineHtml(CowStr::from(raw.clone()))),
            NodeKind::SoftBreak => out.push(Event::SoftBreak),
            NodeKind::HardBreak => out.push(Event::HardBreak),
            NodeKind::Rule => out.push(Event::Rule),
            NodeKind::Leaf(event) => out.push(event.clone()),
            NodeKind::BlockMath(_) | NodeKind::InlineMath(_) => {
                out.push(self.render_custom(node));
            }
            NodeKind::Link { destination, .. } => {
                let rewritten = rewrites.get(destination).map(String::as_str);
                self.unfold_tag(node, rewritten, rewrites, out);
            }
            _ => self.unfold_tag(node, None, rewrites, out),
        }
    }

    fn unfold_tag(
        &self,
        node: &Node,
        destination: Option<&str>,
        rewrites: &LinkRewrites,
        out: &mut Vec<Event<'static>>,
    ) {
        if let Some(tag) = node.tag(destination) {
            let end = tag.to_end();
            out.push(Event::Start(tag));
            self.unfold_children(node, rewrites, out);
            out.push(Event::End(end));
        }
    }

    fn unfold_children(&self, node: &Node, rewrites: &LinkRewrites, out: &mut Vec<Event<'static>>) {
        for child in &node.children {
            self.unfold(child, rewrites, out);
        }
    }

    fn render_custom(&self, node: &Node) -> Event<'static> {
        let block = matches!(node.kind, NodeKind::BlockMath(_));
        let renderers = self.extensions.iter().flat_map(|ext| ext.renderers.iter());

        for renderer in renderers {
            if block {
                if let Some(html) = renderer.render_block(&node.kind) {
                    return Event::Html(CowStr::from(html));
                }
            } else if let Some(html) = renderer.render_inline(&node.kind) {
                return Event::InlineHtml(CowStr::from(html));
            }
        }

        // No renderer registered: give the source back.
        Event::Text(CowStr::from(node.plain_text()))
    }
}

impl Default for MarkdownProcessor {
    fn default() -> Self {
        Self::new()
    }
}

fn is_display_math_paragraph(node: &Node) -> bool {
    let mut has_math = false;
    for child in &node.children {
        match &child.kind {
            NodeKind::BlockMath(_) => has_math = true,
            NodeKind::SoftBreak => {}
            NodeKind::Text(text) if text.trim().is_empty() => {}
            _ => return false,
        }
    }
    has_math
}
