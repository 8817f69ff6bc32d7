//! Plugin contract for custom element kinds.
//!
//! An [`Extension`] teaches the processor to recognize new elements inside
//! raw text ([`InlineElement`]) and how to render them ([`ElementRenderer`]).

use super::tree::{Node, NodeKind};
use pulldown_cmark::{Event, LinkType, Options, Parser, Tag, TagEnd};
use regex::{Captures, Regex};
use std::ops::Range;
use std::sync::OnceLock;

// Private-use code points; markdown parses them as plain text.
const MARK_OPEN: char = '\u{E000}';
const MARK_CLOSE: char = '\u{E001}';

static MARK_REGEX: OnceLock<Regex> = OnceLock::new();

/// A custom element recognized by pattern matching over raw text.
pub trait InlineElement: Send + Sync {
    /// Pattern whose non-overlapping matches become elements.
    fn pattern(&self) -> &Regex;

    /// Build the node for one match.
    fn build(&self, captures: &Captures<'_>) -> NodeKind;

    /// Elements with a higher priority claim text first.
    fn priority(&self) -> u8 {
        5
    }
}

/// Renders custom node kinds to HTML.
pub trait ElementRenderer: Send + Sync {
    /// Block-level HTML for `node`, or `None` if this renderer does not own it.
    fn render_block(&self, _node: &NodeKind) -> Option<String> {
        None
    }

    /// Inline HTML for `node`, or `None` if this renderer does not own it.
    fn render_inline(&self, _node: &NodeKind) -> Option<String> {
        None
    }
}

/// A bundle of elements and their renderers.
#[derive(Default)]
pub struct Extension {
    pub elements: Vec<Box<dyn InlineElement>>,
    pub renderers: Vec<Box<dyn ElementRenderer>>,
}

impl Extension {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn element(mut self, element: impl InlineElement + 'static) -> Self {
        self.elements.push(Box::new(element));
        self
    }

    pub fn renderer(mut self, renderer: impl ElementRenderer + 'static) -> Self {
        self.renderers.push(Box::new(renderer));
        self
    }
}

/// Markdown source with every element match swapped for a placeholder.
///
/// Matching happens on the raw source, so element payloads never see
/// backslash escapes or emphasis resolved by the markdown parser.
pub(crate) struct Masked {
    pub source: String,
    nodes: Vec<NodeKind>,
}

impl Masked {
    /// Swap the placeholders in `node`'s subtree back for their elements.
    pub fn restore(&self, node: &mut Node) {
        if self.nodes.is_empty() {
            return;
        }

        for child in &mut node.children {
            self.restore(child);
        }

        let children = std::mem::take(&mut node.children);
        for child in children {
            if let NodeKind::Text(text) = &child.kind {
                if text.contains(MARK_OPEN) {
                    let pieces = self.split(text);
                    node.children.extend(pieces);
                    continue;
                }
            }
            node.children.push(child);
        }
    }

    fn split(&self, text: &str) -> Vec<Node> {
        let mut out = Vec::new();
        let mut last = 0;

        for captures in mark_regex().captures_iter(text) {
            let (Some(whole), Some(index)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            let Some(kind) = index
                .as_str()
                .parse::<usize>()
                .ok()
                .and_then(|i| self.nodes.get(i))
            else {
                continue;
            };
            if whole.start() > last {
                out.push(Node::text(&text[last..whole.start()]));
            }
            out.push(Node::new(kind.clone()));
            last = whole.end();
        }

        if last < text.len() {
            out.push(Node::text(&text[last..]));
        }
        out
    }
}

fn mark_regex() -> &'static Regex {
    MARK_REGEX.get_or_init(|| Regex::new(r"\x{E000}(\d+)\x{E001}").unwrap())
}

/// Replace matches of `elements` in the inline text of `source` with
/// placeholders.
///
/// `elements` must already be sorted by descending priority. Code spans,
/// inline HTML, link destinations, code blocks and HTML blocks are never
/// scanned, and a match never leaves the block it starts in. A delimiter
/// preceded by a backslash does not open a match.
pub(crate) fn mask(source: &str, options: Options, elements: &[&dyn InlineElement]) -> Masked {
    let mut found: Vec<(Range<usize>, NodeKind)> = Vec::new();
    if !elements.is_empty() {
        for segment in inline_segments(source, options) {
            scan(source, segment, elements, &mut found);
        }
    }
    found.sort_by_key(|(range, _)| range.start);

    let mut masked = String::with_capacity(source.len());
    let mut nodes = Vec::with_capacity(found.len());
    let mut last = 0;
    for (range, kind) in found {
        masked.push_str(&source[last..range.start]);
        masked.push(MARK_OPEN);
        masked.push_str(&nodes.len().to_string());
        masked.push(MARK_CLOSE);
        nodes.push(kind);
        last = range.end;
    }
    masked.push_str(&source[last..]);

    Masked {
        source: masked,
        nodes,
    }
}

fn scan(
    source: &str,
    segment: Range<usize>,
    elements: &[&dyn InlineElement],
    found: &mut Vec<(Range<usize>, NodeKind)>,
) {
    let mut unclaimed = vec![segment];

    for element in elements {
        let mut rest = Vec::with_capacity(unclaimed.len());
        for span in unclaimed {
            let text = &source[span.clone()];
            let mut last = 0;
            let mut pos = 0;

            while let Some(captures) = element.pattern().captures_at(text, pos) {
                let Some(whole) = captures.get(0) else {
                    break;
                };
                if whole.is_empty() || is_escaped(source, span.start + whole.start()) {
                    pos = whole.start()
                        + text[whole.start()..]
                            .chars()
                            .next()
                            .map_or(1, char::len_utf8);
                    continue;
                }
                if whole.start() > last {
                    rest.push(span.start + last..span.start + whole.start());
                }
                found.push((
                    span.start + whole.start()..span.start + whole.end(),
                    element.build(&captures),
                ));
                last = whole.end();
                pos = whole.end();
            }

            if last < text.len() {
                rest.push(span.start + last..span.end);
            }
        }
        unclaimed = rest;
    }
}

fn is_escaped(source: &str, at: usize) -> bool {
    source[..at].bytes().rev().take_while(|&b| b == b'\\').count() % 2 == 1
}

struct OpenLink {
    start: usize,
    text_end: usize,
    autolink: bool,
}

/// Byte ranges of raw inline text, one or more per block.
fn inline_segments(source: &str, options: Options) -> Vec<Range<usize>> {
    let mut runs: Vec<Range<usize>> = Vec::new();
    let mut skipped: Vec<Range<usize>> = Vec::new();
    let mut run: Option<Range<usize>> = None;
    let mut links: Vec<OpenLink> = Vec::new();
    let mut verbatim = 0usize;

    for (event, range) in Parser::new_ext(source, options).into_offset_iter() {
        let inline = match &event {
            Event::Start(Tag::CodeBlock(_) | Tag::HtmlBlock) => {
                verbatim += 1;
                false
            }
            Event::End(TagEnd::CodeBlock | TagEnd::HtmlBlock) => {
                verbatim = verbatim.saturating_sub(1);
                false
            }
            Event::Start(tag) => is_inline_tag(tag),
            Event::End(end) => is_inline_end(end),
            Event::Text(_)
            | Event::Code(_)
            | Event::InlineHtml(_)
            | Event::SoftBreak
            | Event::HardBreak
            | Event::FootnoteReference(_)
            | Event::TaskListMarker(_) => true,
            _ => false,
        };

        if !inline || verbatim > 0 {
            runs.extend(run.take());
            continue;
        }

        match &event {
            Event::Code(_) | Event::InlineHtml(_) | Event::FootnoteReference(_) => {
                skipped.push(range.clone());
            }
            Event::Start(Tag::Link { link_type, .. }) => links.push(OpenLink {
                start: range.start,
                text_end: range.start,
                autolink: matches!(link_type, LinkType::Autolink | LinkType::Email),
            }),
            Event::Start(Tag::Image { .. }) => links.push(OpenLink {
                start: range.start,
                text_end: range.start,
                autolink: false,
            }),
            Event::End(TagEnd::Link | TagEnd::Image) => {
                if let Some(link) = links.pop() {
                    // Everything after the link text: `](dest "title")`
                    let from = if link.autolink { link.start } else { link.text_end };
                    skipped.push(from..range.end);
                    if let Some(parent) = links.last_mut() {
                        parent.text_end = parent.text_end.max(range.end);
                    }
                }
            }
            _ => {
                if let Some(link) = links.last_mut() {
                    link.text_end = link.text_end.max(range.end);
                }
            }
        }

        run = Some(match run {
            Some(open) => open.start..open.end.max(range.end),
            None => range,
        });
    }
    runs.extend(run);

    skipped.sort_by_key(|r| r.start);
    let mut segments = Vec::with_capacity(runs.len());
    for run in runs {
        let mut cursor = run.start;
        for skip in skipped
            .iter()
            .filter(|s| s.start < run.end && s.end > run.start)
        {
            if skip.start > cursor {
                segments.push(cursor..skip.start);
            }
            cursor = cursor.max(skip.end);
        }
        if cursor < run.end {
            segments.push(cursor..run.end);
        }
    }
    segments
}

fn is_inline_tag(tag: &Tag<'_>) -> bool {
    matches!(
        tag,
        Tag::Emphasis | Tag::Strong | Tag::Strikethrough | Tag::Link { .. } | Tag::Image { .. }
    )
}

fn is_inline_end(end: &TagEnd) -> bool {
    matches!(
        end,
        TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough | TagEnd::Link | TagEnd::Image
    )
}
