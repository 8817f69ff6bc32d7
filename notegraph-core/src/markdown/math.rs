//! LaTeX passthrough: `$$...$$` and `$...$` become math nodes whose payload
//! is rendered untouched inside MathJax delimiters.

use super::extension::{ElementRenderer, Extension, InlineElement};
use super::tree::NodeKind;
use regex::{Captures, Regex};
use std::sync::OnceLock;

static BLOCK_MATH_REGEX: OnceLock<Regex> = OnceLock::new();
static INLINE_MATH_REGEX: OnceLock<Regex> = OnceLock::new();

/// Display math, `$$...$$`, may span lines.
pub struct BlockMath;

impl InlineElement for BlockMath {
    fn pattern(&self) -> &Regex {
        BLOCK_MATH_REGEX.get_or_init(|| Regex::new(r"(?s)\$\$(.*?)\$\$").unwrap())
    }

    fn build(&self, captures: &Captures<'_>) -> NodeKind {
        NodeKind::BlockMath(payload(captures))
    }

    // Same delimiter character as inline math, so block spans go first.
    fn priority(&self) -> u8 {
        7
    }
}

/// Inline math, `$...$`, on a single line.
pub struct InlineMath;

impl InlineElement for InlineMath {
    fn pattern(&self) -> &Regex {
        INLINE_MATH_REGEX.get_or_init(|| Regex::new(r"\$([^$\n]+?)\$").unwrap())
    }

    fn build(&self, captures: &Captures<'_>) -> NodeKind {
        NodeKind::InlineMath(payload(captures))
    }
}

fn payload(captures: &Captures<'_>) -> String {
    captures
        .get(1)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Wraps math payloads for client-side MathJax typesetting.
pub struct MathRenderer;

impl ElementRenderer for MathRenderer {
    fn render_block(&self, node: &NodeKind) -> Option<String> {
        match node {
            NodeKind::BlockMath(tex) => Some(wrap_display_math(tex)),
            _ => None,
        }
    }

    fn render_inline(&self, node: &NodeKind) -> Option<String> {
        match node {
            NodeKind::InlineMath(tex) => Some(wrap_inline_math(tex)),
            _ => None,
        }
    }
}

/// The math extension: block and inline elements plus their renderer.
pub fn math_extension() -> Extension {
    Extension::new()
        .element(BlockMath)
        .element(InlineMath)
        .renderer(MathRenderer)
}

fn wrap_inline_math(math: &str) -> String {
    format!(
        r#"<span class="math math-inline">\({}\)</span>"#,
        html_escape(math)
    )
}

fn wrap_display_math(math: &str) -> String {
    format!(
        "<div class=\"math math-display\">\\[{}\\]</div>\n",
        html_escape(math)
    )
}

fn html_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
