//! Link values and destination normalization.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// Extension of note source files.
pub const NOTE_EXTENSION: &str = "md";

/// Extension of rendered pages.
pub const OUTPUT_EXTENSION: &str = "html";

/// Characters escaped when a label is turned into a page URL.
const PAGE_NAME: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`');

/// A renderable reference: where it points and how it reads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Link {
    target: String,
    label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    suffix: Option<String>,
}

impl Link {
    pub fn new(target: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            label: label.into(),
            prefix: None,
            suffix: None,
        }
    }

    /// Attach display text shown before the label (e.g. a date stamp).
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Attach display text shown after the label.
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn suffix(&self) -> Option<&str> {
        self.suffix.as_deref()
    }
}

static SCHEME_REGEX: OnceLock<Regex> = OnceLock::new();

fn scheme_regex() -> &'static Regex {
    // Two or more scheme characters so Windows drive letters stay relative.
    SCHEME_REGEX.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]+:").unwrap())
}

/// Whether a destination points outside the site (`https:`, `mailto:`, `//host`).
pub fn is_absolute_url(dest: &str) -> bool {
    dest.starts_with("//") || scheme_regex().is_match(dest)
}

/// Whether a relative destination names another note by its source file.
pub fn is_note_reference(dest: &str) -> bool {
    !is_absolute_url(dest)
        && dest
            .rsplit_once('.')
            .is_some_and(|(stem, ext)| !stem.is_empty() && ext == NOTE_EXTENSION)
}

/// Percent-decode a destination, keeping the raw text if it is not valid UTF-8.
pub fn decode_destination(dest: &str) -> String {
    percent_decode_str(dest)
        .decode_utf8()
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| dest.to_string())
}

/// Swap the note extension for the page extension.
///
/// With `from_root` the result carries exactly one leading `/`, making it a
/// site-relative URL.
///
/// ```
/// use notegraph_core::link::normalize_link;
///
/// assert_eq!(normalize_link("posts/intro.md", true), "/posts/intro.html");
/// assert_eq!(normalize_link("./about.md", false), "about.html");
/// ```
pub fn normalize_link(link: &str, from_root: bool) -> String {
    let mut path = link.trim();
    while let Some(rest) = path.strip_prefix("./") {
        path = rest;
    }

    let path = match path.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty() && !stem.ends_with('/') && !ext.contains('/') =>
        {
            format!("{stem}.{OUTPUT_EXTENSION}")
        }
        _ => format!("{path}.{OUTPUT_EXTENSION}"),
    };

    if from_root {
        format!("/{}", path.trim_start_matches('/'))
    } else {
        path
    }
}

/// Site-relative URL of a synthetic page named after a label ("All Posts").
pub fn page_url(name: &str) -> String {
    format!(
        "/{}.{OUTPUT_EXTENSION}",
        utf8_percent_encode(name, PAGE_NAME)
    )
}
