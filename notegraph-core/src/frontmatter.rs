//! Front matter written as `key: value` lines inside setext headings.
//!
//! ```text
//! title: "My Note"
//! date: 2024-03-01
//! ---
//! ```
//!
//! Markdown reads the block above as a level-two setext heading. Every such
//! heading in a note contributes to one combined mapping.

use crate::markdown::{Node, NodeKind};
use std::collections::BTreeMap;
use thiserror::Error;

/// Front matter of one note. Later keys overwrite earlier ones.
pub type FrontMatter = BTreeMap<String, String>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrontMatterError {
    #[error("Front matter line {line:?} has no `:` separator")]
    MissingSeparator { line: String },

    #[error("Front matter line {line:?} has an empty key")]
    EmptyKey { line: String },
}

/// Parse one `key: value` line.
///
/// Returns `Ok(None)` for blank lines. The value loses surrounding
/// whitespace and every `"` character.
///
/// ```
/// use notegraph_core::frontmatter::parse_line;
///
/// let entry = parse_line(r#"title: "My Note""#).unwrap();
/// assert_eq!(entry, Some(("title".to_string(), "My Note".to_string())));
/// ```
pub fn parse_line(line: &str) -> Result<Option<(String, String)>, FrontMatterError> {
    if line.trim().is_empty() {
        return Ok(None);
    }

    let Some((key, value)) = line.split_once(':') else {
        return Err(FrontMatterError::MissingSeparator {
            line: line.to_string(),
        });
    };

    let key = key.trim();
    if key.is_empty() {
        return Err(FrontMatterError::EmptyKey {
            line: line.to_string(),
        });
    }

    Ok(Some((key.to_string(), value.trim().replace('"', ""))))
}

/// Text lines of a heading, split at its line breaks.
pub fn heading_lines(heading: &Node) -> Vec<String> {
    let mut lines = vec![String::new()];
    for child in &heading.children {
        match child.kind {
            NodeKind::SoftBreak | NodeKind::HardBreak => lines.push(String::new()),
            _ => {
                if let Some(line) = lines.last_mut() {
                    line.push_str(&child.plain_text());
                }
            }
        }
    }
    lines
}

/// Merge the entries of one front-matter heading into `front_matter`.
pub fn extend_from_heading(
    front_matter: &mut FrontMatter,
    heading: &Node,
) -> Result<(), FrontMatterError> {
    for line in heading_lines(heading) {
        if let Some((key, value)) = parse_line(&line)? {
            front_matter.insert(key, value);
        }
    }
    Ok(())
}
