//! Per-file note construction: parse once, traverse once, resolve the date.

use crate::builder::BuildError;
use crate::config::BuildOptions;
use crate::date::{DateResolver, DateValue};
use crate::frontmatter::{self, FrontMatter, FrontMatterError};
use crate::link::{decode_destination, is_absolute_url, is_note_reference, normalize_link, Link};
use crate::markdown::{LinkRewrites, MarkdownProcessor, Node, NodeKind, Visitor};
use crate::models::{file_stem, Note};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Visitor collecting everything a note knows about itself.
#[derive(Debug)]
pub struct NoteProcessor {
    /// Directory of the note being processed; images resolve against it.
    base_dir: PathBuf,
    pub front_matter: FrontMatter,
    pub outgoing_links: BTreeMap<String, Link>,
    pub rewrites: LinkRewrites,
    pub referenced_assets: Vec<PathBuf>,
    depth: usize,
    visited: usize,
}

impl NoteProcessor {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            front_matter: FrontMatter::new(),
            outgoing_links: BTreeMap::new(),
            rewrites: LinkRewrites::new(),
            referenced_assets: Vec::new(),
            depth: 0,
            visited: 0,
        }
    }

    /// Nodes reached through the fallback handler so far.
    pub fn visited(&self) -> usize {
        self.visited
    }
}

impl Visitor for NoteProcessor {
    type Error = FrontMatterError;

    fn visit_heading(&mut self, node: &Node) -> Result<(), FrontMatterError> {
        if node.is_setext_heading() {
            frontmatter::extend_from_heading(&mut self.front_matter, node)?;
        }
        self.generic_visit(node)
    }

    fn visit_image(&mut self, node: &Node) -> Result<(), FrontMatterError> {
        if let NodeKind::Image { destination, .. } = &node.kind {
            if !destination.is_empty() && !is_absolute_url(destination) {
                let candidate = self.base_dir.join(decode_destination(destination));
                if candidate.is_file() {
                    self.referenced_assets.push(candidate);
                } else {
                    tracing::debug!("Image not found: {}", candidate.display());
                }
            }
        }
        self.generic_visit(node)
    }

    fn visit_link(&mut self, node: &Node) -> Result<(), FrontMatterError> {
        let NodeKind::Link { destination, .. } = &node.kind else {
            return self.generic_visit(node);
        };

        if is_absolute_url(destination) {
            self.outgoing_links.insert(
                destination.clone(),
                Link::new(destination.clone(), node.plain_text()),
            );
            return Ok(());
        }

        if is_note_reference(destination) {
            let normalized = normalize_link(destination, true);
            self.outgoing_links.insert(
                decode_destination(destination),
                Link::new(normalized.clone(), node.plain_text()),
            );
            self.rewrites.insert(destination.clone(), normalized);
        }

        self.generic_visit(node)
    }

    fn enter(&mut self, node: &Node) {
        self.visited += 1;
        tracing::trace!(depth = self.depth, kind = ?node.kind, "visit");
        self.depth += 1;
    }

    fn leave(&mut self, _node: &Node) {
        self.depth = self.depth.saturating_sub(1);
    }
}

/// Build one note from `source_path`, keyed by `rel_path` in the corpus.
pub fn process_note(
    rel_path: &str,
    source_path: &Path,
    markdown: &MarkdownProcessor,
    options: &BuildOptions,
    resolver: &DateResolver,
) -> Result<Note, BuildError> {
    let content = fs::read_to_string(source_path).map_err(|source| BuildError::MissingFile {
        path: source_path.to_path_buf(),
        source,
    })?;

    let document = markdown.parse(&content);

    let base_dir = source_path.parent().unwrap_or_else(|| Path::new(""));
    let mut visitor = NoteProcessor::new(base_dir);
    visitor
        .visit(&document)
        .map_err(|source| BuildError::FrontMatter {
            path: source_path.to_path_buf(),
            source,
        })?;

    tracing::debug!(
        "Processed {} ({} nodes, {} links, {} assets)",
        rel_path,
        visitor.visited(),
        visitor.outgoing_links.len(),
        visitor.referenced_assets.len()
    );

    let title = visitor
        .front_matter
        .get(&options.front_matter.title_key)
        .filter(|t| !t.is_empty())
        .cloned()
        .unwrap_or_else(|| file_stem(rel_path).to_string());

    let date = match visitor.front_matter.get(&options.front_matter.date_key) {
        Some(text) => resolver.resolve(DateValue::Text(text)),
        None => {
            let time = fs::metadata(source_path)
                .and_then(|meta| meta.created().or_else(|_| meta.modified()))
                .map_err(|source| BuildError::MissingFile {
                    path: source_path.to_path_buf(),
                    source,
                })?;
            resolver.resolve(DateValue::from(time))
        }
    }
    .map_err(|source| BuildError::Date {
        path: source_path.to_path_buf(),
        source,
    })?;

    Ok(Note {
        path: rel_path.to_string(),
        source_path: source_path.to_path_buf(),
        document,
        front_matter: visitor.front_matter,
        title,
        date,
        outgoing_links: visitor.outgoing_links,
        rewrites: visitor.rewrites,
        referenced_assets: visitor.referenced_assets,
        backlinks: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn run(markdown: &str, base: &Path) -> NoteProcessor {
        let doc = MarkdownProcessor::new().parse(markdown);
        let mut visitor = NoteProcessor::new(base);
        visitor.visit(&doc).unwrap();
        visitor
    }

    #[test]
    fn test_front_matter_heading() {
        let dir = tempdir().unwrap();
        let visitor = run("title: \"First\"\ndate: 2024-03-01\n---\n\n# Real heading\n", dir.path());
        assert_eq!(visitor.front_matter["title"], "First");
        assert_eq!(visitor.front_matter["date"], "2024-03-01");
        assert_eq!(visitor.front_matter.len(), 2);
    }

    #[test]
    fn test_malformed_front_matter() {
        let doc = MarkdownProcessor::new().parse("No colon here\n---\n");
        let mut visitor = NoteProcessor::new("notes");
        assert!(matches!(
            visitor.visit(&doc),
            Err(FrontMatterError::MissingSeparator { .. })
        ));
    }

    #[test]
    fn test_links() {
        let dir = tempdir().unwrap();
        let visitor = run(
            "[Other](other%20note.md), [web](https://example.com/x.md), \
             [anchor](#top) and [file](data.csv)",
            dir.path(),
        );

        let keys: Vec<&str> = visitor.outgoing_links.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["https://example.com/x.md", "other note.md"]);

        let other = &visitor.outgoing_links["other note.md"];
        assert_eq!(other.target(), "/other%20note.html");
        assert_eq!(other.label(), "Other");
        assert_eq!(
            visitor.rewrites.get("other%20note.md").map(String::as_str),
            Some("/other%20note.html")
        );

        let web = &visitor.outgoing_links["https://example.com/x.md"];
        assert_eq!(web.target(), "https://example.com/x.md");
        assert!(!visitor.rewrites.contains_key("https://example.com/x.md"));
    }

    #[test]
    fn test_images() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("img")).unwrap();
        fs::write(dir.path().join("img/pic.png"), b"png").unwrap();

        let visitor = run(
            "![a](./img/pic.png) ![b](img/missing.png) ![c](https://example.com/c.png)",
            dir.path(),
        );
        assert_eq!(
            visitor.referenced_assets,
            vec![dir.path().join("./img/pic.png")]
        );
    }

    #[test]
    fn test_visit_counter() {
        let visitor = run("plain text", Path::new("."));
        // document, paragraph, text
        assert_eq!(visitor.visited(), 3);
    }

    #[test]
    fn test_process_note() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("intro.md");
        fs::write(
            &path,
            "title: Welcome\ndate: 03/01/2024\n---\n\nSee [next](next.md).\n",
        )
        .unwrap();

        let note = process_note(
            "intro.md",
            &path,
            &MarkdownProcessor::new(),
            &BuildOptions::default(),
            &DateResolver::default(),
        )
        .unwrap();

        assert_eq!(note.title, "Welcome");
        assert_eq!(note.date.format("%Y-%m-%d").to_string(), "2024-03-01");
        assert!(note.outgoing_links.contains_key("next.md"));
        assert!(note.backlinks.is_empty());
    }

    #[test]
    fn test_process_note_falls_back_to_stem_and_file_time() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("untitled.md");
        fs::write(&path, "Just text.\n").unwrap();

        let note = process_note(
            "untitled.md",
            &path,
            &MarkdownProcessor::new(),
            &BuildOptions::default(),
            &DateResolver::default(),
        )
        .unwrap();
        assert_eq!(note.title, "untitled");
        assert!(note.front_matter.is_empty());
    }

    #[test]
    fn test_process_note_errors_name_the_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.md");
        fs::write(&path, "date: someday\n---\n").unwrap();

        let err = process_note(
            "bad.md",
            &path,
            &MarkdownProcessor::new(),
            &BuildOptions::default(),
            &DateResolver::default(),
        )
        .unwrap_err();
        assert!(matches!(err, BuildError::Date { .. }));
        assert!(err.to_string().contains("bad.md"));
        assert!(err.to_string().contains("someday"));

        let missing = dir.path().join("gone.md");
        let err = process_note(
            "gone.md",
            &missing,
            &MarkdownProcessor::new(),
            &BuildOptions::default(),
            &DateResolver::default(),
        )
        .unwrap_err();
        assert!(matches!(err, BuildError::MissingFile { .. }));
    }
}
