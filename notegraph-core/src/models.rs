//! Content model structs for notes and the corpus.

use crate::frontmatter::FrontMatter;
use crate::link::{normalize_link, Link};
use crate::markdown::{LinkRewrites, Node};
use chrono::NaiveDateTime;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

/// One parsed note file.
#[derive(Debug, Clone)]
pub struct Note {
    /// Path relative to the note root, `/`-separated (e.g. "posts/intro.md").
    /// Unique within a corpus.
    pub path: String,

    /// Where the note was read from.
    pub source_path: PathBuf,

    /// Parsed markdown, owned by this note alone.
    pub document: Node,

    pub front_matter: FrontMatter,

    /// Display title: the front-matter title, else the file stem.
    pub title: String,

    pub date: NaiveDateTime,

    /// Outgoing references keyed by the percent-decoded destination as
    /// written in the source.
    pub outgoing_links: BTreeMap<String, Link>,

    /// Render-time destination replacements for links to other notes.
    pub rewrites: LinkRewrites,

    /// Local images that existed when the note was parsed.
    pub referenced_assets: Vec<PathBuf>,

    /// Notes linking here. Filled by the corpus builder's second pass.
    pub backlinks: Vec<Link>,
}

impl Note {
    /// Site-relative URL of the rendered page ("/posts/intro.html").
    pub fn url(&self) -> String {
        normalize_link(&self.path, true)
    }

    /// Output path relative to the site root (no leading slash).
    pub fn output_rel_path(&self) -> String {
        normalize_link(&self.path, false)
    }

    /// File name without directory or extension.
    pub fn stem(&self) -> &str {
        file_stem(&self.path)
    }

    /// Whether the note sits directly under the note root.
    pub fn is_top_level(&self) -> bool {
        !self.path.contains('/')
    }

    pub fn add_backlink(&mut self, link: Link) {
        self.backlinks.push(link);
    }
}

pub(crate) fn file_stem(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}

/// Every note of a site, with the views derived from the link graph.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    pub(crate) notes: Vec<Note>,
    pub(crate) index: HashMap<String, usize>,
    pub(crate) navigation: Vec<Link>,
    pub(crate) posts: Vec<Link>,
}

impl Corpus {
    /// Notes in discovery order.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Look a note up by its relative path.
    pub fn get(&self, path: &str) -> Option<&Note> {
        self.index.get(path).map(|&i| &self.notes[i])
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// One link per top-level note, plus the "all posts" entry if enabled.
    pub fn navigation(&self) -> &[Link] {
        &self.navigation
    }

    /// Nested notes, newest first, each prefixed with its date.
    pub fn posts(&self) -> &[Link] {
        &self.posts
    }
}
