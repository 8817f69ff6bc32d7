//! Corpus building: parse every note, then invert the link graph.

use crate::config::BuildOptions;
use crate::date::{DateParseError, DateResolver};
use crate::frontmatter::FrontMatterError;
use crate::link::{is_absolute_url, page_url, Link, NOTE_EXTENSION};
use crate::markdown::MarkdownProcessor;
use crate::models::{Corpus, Note};
use crate::processor::process_note;
use chrono::format::{Item, StrftimeItems};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::ffi::OsStr;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Cannot read {}: {source}", path.display())]
    MissingFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid date in {}: {source}", path.display())]
    Date {
        path: PathBuf,
        #[source]
        source: DateParseError,
    },

    #[error("Malformed front matter in {}: {source}", path.display())]
    FrontMatter {
        path: PathBuf,
        #[source]
        source: FrontMatterError,
    },

    #[error("Cannot walk {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Invalid ignore pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid post date format {format:?}")]
    PostDateFormat { format: String },
}

/// Two-pass corpus builder.
pub struct CorpusBuilder {
    options: BuildOptions,
    processor: MarkdownProcessor,
    resolver: DateResolver,
}

impl CorpusBuilder {
    pub fn new(options: BuildOptions) -> Self {
        let resolver = DateResolver::new(&options.date_formats);
        Self {
            options,
            processor: MarkdownProcessor::new(),
            resolver,
        }
    }

    /// The markdown processor used to parse notes, for rendering them later.
    pub fn processor(&self) -> &MarkdownProcessor {
        &self.processor
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Discover every note under `root` and build the corpus.
    pub fn build(&self, root: &Path) -> Result<Corpus, BuildError> {
        let files = self.discover(root)?;
        tracing::info!("Found {} markdown files", files.len());
        self.build_from(root, &files)
    }

    /// Note files under `root` in a stable order, minus ignored paths.
    pub fn discover(&self, root: &Path) -> Result<Vec<PathBuf>, BuildError> {
        let ignore_patterns = compile_ignore_patterns(&self.options.ignore_patterns)?;
        let mut files = Vec::new();

        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(|source| BuildError::Walk {
                path: root.to_path_buf(),
                source,
            })?;
            if !entry.file_type().is_file()
                || entry.path().extension() != Some(OsStr::new(NOTE_EXTENSION))
            {
                continue;
            }

            let rel = relative_key(root, entry.path());
            if should_ignore(&rel, &ignore_patterns) {
                tracing::debug!("Ignoring {} due to ignore_patterns", rel);
                continue;
            }
            files.push(entry.into_path());
        }

        Ok(files)
    }

    /// Build a corpus from an explicit file list, in the given order.
    pub fn build_from(&self, root: &Path, files: &[PathBuf]) -> Result<Corpus, BuildError> {
        if !is_valid_format(&self.options.post_date_format) {
            return Err(BuildError::PostDateFormat {
                format: self.options.post_date_format.clone(),
            });
        }

        // Parse pass
        let mut corpus = Corpus::default();
        for file in files {
            let rel = relative_key(root, file);
            if corpus.index.contains_key(&rel) {
                continue;
            }
            let note = process_note(&rel, file, &self.processor, &self.options, &self.resolver)?;
            corpus.index.insert(rel, corpus.notes.len());
            corpus.notes.push(note);
        }

        // Backlink pass
        let backlinks = collect_backlinks(&corpus.notes, &corpus.index);
        let inverted = backlinks.len();
        for (target, link) in backlinks {
            corpus.notes[target].add_backlink(link);
        }
        tracing::info!(
            "Linked {} notes ({} backlinks)",
            corpus.notes.len(),
            inverted
        );

        corpus.navigation = self.navigation(&corpus.notes);
        corpus.posts = self.posts(&corpus.notes)?;

        Ok(corpus)
    }

    fn navigation(&self, notes: &[Note]) -> Vec<Link> {
        let mut nav: Vec<Link> = notes
            .iter()
            .filter(|note| note.is_top_level())
            .map(|note| Link::new(note.url(), capitalize(note.stem())))
            .collect();

        if let Some(label) = self.options.all_posts_label() {
            nav.push(Link::new(page_url(label), label));
        }
        nav
    }

    fn posts(&self, notes: &[Note]) -> Result<Vec<Link>, BuildError> {
        let mut nested: Vec<&Note> = notes.iter().filter(|n| !n.is_top_level()).collect();
        // Stable: equal dates keep discovery order.
        nested.sort_by(|a, b| b.date.cmp(&a.date));

        nested
            .into_iter()
            .map(|note| {
                let mut prefix = String::new();
                write!(prefix, "{}", note.date.format(&self.options.post_date_format)).map_err(
                    |_| BuildError::PostDateFormat {
                        format: self.options.post_date_format.clone(),
                    },
                )?;
                Ok(Link::new(note.url(), note.title.clone()).with_prefix(prefix))
            })
            .collect()
    }
}

/// Pending `(target note index, backlink)` pairs, in note order.
///
/// Several spellings of one destination (`b.md`, `./b.md`) yield one backlink.
fn collect_backlinks(notes: &[Note], index: &HashMap<String, usize>) -> Vec<(usize, Link)> {
    let mut pending = Vec::new();
    let mut seen: HashSet<(usize, usize)> = HashSet::new();
    for (source, note) in notes.iter().enumerate() {
        for key in note.outgoing_links.keys() {
            if is_absolute_url(key) {
                continue;
            }
            match index.get(lookup_key(key)).copied() {
                Some(target) if target != source => {
                    if !seen.insert((source, target)) {
                        continue;
                    }
                    pending.push((target, Link::new(note.url(), note.title.clone())));
                }
                Some(_) => {}
                None => tracing::debug!("{}: no note matches link {}", note.path, key),
            }
        }
    }
    pending
}

/// Corpus key form of an outgoing link destination.
fn lookup_key(destination: &str) -> &str {
    let mut key = destination;
    loop {
        if let Some(rest) = key.strip_prefix("./") {
            key = rest;
        } else if let Some(rest) = key.strip_prefix('/') {
            key = rest;
        } else {
            return key;
        }
    }
}

/// Path of `file` relative to `root`, `/`-separated.
fn relative_key(root: &Path, file: &Path) -> String {
    let rel = file.strip_prefix(root).unwrap_or(file);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn capitalize(stem: &str) -> String {
    let mut chars = stem.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn is_valid_format(format: &str) -> bool {
    !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}

fn compile_ignore_patterns(patterns: &[String]) -> Result<Vec<Regex>, BuildError> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(pattern).map_err(|source| BuildError::Pattern {
                pattern: pattern.clone(),
                source,
            })
        })
        .collect()
}

fn should_ignore(path: &str, ignores: &[Regex]) -> bool {
    ignores.iter().any(|re| re.is_match(path))
}
