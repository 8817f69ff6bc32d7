//! # notegraph-core
//!
//! Core library for the notegraph static site generator.
//!
//! This crate parses markdown notes into document trees, extracts their
//! front matter and links, and builds the corpus with its backlink graph,
//! navigation list and post list.

pub mod builder;
pub mod config;
pub mod date;
pub mod frontmatter;
pub mod link;
pub mod markdown;
pub mod models;
pub mod processor;

pub use builder::{BuildError, CorpusBuilder};
pub use config::{BuildOptions, Config, ConfigError};
pub use date::{DateParseError, DateResolver, DateValue};
pub use frontmatter::{FrontMatter, FrontMatterError};
pub use link::{normalize_link, Link};
pub use markdown::{LinkRewrites, MarkdownProcessor, Node, NodeKind, Visitor};
pub use models::{Corpus, Note};
pub use processor::{process_note, NoteProcessor};
