//! # notegraph-render
//!
//! Template rendering library for notegraph.
//!
//! This crate handles HTML page rendering using Askama.

pub mod templates;

pub use templates::{BacklinkEntry, ListTemplate, NavEntry, NoteTemplate, PostEntry};
