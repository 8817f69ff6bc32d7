//! CLI command implementations.

pub mod build;
pub mod graph;

pub use build::build_site;
pub use graph::show_graph;
