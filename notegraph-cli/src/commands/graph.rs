//! Link graph report.

use anyhow::{Context, Result};
use notegraph_core::link::is_absolute_url;
use notegraph_core::{Config, CorpusBuilder};
use std::path::Path;

/// Build the corpus and print every note's outgoing links and backlinks.
pub fn show_graph(config_path: &Path, json: bool) -> Result<()> {
    let config = Config::from_file(config_path).context("Failed to load configuration")?;

    let builder = CorpusBuilder::new(config.build_options());
    let corpus = builder
        .build(&config.notes_dir())
        .context("Failed to build note graph")?;

    if json {
        let notes: Vec<_> = corpus
            .notes()
            .iter()
            .map(|note| {
                let outgoing: Vec<_> = note
                    .outgoing_links
                    .iter()
                    .map(|(key, link)| {
                        serde_json::json!({
                            "destination": key,
                            "target": link.target(),
                            "label": link.label(),
                            "external": is_absolute_url(key),
                        })
                    })
                    .collect();
                serde_json::json!({
                    "path": note.path,
                    "url": note.url(),
                    "title": note.title,
                    "date": note.date.format("%Y-%m-%dT%H:%M:%S").to_string(),
                    "outgoing": outgoing,
                    "backlinks": note.backlinks,
                })
            })
            .collect();

        let payload = serde_json::json!({
            "notes": notes,
            "navigation": corpus.navigation(),
            "posts": corpus.posts(),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        for note in corpus.notes() {
            println!("{} ({})", note.title, note.path);
            for (key, link) in &note.outgoing_links {
                if is_absolute_url(key) {
                    println!("  -> {} [external]", link.target());
                } else {
                    println!("  -> {}", key);
                }
            }
            for backlink in &note.backlinks {
                println!("  <- {} ({})", backlink.label(), backlink.target());
            }
        }
    }

    Ok(())
}
