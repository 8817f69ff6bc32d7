//! Build command implementation.

use anyhow::{Context, Result};
use askama::Template;
use chrono::NaiveDateTime;
use include_dir::{include_dir, Dir};
use notegraph_core::{Config, Corpus, CorpusBuilder, Note};
use notegraph_render::{BacklinkEntry, ListTemplate, NavEntry, NoteTemplate, PostEntry};
use std::fmt::Write;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

// Embed static assets (CSS, JS) at compile time so they're available after cargo install
static STATIC_ASSETS: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/../static");

/// Site-relative prefix of the copied static assets
const STATIC_PATH: &str = "/static";

/// Build the static site
pub fn build_site(config_path: &Path) -> Result<()> {
    tracing::info!("Loading config from {:?}", config_path);
    let config = Config::from_file(config_path).context("Failed to load configuration")?;
    build_site_with_config(&config).map(|_| ())
}

/// Build the site from an already loaded config, writing output and returning the corpus.
pub fn build_site_with_config(config: &Config) -> Result<Corpus> {
    tracing::info!("Building site: {}", config.site.title);

    let builder = CorpusBuilder::new(config.build_options());
    let corpus = builder
        .build(&config.notes_dir())
        .context("Failed to build note graph")?;

    let output_dir = config.output_dir();
    fs::create_dir_all(&output_dir).context("Failed to create output directory")?;

    let nav: Vec<NavEntry> = corpus.navigation().iter().map(NavEntry::from).collect();

    for note in corpus.notes() {
        render_note_page(config, &builder, note, &nav)?;
        copy_note_assets(config, note)?;
    }

    if let Some(label) = builder.options().all_posts_label() {
        if corpus.posts().is_empty() {
            tracing::info!("No nested notes; skipping {} page", label);
        } else {
            render_post_list(config, label, &corpus, &nav)?;
        }
    }

    copy_static(config)?;

    tracing::info!("✓ Built {} pages", corpus.len());
    tracing::info!("✓ Output written to {:?}", output_dir);

    Ok(corpus)
}

/// Render a single note page
fn render_note_page(
    config: &Config,
    builder: &CorpusBuilder,
    note: &Note,
    nav: &[NavEntry],
) -> Result<()> {
    // Front matter headings and rules never reach the page
    let body = note.document.without_front_matter();
    let content = builder.processor().render(&body, &note.rewrites);

    let date = format_date(&note.date, &builder.options().post_date_format)?;

    let template = NoteTemplate {
        title: note.title.clone(),
        date,
        content,
        site_title: config.site.title.clone(),
        site_description: config.site.description.clone(),
        disqus_shortname: config.site.disqus_shortname.clone(),
        nav: nav.to_vec(),
        static_path: STATIC_PATH.to_string(),
        backlinks: note.backlinks.iter().map(BacklinkEntry::from).collect(),
        disqus: note
            .front_matter
            .get("disqus")
            .filter(|id| !id.is_empty())
            .cloned(),
    };

    let html = template
        .render()
        .context("Failed to render note template")?;

    let output_path = config.output_dir().join(note.output_rel_path());
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&output_path, html).with_context(|| format!("Failed to write {:?}", output_path))?;

    tracing::debug!("Rendered: {}", note.path);

    Ok(())
}

/// Render the synthetic page listing every nested note
fn render_post_list(config: &Config, label: &str, corpus: &Corpus, nav: &[NavEntry]) -> Result<()> {
    let template = ListTemplate {
        title: label.to_string(),
        site_title: config.site.title.clone(),
        site_description: config.site.description.clone(),
        disqus_shortname: config.site.disqus_shortname.clone(),
        nav: nav.to_vec(),
        static_path: STATIC_PATH.to_string(),
        posts: corpus.posts().iter().map(PostEntry::from).collect(),
    };

    let html = template
        .render()
        .context("Failed to render list template")?;

    let output_path = config.output_dir().join(format!("{label}.html"));
    fs::write(&output_path, html).with_context(|| format!("Failed to write {:?}", output_path))?;

    tracing::debug!("Rendered post list: {}", label);

    Ok(())
}

fn format_date(date: &NaiveDateTime, format: &str) -> Result<String> {
    let mut out = String::new();
    write!(out, "{}", date.format(format))
        .with_context(|| format!("Invalid date format {:?}", format))?;
    Ok(out)
}

/// Copy the images a note references, keeping their place relative to the notes directory
fn copy_note_assets(config: &Config, note: &Note) -> Result<()> {
    let notes_dir = config.notes_dir();
    let output_dir = config.output_dir();

    for asset in &note.referenced_assets {
        let Ok(relative) = asset.strip_prefix(&notes_dir) else {
            tracing::warn!(
                "{}: asset {:?} is outside the notes directory; not copied",
                note.path,
                asset
            );
            continue;
        };
        let target = output_dir.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(asset, &target)
            .with_context(|| format!("Failed to copy {:?} to {:?}", asset, target))?;
    }
    Ok(())
}

fn copy_static(config: &Config) -> Result<()> {
    let static_dest = config.output_dir().join("static");

    // Built-in assets first, then the user's files on top
    for entry in STATIC_ASSETS.entries() {
        extract_entry(entry, &static_dest)?;
    }
    tracing::info!("Copied assets from embedded static bundle");

    if let Some(static_dir) = config.static_dir() {
        if static_dir.exists() {
            copy_dir(&static_dir, &static_dest)?;
            tracing::info!("Copied static files from {:?}", static_dir);
        } else {
            tracing::warn!("Configured static path {:?} does not exist", static_dir);
        }
    }

    Ok(())
}

fn copy_dir(src: &Path, dest: &Path) -> Result<()> {
    for entry in WalkDir::new(src)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let relative = entry.path().strip_prefix(src).unwrap_or(entry.path());
        let target = dest.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(entry.path(), &target)
            .with_context(|| format!("Failed to copy {:?} to {:?}", entry.path(), target))?;
    }
    Ok(())
}

fn extract_entry(entry: &include_dir::DirEntry, dest: &Path) -> Result<()> {
    match entry {
        include_dir::DirEntry::Dir(dir) => {
            for sub_entry in dir.entries() {
                extract_entry(sub_entry, dest)?;
            }
        }
        include_dir::DirEntry::File(file) => {
            let target = dest.join(file.path());
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&target, file.contents())
                .with_context(|| format!("Failed to write embedded static file to {:?}", target))?;
        }
    }
    Ok(())
}
