use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write_site(root: &Path) -> Result<(), Box<dyn std::error::Error>> {
    fs::write(
        root.join("notegraph.yml"),
        r#"
site:
  title: "Garden"
  description: "Linked notes"
paths:
  notes: "notes"
  output: "site"
"#,
    )?;

    let notes = root.join("notes");
    fs::create_dir_all(notes.join("posts/img"))?;
    fs::write(
        notes.join("about.md"),
        "title: About me\n---\n\nRead [the first post](posts/first.md).\n",
    )?;
    fs::write(
        notes.join("posts/first.md"),
        "title: \"First post\"\ndate: 2024-03-01\ndisqus: first\n---\n\n\
         Energy: $$E = mc^2$$\n\n![chart](img/chart.png)\n\nBack to [about](about.md).\n",
    )?;
    fs::write(notes.join("posts/img/chart.png"), b"png")?;
    Ok(())
}

#[test]
fn build_writes_pages_assets_and_post_list() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    write_site(dir.path())?;

    #[allow(deprecated)]
    Command::cargo_bin("notegraph")?
        .current_dir(dir.path())
        .arg("build")
        .assert()
        .success();

    let site = dir.path().join("site");
    let about = fs::read_to_string(site.join("about.html"))?;
    assert!(about.contains(r#"<a href="/posts/first.html">the first post</a>"#));
    assert!(about.contains(r#"<a href="/posts/first.html">First post</a>"#));
    assert!(!about.contains("title: About me"));

    let first = fs::read_to_string(site.join("posts/first.html"))?;
    assert!(first.contains(r#"<div class="math math-display">\[E = mc^2\]</div>"#));
    assert!(first.contains(r#"<a href="/about.html">about</a>"#));
    assert!(first.contains("2024-03-01"));
    assert!(first.contains(r#"data-disqus="first""#));
    assert!(first.contains(r#"<a href="/about.html">About me</a>"#));

    assert!(site.join("posts/img/chart.png").is_file());
    assert!(site.join("static/style.css").is_file());
    assert!(site.join("static/script.js").is_file());

    let list = fs::read_to_string(site.join("All Posts.html"))?;
    assert!(list.contains(r#"<span class="post-date">2024-03-01</span> <a href="/posts/first.html">First post</a>"#));
    Ok(())
}

#[test]
fn graph_json_reports_backlinks() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    write_site(dir.path())?;

    #[allow(deprecated)]
    let assert = Command::cargo_bin("notegraph")?
        .current_dir(dir.path())
        .args(["graph", "--json"])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone())?;
    let value: Value = serde_json::from_str(&stdout)?;
    let notes = value["notes"].as_array().expect("notes array");
    assert_eq!(notes.len(), 2);

    let first = notes
        .iter()
        .find(|n| n["path"] == "posts/first.md")
        .expect("first post");
    assert_eq!(first["backlinks"][0]["target"], "/about.html");
    assert_eq!(first["backlinks"][0]["label"], "About me");

    let nav: Vec<&str> = value["navigation"]
        .as_array()
        .expect("navigation array")
        .iter()
        .filter_map(|l| l["label"].as_str())
        .collect();
    assert_eq!(nav, vec!["About", "All Posts"]);
    Ok(())
}

#[test]
fn bad_date_fails_with_file_name() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    write_site(dir.path())?;
    fs::write(
        dir.path().join("notes/posts/broken.md"),
        "date: yesterday\n---\n",
    )?;

    #[allow(deprecated)]
    Command::cargo_bin("notegraph")?
        .current_dir(dir.path())
        .arg("build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("broken.md"))
        .stderr(predicate::str::contains("yesterday"));
    Ok(())
}

#[test]
fn missing_config_fails() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;

    #[allow(deprecated)]
    Command::cargo_bin("notegraph")?
        .current_dir(dir.path())
        .arg("build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration"));
    Ok(())
}
