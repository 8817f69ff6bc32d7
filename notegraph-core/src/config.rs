//! Configuration parsing and management.

use crate::date::DEFAULT_DATE_FORMATS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),
}

/// Main configuration struct matching the notegraph.yml schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    pub paths: PathsConfig,

    /// Label of the synthetic "all posts" page. Empty or null disables it.
    #[serde(default = "default_all_posts_label")]
    pub all_posts_label: Option<String>,

    /// Formats tried in order when resolving a front-matter date.
    #[serde(default = "default_date_formats")]
    pub date_formats: Vec<String>,

    /// Format of the date prefix shown in the post list.
    #[serde(default = "default_post_date_format")]
    pub post_date_format: String,

    #[serde(default)]
    pub front_matter: FrontMatterKeys,

    /// Regexes matched against note paths relative to the notes directory.
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    // Internal: path to config file (for relative path resolution)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub title: String,

    #[serde(default)]
    pub author: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Disqus forum shortname; pages load comments only when it is set.
    #[serde(default)]
    pub disqus_shortname: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    pub notes: PathBuf,
    pub output: PathBuf,

    /// Extra static files copied over the built-in assets.
    #[serde(default)]
    pub r#static: Option<PathBuf>,
}

/// Front-matter keys with special meaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontMatterKeys {
    #[serde(default = "default_title_key")]
    pub title_key: String,

    #[serde(default = "default_date_key")]
    pub date_key: String,
}

impl Default for FrontMatterKeys {
    fn default() -> Self {
        Self {
            title_key: default_title_key(),
            date_key: default_date_key(),
        }
    }
}

fn default_all_posts_label() -> Option<String> {
    Some(String::from("All Posts"))
}

fn default_date_formats() -> Vec<String> {
    DEFAULT_DATE_FORMATS.iter().map(|f| f.to_string()).collect()
}

fn default_post_date_format() -> String {
    String::from("%Y-%m-%d")
}

fn default_title_key() -> String {
    String::from("title")
}

fn default_date_key() -> String {
    String::from("date")
}

/// Settings the corpus builder needs, passed in explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    pub all_posts_label: Option<String>,
    pub date_formats: Vec<String>,
    pub post_date_format: String,
    pub front_matter: FrontMatterKeys,
    pub ignore_patterns: Vec<String>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            all_posts_label: default_all_posts_label(),
            date_formats: default_date_formats(),
            post_date_format: default_post_date_format(),
            front_matter: FrontMatterKeys::default(),
            ignore_patterns: Vec::new(),
        }
    }
}

impl BuildOptions {
    /// The all-posts label if the synthetic entry is enabled.
    pub fn all_posts_label(&self) -> Option<&str> {
        self.all_posts_label
            .as_deref()
            .map(str::trim)
            .filter(|label| !label.is_empty())
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = serde_yaml::from_str(&contents)?;

        // Store config file path for relative path resolution
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Get the notes directory, resolved relative to config file
    pub fn notes_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.notes)
    }

    /// Get the output directory, resolved relative to config file
    pub fn output_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.output)
    }

    /// Get the user static directory (None means built-in assets only)
    pub fn static_dir(&self) -> Option<PathBuf> {
        self.paths.r#static.as_ref().map(|p| self.resolve_path(p))
    }

    /// Options handed to the corpus builder
    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            all_posts_label: self.all_posts_label.clone(),
            date_formats: self.date_formats.clone(),
            post_date_format: self.post_date_format.clone(),
            front_matter: self.front_matter.clone(),
            ignore_patterns: self.ignore_patterns.clone(),
        }
    }

    /// Resolve a path relative to the config file location
    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else if let Some(parent) = self.config_path.as_deref().and_then(Path::parent) {
            parent.join(path)
        } else {
            path.to_path_buf()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_default_values() {
        let config: Config = serde_yaml::from_str(
            r#"
site:
  title: "Notes"
paths:
  notes: notes
  output: output
"#,
        )
        .unwrap();

        assert_eq!(config.all_posts_label.as_deref(), Some("All Posts"));
        assert_eq!(config.date_formats.len(), 5);
        assert_eq!(config.date_formats[0], "%Y-%m-%d");
        assert_eq!(config.post_date_format, "%Y-%m-%d");
        assert_eq!(config.front_matter.title_key, "title");
        assert_eq!(config.front_matter.date_key, "date");
        assert!(config.static_dir().is_none());
    }

    #[test]
    fn test_all_posts_can_be_disabled() {
        let config: Config = serde_yaml::from_str(
            r#"
site: { title: "Notes" }
paths: { notes: notes, output: output }
all_posts_label: null
"#,
        )
        .unwrap();
        assert_eq!(config.build_options().all_posts_label(), None);

        let options = BuildOptions {
            all_posts_label: Some("  ".into()),
            ..BuildOptions::default()
        };
        assert_eq!(options.all_posts_label(), None);
        assert_eq!(BuildOptions::default().all_posts_label(), Some("All Posts"));
    }

    #[test]
    fn test_paths_resolve_relative_to_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notegraph.yml");
        fs::write(
            &path,
            r#"
site:
  title: "Notes"
paths:
  notes: vault
  output: /tmp/site-out
  static: assets
front_matter:
  title_key: name
"#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.notes_dir(), dir.path().join("vault"));
        assert_eq!(config.output_dir(), PathBuf::from("/tmp/site-out"));
        assert_eq!(config.static_dir(), Some(dir.path().join("assets")));
        assert_eq!(config.front_matter.title_key, "name");
        assert_eq!(config.front_matter.date_key, "date");
    }

    #[test]
    fn test_missing_file() {
        let err = Config::from_file("/nonexistent/notegraph.yml").unwrap_err();
        assert!(matches!(err, ConfigError::ReadError(_)));
    }
}
