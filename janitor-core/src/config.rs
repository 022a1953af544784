//! Configuration loading from janitor.toml.
//!
//! ```toml
//! ignore = ["debugbar.*"]
//! exclude = ["public/build"]
//! exclude_paths = ['\.min\.js$']
//! threshold = 0
//!
//! [output]
//! format = "json"
//!
//! [paths]
//! views = "resources/views"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs, path::Path};

use crate::scan::ScanOptions;

/// Main configuration structure for janitor.toml.
#[derive(Debug, Deserialize, Default)]
pub struct JanitorConfig {
    /// Entity names or patterns to ignore.
    pub ignore: Option<Vec<String>>,
    /// Extra directory names to prune.
    pub exclude: Option<Vec<String>>,
    /// Regexes matched against relative paths to skip.
    pub exclude_paths: Option<Vec<String>>,
    /// Scores at or below this are not counted as used.
    pub threshold: Option<i64>,
    pub max_file_size: Option<u64>,
    /// Set to false to let an entity's defining file count as usage.
    pub exclude_definition: Option<bool>,
    /// Output configuration.
    pub output: Option<OutputConfig>,
    /// Where each entity type lives, relative to the root.
    pub paths: Option<PathsConfig>,
}

/// Output format configuration.
#[derive(Debug, Deserialize, Default)]
pub struct OutputConfig {
    /// Output format: "plain" or "json".
    pub format: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PathsConfig {
    pub routes: Option<String>,
    pub views: Option<String>,
    pub assets: Option<String>,
}

impl JanitorConfig {
    /// Scan options with this file's settings layered over the defaults.
    pub fn scan_options(&self) -> ScanOptions {
        let mut options = ScanOptions::default();
        if let Some(dirs) = &self.exclude {
            options.excluded_dirs.extend(dirs.iter().cloned());
        }
        if let Some(paths) = &self.exclude_paths {
            options.excluded_paths.extend(paths.iter().cloned());
        }
        if let Some(size) = self.max_file_size {
            options.max_file_size = size;
        }
        if let Some(exclude) = self.exclude_definition {
            options.exclude_definition = exclude;
        }
        options
    }

    pub fn wants_json(&self) -> bool {
        self.output
            .as_ref()
            .and_then(|o| o.format.as_deref())
            .is_some_and(|f| f.eq_ignore_ascii_case("json"))
    }
}

/// Loads configuration from janitor.toml if it exists.
pub fn load_config(root: &Path) -> Result<Option<JanitorConfig>> {
    let path = root.join("janitor.toml");
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let cfg = toml::from_str(&content).context("Invalid janitor.toml")?;
    Ok(Some(cfg))
}
