//! Application configuration management.
//!
//! Configuration is stored at `~/.config/launchpad/config.json`. Every field
//! has a default, so a missing or partial file is fine. Command-line flags
//! (and `LAUNCHPAD_BASE`) take priority over what is stored here.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use launchpad_core::asset_cache::{DEFAULT_CACHE_NAME, DEFAULT_CORE_ASSETS};
use launchpad_core::SortMode;
use launchpad_core::Url;
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "launchpad";

/// Config file name
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Directory or URL hosting the launcher site.
    pub base: Option<String>,
    pub default_sort: SortMode,
    /// Serve same-origin assets from the on-disk cache.
    pub offline_cache: bool,
    pub cache_name: String,
    pub core_assets: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base: None,
            default_sort: SortMode::default(),
            offline_cache: true,
            cache_name: DEFAULT_CACHE_NAME.to_string(),
            core_assets: DEFAULT_CORE_ASSETS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Invalid config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Root directory for asset stores and log files.
    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Resolve the site base. `cli_base` wins over the configured one; with
    /// neither, the current directory is the site.
    pub fn base_url(&self, cli_base: Option<&str>) -> Result<Url> {
        match cli_base.or(self.base.as_deref()) {
            Some(raw) => parse_base(raw),
            None => {
                let cwd = std::env::current_dir().context("Could not read current directory")?;
                directory_url(&cwd)
            }
        }
    }
}

/// Accept an http(s)/file URL or a local directory path.
pub fn parse_base(raw: &str) -> Result<Url> {
    let raw = raw.trim();
    if let Ok(mut url) = Url::parse(raw) {
        if matches!(url.scheme(), "http" | "https" | "file") {
            // Joining against "…/launcher" would drop the last segment
            if !url.path().ends_with('/') {
                let path = format!("{}/", url.path());
                url.set_path(&path);
            }
            return Ok(url);
        }
    }

    let path = PathBuf::from(raw);
    let path = std::fs::canonicalize(&path)
        .with_context(|| format!("Site directory not found: {}", path.display()))?;
    directory_url(&path)
}

fn directory_url(path: &Path) -> Result<Url> {
    Url::from_directory_path(path)
        .map_err(|_| anyhow::anyhow!("Not an absolute directory: {}", path.display()))
}
