//! Settings file for the command line.

use std::path::{Path, PathBuf};

use color_eyre::eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use spacemap_session::{LayoutConfig, ScanPolicy};

/// Contents of `config.toml`. Every table and key is optional.
///
/// ```toml
/// workers = 16
/// show_free_space = false
///
/// [policy]
/// min_file_size = 1024
/// excluded_paths = ["/proc", "/sys"]
///
/// [layout]
/// max_children = 500
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub policy: ScanPolicy,
    pub layout: LayoutConfig,
    /// Concurrent directory expansions (0 = automatic).
    pub workers: usize,
    pub show_free_space: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            policy: ScanPolicy::new(),
            layout: LayoutConfig::default(),
            workers: 0,
            show_free_space: true,
        }
    }
}

impl AppConfig {
    /// Default location of the settings file.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("spacemap").join("config.toml"))
    }

    /// Load an explicitly named file, or the default one when it exists.
    ///
    /// A named file must exist and parse; a missing default file just
    /// yields the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => match Self::config_path().filter(|path| path.is_file()) {
                Some(path) => Self::from_file(&path),
                None => Ok(Self::default()),
            },
        }
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        config
            .layout
            .validate()
            .map_err(|e| eyre!("Invalid [layout] in {}: {e}", path.display()))?;
        config
            .policy
            .validate()
            .with_context(|| format!("Invalid [policy] in {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }
}
