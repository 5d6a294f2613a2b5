//! Scan policy: what a scan keeps and what it drops.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::ScanError;

/// Exclusion and visibility rules applied while scanning.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ScanPolicy {
    /// Path prefixes that are never entered, matched per path component.
    #[builder(default)]
    #[serde(default)]
    pub excluded_paths: Vec<PathBuf>,

    /// Skip entries whose name starts with a dot.
    #[builder(default = "false")]
    #[serde(default)]
    pub skip_hidden: bool,

    /// Files strictly smaller than this many bytes are dropped.
    #[builder(default = "0")]
    #[serde(default)]
    pub min_file_size: u64,

    /// Accepted for configuration compatibility; symlinks are currently
    /// always skipped.
    #[builder(default = "false")]
    #[serde(default)]
    pub follow_symlinks: bool,

    /// Do not descend into network or FUSE mounts.
    #[builder(default = "false")]
    #[serde(default)]
    pub skip_network_filesystems: bool,

    /// Use the logical file length instead of allocated disk blocks.
    #[builder(default = "false")]
    #[serde(default)]
    pub apparent_size: bool,
}

impl ScanPolicyBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref excluded) = self.excluded_paths {
            if excluded.iter().any(|p| p.as_os_str().is_empty()) {
                return Err("Excluded path cannot be empty".to_string());
            }
        }
        Ok(())
    }
}

impl ScanPolicy {
    /// Create a new policy builder.
    pub fn builder() -> ScanPolicyBuilder {
        ScanPolicyBuilder::default()
    }

    /// A policy that keeps everything.
    pub fn new() -> Self {
        Self {
            excluded_paths: Vec::new(),
            skip_hidden: false,
            min_file_size: 0,
            follow_symlinks: false,
            skip_network_filesystems: false,
            apparent_size: false,
        }
    }

    /// The profile used for interactive whole-disk browsing: ignores files
    /// under 1 KiB, stays off network mounts and skips the usual virtual or
    /// system-managed trees of the current OS.
    pub fn system_default() -> Self {
        Self {
            excluded_paths: system_excluded_paths(),
            min_file_size: 1024,
            skip_network_filesystems: true,
            ..Self::new()
        }
    }

    /// Check if a path falls under one of the excluded prefixes.
    pub fn is_excluded(&self, path: &Path) -> bool {
        self.excluded_paths
            .iter()
            .any(|prefix| path_has_prefix(path, prefix))
    }

    /// Check if an entry name should be skipped as hidden.
    pub fn should_skip_hidden(&self, name: &OsStr) -> bool {
        self.skip_hidden && name.as_encoded_bytes().first() == Some(&b'.')
    }

    /// Check if a file of this size is kept.
    pub fn keeps_size(&self, size: u64) -> bool {
        size >= self.min_file_size
    }

    /// Re-check a policy that did not come from the builder, e.g. one read
    /// from a settings file.
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.excluded_paths.iter().any(|p| p.as_os_str().is_empty()) {
            return Err(ScanError::InvalidConfig {
                message: "Excluded path cannot be empty".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for ScanPolicy {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(windows))]
fn path_has_prefix(path: &Path, prefix: &Path) -> bool {
    path.starts_with(prefix)
}

#[cfg(windows)]
fn path_has_prefix(path: &Path, prefix: &Path) -> bool {
    let mut path = path.components();
    prefix.components().all(|want| {
        path.next().is_some_and(|got| {
            got.as_os_str()
                .to_string_lossy()
                .eq_ignore_ascii_case(&want.as_os_str().to_string_lossy())
        })
    })
}

#[cfg(target_os = "linux")]
fn system_excluded_paths() -> Vec<PathBuf> {
    [
        "/proc",
        "/sys",
        "/dev",
        "/run",
        "/var/lib/docker",
        "/var/log/lastlog",
        "/snap",
    ]
    .into_iter()
    .map(PathBuf::from)
    .collect()
}

#[cfg(target_os = "macos")]
fn system_excluded_paths() -> Vec<PathBuf> {
    [
        "/System",
        "/private/var/vm",
        "/Volumes/MobileBackups",
        "/Library/Application Support/MobileSync/Backup",
    ]
    .into_iter()
    .map(PathBuf::from)
    .collect()
}

#[cfg(windows)]
fn system_excluded_paths() -> Vec<PathBuf> {
    let windir = std::env::var_os("WINDIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(r"C:\Windows"));
    vec![
        PathBuf::from(r"C:\$Recycle.Bin"),
        PathBuf::from(r"C:\System Volume Information"),
        windir.join("WinSxS"),
        windir.join("Temp"),
    ]
}

#[cfg(not(any(target_os = "linux", target_os = "macos", windows)))]
fn system_excluded_paths() -> Vec<PathBuf> {
    Vec::new()
}
