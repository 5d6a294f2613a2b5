//! Windows implementations.
//!
//! Std metadata on Windows exposes neither allocation size nor a stable file
//! index, so sizes are logical and hard links are not deduplicated.

use std::fs::Metadata;
use std::path::{Component, Path, PathBuf, Prefix};

use spacemap_core::{DiskSpace, HardLinkKey};

pub(super) fn allocated_size(metadata: &Metadata) -> u64 {
    metadata.len()
}

pub(super) fn hard_link_key(_metadata: &Metadata) -> Option<HardLinkKey> {
    None
}

/// Drive roots (`D:\`) and UNC share roots (`\\server\share`) have no parent.
pub(super) fn is_mount_root(path: &Path) -> bool {
    path.parent().is_none()
}

pub(super) fn disk_space(path: &Path) -> Option<DiskSpace> {
    let stats = match fs4::statvfs(path) {
        Ok(stats) => stats,
        Err(err) => {
            tracing::debug!(path = %path.display(), error = %err, "volume query failed");
            return None;
        }
    };
    Some(DiskSpace::new(stats.total_space(), stats.free_space()))
}

pub(super) fn is_network_filesystem(path: &Path) -> bool {
    matches!(
        path.components().next(),
        Some(Component::Prefix(prefix))
            if matches!(prefix.kind(), Prefix::UNC(..) | Prefix::VerbatimUNC(..))
    )
}

/// Root of the system drive, e.g. `C:\`.
pub(super) fn default_start_path() -> Option<PathBuf> {
    let drive = std::env::var("SystemDrive").unwrap_or_else(|_| "C:".to_string());
    let root = PathBuf::from(format!("{drive}\\"));
    root.is_dir().then_some(root)
}
