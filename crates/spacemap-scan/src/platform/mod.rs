//! Operating-system facts the scanner depends on.
//!
//! The scanner never branches on the target OS itself; everything that
//! differs between platforms goes through [`Platform`]. The default method
//! bodies are the portable behaviour, and [`NativePlatform`] overrides them
//! with what the current OS can report.

use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};

use compact_str::CompactString;
use spacemap_core::{DiskSpace, HardLinkKey};

#[cfg(unix)]
mod unix;
#[cfg(unix)]
use unix as sys;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
use windows as sys;

/// Capability interface injected into the scanner.
pub trait Platform: Send + Sync {
    /// Resolve a user-supplied path to the canonical form used for scanning.
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        dunce::canonicalize(path)
    }

    /// Human-readable label: the entry name, or the whole path for a
    /// volume root such as `/` or `C:\`.
    fn base_name(&self, path: &Path) -> CompactString {
        match path.file_name() {
            Some(name) => CompactString::new(name.to_string_lossy()),
            None => CompactString::new(path.to_string_lossy()),
        }
    }

    /// Check if a path is the top of a mounted volume.
    fn is_mount_root(&self, path: &Path) -> bool {
        path.parent().is_none()
    }

    /// Bytes a file occupies on disk.
    fn allocated_size(&self, metadata: &Metadata) -> u64 {
        metadata.len()
    }

    /// Identity shared by all hard links to the same content, if the
    /// platform exposes one and the file can have other names.
    fn hard_link_key(&self, _metadata: &Metadata) -> Option<HardLinkKey> {
        None
    }

    /// Capacity of the volume holding `path`.
    fn disk_space(&self, _path: &Path) -> Option<DiskSpace> {
        None
    }

    /// Check if `path` lives on a network or FUSE filesystem.
    fn is_network_filesystem(&self, _path: &Path) -> bool {
        false
    }

    /// Where browsing starts when the user names no path.
    fn default_start_path(&self) -> PathBuf {
        home_or_root()
    }
}

/// The user's home directory, or the filesystem root when there is none.
fn home_or_root() -> PathBuf {
    dirs::home_dir()
        .filter(|home| home.is_dir())
        .unwrap_or_else(|| PathBuf::from(std::path::MAIN_SEPARATOR_STR))
}

/// The platform the binary was compiled for.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativePlatform;

#[cfg(any(unix, windows))]
impl Platform for NativePlatform {
    fn is_mount_root(&self, path: &Path) -> bool {
        sys::is_mount_root(path)
    }

    fn allocated_size(&self, metadata: &Metadata) -> u64 {
        sys::allocated_size(metadata)
    }

    fn hard_link_key(&self, metadata: &Metadata) -> Option<HardLinkKey> {
        sys::hard_link_key(metadata)
    }

    fn disk_space(&self, path: &Path) -> Option<DiskSpace> {
        sys::disk_space(path)
    }

    fn is_network_filesystem(&self, path: &Path) -> bool {
        sys::is_network_filesystem(path)
    }

    fn default_start_path(&self) -> PathBuf {
        sys::default_start_path().unwrap_or_else(home_or_root)
    }
}

#[cfg(not(any(unix, windows)))]
impl Platform for NativePlatform {}

#[cfg(test)]
mod tests {
    use super::*;

    struct Portable;

    impl Platform for Portable {}

    #[test]
    fn test_base_name() {
        let platform = Portable;
        assert_eq!(platform.base_name(Path::new("/home/user/docs")).as_str(), "docs");
        #[cfg(unix)]
        assert_eq!(platform.base_name(Path::new("/")).as_str(), "/");
    }

    #[test]
    fn test_default_mount_root() {
        let platform = Portable;
        #[cfg(unix)]
        assert!(platform.is_mount_root(Path::new("/")));
        assert!(!platform.is_mount_root(Path::new("/home/user")));
    }

    #[test]
    fn test_default_sizes_are_logical() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), vec![0u8; 1500]).unwrap();
        let metadata = std::fs::metadata(temp.path()).unwrap();

        assert_eq!(Portable.allocated_size(&metadata), 1500);
        assert_eq!(Portable.hard_link_key(&metadata), None);
    }

    #[test]
    fn test_canonicalize_missing_path_fails() {
        let temp = tempfile::TempDir::new().unwrap();
        let missing = temp.path().join("does-not-exist");
        assert!(Portable.canonicalize(&missing).is_err());
    }

    #[test]
    fn test_default_start_path_is_a_directory() {
        assert!(Portable.default_start_path().is_dir());
        assert!(NativePlatform.default_start_path().is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn test_native_disk_space_of_root() {
        let space = NativePlatform.disk_space(Path::new("/"));
        if let Some(space) = space {
            assert!(space.total >= space.free);
        }
    }

    #[cfg(windows)]
    #[test]
    fn test_native_disk_space_of_system_drive() {
        let drive = NativePlatform.default_start_path();
        let space = NativePlatform.disk_space(&drive).unwrap();
        assert!(space.total > 0);
        assert!(space.total >= space.free);
    }
}
