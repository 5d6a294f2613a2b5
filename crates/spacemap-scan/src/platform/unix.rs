//! Unix implementations backed by `stat`, `statvfs` and `statfs`.

use std::ffi::CString;
use std::fs::{self, Metadata};
use std::mem::MaybeUninit;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

use spacemap_core::{DiskSpace, HardLinkKey};

/// `st_blocks` is always counted in 512-byte units.
pub(super) fn allocated_size(metadata: &Metadata) -> u64 {
    metadata.blocks() * 512
}

/// Files with a single link can never be met twice, so they get no key and
/// never enter the dedup set.
pub(super) fn hard_link_key(metadata: &Metadata) -> Option<HardLinkKey> {
    (metadata.nlink() > 1).then(|| HardLinkKey::new(metadata.dev(), metadata.ino()))
}

/// A path is a mount root when it is `/` or sits on a different device than
/// its parent.
pub(super) fn is_mount_root(path: &Path) -> bool {
    let Some(parent) = path.parent() else {
        return true;
    };
    match (fs::metadata(path), fs::metadata(parent)) {
        (Ok(here), Ok(above)) => here.dev() != above.dev(),
        _ => false,
    }
}

pub(super) fn disk_space(path: &Path) -> Option<DiskSpace> {
    let c_path = CString::new(path.as_os_str().as_bytes()).ok()?;

    let mut stat = MaybeUninit::<libc::statvfs>::uninit();
    let rc = unsafe { libc::statvfs(c_path.as_ptr(), stat.as_mut_ptr()) };
    if rc != 0 {
        tracing::debug!(
            path = %path.display(),
            error = %std::io::Error::last_os_error(),
            "statvfs failed"
        );
        return None;
    }

    let stat = unsafe { stat.assume_init() };
    let frsize = if stat.f_frsize > 0 {
        stat.f_frsize as u64
    } else {
        stat.f_bsize as u64
    };

    Some(DiskSpace::new(
        (stat.f_blocks as u64).saturating_mul(frsize),
        (stat.f_bfree as u64).saturating_mul(frsize),
    ))
}

#[cfg(target_os = "linux")]
pub(super) fn is_network_filesystem(path: &Path) -> bool {
    const NFS_SUPER_MAGIC: u32 = 0x6969;
    const CIFS_SUPER_MAGIC: u32 = 0xFF53_4D42;
    const SMB2_SUPER_MAGIC: u32 = 0xFE53_4D42;
    const FUSE_SUPER_MAGIC: u32 = 0x6573_5546;
    const AUTOFS_SUPER_MAGIC: u32 = 0x0187;

    // GVfs user mounts
    if path.starts_with("/run/user") && path.components().any(|c| c.as_os_str() == "gvfs") {
        return true;
    }

    let Ok(c_path) = CString::new(path.as_os_str().as_bytes()) else {
        return false;
    };
    let mut stat = MaybeUninit::<libc::statfs>::uninit();
    let rc = unsafe { libc::statfs(c_path.as_ptr(), stat.as_mut_ptr()) };
    if rc != 0 {
        return false;
    }
    let stat = unsafe { stat.assume_init() };

    matches!(
        stat.f_type as u32,
        NFS_SUPER_MAGIC | CIFS_SUPER_MAGIC | SMB2_SUPER_MAGIC | FUSE_SUPER_MAGIC | AUTOFS_SUPER_MAGIC
    )
}

#[cfg(target_os = "macos")]
pub(super) fn is_network_filesystem(path: &Path) -> bool {
    let Ok(c_path) = CString::new(path.as_os_str().as_bytes()) else {
        return false;
    };
    let mut stat = MaybeUninit::<libc::statfs>::uninit();
    let rc = unsafe { libc::statfs(c_path.as_ptr(), stat.as_mut_ptr()) };
    if rc != 0 {
        return false;
    }
    let stat = unsafe { stat.assume_init() };

    let fs_type: String = stat
        .f_fstypename
        .iter()
        .take_while(|&&c| c != 0)
        .map(|&c| c as u8 as char)
        .collect();

    ["smbfs", "webdav", "nfs", "afpfs"]
        .iter()
        .any(|prefix| fs_type.starts_with(prefix))
        || fs_type.contains("fuse")
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
pub(super) fn is_network_filesystem(_path: &Path) -> bool {
    false
}

/// The directory holding every user's home, when the system has one.
pub(super) fn default_start_path() -> Option<PathBuf> {
    let users = if cfg!(target_os = "macos") {
        "/Users"
    } else {
        "/home"
    };
    let users = Path::new(users);
    users.is_dir().then(|| users.to_path_buf())
}
