//! Directory scanning engine for spacemap.
//!
//! # Overview
//!
//! `spacemap-scan` walks a directory tree and builds the immutable node
//! tree plus its id index. Key features:
//!
//! - **Bounded parallelism**: sibling directories are expanded on a rayon
//!   pool, limited by a shared, non-blocking token pool
//! - **Hard-link dedup**: content reachable through several links is
//!   counted once per scan
//! - **Platform adapter**: allocation sizes, mount detection and volume
//!   capacity come from a [`Platform`] implementation
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use spacemap_scan::{ScanPolicy, Scanner};
//!
//! let scanner = Scanner::new(ScanPolicy::system_default(), 0);
//! let tree = scanner.scan(Path::new("/home")).unwrap();
//!
//! println!("Total size: {} bytes", tree.total_size());
//! println!("Total files: {}", tree.stats.files);
//! ```

mod inode;
mod platform;
mod scanner;

pub use inode::InodeTracker;
pub use platform::{NativePlatform, Platform};
pub use scanner::Scanner;

// Re-export core types for convenience
pub use spacemap_core::{
    DiskSpace, HardLinkKey, Node, NodeId, NodeIndex, NodeKind, ScanError, ScanPolicy,
    ScanStats, ScanTree,
};
