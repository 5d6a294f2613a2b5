//! Caller-facing operations of spacemap.
//!
//! A [`Session`] ties the scanner and the treemap together: `scan` builds a
//! tree and keeps it as the current one, `layout` projects any of its nodes
//! into rectangles by id. Bindings (a CLI, an HTTP or IPC layer) only talk
//! to this crate.
//!
//! # Example
//!
//! ```rust,no_run
//! use spacemap_session::{LayoutConfig, ScanPolicy, Session};
//!
//! let mut session = Session::new(ScanPolicy::system_default(), LayoutConfig::default(), 0);
//! let summary = session.scan("/home").unwrap();
//! let rects = session.layout(summary.root_id, 1280, 800).unwrap();
//!
//! println!("{} files, {} rects", summary.file_count, rects.len());
//! ```

mod error;
mod session;

pub use error::SessionError;
pub use session::{ScanSummary, Session};

// Re-export the types callers need to drive a session
pub use spacemap_core::{DiskSpace, Node, NodeId, ScanError, ScanPolicy, ScanTree};
pub use spacemap_layout::{LayoutConfig, Rect};
pub use spacemap_scan::{NativePlatform, Platform};
