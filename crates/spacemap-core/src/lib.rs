//! Core types for spacemap.
//!
//! This crate provides the data structures shared by the scanner, the
//! treemap layout and their callers: nodes, the scan policy, the dense node
//! index and the scanned tree that owns them.

mod error;
mod node;
mod policy;
mod tree;

pub use error::ScanError;
pub use node::{DiskSpace, FREE_SPACE_NAME, HardLinkKey, Node, NodeId, NodeKind};
pub use policy::{ScanPolicy, ScanPolicyBuilder};
pub use tree::{NodeIndex, ScanStats, ScanTree};
