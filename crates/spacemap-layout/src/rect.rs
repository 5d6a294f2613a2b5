//! Draw-ready rectangles.

use std::path::PathBuf;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use spacemap_core::NodeId;

/// Name of the bucket that stands in for folded children.
pub const OTHER_NAME: &str = "[Other]";

/// One pixel-snapped box of a treemap, carrying enough of its node that a
/// renderer needs no second lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub w: i64,
    pub h: i64,

    /// Originating node; `None` for synthetic tiles.
    pub node_id: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<NodeId>,

    /// Indices of this rect's emitted children in the same layout.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<usize>,

    pub full_path: PathBuf,
    pub name: CompactString,
    pub size: u64,
    pub is_folder: bool,
    pub is_free_space: bool,
    #[serde(default)]
    pub is_other: bool,

    /// Depth of the node in the scanned tree.
    pub depth: u32,
    /// Nesting level within this layout (the layout root is 0).
    pub level: u32,

    /// Volume capacity, on an augmented mount root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_free: Option<u64>,

    /// Modification time as Unix seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtime: Option<i64>,
}

impl Rect {
    pub fn area(&self) -> i64 {
        self.w * self.h
    }

    pub fn right(&self) -> i64 {
        self.x + self.w
    }

    pub fn bottom(&self) -> i64 {
        self.y + self.h
    }
}
