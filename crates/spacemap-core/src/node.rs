//! Scanned filesystem nodes.

use std::cmp::Ordering;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Name given to the synthetic free-space tile.
pub const FREE_SPACE_NAME: &str = "[Free Disk Space]";

/// Dense identifier of a node within one scan.
///
/// Ids are handed out from zero upwards and double as the position of the
/// node in the [`NodeIndex`](crate::NodeIndex).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl NodeId {
    /// Create a new NodeId from a u64.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Position of this node in a dense index.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Identity shared by every directory entry that points at the same file
/// content (device + inode, or the platform equivalent).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HardLinkKey {
    /// Device ID.
    pub device: u64,
    /// Inode number.
    pub inode: u64,
}

impl HardLinkKey {
    /// Create a new hard-link key.
    pub fn new(device: u64, inode: u64) -> Self {
        Self { device, inode }
    }
}

/// Capacity figures of a mounted volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskSpace {
    /// Total bytes on the volume.
    pub total: u64,
    /// Bytes still free.
    pub free: u64,
}

impl DiskSpace {
    pub fn new(total: u64, free: u64) -> Self {
        Self { total, free }
    }

    pub fn used(&self) -> u64 {
        self.total.saturating_sub(self.free)
    }
}

/// Type of node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Regular file.
    File,
    /// Directory.
    Directory {
        /// Retained files anywhere below this directory.
        file_count: u64,
        /// Retained directories below this directory (excluding itself).
        dir_count: u64,
    },
    /// Synthetic tile standing for the free space of a mounted volume.
    FreeSpace,
}

impl NodeKind {
    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, NodeKind::Directory { .. })
    }

    /// Check if this is a regular file.
    pub fn is_file(&self) -> bool {
        matches!(self, NodeKind::File)
    }

    /// Check if this is the free-space tile.
    pub fn is_free_space(&self) -> bool {
        matches!(self, NodeKind::FreeSpace)
    }
}

/// One scanned entry: a file, a directory or a synthetic placeholder.
///
/// Nodes are built bottom-up by the scanner and are immutable once wrapped
/// in an [`Arc`]; the tree and the index share the same allocations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Position in the scan's index; `None` for synthetic tiles.
    pub id: Option<NodeId>,

    /// Enclosing directory; `None` for the scan root.
    pub parent_id: Option<NodeId>,

    /// Entry name (the whole path for a volume root).
    pub name: CompactString,

    /// Canonical path of the entry.
    pub full_path: PathBuf,

    /// Size in bytes (aggregate of retained descendants for directories).
    pub size: u64,

    /// Node type and associated counters.
    pub kind: NodeKind,

    /// Distance from the scan root (root = 0).
    pub depth: u32,

    /// Last modification time, when known.
    pub modified: Option<SystemTime>,

    /// Volume capacity; only set on a mount root that was augmented with
    /// its free space.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk: Option<DiskSpace>,

    /// Children, sorted by size descending.
    pub children: Vec<Arc<Node>>,
}

impl Node {
    /// Create an empty directory node.
    pub fn new_directory(
        id: NodeId,
        parent_id: Option<NodeId>,
        name: impl Into<CompactString>,
        full_path: impl Into<PathBuf>,
        depth: u32,
    ) -> Self {
        Self {
            id: Some(id),
            parent_id,
            name: name.into(),
            full_path: full_path.into(),
            size: 0,
            kind: NodeKind::Directory {
                file_count: 0,
                dir_count: 0,
            },
            depth,
            modified: None,
            disk: None,
            children: Vec::new(),
        }
    }

    /// Create a file leaf.
    pub fn new_file(
        id: NodeId,
        parent_id: NodeId,
        name: impl Into<CompactString>,
        full_path: impl Into<PathBuf>,
        size: u64,
        depth: u32,
        modified: Option<SystemTime>,
    ) -> Self {
        Self {
            id: Some(id),
            parent_id: Some(parent_id),
            name: name.into(),
            full_path: full_path.into(),
            size,
            kind: NodeKind::File,
            depth,
            modified,
            disk: None,
            children: Vec::new(),
        }
    }

    /// Create the free-space tile placed under a mount root.
    pub fn new_free_space(parent: &Node, free: u64) -> Self {
        Self {
            id: None,
            parent_id: parent.id,
            name: FREE_SPACE_NAME.into(),
            full_path: parent.full_path.clone(),
            size: free,
            kind: NodeKind::FreeSpace,
            depth: parent.depth + 1,
            modified: None,
            disk: None,
            children: Vec::new(),
        }
    }

    /// Check if this node is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }

    /// Check if this node is a file.
    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }

    /// Check if this node is the free-space tile.
    pub fn is_free_space(&self) -> bool {
        self.kind.is_free_space()
    }

    /// Get the number of direct children.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Get file count for directories, 1 for files.
    pub fn file_count(&self) -> u64 {
        match self.kind {
            NodeKind::Directory { file_count, .. } => file_count,
            NodeKind::File => 1,
            NodeKind::FreeSpace => 0,
        }
    }

    /// Get directory count for directories.
    pub fn dir_count(&self) -> u64 {
        match self.kind {
            NodeKind::Directory { dir_count, .. } => dir_count,
            _ => 0,
        }
    }

    /// Modification time as Unix seconds.
    pub fn mtime(&self) -> Option<i64> {
        self.modified.map(|time| DateTime::<Utc>::from(time).timestamp())
    }

    /// Re-establish the size-descending order of the direct children.
    pub fn sort_children(&mut self) {
        self.children.sort_by(|a, b| by_size_desc(a, b));
    }

    /// Recompute size and subtree counters from the direct children.
    pub fn update_totals(&mut self) {
        let mut size = 0;
        let mut files = 0;
        let mut dirs = 0;

        for child in &self.children {
            match child.kind {
                NodeKind::File => {
                    size += child.size;
                    files += 1;
                }
                NodeKind::Directory {
                    file_count,
                    dir_count,
                } => {
                    size += child.size;
                    files += file_count;
                    dirs += dir_count + 1;
                }
                NodeKind::FreeSpace => {}
            }
        }

        if let NodeKind::Directory {
            ref mut file_count,
            ref mut dir_count,
        } = self.kind
        {
            self.size = size;
            *file_count = files;
            *dir_count = dirs;
        }
    }
}

impl Drop for Node {
    /// Unlinks uniquely owned descendants one at a time, so dropping a very
    /// deep tree does not recurse once per level.
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(child) = pending.pop() {
            if let Ok(mut node) = Arc::try_unwrap(child) {
                pending.append(&mut node.children);
            }
        }
    }
}

/// Largest first; equal sizes fall back to the name so sibling order never
/// depends on scheduling.
fn by_size_desc(a: &Node, b: &Node) -> Ordering {
    b.size.cmp(&a.size).then_with(|| a.name.cmp(&b.name))
}
