//! Scanned tree container and its dense node index.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use crate::node::{DiskSpace, Node, NodeId};
use crate::policy::ScanPolicy;

/// Dense, id-addressed view of every node produced by one scan.
///
/// Slot `i` holds the node whose id is `i`. The slots hold the same `Arc`s
/// as the tree, so a lookup never walks the filesystem or the tree.
#[derive(Debug, Clone, Default)]
pub struct NodeIndex {
    slots: Vec<Option<Arc<Node>>>,
}

impl NodeIndex {
    /// Wrap slots collected during a scan.
    pub fn from_slots(slots: Vec<Option<Arc<Node>>>) -> Self {
        Self { slots }
    }

    /// Look up a node by id. Returns `None` past the end or for an empty slot.
    pub fn get(&self, id: NodeId) -> Option<&Arc<Node>> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    /// Number of slots (the highest id handed out plus one).
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Iterate over the occupied slots in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Node>> {
        self.slots.iter().flatten()
    }

    /// Point the slot of `node.id` at a new version of that node.
    pub fn replace(&mut self, node: Arc<Node>) {
        if let Some(slot) = node.id.and_then(|id| self.slots.get_mut(id.index())) {
            *slot = Some(node);
        }
    }
}

/// Entry counts gathered while scanning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    /// Retained files.
    pub files: u64,
    /// Expanded directories, the root included.
    pub dirs: u64,
}

/// Complete result of one scan: the size-annotated tree plus its index.
///
/// The tree is immutable once returned and can be shared across threads
/// for layout and rendering.
#[derive(Debug, Clone)]
pub struct ScanTree {
    /// Root node of the tree.
    pub root: Arc<Node>,

    /// Every scanned node, addressed by id.
    pub index: NodeIndex,

    /// Canonical root path that was scanned.
    pub root_path: PathBuf,

    /// Entry counts.
    pub stats: ScanStats,

    /// Policy the scan ran with.
    pub policy: ScanPolicy,

    /// When this scan was performed.
    pub scanned_at: SystemTime,

    /// Duration of the scan.
    pub scan_duration: Duration,
}

impl ScanTree {
    /// Create a new scan tree.
    pub fn new(
        root: Arc<Node>,
        index: NodeIndex,
        root_path: PathBuf,
        stats: ScanStats,
        policy: ScanPolicy,
        scan_duration: Duration,
    ) -> Self {
        Self {
            root,
            index,
            root_path,
            stats,
            policy,
            scanned_at: SystemTime::now(),
            scan_duration,
        }
    }

    /// Id of the root node.
    pub fn root_id(&self) -> Option<NodeId> {
        self.root.id
    }

    /// Look up a node by id.
    pub fn node(&self, id: NodeId) -> Option<&Arc<Node>> {
        self.index.get(id)
    }

    /// Get the total size of the tree.
    pub fn total_size(&self) -> u64 {
        self.root.size
    }

    /// Add the free space of the scanned volume as a sibling tile of the
    /// root's children.
    ///
    /// The tile competes for area like any file, but it is not part of the
    /// scanned bytes: the root's own size keeps reporting used space.
    pub fn attach_free_space(&mut self, space: DiskSpace) {
        let root = Arc::make_mut(&mut self.root);
        root.children.retain(|child| !child.is_free_space());
        let tile = Node::new_free_space(root, space.free);
        root.children.push(Arc::new(tile));
        root.sort_children();
        root.disk = Some(space);

        self.index.replace(Arc::clone(&self.root));
    }
}
