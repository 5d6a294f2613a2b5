//! Hard-link deduplication.

use dashmap::DashSet;
use spacemap_core::HardLinkKey;

/// Remembers which file contents a scan has already counted.
///
/// Several directory entries can name the same inode; only the first one
/// observed keeps its size. Under concurrent expansion "first" is whichever
/// branch gets there first, so the surviving path may differ between runs
/// while the totals do not.
#[derive(Debug, Default)]
pub struct InodeTracker {
    seen: DashSet<HardLinkKey>,
}

impl InodeTracker {
    /// Create a new inode tracker.
    pub fn new() -> Self {
        Self {
            seen: DashSet::new(),
        }
    }

    /// Record a sighting. Returns `true` only for the first sighting of the
    /// key; check and insert happen under one shard lock.
    pub fn first_sighting(&self, key: HardLinkKey) -> bool {
        self.seen.insert(key)
    }

    /// Get the number of distinct keys seen.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Check if no keys have been seen.
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
