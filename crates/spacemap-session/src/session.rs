//! The scan / layout pair exposed to callers.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use spacemap_core::{Node, NodeId, ScanPolicy, ScanTree};
use spacemap_layout::{LayoutConfig, Rect, Treemap};
use spacemap_scan::{NativePlatform, Platform, Scanner};

use crate::error::SessionError;

/// Counts reported back after a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSummary {
    pub root_id: NodeId,
    pub file_count: u64,
    /// Directories scanned, the root included.
    pub dir_count: u64,
}

/// Owner of the current scan result.
///
/// A session keeps at most one tree alive: every successful [`scan`] replaces
/// the previous one, and [`layout`] requests address nodes of that tree by
/// id. Layouts never mutate the tree.
///
/// [`scan`]: Session::scan
/// [`layout`]: Session::layout
pub struct Session<P = NativePlatform> {
    scanner: Scanner<P>,
    treemap: Treemap,
    show_free_space: bool,
    current: Option<ScanTree>,
}

impl Session<NativePlatform> {
    pub fn new(policy: ScanPolicy, layout: LayoutConfig, max_workers: usize) -> Self {
        Self::with_platform(NativePlatform, policy, layout, max_workers)
    }
}

impl Default for Session<NativePlatform> {
    fn default() -> Self {
        Self::new(ScanPolicy::system_default(), LayoutConfig::default(), 0)
    }
}

impl<P: Platform> Session<P> {
    pub fn with_platform(
        platform: P,
        policy: ScanPolicy,
        layout: LayoutConfig,
        max_workers: usize,
    ) -> Self {
        Self {
            scanner: Scanner::with_platform(platform, policy, max_workers),
            treemap: Treemap::new(layout),
            show_free_space: true,
            current: None,
        }
    }

    /// Scan `path` and make the result the current tree.
    ///
    /// When the scanned directory is the root of a mounted volume, the
    /// volume's free space is added as a tile of its own. The previous tree
    /// is kept if the scan fails.
    pub fn scan(&mut self, path: impl AsRef<Path>) -> Result<ScanSummary, SessionError> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(SessionError::MissingPath);
        }

        let mut tree = self.scanner.scan(path)?;

        let platform = self.scanner.platform();
        if platform.is_mount_root(&tree.root_path) {
            match platform.disk_space(&tree.root_path) {
                Some(space) => tree.attach_free_space(space),
                None => tracing::debug!(
                    path = %tree.root_path.display(),
                    "disk usage unavailable, free space omitted"
                ),
            }
        }

        let summary = ScanSummary {
            // The scan root always takes the first id.
            root_id: tree.root_id().unwrap_or(NodeId::new(0)),
            file_count: tree.stats.files,
            dir_count: tree.stats.dirs,
        };
        self.current = Some(tree);
        Ok(summary)
    }

    /// Lay out the subtree of `node_id` in a `width` × `height` viewport.
    ///
    /// The id is checked before the dimensions.
    pub fn layout(&self, node_id: NodeId, width: i64, height: i64) -> Result<Vec<Rect>, SessionError> {
        let node = self
            .current
            .as_ref()
            .and_then(|tree| tree.node(node_id))
            .ok_or(SessionError::InvalidNodeId(node_id.0))?;

        if width <= 0 || height <= 0 {
            return Err(SessionError::InvalidDimensions { width, height });
        }

        let (width, height) = (width as f64, height as f64);
        if self.show_free_space || !node.children.iter().any(|c| c.is_free_space()) {
            return Ok(self.treemap.layout(Some(node), width, height));
        }

        let mut shown = Node::clone(node);
        shown.children.retain(|c| !c.is_free_space());
        Ok(self.treemap.layout(Some(&shown), width, height))
    }

    /// Whether free-space tiles take part in layouts.
    pub fn show_free_space(&self) -> bool {
        self.show_free_space
    }

    pub fn set_show_free_space(&mut self, show: bool) {
        self.show_free_space = show;
    }

    /// The current tree, if a scan has completed.
    pub fn tree(&self) -> Option<&ScanTree> {
        self.current.as_ref()
    }

    pub fn scanner(&self) -> &Scanner<P> {
        &self.scanner
    }

    pub fn treemap(&self) -> &Treemap {
        &self.treemap
    }

    /// Where to start when the caller has no path in mind.
    pub fn default_path(&self) -> PathBuf {
        self.scanner.platform().default_start_path()
    }
}
