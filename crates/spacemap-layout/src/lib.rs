//! Treemap layout for spacemap.
//!
//! Turns a size-sorted [`Node`](spacemap_core::Node) subtree into a flat
//! list of pixel-snapped [`Rect`]s, ready to draw. The engine is pure and
//! single-threaded: no I/O, no shared state, so it may run concurrently on
//! any number of subtrees.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use spacemap_core::{Node, NodeId};
//! use spacemap_layout::{LayoutConfig, Treemap};
//!
//! let mut root = Node::new_directory(NodeId::new(0), None, "data", "/data", 0);
//! for (id, size) in [(1, 600), (2, 300), (3, 100)] {
//!     let name = format!("file{id}");
//!     let path = format!("/data/{name}");
//!     let file = Node::new_file(NodeId::new(id), NodeId::new(0), name, path, size, 1, None);
//!     root.children.push(Arc::new(file));
//! }
//! root.update_totals();
//!
//! let rects = Treemap::new(LayoutConfig::default()).layout(Some(&root), 400.0, 300.0);
//! assert_eq!(rects[0].w, 400);
//! assert_eq!(rects[0].children.len(), 3);
//! ```

mod config;
mod rect;
mod treemap;

pub use config::{LayoutConfig, LayoutConfigBuilder};
pub use rect::{OTHER_NAME, Rect};
pub use treemap::{Treemap, layout};
