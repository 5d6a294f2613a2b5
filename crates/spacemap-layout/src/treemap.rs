//! Squarified treemap layout.
//!
//! The layout walks the tree with an explicit stack, so nesting depth is
//! bounded by memory rather than by the call stack. Every folder frame is
//! subdivided in three steps:
//!
//! 1. shrink the frame by the padding and the label strip,
//! 2. pick the children worth placing, folding the tail into "[Other]",
//! 3. place them with the squarified algorithm of Bruls, Huizing and van
//!    Wijk, one row (or column) at a time along the longer side.
//!
//! Areas are always proportional to the full size of the folder, so mass
//! that ends up too small to draw is left as blank space instead of being
//! handed to the visible siblings.

use spacemap_core::Node;

use crate::config::LayoutConfig;
use crate::rect::{OTHER_NAME, Rect};

/// Emitted child boxes grow by this many pixels, centred, so rounding leaves
/// no hairline seams between neighbours.
const SEAM_OVERLAP: f64 = 1.0;

/// Treemap engine bound to one set of tunables.
///
/// Layouts are pure functions of the node, the viewport and the config; the
/// engine holds no state between calls and can be shared freely.
#[derive(Debug, Clone, Default)]
pub struct Treemap {
    config: LayoutConfig,
}

impl Treemap {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Lay out `root` and its descendants in a `width` × `height` viewport.
    ///
    /// The first rect is always the root itself, covering the whole
    /// viewport. Returns an empty vector when there is no root or the
    /// viewport is empty.
    pub fn layout(&self, root: Option<&Node>, width: f64, height: f64) -> Vec<Rect> {
        let Some(root) = root else {
            return Vec::new();
        };
        if !(width > 0.0 && height > 0.0) {
            return Vec::new();
        }

        let bounds = Bounds {
            x: 0.0,
            y: 0.0,
            w: width,
            h: height,
        };
        let mut out = Vec::with_capacity(256);
        let at = emit(&mut out, Tile::Node(root), bounds, 0);
        let mut stack = vec![Frame {
            node: root,
            bounds,
            level: 0,
            at,
        }];

        while let Some(frame) = stack.pop() {
            self.subdivide(frame, &mut out, &mut stack);
        }

        tracing::trace!(rects = out.len(), width, height, "treemap laid out");
        out
    }

    fn subdivide<'a>(&self, frame: Frame<'a>, out: &mut Vec<Rect>, stack: &mut Vec<Frame<'a>>) {
        let node = frame.node;
        if !node.is_dir() || node.children.is_empty() {
            return;
        }

        let min_side = self.config.scaled_min_side();
        let inner = frame.bounds.inset(
            self.config.scaled_padding(),
            self.config.scaled_label_height(),
        );
        if inner.w < min_side || inner.h < min_side {
            return;
        }

        let total: u64 = node.children.iter().map(|c| c.size).sum();
        let area = inner.w * inner.h;
        if total == 0 || area <= 0.0 {
            return;
        }

        let tiles = self.select(node, total as f64, area);
        let parent = Parent {
            at: frame.at,
            level: frame.level + 1,
        };
        self.squarify(&tiles, inner, parent, out, stack);
    }

    /// Children to place, with their share of `area`, largest first.
    ///
    /// Past `max_children`, and below `min_area`, children are folded into a
    /// single "[Other]" tile inserted at its size-ordered position.
    fn select<'a>(&self, parent: &'a Node, total: f64, area: f64) -> Vec<(Tile<'a>, f64)> {
        let cap = match self.config.max_children {
            0 => usize::MAX,
            n => n,
        };
        let min_area = self.config.scaled_min_area();
        let share = |size: u64| size as f64 / total * area;

        let mut tiles = Vec::with_capacity(parent.children.len().min(cap) + 1);
        let mut folded = 0u64;
        for (rank, child) in parent.children.iter().filter(|c| c.size > 0).enumerate() {
            let child_area = share(child.size);
            if rank >= cap || child_area < min_area {
                folded += child.size;
            } else {
                tiles.push((Tile::Node(child.as_ref()), child_area));
            }
        }

        if folded > 0 {
            let at = tiles.partition_point(|(tile, _)| tile.size() >= folded);
            tiles.insert(
                at,
                (
                    Tile::Other {
                        parent,
                        size: folded,
                    },
                    share(folded),
                ),
            );
        }
        tiles
    }

    fn squarify<'a>(
        &self,
        tiles: &[(Tile<'a>, f64)],
        bounds: Bounds,
        parent: Parent,
        out: &mut Vec<Rect>,
        stack: &mut Vec<Frame<'a>>,
    ) {
        let min_side = self.config.scaled_min_side();
        let mut rest = bounds;
        let mut next = 0;

        while next < tiles.len() && rest.w > 0.0 && rest.h > 0.0 {
            let long = rest.w.max(rest.h);
            let start = next;
            let mut row = Row::EMPTY;
            while next < tiles.len() {
                let grown = row.push(tiles[next].1);
                if row.sum > 0.0 && grown.worst(long) > row.worst(long) {
                    break;
                }
                row = grown;
                next += 1;
            }
            if row.sum <= 0.0 {
                break;
            }

            let horizontal = rest.w >= rest.h;
            let thickness = row.sum / long;
            let (band, remaining) = rest.split(thickness, horizontal);

            // A band too thin to draw stays blank; the cursor still moves past it.
            if thickness.floor() >= min_side {
                self.place_row(&tiles[start..next], band, horizontal, parent, out, stack);
            }

            rest = remaining;
            if rest.w < min_side || rest.h < min_side {
                break;
            }
        }
    }

    /// Place one closed row inside `band`. Boxes that round below the
    /// minimum side are skipped, but their breadth is still consumed.
    fn place_row<'a>(
        &self,
        row: &[(Tile<'a>, f64)],
        band: Bounds,
        horizontal: bool,
        parent: Parent,
        out: &mut Vec<Rect>,
        stack: &mut Vec<Frame<'a>>,
    ) {
        let min_side = self.config.scaled_min_side();
        let thickness = if horizontal { band.h } else { band.w };
        let mut offset = 0.0;

        for &(tile, area) in row {
            let breadth = area / thickness;
            let cell = if horizontal {
                Bounds {
                    x: band.x + offset,
                    w: breadth,
                    ..band
                }
            } else {
                Bounds {
                    y: band.y + offset,
                    h: breadth,
                    ..band
                }
            }
            .overlapped();
            offset += breadth;

            let (_, _, w, h) = cell.snap();
            if (w as f64) < min_side || (h as f64) < min_side {
                continue;
            }

            let at = emit(out, tile, cell, parent.level);
            out[parent.at].children.push(at);

            if let Tile::Node(node) = tile {
                if node.is_dir() && !node.children.is_empty() {
                    stack.push(Frame {
                        node,
                        bounds: cell,
                        level: parent.level,
                        at,
                    });
                }
            }
        }
    }
}

/// Lay out `root` with the given tunables.
pub fn layout(root: Option<&Node>, width: f64, height: f64, config: &LayoutConfig) -> Vec<Rect> {
    Treemap::new(config.clone()).layout(root, width, height)
}

/// Unrounded box in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Bounds {
    x: f64,
    y: f64,
    w: f64,
    h: f64,
}

impl Bounds {
    /// Round both corners independently and derive the size from them, so
    /// adjacent boxes share edges exactly.
    fn snap(self) -> (i64, i64, i64, i64) {
        let x1 = self.x.round();
        let y1 = self.y.round();
        let x2 = (self.x + self.w).round();
        let y2 = (self.y + self.h).round();
        (
            x1 as i64,
            y1 as i64,
            (x2 - x1).max(0.0) as i64,
            (y2 - y1).max(0.0) as i64,
        )
    }

    fn inset(self, padding: f64, label_height: f64) -> Self {
        Self {
            x: self.x + padding,
            y: self.y + padding + label_height,
            w: self.w - 2.0 * padding,
            h: self.h - 2.0 * padding - label_height,
        }
    }

    fn overlapped(self) -> Self {
        Self {
            x: self.x - SEAM_OVERLAP / 2.0,
            y: self.y - SEAM_OVERLAP / 2.0,
            w: self.w + SEAM_OVERLAP,
            h: self.h + SEAM_OVERLAP,
        }
    }

    /// Cut a band of `thickness` off the top (horizontal) or the left side,
    /// returning the band and what remains.
    fn split(self, thickness: f64, horizontal: bool) -> (Self, Self) {
        if horizontal {
            (
                Self {
                    h: thickness,
                    ..self
                },
                Self {
                    y: self.y + thickness,
                    h: self.h - thickness,
                    ..self
                },
            )
        } else {
            (
                Self {
                    w: thickness,
                    ..self
                },
                Self {
                    x: self.x + thickness,
                    w: self.w - thickness,
                    ..self
                },
            )
        }
    }
}

/// Something that gets a box of its own.
#[derive(Debug, Clone, Copy)]
enum Tile<'a> {
    Node(&'a Node),
    Other { parent: &'a Node, size: u64 },
}

impl Tile<'_> {
    fn size(&self) -> u64 {
        match self {
            Tile::Node(node) => node.size,
            Tile::Other { size, .. } => *size,
        }
    }
}

/// A folder whose box is emitted and whose children still need placing.
struct Frame<'a> {
    node: &'a Node,
    bounds: Bounds,
    level: u32,
    at: usize,
}

/// Where placed children are attached.
#[derive(Debug, Clone, Copy)]
struct Parent {
    at: usize,
    level: u32,
}

/// Running aggregates of the row being grown.
#[derive(Debug, Clone, Copy)]
struct Row {
    sum: f64,
    min: f64,
    max: f64,
}

impl Row {
    const EMPTY: Row = Row {
        sum: 0.0,
        min: f64::INFINITY,
        max: 0.0,
    };

    fn push(self, area: f64) -> Self {
        Self {
            sum: self.sum + area,
            min: self.min.min(area),
            max: self.max.max(area),
        }
    }

    /// Worst aspect ratio among the row's boxes when laid along `long`.
    fn worst(&self, long: f64) -> f64 {
        let thickness = self.sum / long;
        let t2 = thickness * thickness;
        (self.max / t2).max(t2 / self.min)
    }
}

fn emit(out: &mut Vec<Rect>, tile: Tile<'_>, bounds: Bounds, level: u32) -> usize {
    let (x, y, w, h) = bounds.snap();
    let rect = match tile {
        Tile::Node(node) => Rect {
            x,
            y,
            w,
            h,
            node_id: node.id,
            parent_id: node.parent_id,
            children: Vec::new(),
            full_path: node.full_path.clone(),
            name: node.name.clone(),
            size: node.size,
            is_folder: node.is_dir(),
            is_free_space: node.is_free_space(),
            is_other: false,
            depth: node.depth,
            level,
            disk_total: node.disk.map(|d| d.total),
            disk_free: node.disk.map(|d| d.free),
            mtime: node.mtime(),
        },
        Tile::Other { parent, size } => Rect {
            x,
            y,
            w,
            h,
            node_id: None,
            parent_id: parent.id,
            children: Vec::new(),
            full_path: parent.full_path.clone(),
            name: OTHER_NAME.into(),
            size,
            is_folder: false,
            is_free_space: false,
            is_other: true,
            depth: parent.depth + 1,
            level,
            disk_total: None,
            disk_free: None,
            mtime: None,
        },
    };
    out.push(rect);
    out.len() - 1
}
