use spacemap_core::{DiskSpace, Node, NodeId};
use spacemap_layout::{LayoutConfig, OTHER_NAME, Rect, Treemap, layout};
use std::sync::Arc;

/// Hands out ids and builds nodes for in-memory fixtures.
struct Fixture {
    next: u64,
}

impl Fixture {
    fn new() -> Self {
        Self { next: 0 }
    }

    fn id(&mut self) -> NodeId {
        let id = NodeId::new(self.next);
        self.next += 1;
        id
    }

    fn dir(&mut self, parent: Option<&Node>, name: &str) -> Node {
        let id = self.id();
        let (path, depth) = match parent {
            Some(p) => (p.full_path.join(name), p.depth + 1),
            None => (format!("/{name}").into(), 0),
        };
        Node::new_directory(id, parent.and_then(|p| p.id), name, path, depth)
    }

    fn file(&mut self, parent: &Node, name: &str, size: u64) -> Arc<Node> {
        let id = self.id();
        Arc::new(Node::new_file(
            id,
            parent.id.unwrap(),
            name,
            parent.full_path.join(name),
            size,
            parent.depth + 1,
            None,
        ))
    }
}

fn finish(mut dir: Node) -> Node {
    dir.update_totals();
    dir.sort_children();
    dir
}

/// Small linear congruential generator so fixtures are reproducible.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self, bound: u64) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (self.0 >> 33) % bound
    }
}

/// Three levels of folders with skewed file sizes.
fn mixed_tree() -> Node {
    let mut fx = Fixture::new();
    let mut rng = Lcg(7);
    let mut root = fx.dir(None, "root");

    for d in 0..25 {
        let mut dir = fx.dir(Some(&root), &format!("dir{d}"));
        for s in 0..rng.next(4) {
            let mut sub = fx.dir(Some(&dir), &format!("sub{s}"));
            for f in 0..rng.next(30) {
                let bits = 4 + rng.next(20);
                let size = 1 + rng.next(1 << bits);
                let file = fx.file(&sub, &format!("f{f}"), size);
                sub.children.push(file);
            }
            dir.children.push(Arc::new(finish(sub)));
        }
        for f in 0..rng.next(50) {
            let bits = 4 + rng.next(20);
            let size = 1 + rng.next(1 << bits);
            let file = fx.file(&dir, &format!("g{f}"), size);
            dir.children.push(file);
        }
        root.children.push(Arc::new(finish(dir)));
    }
    for f in 0..10 {
        let file = fx.file(&root, &format!("top{f}"), 50_000 * (f + 1));
        root.children.push(file);
    }
    finish(root)
}

fn flat_folder(count: usize, size: u64) -> Node {
    let mut fx = Fixture::new();
    let mut root = fx.dir(None, "flat");
    for i in 0..count {
        let file = fx.file(&root, &format!("file{i:04}"), size);
        root.children.push(file);
    }
    finish(root)
}

#[test]
fn test_degenerate_inputs() {
    let root = mixed_tree();
    let config = LayoutConfig::default();

    assert!(layout(Some(&root), 0.0, 100.0, &config).is_empty());
    assert!(layout(Some(&root), 100.0, -5.0, &config).is_empty());
    assert!(layout(Some(&root), f64::NAN, 100.0, &config).is_empty());
    assert!(layout(None, 100.0, 100.0, &config).is_empty());
}

#[test]
fn test_root_rect_covers_viewport() {
    let root = mixed_tree();
    let rects = Treemap::default().layout(Some(&root), 1024.0, 768.0);

    let first = &rects[0];
    assert_eq!((first.x, first.y, first.w, first.h), (0, 0, 1024, 768));
    assert_eq!(first.node_id, root.id);
    assert_eq!(first.level, 0);
    assert_eq!(first.size, root.size);
    assert!(first.is_folder);
    assert!(!first.children.is_empty());
}

#[test]
fn test_tiny_viewport_keeps_root() {
    let root = mixed_tree();
    let rects = Treemap::default().layout(Some(&root), 2.0, 2.0);

    assert_eq!(rects.len(), 1);
    assert!(rects[0].children.is_empty());
}

#[test]
fn test_min_visible_size() {
    let root = mixed_tree();
    for scale in [1.0, 2.0] {
        let config = LayoutConfig::builder().scale(scale).build().unwrap();
        let min_side = config.scaled_min_side() as i64;
        let rects = Treemap::new(config).layout(Some(&root), 1600.0, 1000.0);

        assert!(rects.len() > 1);
        for rect in &rects[1..] {
            assert!(rect.w >= min_side, "{} too narrow: {}", rect.name, rect.w);
            assert!(rect.h >= min_side, "{} too short: {}", rect.name, rect.h);
        }
    }
}

#[test]
fn test_children_fit_inside_parent_interior() {
    let config = LayoutConfig::default();
    let pad = config.padding as i64;
    let label = config.label_height as i64;
    let root = mixed_tree();
    let rects = Treemap::new(config).layout(Some(&root), 1920.0, 1080.0);

    for parent in rects.iter().filter(|r| !r.children.is_empty()) {
        let interior = (parent.w + 1 - 2 * pad) * (parent.h + 1 - 2 * pad - label);
        let used: i64 = parent
            .children
            .iter()
            .map(|&i| (rects[i].w - 2).max(0) * (rects[i].h - 2).max(0))
            .sum();
        assert!(used <= interior, "{}: {used} > {interior}", parent.name);

        for &i in &parent.children {
            let child = &rects[i];
            assert!(child.x >= parent.x + pad - 2);
            assert!(child.y >= parent.y + pad + label - 2);
            assert!(child.right() <= parent.right() - pad + 2);
            assert!(child.bottom() <= parent.bottom() - pad + 2);
        }
    }
}

#[test]
fn test_child_links_are_consistent() {
    let root = mixed_tree();
    let rects = Treemap::default().layout(Some(&root), 1280.0, 800.0);

    let mut seen = vec![false; rects.len()];
    for (p, parent) in rects.iter().enumerate() {
        for &c in &parent.children {
            assert!(c > p);
            assert!(!seen[c], "rect {c} attached twice");
            seen[c] = true;

            let child = &rects[c];
            assert_eq!(child.parent_id, parent.node_id);
            assert_eq!(child.level, parent.level + 1);
            assert_eq!(child.depth, parent.depth + 1);
        }
    }
    // Everything but the root hangs off exactly one parent.
    assert!(!seen[0]);
    assert!(seen[1..].iter().all(|&s| s));
}

#[test]
fn test_each_node_emitted_once() {
    let root = mixed_tree();
    let rects = Treemap::default().layout(Some(&root), 1280.0, 800.0);

    let mut ids: Vec<_> = rects.iter().filter_map(|r| r.node_id).collect();
    let total = ids.len();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), total);
}

#[test]
fn test_deterministic() {
    let root = mixed_tree();
    let treemap = Treemap::default();

    let first = treemap.layout(Some(&root), 1366.0, 768.0);
    let second = treemap.layout(Some(&root), 1366.0, 768.0);
    assert_eq!(first, second);
}

#[test]
fn test_top_k_bucketing() {
    let root = flat_folder(1000, 10);
    let config = LayoutConfig::builder()
        .max_children(200usize)
        .min_area(0.0)
        .build()
        .unwrap();
    let rects = Treemap::new(config).layout(Some(&root), 4000.0, 4000.0);

    let children = &rects[0].children;
    assert!(children.len() <= 201);

    let others: Vec<&Rect> = rects.iter().filter(|r| r.is_other).collect();
    assert_eq!(others.len(), 1);
    let other = others[0];
    assert_eq!(other.size, 800 * 10);
    assert_eq!(other.name.as_str(), OTHER_NAME);
    assert_eq!(other.node_id, None);
    assert_eq!(other.parent_id, root.id);
    assert!(!other.is_folder);

    // Largest tile, so it opens the first row.
    assert!(rects[children[0]].is_other);
}

#[test]
fn test_unlimited_children_without_bucket() {
    let root = flat_folder(50, 1000);
    let rects = Treemap::default().layout(Some(&root), 1000.0, 1000.0);

    assert_eq!(rects[0].children.len(), 50);
    assert!(!rects.iter().any(|r| r.is_other));
}

#[test]
fn test_sub_pixel_children_leave_blank_space() {
    let mut fx = Fixture::new();
    let mut root = fx.dir(None, "skewed");
    let big = fx.file(&root, "big", 1_000_000);
    root.children.push(big);
    for i in 0..100 {
        let file = fx.file(&root, &format!("tiny{i}"), 1);
        root.children.push(file);
    }
    let root = finish(root);

    let rects = Treemap::default().layout(Some(&root), 200.0, 200.0);

    // The tiny files and their bucket are far below one pixel.
    assert_eq!(rects[0].children.len(), 1);
    assert_eq!(rects[1].name.as_str(), "big");
    assert!(!rects.iter().any(|r| r.is_other || r.size == 1));
}

#[test]
fn test_deep_tree_does_not_overflow() {
    const DEPTH: u32 = 1000;

    let mut node = Node::new_file(
        NodeId::new(u64::from(DEPTH)),
        NodeId::new(u64::from(DEPTH - 1)),
        "leaf",
        "/leaf",
        4096,
        DEPTH,
        None,
    );
    for depth in (0..DEPTH).rev() {
        let parent = (depth > 0).then(|| NodeId::new(u64::from(depth - 1)));
        let mut dir = Node::new_directory(NodeId::new(u64::from(depth)), parent, "d", "/d", depth);
        dir.children.push(Arc::new(node));
        dir.update_totals();
        node = dir;
    }

    let config = LayoutConfig::builder()
        .padding(0.0)
        .label_height(0.0)
        .min_side(1.0)
        .build()
        .unwrap();
    let rects = Treemap::new(config).layout(Some(&node), 500.0, 500.0);

    assert_eq!(rects.len(), DEPTH as usize + 1);
    assert_eq!(rects.last().unwrap().level, DEPTH);
    assert_eq!(rects.last().unwrap().name.as_str(), "leaf");
}

#[test]
fn test_free_space_tile_competes_for_area() {
    let mut fx = Fixture::new();
    let mut root = fx.dir(None, "volume");
    let data = fx.file(&root, "data", 3000);
    root.children.push(data);
    let free = Node::new_free_space(&root, 7000);
    root.children.push(Arc::new(free));
    root.disk = Some(DiskSpace::new(10_000, 7000));
    let root = finish(root);
    assert_eq!(root.size, 3000);

    let rects = Treemap::default().layout(Some(&root), 800.0, 600.0);

    assert_eq!(rects[0].disk_total, Some(10_000));
    assert_eq!(rects[0].disk_free, Some(7000));

    let free = rects.iter().find(|r| r.is_free_space).unwrap();
    let data = rects.iter().find(|r| r.name.as_str() == "data").unwrap();
    assert_eq!(free.node_id, None);
    assert_eq!(free.size, 7000);
    assert!(free.area() > data.area() * 2);
}

#[test]
fn test_rect_json_shape() {
    let root = flat_folder(3, 100);
    let rects = Treemap::default().layout(Some(&root), 300.0, 200.0);

    let json = serde_json::to_value(&rects).unwrap();
    assert_eq!(json[0]["x"], 0);
    assert_eq!(json[0]["w"], 300);
    assert_eq!(json[0]["node_id"], 0);
    assert!(json[0]["children"].is_array());
    assert!(json[0].get("parent_id").is_none());
    assert!(json[1].get("children").is_none());
    assert_eq!(json[1]["is_folder"], false);
}

#[test]
fn test_config_from_partial_json() {
    let config: LayoutConfig = serde_json::from_str(r#"{"max_children": 50}"#).unwrap();
    assert_eq!(config.max_children, 50);
    assert_eq!(config.padding, 5.0);
    assert_eq!(config.min_area, 16.0);
}
