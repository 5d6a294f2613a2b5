use spacemap_session::{
    DiskSpace, LayoutConfig, NodeId, Platform, ScanError, ScanPolicy, Session, SessionError,
};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// Treats every scanned directory as a volume root with fixed usage.
struct Volume {
    space: Option<DiskSpace>,
}

impl Platform for Volume {
    fn is_mount_root(&self, _path: &Path) -> bool {
        true
    }

    fn disk_space(&self, _path: &Path) -> Option<DiskSpace> {
        self.space
    }
}

fn policy() -> ScanPolicy {
    ScanPolicy::builder().apparent_size(true).build().unwrap()
}

fn volume_session(space: Option<DiskSpace>) -> Session<Volume> {
    Session::with_platform(Volume { space }, policy(), LayoutConfig::default(), 2)
}

fn create_tree() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::write(root.join("f1"), vec![0u8; 3000]).unwrap();
    fs::write(root.join("f2"), vec![0u8; 2000]).unwrap();
    fs::write(root.join("f3"), vec![0u8; 1000]).unwrap();
    fs::create_dir(root.join("S")).unwrap();
    fs::write(root.join("S/inner"), vec![0u8; 4000]).unwrap();
    temp
}

#[test]
fn test_scan_summary() {
    let temp = create_tree();
    let mut session = Session::new(policy(), LayoutConfig::default(), 2);

    let summary = session.scan(temp.path()).unwrap();

    assert_eq!(summary.root_id, NodeId::new(0));
    assert_eq!(summary.file_count, 4);
    assert_eq!(summary.dir_count, 2);

    let tree = session.tree().unwrap();
    assert_eq!(tree.root.size, 10_000);
    assert!(!tree.root.children.iter().any(|c| c.is_free_space()));
}

#[test]
fn test_summary_json_keys() {
    let temp = create_tree();
    let mut session = Session::new(policy(), LayoutConfig::default(), 1);
    let summary = session.scan(temp.path()).unwrap();

    let json = serde_json::to_value(summary).unwrap();
    assert_eq!(json["rootId"], 0);
    assert_eq!(json["fileCount"], 4);
    assert_eq!(json["dirCount"], 2);
}

#[test]
fn test_missing_path() {
    let mut session = Session::new(policy(), LayoutConfig::default(), 1);
    assert!(matches!(session.scan(""), Err(SessionError::MissingPath)));
    assert!(session.tree().is_none());
}

#[test]
fn test_scan_failure_keeps_previous_tree() {
    let temp = create_tree();
    let mut session = Session::new(policy(), LayoutConfig::default(), 1);
    session.scan(temp.path()).unwrap();

    let result = session.scan(temp.path().join("nope"));
    assert!(matches!(
        result,
        Err(SessionError::Scan(ScanError::NotFound { .. }))
    ));
    assert_eq!(session.tree().unwrap().root.size, 10_000);
}

#[test]
fn test_rescan_replaces_tree() {
    let first = create_tree();
    let second = TempDir::new().unwrap();
    fs::write(second.path().join("only"), vec![0u8; 77]).unwrap();

    let mut session = Session::new(policy(), LayoutConfig::default(), 2);
    session.scan(first.path()).unwrap();
    let summary = session.scan(second.path()).unwrap();

    assert_eq!(summary.file_count, 1);
    let tree = session.tree().unwrap();
    assert_eq!(tree.root.size, 77);
    assert_eq!(tree.index.len(), 2);
}

#[test]
fn test_mount_root_gets_free_space() {
    let temp = create_tree();
    let space = DiskSpace::new(100_000, 25_000);
    let mut session = volume_session(Some(space));

    let summary = session.scan(temp.path()).unwrap();
    let tree = session.tree().unwrap();

    assert_eq!(tree.root.size, 10_000);
    assert_eq!(tree.root.disk, Some(space));

    let free = &tree.root.children[0];
    assert!(free.is_free_space());
    assert_eq!(free.size, 25_000);
    assert_eq!(free.id, None);
    assert_eq!(free.parent_id, Some(summary.root_id));

    // Layout by id sees the augmented root.
    assert!(Arc::ptr_eq(tree.node(summary.root_id).unwrap(), &tree.root));
}

#[test]
fn test_failed_disk_query_omits_tile() {
    let temp = create_tree();
    let mut session = volume_session(None);

    session.scan(temp.path()).unwrap();
    let tree = session.tree().unwrap();

    assert!(tree.root.disk.is_none());
    assert!(!tree.root.children.iter().any(|c| c.is_free_space()));
}

#[test]
fn test_free_space_toggle() {
    let temp = create_tree();
    let mut session = volume_session(Some(DiskSpace::new(100_000, 25_000)));
    let summary = session.scan(temp.path()).unwrap();
    assert!(session.show_free_space());

    let shown = session.layout(summary.root_id, 800, 600).unwrap();
    let tile = shown.iter().find(|r| r.is_free_space).unwrap();
    assert_eq!(tile.size, 25_000);
    assert_eq!(shown[0].disk_free, Some(25_000));

    session.set_show_free_space(false);
    let hidden = session.layout(summary.root_id, 800, 600).unwrap();
    assert!(!hidden.iter().any(|r| r.is_free_space));
    assert_eq!(hidden[0].children.len(), 4);

    // The stored tree is untouched.
    let tree = session.tree().unwrap();
    assert!(tree.root.children.iter().any(|c| c.is_free_space()));
}

#[test]
fn test_layout_of_subtree() {
    let temp = create_tree();
    let mut session = Session::new(policy(), LayoutConfig::default(), 2);
    session.scan(temp.path()).unwrap();

    let sub_id = session.tree().unwrap().root.children[0].id.unwrap();
    let rects = session.layout(sub_id, 300, 200).unwrap();

    assert_eq!(rects[0].node_id, Some(sub_id));
    assert_eq!(rects[0].name.as_str(), "S");
    assert_eq!((rects[0].w, rects[0].h), (300, 200));
    assert_eq!(rects.len(), 2);
}

#[test]
fn test_layout_validation() {
    let temp = create_tree();
    let mut session = Session::new(policy(), LayoutConfig::default(), 2);

    // Nothing scanned yet.
    assert!(matches!(
        session.layout(NodeId::new(0), 100, 100),
        Err(SessionError::InvalidNodeId(0))
    ));

    session.scan(temp.path()).unwrap();
    let len = session.tree().unwrap().index.len() as u64;

    assert!(matches!(
        session.layout(NodeId::new(len), 100, 100),
        Err(SessionError::InvalidNodeId(id)) if id == len
    ));
    // Id is checked first.
    assert!(matches!(
        session.layout(NodeId::new(len + 5), 0, 0),
        Err(SessionError::InvalidNodeId(_))
    ));
    assert!(matches!(
        session.layout(NodeId::new(0), 0, 100),
        Err(SessionError::InvalidDimensions {
            width: 0,
            height: 100
        })
    ));
    assert!(matches!(
        session.layout(NodeId::new(0), 100, -1),
        Err(SessionError::InvalidDimensions { .. })
    ));
    assert!(session.layout(NodeId::new(0), 100, 100).is_ok());
}

#[test]
fn test_layout_of_file_is_single_tile() {
    let temp = create_tree();
    let mut session = Session::new(policy(), LayoutConfig::default(), 2);
    session.scan(temp.path()).unwrap();

    let file = session
        .tree()
        .unwrap()
        .root
        .children
        .iter()
        .find(|c| c.is_file())
        .cloned()
        .unwrap();
    let rects = session.layout(file.id.unwrap(), 50, 50).unwrap();

    assert_eq!(rects.len(), 1);
    assert!(!rects[0].is_folder);
    assert_eq!(rects[0].size, file.size);
}
