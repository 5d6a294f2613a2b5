//! Bounded-concurrency directory scanner.

use std::fs::{self, DirEntry};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Instant, SystemTime};

use parking_lot::Mutex;
use tokio::sync::Semaphore;

use spacemap_core::{Node, NodeId, NodeIndex, ScanError, ScanPolicy, ScanStats, ScanTree};

use crate::inode::InodeTracker;
use crate::platform::{NativePlatform, Platform};

/// Directory expansions allowed per CPU when no worker count is given.
const WORKERS_PER_CPU: usize = 4;

/// Every directory level costs a frame on some worker, whether it was
/// expanded inline or stolen back while its parent waits in `scope`. Sized
/// for chains that hit `PATH_MAX` in unoptimized builds.
const WORKER_STACK_SIZE: usize = 64 * 1024 * 1024;

/// Scanner that expands sibling directories in parallel, bounded by a shared
/// token pool.
///
/// Every directory tries to take a token for each of its subdirectories.
/// With a token the subdirectory is expanded on its own task; without one it
/// is expanded inline on the current task. Acquisition never blocks: a token
/// is only returned by a task that may itself be waiting on deeper tokens.
pub struct Scanner<P = NativePlatform> {
    platform: P,
    policy: ScanPolicy,
    max_workers: usize,
}

impl Scanner<NativePlatform> {
    /// Create a scanner for the native platform. `max_workers == 0` picks a
    /// default proportional to the available parallelism.
    pub fn new(policy: ScanPolicy, max_workers: usize) -> Self {
        Self::with_platform(NativePlatform, policy, max_workers)
    }
}

impl<P: Platform> Scanner<P> {
    /// Create a scanner using an explicit platform adapter.
    pub fn with_platform(platform: P, policy: ScanPolicy, max_workers: usize) -> Self {
        let max_workers = match max_workers {
            0 => default_workers(),
            n => n,
        };
        Self {
            platform,
            policy,
            max_workers,
        }
    }

    /// The platform adapter in use.
    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// The policy applied to every scan.
    pub fn policy(&self) -> &ScanPolicy {
        &self.policy
    }

    /// Upper bound on concurrently running directory expansions.
    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Scan `path` and everything below it.
    ///
    /// Fails only if the policy is invalid, or the starting path cannot be
    /// resolved or is not a directory. Unreadable directories below the root
    /// become empty folders and entries that cannot be inspected are left out.
    pub fn scan(&self, path: &Path) -> Result<ScanTree, ScanError> {
        self.policy.validate()?;

        let start = Instant::now();
        let root_path = self
            .platform
            .canonicalize(path)
            .map_err(|e| ScanError::io(path, e))?;

        let metadata = fs::metadata(&root_path).map_err(|e| ScanError::io(&root_path, e))?;
        if !metadata.is_dir() {
            return Err(ScanError::NotADirectory { path: root_path });
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_workers)
            .stack_size(WORKER_STACK_SIZE)
            .thread_name(|i| format!("spacemap-scan-{i}"))
            .build()
            .map_err(|e| ScanError::ThreadPool {
                message: e.to_string(),
            })?;

        let walk = Walk::new(&self.platform, &self.policy, self.max_workers);
        let start_dir = root_path.clone();
        let root = pool.install(|| walk.expand_dir(start_dir, 0, None));

        let stats = walk.stats();
        let index = walk.into_index();
        let scan_duration = start.elapsed();

        tracing::info!(
            root = %root_path.display(),
            files = stats.files,
            dirs = stats.dirs,
            bytes = root.size,
            elapsed_ms = scan_duration.as_millis() as u64,
            "scan finished"
        );

        Ok(ScanTree::new(
            root,
            index,
            root_path,
            stats,
            self.policy.clone(),
            scan_duration,
        ))
    }
}

impl Default for Scanner<NativePlatform> {
    fn default() -> Self {
        Self::new(ScanPolicy::default(), 0)
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
        * WORKERS_PER_CPU
}

/// A directory entry that survived classification.
enum Entry {
    Dir(PathBuf),
    File {
        path: PathBuf,
        size: u64,
        modified: Option<SystemTime>,
    },
}

/// State shared by every task of one scan.
struct Walk<'s, P> {
    platform: &'s P,
    policy: &'s ScanPolicy,
    tokens: Semaphore,
    next_id: AtomicU64,
    slots: Mutex<Vec<Option<Arc<Node>>>>,
    inodes: InodeTracker,
    files: AtomicU64,
    dirs: AtomicU64,
}

impl<'s, P: Platform> Walk<'s, P> {
    fn new(platform: &'s P, policy: &'s ScanPolicy, max_workers: usize) -> Self {
        Self {
            platform,
            policy,
            tokens: Semaphore::new(max_workers),
            next_id: AtomicU64::new(0),
            slots: Mutex::new(Vec::with_capacity(1024)),
            inodes: InodeTracker::new(),
            files: AtomicU64::new(0),
            dirs: AtomicU64::new(0),
        }
    }

    fn stats(&self) -> ScanStats {
        ScanStats {
            files: self.files.load(Ordering::Relaxed),
            dirs: self.dirs.load(Ordering::Relaxed),
        }
    }

    fn into_index(self) -> NodeIndex {
        NodeIndex::from_slots(self.slots.into_inner())
    }

    fn allocate_id(&self) -> NodeId {
        NodeId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Freeze a finished node and publish it under its id.
    fn register(&self, node: Node) -> Arc<Node> {
        let node = Arc::new(node);
        if let Some(id) = node.id {
            let mut slots = self.slots.lock();
            let at = id.index();
            if at >= slots.len() {
                slots.resize(at + 1, None);
            }
            slots[at] = Some(Arc::clone(&node));
        }
        node
    }

    /// Build the node for one directory, recursing into its subdirectories.
    fn expand_dir(&self, path: PathBuf, depth: u32, parent_id: Option<NodeId>) -> Arc<Node> {
        let id = self.allocate_id();
        self.dirs.fetch_add(1, Ordering::Relaxed);

        let name = self.platform.base_name(&path);
        let mut node = Node::new_directory(id, parent_id, name, path, depth);

        let entries = match fs::read_dir(&node.full_path) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::debug!(
                    path = %node.full_path.display(),
                    error = %err,
                    "unreadable directory kept as empty folder"
                );
                return self.register(node);
            }
        };

        let mut subdirs = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::debug!(
                        path = %node.full_path.display(),
                        error = %err,
                        "skipping unreadable entry"
                    );
                    continue;
                }
            };

            match self.classify(&entry) {
                Some(Entry::Dir(path)) => subdirs.push(path),
                Some(Entry::File {
                    path,
                    size,
                    modified,
                }) => {
                    let name = self.platform.base_name(&path);
                    let file = Node::new_file(
                        self.allocate_id(),
                        id,
                        name,
                        path,
                        size,
                        depth + 1,
                        modified,
                    );
                    node.children.push(self.register(file));
                    self.files.fetch_add(1, Ordering::Relaxed);
                }
                None => {}
            }
        }

        if !subdirs.is_empty() {
            let spawned = Mutex::new(Vec::with_capacity(subdirs.len()));
            let mut inline = Vec::new();

            rayon::scope(|scope| {
                for subdir in subdirs {
                    match self.tokens.try_acquire() {
                        Ok(permit) => {
                            let spawned = &spawned;
                            scope.spawn(move |_| {
                                let child = self.expand_dir(subdir, depth + 1, Some(id));
                                drop(permit);
                                spawned.lock().push(child);
                            });
                        }
                        // Pool exhausted: expand here instead of waiting.
                        Err(_) => inline.push(self.expand_dir(subdir, depth + 1, Some(id))),
                    }
                }
            });

            node.children.extend(inline);
            node.children.extend(spawned.into_inner());
        }

        node.update_totals();
        node.sort_children();
        self.register(node)
    }

    /// Apply the policy to one listing entry.
    ///
    /// Exclusion, symlink and hidden checks only need the listing itself, so
    /// they run before the entry is stat-ed.
    fn classify(&self, entry: &DirEntry) -> Option<Entry> {
        let path = entry.path();
        if self.policy.is_excluded(&path) {
            return None;
        }

        let file_type = entry.file_type().ok()?;
        if file_type.is_symlink() {
            return None;
        }
        if self.policy.should_skip_hidden(&entry.file_name()) {
            return None;
        }

        if file_type.is_dir() {
            if self.policy.skip_network_filesystems && self.platform.is_network_filesystem(&path) {
                tracing::debug!(path = %path.display(), "skipping network filesystem");
                return None;
            }
            return Some(Entry::Dir(path));
        }

        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(err) => {
                tracing::debug!(path = %path.display(), error = %err, "skipping unstatable entry");
                return None;
            }
        };
        if !metadata.is_file() {
            return None;
        }

        let size = if self.policy.apparent_size {
            metadata.len()
        } else {
            self.platform.allocated_size(&metadata)
        };
        if !self.policy.keeps_size(size) {
            return None;
        }

        if let Some(key) = self.platform.hard_link_key(&metadata) {
            if !self.inodes.first_sighting(key) {
                return None;
            }
        }

        Some(Entry::File {
            path,
            size,
            modified: metadata.modified().ok(),
        })
    }
}
