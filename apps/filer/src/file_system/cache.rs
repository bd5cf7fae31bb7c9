//! Shared, reference-counted directory snapshots keyed by canonical path.
//!
//! `DirectoryCache` hands out `Arc<Directory>`; the map itself only holds weak handles,
//! so a Directory lives exactly as long as some window holds it. Scans run on background
//! threads and report back through a channel that the loop drains with `pump()`. All
//! mutation of a snapshot happens in `pump()`, on the loop thread.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, RwLock, Weak};
use std::time::{Duration, Instant};

use super::events::{DirEvent, EventQueue, Subscription};
use super::item::DirectoryItem;
use super::reading::{DirectoryIdentity, canonical_path, check_readable_dir, directory_identity, read_directory_batches};
use super::types::{MimeGuessResolver, TypeResolver};
use super::watcher::{DirectoryWatcher, start_watching};
use crate::error::FilerError;
use crate::ignore_poison::{IgnorePoison, IgnoreRwPoison};
use crate::window::WindowId;

/// Items per Add/Update notification while scanning
pub const SCAN_BATCH_SIZE: usize = 64;

/// Messages from scan threads and watchers back to the loop.
#[derive(Debug)]
pub enum ScanMessage {
    Batch {
        path: PathBuf,
        directory: u64,
        generation: u64,
        items: Vec<DirectoryItem>,
    },
    Finished {
        path: PathBuf,
        directory: u64,
        generation: u64,
        result: Result<usize, ErrorKind>,
        elapsed_ms: u128,
    },
    RescanRequested {
        path: PathBuf,
    },
}

// ============================================================================
// Directory
// ============================================================================

struct Observer {
    window: WindowId,
    queue: Weak<EventQueue>,
}

#[derive(Default)]
struct DirectoryState {
    items: BTreeMap<String, DirectoryItem>,
    scanning: bool,
    /// Bumped per scan so that batches from a superseded scan are ignored
    generation: u64,
    /// Names reported by the current scan; anything else is removed when it ends
    seen: HashSet<String>,
    needs_rescan: bool,
    missing: bool,
    observers: Vec<Observer>,
}

impl DirectoryState {
    fn broadcast(&mut self, event: DirEvent) {
        self.observers.retain(|o| o.queue.strong_count() > 0);
        for observer in &self.observers {
            if let Some(queue) = observer.queue.upgrade() {
                queue.lock_ignore_poison().push_back(event.clone());
            }
        }
    }
}

/// Snapshot of one directory's contents, shared by every window showing it.
pub struct Directory {
    id: u64,
    path: PathBuf,
    identity: DirectoryIdentity,
    state: RwLock<DirectoryState>,
    watcher: Mutex<Option<DirectoryWatcher>>,
}

impl std::fmt::Debug for Directory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Directory")
            .field("id", &self.id)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl Directory {
    fn new(id: u64, path: PathBuf, identity: DirectoryIdentity) -> Self {
        Self {
            id,
            path,
            identity,
            state: RwLock::new(DirectoryState::default()),
            watcher: Mutex::new(None),
        }
    }

    /// Canonical path of the directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn identity(&self) -> DirectoryIdentity {
        self.identity
    }

    pub fn is_scanning(&self) -> bool {
        self.state.read_ignore_poison().scanning
    }

    /// True once a scan found that the directory no longer exists.
    pub fn is_missing(&self) -> bool {
        self.state.read_ignore_poison().missing
    }

    pub fn len(&self) -> usize {
        self.state.read_ignore_poison().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the current items, ordered by name.
    pub fn items(&self) -> Vec<DirectoryItem> {
        self.state.read_ignore_poison().items.values().cloned().collect()
    }

    pub fn item(&self, name: &str) -> Option<DirectoryItem> {
        self.state.read_ignore_poison().items.get(name).cloned()
    }

    /// Number of windows currently receiving notifications.
    pub fn observer_count(&self) -> usize {
        self.state
            .read_ignore_poison()
            .observers
            .iter()
            .filter(|o| o.queue.strong_count() > 0)
            .count()
    }

    pub fn is_watched(&self) -> bool {
        self.watcher.lock_ignore_poison().is_some()
    }

    /// Registers `window` for notifications. The new queue is primed with the current
    /// contents, so the window sees the same sequence a fresh scan would produce.
    fn attach(&self, window: WindowId) -> Subscription {
        let queue: Arc<EventQueue> = Arc::new(Mutex::new(VecDeque::new()));
        let mut state = self.state.write_ignore_poison();
        {
            let mut pending = queue.lock_ignore_poison();
            if state.scanning {
                pending.push_back(DirEvent::ScanStart);
            }
            if !state.items.is_empty() {
                pending.push_back(DirEvent::Add(state.items.values().cloned().collect()));
            }
            if !state.scanning {
                pending.push_back(DirEvent::ScanEnd);
            }
        }
        state.observers.retain(|o| o.window != window && o.queue.strong_count() > 0);
        state.observers.push(Observer {
            window,
            queue: Arc::downgrade(&queue),
        });
        Subscription::new(window, queue)
    }

    fn detach(&self, window: WindowId) {
        self.state.write_ignore_poison().observers.retain(|o| o.window != window);
    }

    fn begin_scan(&self) -> u64 {
        let mut state = self.state.write_ignore_poison();
        state.generation += 1;
        state.scanning = true;
        state.needs_rescan = false;
        state.seen.clear();
        state.broadcast(DirEvent::ScanStart);
        state.generation
    }

    fn merge_batch(&self, generation: u64, items: Vec<DirectoryItem>) {
        let mut state = self.state.write_ignore_poison();
        if generation != state.generation {
            return;
        }

        let mut added = Vec::new();
        let mut updated = Vec::new();
        for item in items {
            state.seen.insert(item.name.clone());
            match state.items.get(&item.name) {
                None => added.push(item.clone()),
                Some(old) if old.differs_from(&item) => updated.push(item.clone()),
                Some(_) => continue,
            }
            state.items.insert(item.name.clone(), item);
        }

        if !added.is_empty() {
            state.broadcast(DirEvent::Add(added));
        }
        if !updated.is_empty() {
            state.broadcast(DirEvent::Update(updated));
        }
    }

    /// Ends scan `generation`. Returns true if another scan was requested meanwhile.
    fn finish_scan(&self, generation: u64, result: Result<usize, ErrorKind>) -> bool {
        let mut state = self.state.write_ignore_poison();
        if generation != state.generation {
            return false;
        }

        match result {
            Ok(_) => {
                let seen = std::mem::take(&mut state.seen);
                let stale: Vec<String> = state.items.keys().filter(|name| !seen.contains(*name)).cloned().collect();
                let removed: Vec<DirectoryItem> = stale.iter().filter_map(|name| state.items.remove(name)).collect();
                if !removed.is_empty() {
                    state.broadcast(DirEvent::Remove(removed));
                }
            }
            Err(ErrorKind::NotFound) => {
                log::info!("Directory cache: Directory deleted: {}", self.path.display());
                state.missing = true;
                state.seen.clear();
            }
            Err(kind) => {
                log::warn!("Directory cache: Failed to read {}: {}", self.path.display(), kind);
                state.seen.clear();
            }
        }

        state.scanning = false;
        state.broadcast(DirEvent::ScanEnd);
        std::mem::take(&mut state.needs_rescan) && !state.missing
    }

    /// Marks a rescan as wanted. Returns false if a scan is already running (it will
    /// restart when the current one ends).
    fn request_rescan(&self) -> bool {
        let mut state = self.state.write_ignore_poison();
        if state.scanning {
            state.needs_rescan = true;
            false
        } else {
            true
        }
    }
}

impl Drop for Directory {
    fn drop(&mut self) {
        log::debug!("Directory cache: Freed {}", self.path.display());
    }
}

// ============================================================================
// DirectoryCache
// ============================================================================

/// Process-wide map from canonical path to the one live `Directory` for it.
pub struct DirectoryCache {
    entries: RwLock<HashMap<PathBuf, Weak<Directory>>>,
    sender: Sender<ScanMessage>,
    receiver: Mutex<Receiver<ScanMessage>>,
    resolver: Arc<dyn TypeResolver>,
    next_id: AtomicU64,
    batch_size: usize,
    watch: AtomicBool,
}

impl Default for DirectoryCache {
    fn default() -> Self {
        Self::new(Arc::new(MimeGuessResolver))
    }
}

impl DirectoryCache {
    pub fn new(resolver: Arc<dyn TypeResolver>) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            entries: RwLock::new(HashMap::new()),
            sender,
            receiver: Mutex::new(receiver),
            resolver,
            next_id: AtomicU64::new(1),
            batch_size: SCAN_BATCH_SIZE,
            watch: AtomicBool::new(false),
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn resolver(&self) -> &dyn TypeResolver {
        self.resolver.as_ref()
    }

    /// Enables OS change notifications for directories created from now on.
    pub fn set_watch(&self, watch: bool) {
        self.watch.store(watch, Ordering::Relaxed);
    }

    /// Returns the shared Directory for `path`, creating it and starting a scan if no
    /// window currently holds one.
    pub fn lookup(&self, path: &Path) -> Result<Arc<Directory>, FilerError> {
        let not_accessible = || FilerError::DirectoryNotAccessible { path: path.to_path_buf() };
        let canonical = canonical_path(path).map_err(|_| not_accessible())?;
        check_readable_dir(&canonical).map_err(|_| not_accessible())?;

        if let Some(existing) = self.live(&canonical)
            && !existing.is_missing()
        {
            return Ok(existing);
        }
        let identity = directory_identity(&canonical).map_err(|_| not_accessible())?;
        Ok(self.create(canonical, identity))
    }

    /// Like `lookup`, but re-checks the directory on disk: if it was replaced since the
    /// cached snapshot was made, a new Directory is created for the same path.
    pub fn lookup_fresh(&self, path: &Path) -> Result<Arc<Directory>, FilerError> {
        let identity = match directory_identity(path) {
            Ok(identity) => identity,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(FilerError::DirectoryMissing { path: path.to_path_buf() });
            }
            Err(_) => return Err(FilerError::DirectoryNotAccessible { path: path.to_path_buf() }),
        };
        let canonical = canonical_path(path).map_err(|_| FilerError::DirectoryMissing { path: path.to_path_buf() })?;

        if let Some(existing) = self.live(&canonical)
            && existing.identity() == identity
            && !existing.is_missing()
        {
            return Ok(existing);
        }
        check_readable_dir(&canonical).map_err(|_| FilerError::DirectoryNotAccessible { path: path.to_path_buf() })?;
        Ok(self.create(canonical, identity))
    }

    /// Gives up one reference. The Directory is freed when the last one goes.
    pub fn release(&self, directory: Arc<Directory>) {
        let path = directory.path().to_path_buf();
        drop(directory);
        let mut entries = self.entries.write_ignore_poison();
        if entries.get(&path).is_some_and(|weak| weak.strong_count() == 0) {
            entries.remove(&path);
        }
    }

    /// Starts delivering `directory`'s notifications to `window`.
    pub fn attach(&self, directory: &Directory, window: WindowId) -> Subscription {
        log::debug!("Directory cache: Attach {} to {}", window, directory.path().display());
        directory.attach(window)
    }

    /// Stops delivery to `window`. Doesn't affect the reference count or a running scan.
    pub fn detach(&self, directory: &Directory, window: WindowId) {
        log::debug!("Directory cache: Detach {} from {}", window, directory.path().display());
        directory.detach(window);
    }

    /// Requests a rescan of the live Directory at `path`, if any.
    pub fn rescan(&self, path: &Path) -> bool {
        let canonical = canonical_path(path).unwrap_or_else(|_| path.to_path_buf());
        match self.live(&canonical) {
            Some(directory) => {
                self.rescan_directory(&directory);
                true
            }
            None => false,
        }
    }

    pub fn rescan_directory(&self, directory: &Arc<Directory>) {
        if directory.request_rescan() {
            self.start_scan(directory);
        }
    }

    /// Every Directory that some window still holds.
    pub fn live_directories(&self) -> Vec<Arc<Directory>> {
        self.entries
            .read_ignore_poison()
            .values()
            .filter_map(Weak::upgrade)
            .collect()
    }

    /// Number of live Directories.
    pub fn len(&self) -> usize {
        self.live_directories().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True while any live Directory is scanning.
    pub fn is_busy(&self) -> bool {
        self.live_directories().iter().any(|d| d.is_scanning())
    }

    /// Applies every message that has arrived so far. Returns how many were handled.
    pub fn pump(&self) -> usize {
        let mut handled = 0;
        loop {
            let message = match self.receiver.lock_ignore_poison().try_recv() {
                Ok(message) => message,
                Err(_) => break,
            };
            self.handle(message);
            handled += 1;
        }
        handled
    }

    /// Waits up to `timeout` for the first message, then drains the rest.
    pub fn pump_wait(&self, timeout: Duration) -> usize {
        let first = self.receiver.lock_ignore_poison().recv_timeout(timeout);
        match first {
            Ok(message) => {
                self.handle(message);
                1 + self.pump()
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => 0,
        }
    }

    fn live(&self, canonical: &Path) -> Option<Arc<Directory>> {
        self.entries.read_ignore_poison().get(canonical).and_then(Weak::upgrade)
    }

    fn create(&self, canonical: PathBuf, identity: DirectoryIdentity) -> Arc<Directory> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let directory = Arc::new(Directory::new(id, canonical.clone(), identity));
        log::debug!("Directory cache: Created {} (id {})", canonical.display(), id);

        if self.watch.load(Ordering::Relaxed) {
            match start_watching(&canonical, self.sender.clone()) {
                Ok(watcher) => *directory.watcher.lock_ignore_poison() = Some(watcher),
                Err(e) => log::warn!("Directory cache: Not watching {}: {}", canonical.display(), e),
            }
        }

        {
            let mut entries = self.entries.write_ignore_poison();
            entries.retain(|_, weak| weak.strong_count() > 0);
            entries.insert(canonical, Arc::downgrade(&directory));
        }
        self.start_scan(&directory);
        directory
    }

    fn start_scan(&self, directory: &Arc<Directory>) {
        let generation = directory.begin_scan();
        let path = directory.path().to_path_buf();
        let id = directory.id;
        let sender = self.sender.clone();
        let resolver = Arc::clone(&self.resolver);
        let batch_size = self.batch_size;
        log::debug!("Directory cache: Scan {} of {} started", generation, path.display());

        let spawned = std::thread::Builder::new().name("dir-scan".to_string()).spawn({
            let path = path.clone();
            move || {
                let start = Instant::now();
                let result = read_directory_batches(&path, batch_size, resolver.as_ref(), |items| {
                    sender
                        .send(ScanMessage::Batch {
                            path: path.clone(),
                            directory: id,
                            generation,
                            items,
                        })
                        .is_ok()
                });
                // Err only when the cache itself is gone
                let _ = sender.send(ScanMessage::Finished {
                    path,
                    directory: id,
                    generation,
                    result: result.map_err(|e| e.kind()),
                    elapsed_ms: start.elapsed().as_millis(),
                });
            }
        });

        if let Err(e) = spawned {
            log::error!("Directory cache: Failed to start scan of {}: {}", path.display(), e);
            directory.finish_scan(generation, Err(ErrorKind::Other));
        }
    }

    fn directory_for(&self, path: &Path, id: u64) -> Option<Arc<Directory>> {
        self.live(path).filter(|d| d.id == id)
    }

    fn handle(&self, message: ScanMessage) {
        match message {
            ScanMessage::Batch {
                path,
                directory,
                generation,
                items,
            } => {
                if let Some(directory) = self.directory_for(&path, directory) {
                    directory.merge_batch(generation, items);
                }
            }
            ScanMessage::Finished {
                path,
                directory,
                generation,
                result,
                elapsed_ms,
            } => {
                let Some(directory) = self.directory_for(&path, directory) else {
                    return;
                };
                log::debug!(
                    "Directory cache: Scan {} of {} finished, entries={:?}, total={}ms",
                    generation,
                    path.display(),
                    result,
                    elapsed_ms
                );
                if directory.finish_scan(generation, result) {
                    self.start_scan(&directory);
                }
            }
            ScanMessage::RescanRequested { path } => {
                self.rescan(&path);
            }
        }
    }
}
