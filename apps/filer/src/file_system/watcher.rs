//! Directory watching with debouncing.
//!
//! A watched Directory gets a rescan request whenever its contents change on disk.
//! Requests travel through the cache's scan channel, so they're ordered with scan batches.

use notify_debouncer_full::{
    DebounceEventResult, Debouncer, RecommendedCache, new_debouncer,
    notify::{RecommendedWatcher, RecursiveMode},
};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::time::Duration;

use super::cache::ScanMessage;

/// Debounce duration in milliseconds
pub const DEFAULT_DEBOUNCE_MS: u64 = 200;

/// Keeps the OS watch alive for as long as it's held.
pub struct DirectoryWatcher {
    path: PathBuf,
    #[allow(dead_code, reason = "Debouncer must be held to keep watching")]
    debouncer: Debouncer<RecommendedWatcher, RecommendedCache>,
}

impl std::fmt::Debug for DirectoryWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryWatcher").field("path", &self.path).finish()
    }
}

/// Starts watching `path`, sending `ScanMessage::RescanRequested` on every debounced change.
pub fn start_watching(path: &Path, sender: Sender<ScanMessage>) -> Result<DirectoryWatcher, String> {
    let path_for_closure = path.to_path_buf();

    let mut debouncer = new_debouncer(
        Duration::from_millis(DEFAULT_DEBOUNCE_MS),
        None,
        move |result: DebounceEventResult| {
            if let Err(errors) = &result {
                // Watch errors usually mean the directory itself went away; the rescan finds out
                log::debug!("Watcher: {} error(s) for {}", errors.len(), path_for_closure.display());
            }
            if sender
                .send(ScanMessage::RescanRequested {
                    path: path_for_closure.clone(),
                })
                .is_err()
            {
                log::debug!("Watcher: Cache gone, dropping change for {}", path_for_closure.display());
            }
        },
    )
    .map_err(|e| format!("Failed to create watcher: {}", e))?;

    debouncer
        .watch(path, RecursiveMode::NonRecursive)
        .map_err(|e| format!("Failed to watch path: {}", e))?;

    Ok(DirectoryWatcher {
        path: path.to_path_buf(),
        debouncer,
    })
}
