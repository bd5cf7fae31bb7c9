//! The set of open filer windows and the operations that span them.
//!
//! `Filer` owns the directory cache, every window, the selection arbiter and the session
//! defaults. It is driven from one thread: call `pump()` whenever the loop wakes up (or
//! `pump_wait()` to block for the next scan batch).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::FilerError;
use crate::file_system::{DirectoryCache, TypeResolver, canonical_path};
use crate::font_metrics::Fonts;
use crate::listing::layout::MIN_ITEM_WIDTH;
use crate::listing::{DisplayStyle, NameCase, SortKey};
use crate::navigation::{Launcher, OpenAction, OpenFlags, SystemLauncher, resolve_open, resolve_symlink};
use crate::selection::{ClaimOutcome, NullSelectionHost, SelectionArbiter, SelectionHost, SelectionTarget, selection_payload};
use crate::settings::FilerOptions;
use crate::window::{FilerWindow, PanelType, ViewContext, WindowId};

/// How long "(Scanning)" stays in the title after a scan ends
pub const SCANNING_CLEAR_DELAY: Duration = Duration::from_millis(300);

/// Process-wide state that new windows inherit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Window with input focus
    pub focus: Option<WindowId>,
    /// Style for the next window opened
    pub last_style: DisplayStyle,
    /// Sort key for the next window opened
    pub last_sort: SortKey,
    /// Show-hidden default for the next window opened
    pub show_hidden: bool,
}

impl Session {
    pub fn from_options(options: &FilerOptions) -> Self {
        Self {
            focus: None,
            last_style: options.display_style,
            last_sort: options.sort_by,
            show_hidden: false,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ScanTimer {
    window: WindowId,
    epoch: u64,
    deadline: Instant,
}

fn view_context<'a>(options: &FilerOptions, fonts: &'a Fonts, min_width: u32) -> ViewContext<'a> {
    ViewContext {
        case: NameCase::from_nocase(options.sort_nocase),
        truncation: options.truncation,
        fonts,
        min_width,
    }
}

pub struct Filer {
    cache: DirectoryCache,
    windows: BTreeMap<WindowId, FilerWindow>,
    next_id: u64,
    session: Session,
    arbiter: SelectionArbiter,
    selection_host: Box<dyn SelectionHost>,
    launcher: Box<dyn Launcher>,
    options: FilerOptions,
    fonts: Fonts,
    min_width: u32,
    timers: Vec<ScanTimer>,
    notices: Vec<FilerError>,
}

impl Filer {
    pub fn new(options: FilerOptions) -> Self {
        let cache = DirectoryCache::default();
        cache.set_watch(options.watch_directories);
        Self {
            cache,
            windows: BTreeMap::new(),
            next_id: 1,
            session: Session::from_options(&options),
            arbiter: SelectionArbiter::default(),
            selection_host: Box::new(NullSelectionHost),
            launcher: Box::new(SystemLauncher),
            options,
            fonts: Fonts::default(),
            min_width: MIN_ITEM_WIDTH,
            timers: Vec::new(),
            notices: Vec::new(),
        }
    }

    pub fn with_selection_host(mut self, host: Box<dyn SelectionHost>) -> Self {
        self.selection_host = host;
        self
    }

    pub fn with_launcher(mut self, launcher: Box<dyn Launcher>) -> Self {
        self.launcher = launcher;
        self
    }

    /// Replaces the content-type resolver. Only affects Directories created afterwards.
    pub fn with_resolver(mut self, resolver: Arc<dyn TypeResolver>) -> Self {
        let cache = DirectoryCache::new(resolver);
        cache.set_watch(self.options.watch_directories);
        self.cache = cache;
        self
    }

    pub fn with_fonts(mut self, fonts: Fonts) -> Self {
        self.fonts = fonts;
        self
    }

    /// Narrowest item box any window will use.
    pub fn with_min_item_width(mut self, min_width: u32) -> Self {
        self.min_width = min_width;
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn window(&self, id: WindowId) -> Option<&FilerWindow> {
        self.windows.get(&id)
    }

    pub fn window_mut(&mut self, id: WindowId) -> Option<&mut FilerWindow> {
        self.windows.get_mut(&id)
    }

    pub fn windows(&self) -> impl Iterator<Item = &FilerWindow> {
        self.windows.values()
    }

    pub fn window_ids(&self) -> Vec<WindowId> {
        self.windows.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    /// True once the last window has closed.
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn options(&self) -> &FilerOptions {
        &self.options
    }

    pub fn fonts(&self) -> &Fonts {
        &self.fonts
    }

    pub fn cache(&self) -> &DirectoryCache {
        &self.cache
    }

    pub fn selection_owner(&self) -> Option<WindowId> {
        self.arbiter.owner()
    }

    /// User-visible errors since the last call, oldest first.
    pub fn take_notices(&mut self) -> Vec<FilerError> {
        std::mem::take(&mut self.notices)
    }

    fn window_or_err(&self, id: WindowId) -> Result<&FilerWindow, FilerError> {
        self.windows.get(&id).ok_or(FilerError::NoSuchWindow(id))
    }

    fn report(&mut self, error: FilerError) -> FilerError {
        log::error!("{}", error);
        self.notices.push(error.clone());
        error
    }

    /// Non-panel window other than `except` already showing `path`.
    fn find_window_showing(&self, path: &Path, except: Option<WindowId>) -> Option<WindowId> {
        let canonical = canonical_path(path).ok()?;
        self.windows
            .values()
            .find(|w| Some(w.id()) != except && !w.is_panel() && w.path() == canonical)
            .map(FilerWindow::id)
    }

    // ========================================================================
    // Opening and closing windows
    // ========================================================================

    /// Opens a new window on `path`. With unique windows on, an ordinary window already
    /// showing the path is returned instead.
    pub fn open_dir(&mut self, path: &Path, panel: PanelType) -> Result<WindowId, FilerError> {
        if self.options.unique_windows
            && !panel.is_panel()
            && let Some(existing) = self.find_window_showing(path, None)
        {
            log::debug!("Filer: {} already shows {}", existing, path.display());
            return Ok(existing);
        }

        let directory = match self.cache.lookup(path) {
            Ok(directory) => directory,
            Err(e) => return Err(self.report(e)),
        };

        let id = WindowId(self.next_id);
        self.next_id += 1;
        let mut window = FilerWindow::new(
            id,
            directory.path().to_path_buf(),
            panel,
            self.session.last_style,
            self.session.last_sort,
            self.session.show_hidden,
        );
        window.attach(&self.cache, directory);
        window.shrink_to_fit(&view_context(&self.options, &self.fonts, self.min_width));
        log::info!("Filer: Opened {} on {}", id, window.path().display());
        self.windows.insert(id, window);
        Ok(id)
    }

    /// Closes a window, releasing its Directory and any selection it owns.
    pub fn close_window(&mut self, id: WindowId) -> Result<(), FilerError> {
        if self.destroy_window(id) {
            Ok(())
        } else {
            Err(FilerError::NoSuchWindow(id))
        }
    }

    fn destroy_window(&mut self, id: WindowId) -> bool {
        let Some(mut window) = self.windows.remove(&id) else {
            return false;
        };
        self.arbiter.window_destroyed(id, self.selection_host.as_mut(), 0);
        if self.session.focus == Some(id) {
            self.session.focus = None;
        }
        if let Some(directory) = window.detach(&self.cache) {
            self.cache.release(directory);
        }
        self.timers.retain(|t| t.window != id);
        log::info!("Filer: Closed {} ({} left)", id, self.windows.len());
        true
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// Shows `path` in window `id`, highlighting `from` once it appears. If the path
    /// can't be opened the window is closed.
    pub fn change_to(&mut self, id: WindowId, path: &Path, from: Option<&str>) -> Result<(), FilerError> {
        let is_panel = self.window_or_err(id)?.is_panel();

        if self.options.unique_windows
            && !is_panel
            && let Some(other) = self.find_window_showing(path, Some(id))
        {
            log::debug!("Filer: Closing {} which already shows {}", other, path.display());
            self.destroy_window(other);
        }

        let from = from.filter(|name| !name.is_empty());
        let Some(window) = self.windows.get_mut(&id) else {
            return Err(FilerError::NoSuchWindow(id));
        };
        window.prepare_change(from);
        let old = window.detach(&self.cache);

        // Looked up before the old reference goes, so a same-path change reuses the snapshot
        let result = self.cache.lookup(path);
        if let Some(old) = old {
            self.cache.release(old);
        }

        match result {
            Ok(directory) => {
                if let Some(window) = self.windows.get_mut(&id) {
                    window.attach(&self.cache, directory);
                    log::debug!("Filer: {} changed to {}", id, window.path().display());
                }
                Ok(())
            }
            Err(e) => {
                self.destroy_window(id);
                Err(self.report(e))
            }
        }
    }

    /// Goes up one level, highlighting the directory we came from. No-op at `/`.
    pub fn change_to_parent(&mut self, id: WindowId) -> Result<(), FilerError> {
        let path = self.window_or_err(id)?.path().to_path_buf();
        let (Some(parent), Some(leaf)) = (path.parent(), path.file_name()) else {
            return Ok(());
        };
        let leaf = leaf.to_string_lossy().to_string();
        self.change_to(id, parent, Some(&leaf))
    }

    /// Opens the parent directory in a new window. Returns None at `/`.
    pub fn open_parent(&mut self, id: WindowId) -> Result<Option<WindowId>, FilerError> {
        let path = self.window_or_err(id)?.path().to_path_buf();
        match path.parent() {
            Some(parent) => self.open_dir(parent, PanelType::None).map(Some),
            None => Ok(None),
        }
    }

    pub fn change_to_home(&mut self, id: WindowId) -> Result<(), FilerError> {
        let home: PathBuf = dirs::home_dir().ok_or_else(|| FilerError::Io("No home directory".to_string()))?;
        self.change_to(id, &home, None)
    }

    pub fn set_autoselect(&mut self, id: WindowId, name: &str) -> Result<(), FilerError> {
        self.windows
            .get_mut(&id)
            .ok_or(FilerError::NoSuchWindow(id))?
            .set_autoselect(name);
        Ok(())
    }

    /// Re-checks the window's directory and rescans it. A vanished directory closes the
    /// window (with a notice when `warn`); a replaced one is swapped in.
    pub fn update_dir(&mut self, id: WindowId, warn: bool) -> Result<(), FilerError> {
        let path = self.window_or_err(id)?.path().to_path_buf();

        let fresh = match self.cache.lookup_fresh(&path) {
            Ok(directory) => directory,
            Err(e) => {
                if warn {
                    self.report(e.clone());
                } else {
                    log::info!("Filer: {}", e);
                }
                self.destroy_window(id);
                return Err(e);
            }
        };

        let Some(window) = self.windows.get_mut(&id) else {
            return Err(FilerError::NoSuchWindow(id));
        };
        let unchanged = window.directory().is_some_and(|current| Arc::ptr_eq(current, &fresh));
        if unchanged {
            self.cache.rescan_directory(&fresh);
            return Ok(());
        }

        log::debug!("Filer: {} directory was replaced, reattaching", id);
        let old = window.detach(&self.cache);
        window.attach(&self.cache, Arc::clone(&fresh));
        if let Some(old) = old {
            self.cache.release(old);
        }
        self.cache.rescan_directory(&fresh);
        Ok(())
    }

    /// Something was (un)mounted at `path`: rescan every window at or below it.
    pub fn check_mounted(&mut self, path: &Path) {
        let affected: Vec<WindowId> = self
            .windows
            .values()
            .filter(|w| w.path().starts_with(path))
            .map(FilerWindow::id)
            .collect();
        for id in affected {
            // A window that no longer has a directory gets closed; nothing else to do
            let _ = self.update_dir(id, false);
        }
    }

    // ========================================================================
    // View settings
    // ========================================================================

    /// Toggles hidden files, redelivering the directory's contents to the window.
    pub fn set_hidden(&mut self, id: WindowId, show_hidden: bool) -> Result<(), FilerError> {
        let window = self.windows.get_mut(&id).ok_or(FilerError::NoSuchWindow(id))?;
        window.set_show_hidden(show_hidden);
        window.reattach(&self.cache);
        self.session.show_hidden = show_hidden;
        Ok(())
    }

    pub fn set_style(&mut self, id: WindowId, style: DisplayStyle) -> Result<DisplayStyle, FilerError> {
        let ctx = view_context(&self.options, &self.fonts, self.min_width);
        let window = self.windows.get_mut(&id).ok_or(FilerError::NoSuchWindow(id))?;
        let applied = window.set_style(style, &ctx);
        if !window.is_panel() {
            self.session.last_style = applied;
        }
        Ok(applied)
    }

    pub fn set_sort(&mut self, id: WindowId, key: SortKey) -> Result<(), FilerError> {
        let case = NameCase::from_nocase(self.options.sort_nocase);
        let window = self.windows.get_mut(&id).ok_or(FilerError::NoSuchWindow(id))?;
        if window.set_sort(key, case) {
            self.session.last_sort = key;
        }
        Ok(())
    }

    /// Installs new options: re-sorts if the case rule changed, refits every window.
    pub fn apply_options(&mut self, options: FilerOptions) {
        let case_changed = options.sort_nocase != self.options.sort_nocase;
        self.options = options;
        self.cache.set_watch(self.options.watch_directories);

        let ctx = view_context(&self.options, &self.fonts, self.min_width);
        for window in self.windows.values_mut() {
            if case_changed {
                window.resort(ctx.case);
            }
            window.shrink_to_fit(&ctx);
        }
    }

    /// New fonts invalidate every measurement.
    pub fn set_fonts(&mut self, fonts: Fonts) {
        self.fonts = fonts;
        let ctx = view_context(&self.options, &self.fonts, self.min_width);
        for window in self.windows.values_mut() {
            window.remeasure(&ctx);
        }
    }

    pub fn focus_in(&mut self, id: WindowId) -> Result<(), FilerError> {
        self.window_or_err(id)?;
        self.session.focus = Some(id);
        Ok(())
    }

    // ========================================================================
    // Selection
    // ========================================================================

    /// Changes one item's selection, claiming or releasing ownership as the window's
    /// selection becomes non-empty or empty.
    pub fn select_item(&mut self, id: WindowId, index: usize, selected: bool, timestamp: u32) -> Result<(), FilerError> {
        let window = self.windows.get_mut(&id).ok_or(FilerError::NoSuchWindow(id))?;
        if index >= window.collection().len() {
            return Err(FilerError::NoSuchItem { index });
        }
        let had_selection = window.collection().selected_count() > 0;
        window.collection_mut().select(index, selected);
        let has_selection = window.collection().selected_count() > 0;

        if has_selection && (!had_selection || self.arbiter.owner() != Some(id)) {
            self.claim_selection(id, timestamp)?;
        } else if !has_selection && had_selection {
            self.arbiter.release(id, self.selection_host.as_mut(), timestamp);
        }
        Ok(())
    }

    /// Unselects everything in the window and gives up ownership.
    pub fn clear_selection(&mut self, id: WindowId, timestamp: u32) -> Result<(), FilerError> {
        let window = self.windows.get_mut(&id).ok_or(FilerError::NoSuchWindow(id))?;
        window.collection_mut().clear_selection();
        self.arbiter.release(id, self.selection_host.as_mut(), timestamp);
        Ok(())
    }

    /// Asks the host for the selection on behalf of `id`.
    pub fn claim_selection(&mut self, id: WindowId, timestamp: u32) -> Result<ClaimOutcome, FilerError> {
        self.window_or_err(id)?;
        let outcome = self.arbiter.claim(id, self.selection_host.as_mut(), timestamp);
        let loser = match outcome {
            ClaimOutcome::Granted { evicted } => evicted,
            ClaimOutcome::Declined => Some(id),
        };
        if let Some(loser) = loser
            && let Some(window) = self.windows.get_mut(&loser)
        {
            window.collection_mut().clear_selection();
        }
        Ok(outcome)
    }

    /// The host says someone else took the selection.
    pub fn selection_lost(&mut self) {
        if let Some(owner) = self.arbiter.selection_lost()
            && let Some(window) = self.windows.get_mut(&owner)
        {
            log::debug!("Filer: {} lost the selection", owner);
            window.collection_mut().clear_selection();
        }
    }

    /// The owner's selection rendered for a requester.
    pub fn selection_payload(&self, target: SelectionTarget) -> Option<String> {
        let window = self.windows.get(&self.arbiter.owner()?)?;
        let names: Vec<&str> = window
            .collection()
            .items()
            .iter()
            .filter(|v| v.selected)
            .map(|v| v.item.name.as_str())
            .collect();
        Some(selection_payload(
            window.path(),
            &names,
            target,
            &self.selection_host.host_name(),
        ))
    }

    // ========================================================================
    // Opening items
    // ========================================================================

    /// Opens item `index` of window `id` the way `flags` ask.
    pub fn open_item(&mut self, id: WindowId, index: usize, flags: OpenFlags) -> Result<(), FilerError> {
        let window = self.window_or_err(id)?;
        let item = window
            .collection()
            .get(index)
            .ok_or(FilerError::NoSuchItem { index })?
            .item
            .clone();
        let is_panel = window.is_panel();
        let dir = window.path().to_path_buf();
        let close_window = flags.contains(OpenFlags::CLOSE_WINDOW) && !is_panel;

        let action = resolve_open(&dir, &item, flags, is_panel);
        log::debug!("Filer: Open '{}' in {} with {:?}: {:?}", item.name, id, flags, action);

        let launched = match action {
            OpenAction::FollowLink { link, same_window } => {
                let (target_dir, leaf) = match resolve_symlink(&link) {
                    Ok(target) => target,
                    Err(e) => return Err(self.report(e)),
                };
                if is_panel || !same_window {
                    let new = self.open_dir(&target_dir, PanelType::None)?;
                    self.set_autoselect(new, &leaf)?;
                } else {
                    self.change_to(id, &target_dir, Some(&leaf))?;
                }
                return Ok(());
            }
            OpenAction::RunApp(path) => {
                if let Err(message) = self.launcher.run_app(&path) {
                    return Err(self.report(FilerError::LaunchFailed { path, message }));
                }
                true
            }
            OpenAction::Unmount(path) => {
                if let Err(message) = self.launcher.toggle_mount(&path, true) {
                    return Err(self.report(FilerError::LaunchFailed { path, message }));
                }
                false
            }
            OpenAction::OpenDirectory {
                path,
                same_window,
                mount_first,
            } => {
                if mount_first && let Err(message) = self.launcher.toggle_mount(&path, false) {
                    return Err(self.report(FilerError::LaunchFailed { path, message }));
                }
                if same_window {
                    // The window shows something else now; nothing to wink
                    return self.change_to(id, &path, None);
                }
                self.open_dir(&path, PanelType::None)?;
                false
            }
            OpenAction::Execute(path) => {
                if let Err(message) = self.launcher.execute(&path, &dir) {
                    return Err(self.report(FilerError::LaunchFailed { path, message }));
                }
                true
            }
            OpenAction::OpenWithType { path, content_type } => match self.launcher.open_with_type(&path, &content_type) {
                Ok(true) => true,
                Ok(false) => {
                    return Err(self.report(FilerError::NoRunAction {
                        path,
                        content_type: content_type.to_string(),
                    }));
                }
                Err(message) => return Err(self.report(FilerError::LaunchFailed { path, message })),
            },
            OpenAction::Unknown => return Err(self.report(FilerError::UnknownItemKind { name: item.name })),
        };

        if launched && close_window {
            self.destroy_window(id);
        } else if let Some(window) = self.windows.get_mut(&id) {
            window.collection_mut().wink_item(index);
        }
        Ok(())
    }

    // ========================================================================
    // Event loop
    // ========================================================================

    /// Applies scan results, feeds windows their notifications and fires due timers.
    /// Returns the number of scan messages handled.
    pub fn pump(&mut self) -> usize {
        self.pump_at(Instant::now())
    }

    /// `pump` with an explicit clock, for deterministic timer handling.
    pub fn pump_at(&mut self, now: Instant) -> usize {
        let handled = self.cache.pump();
        self.deliver(now);
        self.close_missing();
        self.fire_timers(now);
        handled
    }

    /// Blocks up to `timeout` for scan progress, then pumps.
    pub fn pump_wait(&mut self, timeout: Duration) -> usize {
        let waited = self.cache.pump_wait(timeout);
        waited + self.pump()
    }

    /// Pumps until no Directory is scanning. Returns false on timeout.
    pub fn wait_until_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.pump();
            if !self.cache.is_busy() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            self.pump_wait((deadline - now).min(Duration::from_millis(50)));
        }
    }

    /// When the next clear-scanning timer is due, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.iter().map(|t| t.deadline).min()
    }

    fn deliver(&mut self, now: Instant) {
        let ctx = view_context(&self.options, &self.fonts, self.min_width);
        for window in self.windows.values_mut() {
            if window.drain_events(&ctx) {
                self.timers.push(ScanTimer {
                    window: window.id(),
                    epoch: window.scan_epoch(),
                    deadline: now + SCANNING_CLEAR_DELAY,
                });
            }
        }
    }

    fn close_missing(&mut self) {
        let missing: Vec<(WindowId, PathBuf)> = self
            .windows
            .values()
            .filter(|w| w.directory().is_some_and(|d| d.is_missing()))
            .map(|w| (w.id(), w.path().to_path_buf()))
            .collect();
        for (id, path) in missing {
            self.report(FilerError::DirectoryMissing { path });
            self.destroy_window(id);
        }
    }

    fn fire_timers(&mut self, now: Instant) {
        let (due, pending): (Vec<ScanTimer>, Vec<ScanTimer>) = self.timers.iter().partition(|t| t.deadline <= now);
        self.timers = pending;
        for timer in due {
            // The window may have closed since the timer was set
            if let Some(window) = self.windows.get_mut(&timer.window) {
                window.finish_scanning(timer.epoch);
            }
        }
    }
}
