//! Filer windows: one view onto a Directory with its own style, order and filter.

pub mod collection;
pub(crate) mod reducer;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::file_system::{Directory, DirectoryCache, DirectoryItem, Subscription};
use crate::font_metrics::Fonts;
use crate::listing::layout::{self, DisplayStyle, ItemSize, Point, Rect, Truncation};
use crate::listing::{NameCase, SortKey};

pub use collection::{Collection, Redraw, ViewItem};

/// Identifies a window for the lifetime of the process. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WindowId(pub u64);

impl std::fmt::Display for WindowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Ordinary window, or a panel pinned to a screen edge.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum PanelType {
    #[default]
    None,
    Top,
    Bottom,
}

impl PanelType {
    pub fn is_panel(self) -> bool {
        self != PanelType::None
    }
}

/// Settings that affect how items are measured and ordered, shared by all windows.
#[derive(Debug, Clone, Copy)]
pub struct ViewContext<'a> {
    pub case: NameCase,
    pub truncation: Truncation,
    pub fonts: &'a Fonts,
    pub min_width: u32,
}

#[derive(Debug)]
pub struct FilerWindow {
    id: WindowId,
    path: PathBuf,
    directory: Option<Arc<Directory>>,
    subscription: Option<Subscription>,
    collection: Collection,
    style: DisplayStyle,
    sort_key: SortKey,
    show_hidden: bool,
    /// Busy indicator: between ScanStart and ScanEnd
    busy: bool,
    /// Shown in the title; cleared a little after ScanEnd
    scanning: bool,
    /// Bumped on every ScanStart, so stale clear-scanning timers can be told apart
    scan_epoch: u64,
    auto_select: Option<String>,
    had_cursor: bool,
    panel: PanelType,
}

impl FilerWindow {
    pub fn new(
        id: WindowId,
        path: PathBuf,
        panel: PanelType,
        style: DisplayStyle,
        sort_key: SortKey,
        show_hidden: bool,
    ) -> Self {
        Self {
            id,
            path,
            directory: None,
            subscription: None,
            collection: Collection::default(),
            style: if panel.is_panel() { DisplayStyle::LargeIcons } else { style },
            sort_key,
            show_hidden,
            busy: false,
            scanning: false,
            scan_epoch: 0,
            auto_select: None,
            had_cursor: false,
            panel,
        }
    }

    pub fn id(&self) -> WindowId {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn directory(&self) -> Option<&Arc<Directory>> {
        self.directory.as_ref()
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    pub fn collection_mut(&mut self) -> &mut Collection {
        &mut self.collection
    }

    /// Names of the displayed items, in display order.
    pub fn names(&self) -> Vec<&str> {
        self.collection.names()
    }

    pub fn style(&self) -> DisplayStyle {
        self.style
    }

    pub fn sort_key(&self) -> SortKey {
        self.sort_key
    }

    pub fn show_hidden(&self) -> bool {
        self.show_hidden
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn is_scanning(&self) -> bool {
        self.scanning
    }

    pub fn scan_epoch(&self) -> u64 {
        self.scan_epoch
    }

    pub fn auto_select(&self) -> Option<&str> {
        self.auto_select.as_deref()
    }

    pub fn had_cursor(&self) -> bool {
        self.had_cursor
    }

    pub fn panel(&self) -> PanelType {
        self.panel
    }

    pub fn is_panel(&self) -> bool {
        self.panel.is_panel()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.collection.cursor()
    }

    pub fn item_size(&self) -> ItemSize {
        self.collection.item_size()
    }

    pub fn title(&self) -> String {
        if self.scanning {
            format!("{} (Scanning)", self.path.display())
        } else {
            self.path.display().to_string()
        }
    }

    // ========================================================================
    // Directory attachment
    // ========================================================================

    /// Points the window at a new Directory and subscribes to it. The collection is
    /// emptied; the subscription replays the Directory's contents.
    pub(crate) fn attach(&mut self, cache: &DirectoryCache, directory: Arc<Directory>) {
        self.path = directory.path().to_path_buf();
        self.collection.clear();
        self.busy = true;
        self.scanning = true;
        self.subscription = Some(cache.attach(&directory, self.id));
        self.directory = Some(directory);
    }

    /// Re-subscribes to the current Directory, redelivering everything.
    pub(crate) fn reattach(&mut self, cache: &DirectoryCache) {
        if let Some(directory) = self.detach(cache) {
            self.attach(cache, directory);
        }
    }

    /// Unsubscribes and hands back the Directory reference for the caller to release.
    pub(crate) fn detach(&mut self, cache: &DirectoryCache) -> Option<Arc<Directory>> {
        let directory = self.directory.take()?;
        cache.detach(&directory, self.id);
        self.subscription = None;
        Some(directory)
    }

    /// Feeds every pending notification through the reducer. Returns true if a scan
    /// ended, i.e. the scanning flag should be cleared after the usual delay.
    pub(crate) fn drain_events(&mut self, ctx: &ViewContext) -> bool {
        let mut scan_ended = false;
        while let Some(event) = self.subscription.as_ref().and_then(Subscription::next_event) {
            scan_ended |= reducer::apply_event(self, event, ctx);
        }
        scan_ended
    }

    /// Delayed half of ScanEnd. Ignored if another scan started in between.
    pub(crate) fn finish_scanning(&mut self, epoch: u64) -> bool {
        if epoch != self.scan_epoch || self.busy {
            return false;
        }
        self.scanning = false;
        true
    }

    /// Starts a new attach cycle remembering whether the user had a cursor.
    pub(crate) fn prepare_change(&mut self, from: Option<&str>) {
        self.had_cursor = self.collection.cursor().is_some() || self.had_cursor;
        self.collection.set_cursor(None);
        self.auto_select = from.map(str::to_string);
    }

    // ========================================================================
    // Style, order and measurement
    // ========================================================================

    /// Fills in name and details widths for the current fonts.
    pub fn measure(item: &mut DirectoryItem, fonts: &Fonts) {
        item.measurements.name_width = fonts.item.text_width(&item.name);
        item.measurements.details_width = fonts.fixed.text_width(&item.details());
    }

    /// Changes the display style. Panels only do Large Icons. Returns the style applied.
    pub fn set_style(&mut self, style: DisplayStyle, ctx: &ViewContext) -> DisplayStyle {
        let style = if self.is_panel() { DisplayStyle::LargeIcons } else { style };
        if self.style != style {
            self.style = style;
            self.shrink_to_fit(ctx);
        }
        style
    }

    /// Changes the sort key and re-sorts. Returns false if it was already in use.
    pub fn set_sort(&mut self, key: SortKey, case: NameCase) -> bool {
        if self.sort_key == key {
            return false;
        }
        self.sort_key = key;
        self.resort(case);
        true
    }

    pub fn resort(&mut self, case: NameCase) {
        self.collection.sort(self.sort_key, case);
    }

    pub(crate) fn set_show_hidden(&mut self, show_hidden: bool) {
        self.show_hidden = show_hidden;
    }

    /// Recomputes the box size from every displayed item.
    pub fn shrink_to_fit(&mut self, ctx: &ViewContext) {
        let size = layout::fit_size(
            self.style,
            self.collection.items().iter().map(|v| &v.item.measurements),
            ctx.truncation,
            ctx.fonts,
            ctx.min_width,
        );
        self.collection.set_item_size(size);
    }

    /// Widens the box if `item` needs more room. Never shrinks.
    pub(crate) fn grow_to_fit(&mut self, item: &DirectoryItem, ctx: &ViewContext) {
        let current = self.collection.item_size();
        let width = layout::item_width(self.style, &item.measurements, ctx.truncation);
        let height = layout::item_height(self.style, ctx.fonts);
        if width > current.width || current.height == 0 {
            self.collection.set_item_size(ItemSize {
                width: width.max(current.width).max(ctx.min_width),
                height,
            });
        }
    }

    /// Re-measures every item, e.g. after a font change, then shrink-fits.
    pub fn remeasure(&mut self, ctx: &ViewContext) {
        for view in self.collection.items_mut() {
            Self::measure(&mut view.item, ctx.fonts);
        }
        self.shrink_to_fit(ctx);
    }

    // ========================================================================
    // Cursor and autoselect
    // ========================================================================

    /// Highlights `name` if it's shown (cursor if there is one, wink otherwise),
    /// or remembers it until it turns up.
    pub fn set_autoselect(&mut self, name: &str) {
        match self.collection.find(name) {
            Some(index) => {
                if self.collection.cursor().is_some() {
                    self.collection.set_cursor(Some(index));
                } else {
                    self.collection.wink_item(index);
                }
                self.auto_select = None;
            }
            None => self.auto_select = Some(name.to_string()),
        }
    }

    pub fn set_cursor(&mut self, index: Option<usize>) {
        self.collection.set_cursor(index);
    }

    // ========================================================================
    // Geometry
    // ========================================================================

    /// Box of item `index` for a viewport `viewport_width` pixels wide.
    pub fn item_rect(&self, index: usize, viewport_width: u32) -> Option<Rect> {
        if index >= self.collection.len() {
            return None;
        }
        let size = self.collection.item_size();
        Some(layout::item_rect(index, layout::columns(viewport_width, size), size))
    }

    /// Index of the item drawn under `point`, if the point is on its icon or text.
    pub fn item_at(&self, point: Point, viewport_width: u32, fonts: &Fonts) -> Option<usize> {
        let size = self.collection.item_size();
        let columns = layout::columns(viewport_width, size);
        let (index, local) = layout::cell_at(point, columns, size, self.collection.len())?;
        let view = self.collection.get(index)?;
        layout::hit_test(self.style, &view.item.measurements, fonts, local, size).then_some(index)
    }
}

#[cfg(test)]
mod reducer_test;
