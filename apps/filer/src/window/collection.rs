//! The ordered item collection a window displays, with cursor, wink and selection.

use crate::file_system::DirectoryItem;
use crate::listing::{ItemSize, NameCase, SortKey, sort_items};

/// A displayed item: the window's own copy plus its selection state.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewItem {
    pub item: DirectoryItem,
    pub selected: bool,
}

impl AsRef<DirectoryItem> for ViewItem {
    fn as_ref(&self) -> &DirectoryItem {
        &self.item
    }
}

/// What the presentation layer needs to repaint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redraw {
    Item(usize),
    All,
}

#[derive(Debug, Clone, Default)]
pub struct Collection {
    items: Vec<ViewItem>,
    cursor: Option<usize>,
    wink: Option<usize>,
    item_size: ItemSize,
    redraws: Vec<Redraw>,
}

impl Collection {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[ViewItem] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&ViewItem> {
        self.items.get(index)
    }

    pub fn names(&self) -> Vec<&str> {
        self.items.iter().map(|v| v.item.name.as_str()).collect()
    }

    pub fn find(&self, name: &str) -> Option<usize> {
        self.items.iter().position(|v| v.item.name == name)
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.cursor = None;
        self.wink = None;
        self.request_redraw_all();
    }

    /// Appends an item, returning its index. Callers sort afterwards.
    pub fn insert(&mut self, item: DirectoryItem) -> usize {
        self.items.push(ViewItem { item, selected: false });
        self.items.len() - 1
    }

    /// Swaps in a newer version of the item at `index`, keeping its selection.
    pub fn replace(&mut self, index: usize, item: DirectoryItem) {
        if let Some(slot) = self.items.get_mut(index) {
            slot.item = item;
            self.redraws.push(Redraw::Item(index));
        }
    }

    /// Removes every item matching `predicate`. The cursor and wink follow their items;
    /// a deleted cursor item leaves the cursor on whatever slid into its place.
    pub fn delete_if(&mut self, predicate: impl Fn(&DirectoryItem) -> bool) -> usize {
        let before = self.items.len();
        let cursor_name = self.name_at(self.cursor);
        let wink_name = self.name_at(self.wink);
        let old_cursor = self.cursor;

        self.items.retain(|v| !predicate(&v.item));
        let removed = before - self.items.len();
        if removed == 0 {
            return 0;
        }

        self.cursor = match cursor_name.and_then(|name| self.find(&name)) {
            Some(index) => Some(index),
            None if self.items.is_empty() => None,
            None => old_cursor.map(|index| index.min(self.items.len() - 1)),
        };
        self.wink = wink_name.and_then(|name| self.find(&name));
        self.request_redraw_all();
        removed
    }

    /// Stable sort; cursor and wink stay on the same items.
    pub fn sort(&mut self, key: SortKey, case: NameCase) {
        let cursor_name = self.name_at(self.cursor);
        let wink_name = self.name_at(self.wink);

        sort_items(&mut self.items, key, case);

        self.cursor = cursor_name.and_then(|name| self.find(&name));
        self.wink = wink_name.and_then(|name| self.find(&name));
        self.request_redraw_all();
    }

    fn name_at(&self, index: Option<usize>) -> Option<String> {
        index.and_then(|i| self.items.get(i)).map(|v| v.item.name.clone())
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn set_cursor(&mut self, index: Option<usize>) {
        let index = index.filter(|&i| i < self.items.len());
        if let Some(old) = self.cursor {
            self.redraws.push(Redraw::Item(old));
        }
        if let Some(new) = index {
            self.redraws.push(Redraw::Item(new));
        }
        self.cursor = index;
    }

    /// The most recently winked item.
    pub fn wink(&self) -> Option<usize> {
        self.wink
    }

    /// Flashes an item without moving the cursor.
    pub fn wink_item(&mut self, index: usize) {
        if index < self.items.len() {
            self.wink = Some(index);
            self.redraws.push(Redraw::Item(index));
        }
    }

    pub fn select(&mut self, index: usize, selected: bool) {
        if let Some(slot) = self.items.get_mut(index)
            && slot.selected != selected
        {
            slot.selected = selected;
            self.redraws.push(Redraw::Item(index));
        }
    }

    /// Unhighlights everything. Returns true if anything was selected.
    pub fn clear_selection(&mut self) -> bool {
        let mut any = false;
        for index in 0..self.items.len() {
            if self.items[index].selected {
                self.items[index].selected = false;
                self.redraws.push(Redraw::Item(index));
                any = true;
            }
        }
        any
    }

    pub fn selected_indices(&self) -> Vec<usize> {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, v)| v.selected)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn selected_count(&self) -> usize {
        self.items.iter().filter(|v| v.selected).count()
    }

    pub fn item_size(&self) -> ItemSize {
        self.item_size
    }

    pub fn set_item_size(&mut self, size: ItemSize) {
        if self.item_size != size {
            self.item_size = size;
            self.request_redraw_all();
        }
    }

    pub fn request_redraw(&mut self, index: usize) {
        self.redraws.push(Redraw::Item(index));
    }

    fn request_redraw_all(&mut self) {
        self.redraws.clear();
        self.redraws.push(Redraw::All);
    }

    /// Hands pending repaint requests to the presentation layer.
    pub fn take_redraws(&mut self) -> Vec<Redraw> {
        std::mem::take(&mut self.redraws)
    }

    pub(crate) fn items_mut(&mut self) -> impl Iterator<Item = &mut ViewItem> {
        self.items.iter_mut()
    }
}
