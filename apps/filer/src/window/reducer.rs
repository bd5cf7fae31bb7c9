//! Folds Directory notifications into a window's displayed collection.
//!
//! Whatever the batch boundaries, the result is the Directory's items minus the
//! hidden-file filter, in the window's sort order.

use std::collections::HashSet;

use super::{FilerWindow, ViewContext};
use crate::file_system::{DirEvent, DirectoryItem};
use crate::listing::is_visible;

/// Applies one notification. Returns true on ScanEnd, when the caller should schedule
/// clearing the scanning flag.
pub(crate) fn apply_event(window: &mut FilerWindow, event: DirEvent, ctx: &ViewContext) -> bool {
    match event {
        DirEvent::ScanStart => {
            window.busy = true;
            window.scanning = true;
            window.scan_epoch += 1;
            false
        }
        DirEvent::Add(items) => {
            add_items(window, items, ctx);
            false
        }
        DirEvent::Remove(items) => {
            remove_items(window, &items, ctx);
            false
        }
        DirEvent::Update(items) => {
            update_items(window, items, ctx);
            false
        }
        DirEvent::ScanEnd => {
            end_scan(window, ctx);
            true
        }
    }
}

fn add_items(window: &mut FilerWindow, items: Vec<DirectoryItem>, ctx: &ViewContext) {
    let mut inserted = false;

    for mut item in items {
        if !is_visible(&item.name, window.show_hidden) {
            continue;
        }
        FilerWindow::measure(&mut item, ctx.fonts);
        window.grow_to_fit(&item, ctx);

        let name = item.name.clone();
        let index = match window.collection.find(&name) {
            Some(index) => {
                window.collection.replace(index, item);
                index
            }
            None => window.collection.insert(item),
        };
        inserted = true;

        if window.collection.cursor().is_none() && window.auto_select.as_deref() == Some(name.as_str()) {
            window.auto_select = None;
            if window.had_cursor {
                window.collection.set_cursor(Some(index));
            } else {
                window.collection.wink_item(index);
            }
        }
    }

    // Once per batch, not per item
    if inserted {
        window.resort(ctx.case);
    }
}

fn remove_items(window: &mut FilerWindow, items: &[DirectoryItem], ctx: &ViewContext) {
    let names: HashSet<&str> = items.iter().map(|i| i.name.as_str()).collect();
    if window.collection.delete_if(|item| names.contains(item.name.as_str())) > 0 {
        window.shrink_to_fit(ctx);
    }
}

fn update_items(window: &mut FilerWindow, items: Vec<DirectoryItem>, ctx: &ViewContext) {
    for mut item in items {
        if !is_visible(&item.name, window.show_hidden) {
            continue;
        }
        match window.collection.find(&item.name) {
            Some(index) => {
                FilerWindow::measure(&mut item, ctx.fonts);
                window.grow_to_fit(&item, ctx);
                window.collection.replace(index, item);
            }
            None => log::warn!("Failed to find '{}' in {}", item.name, window.path.display()),
        }
    }
    // The change may have moved the item in date or size order
    window.resort(ctx.case);
}

fn end_scan(window: &mut FilerWindow, ctx: &ViewContext) {
    window.busy = false;
    window.shrink_to_fit(ctx);
    if window.had_cursor && window.collection.cursor().is_none() && !window.collection.is_empty() {
        window.collection.set_cursor(Some(0));
    }
    window.had_cursor = false;
    if let Some(target) = window.auto_select.take() {
        log::debug!("Autoselect: '{}' never appeared in {}", target, window.path.display());
    }
}
