//! Tests for the update reducer and the autoselect/cursor rules.

use super::reducer::apply_event;
use super::*;
use crate::file_system::{DirEvent, DirectoryItem, FileKind};
use crate::font_metrics::{FontMetrics, Fonts};
use crate::listing::{NameCase, SortKey, Truncation, is_visible, sort_items};

fn one_pixel_fonts() -> Fonts {
    Fonts {
        item: FontMetrics::monospace("test", 1.0, 10, 2),
        fixed: FontMetrics::monospace("test-fixed", 1.0, 10, 2),
    }
}

fn ctx(fonts: &Fonts) -> ViewContext<'_> {
    ViewContext {
        case: NameCase::Insensitive,
        truncation: Truncation::default(),
        fonts,
        min_width: 0,
    }
}

fn window(sort_key: SortKey, show_hidden: bool) -> FilerWindow {
    FilerWindow::new(
        WindowId(1),
        PathBuf::from("/tmp/d"),
        PanelType::None,
        DisplayStyle::LargeIcons,
        sort_key,
        show_hidden,
    )
}

fn file(name: &str, size: u64) -> DirectoryItem {
    DirectoryItem::new(name, FileKind::File).with_size(size)
}

fn names(window: &FilerWindow) -> Vec<String> {
    window.names().into_iter().map(str::to_string).collect()
}

#[test]
fn test_fold_matches_filtered_sorted_snapshot_for_any_batching() {
    let fonts = one_pixel_fonts();
    let ctx = ctx(&fonts);
    let items = vec![
        file("delta", 4),
        file(".hidden", 9),
        file("alpha", 1),
        file("Charlie", 3),
        file("bravo", 2),
        file("echo", 3),
    ];

    let mut expected: Vec<DirectoryItem> = items.iter().filter(|i| is_visible(&i.name, false)).cloned().collect();
    sort_items(&mut expected, SortKey::Size, NameCase::Insensitive);
    let expected: Vec<String> = expected.into_iter().map(|i| i.name).collect();

    for batch_size in 1..=items.len() {
        let mut w = window(SortKey::Size, false);
        apply_event(&mut w, DirEvent::ScanStart, &ctx);
        for batch in items.chunks(batch_size) {
            apply_event(&mut w, DirEvent::Add(batch.to_vec()), &ctx);
        }
        apply_event(&mut w, DirEvent::ScanEnd, &ctx);
        assert_eq!(names(&w), expected, "batch size {}", batch_size);
    }
}

#[test]
fn test_remove_and_update_keep_the_fixed_point() {
    let fonts = one_pixel_fonts();
    let ctx = ctx(&fonts);
    let mut w = window(SortKey::Size, false);

    apply_event(&mut w, DirEvent::Add(vec![file("a", 1), file("b", 2), file("c", 3)]), &ctx);
    assert_eq!(names(&w), vec!["c", "b", "a"]);

    apply_event(&mut w, DirEvent::Update(vec![file("a", 10)]), &ctx);
    assert_eq!(names(&w), vec!["a", "c", "b"]);
    assert_eq!(w.collection().get(0).unwrap().item.size, 10);

    apply_event(&mut w, DirEvent::Remove(vec![file("c", 3)]), &ctx);
    assert_eq!(names(&w), vec!["a", "b"]);
}

#[test]
fn test_hidden_items_are_filtered() {
    let fonts = one_pixel_fonts();
    let ctx = ctx(&fonts);
    let batch = vec![file(".profile", 1), file(".", 0), file("..", 0), file("notes", 1)];

    let mut hidden = window(SortKey::Name, false);
    apply_event(&mut hidden, DirEvent::Add(batch.clone()), &ctx);
    assert_eq!(names(&hidden), vec!["notes"]);

    let mut shown = window(SortKey::Name, true);
    apply_event(&mut shown, DirEvent::Add(batch), &ctx);
    assert_eq!(names(&shown), vec![".profile", "notes"]);
}

#[test]
fn test_update_of_unknown_item_is_ignored() {
    let fonts = one_pixel_fonts();
    let ctx = ctx(&fonts);
    let mut w = window(SortKey::Name, false);
    apply_event(&mut w, DirEvent::Add(vec![file("a", 1)]), &ctx);

    apply_event(&mut w, DirEvent::Update(vec![file("ghost", 1), file(".dot", 1)]), &ctx);

    assert_eq!(names(&w), vec!["a"]);
}

#[test]
fn test_repeated_add_replaces_instead_of_duplicating() {
    let fonts = one_pixel_fonts();
    let ctx = ctx(&fonts);
    let mut w = window(SortKey::Name, false);

    apply_event(&mut w, DirEvent::Add(vec![file("a", 1)]), &ctx);
    apply_event(&mut w, DirEvent::Add(vec![file("a", 5)]), &ctx);

    assert_eq!(names(&w), vec!["a"]);
    assert_eq!(w.collection().get(0).unwrap().item.size, 5);
}

#[test]
fn test_box_width_grows_then_recomputes_after_remove() {
    let fonts = one_pixel_fonts();
    let ctx = ctx(&fonts);
    let mut w = window(SortKey::Name, false);
    let ten = DirectoryItem::new("ten", FileKind::File).with_icon(6, 10);
    let fifty = DirectoryItem::new("fifty", FileKind::File).with_icon(46, 10);
    let twenty = DirectoryItem::new("twenty", FileKind::File).with_icon(16, 10);

    apply_event(&mut w, DirEvent::Add(vec![ten.clone()]), &ctx);
    assert_eq!(w.item_size().width, 10);
    apply_event(&mut w, DirEvent::Add(vec![fifty.clone(), twenty]), &ctx);
    assert_eq!(w.item_size().width, 50);

    apply_event(&mut w, DirEvent::Remove(vec![fifty]), &ctx);
    assert_eq!(w.item_size().width, 20);
}

#[test]
fn test_scan_flags_and_delayed_clear() {
    let fonts = one_pixel_fonts();
    let ctx = ctx(&fonts);
    let mut w = window(SortKey::Name, false);

    assert!(!apply_event(&mut w, DirEvent::ScanStart, &ctx));
    assert!(w.is_busy());
    assert!(w.is_scanning());
    assert_eq!(w.title(), "/tmp/d (Scanning)");
    let epoch = w.scan_epoch();

    assert!(apply_event(&mut w, DirEvent::ScanEnd, &ctx));
    assert!(!w.is_busy());
    // Still showing "scanning" until the timer fires
    assert!(w.is_scanning());

    assert!(w.finish_scanning(epoch));
    assert!(!w.is_scanning());
    assert_eq!(w.title(), "/tmp/d");
}

#[test]
fn test_stale_scan_timer_is_ignored() {
    let fonts = one_pixel_fonts();
    let ctx = ctx(&fonts);
    let mut w = window(SortKey::Name, false);

    apply_event(&mut w, DirEvent::ScanStart, &ctx);
    let first = w.scan_epoch();
    apply_event(&mut w, DirEvent::ScanEnd, &ctx);
    apply_event(&mut w, DirEvent::ScanStart, &ctx);

    assert!(!w.finish_scanning(first));
    assert!(w.is_scanning());
}

#[test]
fn test_autoselect_sets_cursor_when_window_had_one() {
    let fonts = one_pixel_fonts();
    let ctx = ctx(&fonts);
    let mut w = window(SortKey::Name, false);
    apply_event(&mut w, DirEvent::Add(vec![file("x", 1)]), &ctx);
    w.set_cursor(Some(0));

    w.prepare_change(Some("sub"));
    w.collection_mut().clear();
    apply_event(&mut w, DirEvent::ScanStart, &ctx);
    apply_event(
        &mut w,
        DirEvent::Add(vec![
            DirectoryItem::new("sub", FileKind::Directory),
            file("z", 1),
            file("a", 1),
        ]),
        &ctx,
    );

    assert_eq!(names(&w), vec!["a", "sub", "z"]);
    assert_eq!(w.cursor(), Some(1));
    assert_eq!(w.auto_select(), None);
}

#[test]
fn test_autoselect_only_winks_without_previous_cursor() {
    let fonts = one_pixel_fonts();
    let ctx = ctx(&fonts);
    let mut w = window(SortKey::Name, false);

    w.prepare_change(Some("sub"));
    apply_event(&mut w, DirEvent::ScanStart, &ctx);
    apply_event(
        &mut w,
        DirEvent::Add(vec![DirectoryItem::new("sub", FileKind::Directory), file("a", 1)]),
        &ctx,
    );
    apply_event(&mut w, DirEvent::ScanEnd, &ctx);

    assert_eq!(w.cursor(), None);
    assert_eq!(w.collection().wink(), Some(1));
}

#[test]
fn test_scan_end_defaults_cursor_and_discards_target() {
    let fonts = one_pixel_fonts();
    let ctx = ctx(&fonts);
    let mut w = window(SortKey::Name, false);
    apply_event(&mut w, DirEvent::Add(vec![file("x", 1)]), &ctx);
    w.set_cursor(Some(0));

    w.prepare_change(Some("missing"));
    w.collection_mut().clear();
    apply_event(&mut w, DirEvent::Add(vec![file("b", 1), file("a", 1)]), &ctx);
    assert_eq!(w.cursor(), None);

    apply_event(&mut w, DirEvent::ScanEnd, &ctx);

    assert_eq!(w.cursor(), Some(0));
    assert!(!w.had_cursor());
    assert_eq!(w.auto_select(), None);
}

#[test]
fn test_set_autoselect_on_displayed_item() {
    let fonts = one_pixel_fonts();
    let ctx = ctx(&fonts);
    let mut w = window(SortKey::Name, false);
    apply_event(&mut w, DirEvent::Add(vec![file("a", 1), file("b", 1)]), &ctx);

    w.set_autoselect("b");
    assert_eq!(w.collection().wink(), Some(1));
    assert_eq!(w.cursor(), None);

    w.set_cursor(Some(0));
    w.set_autoselect("b");
    assert_eq!(w.cursor(), Some(1));

    w.set_autoselect("later");
    assert_eq!(w.auto_select(), Some("later"));
}

#[test]
fn test_panel_is_forced_to_large_icons() {
    let fonts = one_pixel_fonts();
    let ctx = ctx(&fonts);
    let mut panel = FilerWindow::new(
        WindowId(2),
        PathBuf::from("/"),
        PanelType::Bottom,
        DisplayStyle::FullInfo,
        SortKey::Name,
        false,
    );
    assert_eq!(panel.style(), DisplayStyle::LargeIcons);
    assert_eq!(panel.set_style(DisplayStyle::SmallIcons, &ctx), DisplayStyle::LargeIcons);

    let mut w = window(SortKey::Name, false);
    assert_eq!(w.set_style(DisplayStyle::FullInfo, &ctx), DisplayStyle::FullInfo);
    assert_eq!(w.item_size().height, 46);
}

#[test]
fn test_item_at_uses_grid_and_hit_test() {
    let fonts = one_pixel_fonts();
    let ctx = ctx(&fonts);
    let mut w = window(SortKey::Name, false);
    apply_event(&mut w, DirEvent::Add(vec![file("a", 1), file("b", 1)]), &ctx);
    apply_event(&mut w, DirEvent::ScanEnd, &ctx);

    // Default 48x42 icons: boxes are 52 wide, 12 + 42 + 8 high
    assert_eq!(w.item_size(), ItemSize { width: 52, height: 62 });
    assert_eq!(w.item_at(Point::new(26, 20), 200, &fonts), Some(0));
    assert_eq!(w.item_at(Point::new(78, 20), 200, &fonts), Some(1));
    assert_eq!(w.item_at(Point::new(0, 20), 200, &fonts), None);
    assert_eq!(w.item_at(Point::new(26, 20), 60, &fonts), Some(0));
    assert_eq!(w.item_rect(1, 60), Some(Rect { x: 0, y: 62, width: 52, height: 62 }));
}
