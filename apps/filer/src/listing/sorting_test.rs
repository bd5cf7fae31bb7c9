//! Tests for item ordering.

use super::sorting::*;
use std::cmp::Ordering;
use crate::file_system::{ContentType, DirectoryItem, FileKind, ItemFlags};

fn file(name: &str) -> DirectoryItem {
    DirectoryItem::new(name, FileKind::File)
}

fn names(items: &[DirectoryItem]) -> Vec<&str> {
    items.iter().map(|i| i.name.as_str()).collect()
}

#[test]
fn test_sort_key_names_round_trip() {
    for key in SortKey::ALL {
        assert_eq!(SortKey::from_name(key.name()), Some(key));
    }
    assert_eq!(SortKey::from_name("size"), Some(SortKey::Size));
    assert_eq!(SortKey::from_name("Colour"), None);
}

#[test]
fn test_name_case_insensitive() {
    let mut items = vec![file("b"), file("C"), file("a")];
    sort_items(&mut items, SortKey::Name, NameCase::Insensitive);
    assert_eq!(names(&items), vec!["a", "b", "C"]);
}

#[test]
fn test_name_case_sensitive() {
    let mut items = vec![file("b"), file("C"), file("a")];
    sort_items(&mut items, SortKey::Name, NameCase::Sensitive);
    assert_eq!(names(&items), vec!["C", "a", "b"]);
}

#[test]
fn test_insensitive_is_total_for_case_variants() {
    assert_eq!(compare_names("README", "readme", NameCase::Insensitive), Ordering::Less);
    assert_eq!(compare_names("readme", "README", NameCase::Insensitive), Ordering::Greater);
    assert_eq!(compare_names("same", "same", NameCase::Insensitive), Ordering::Equal);
}

#[test]
fn test_size_descending_with_name_tie_break() {
    let mut items = vec![
        file("small").with_size(1),
        file("b-big").with_size(100),
        file("a-big").with_size(100),
    ];
    sort_items(&mut items, SortKey::Size, NameCase::Insensitive);
    assert_eq!(names(&items), vec!["a-big", "b-big", "small"]);
}

#[test]
fn test_date_newest_first() {
    let mut items = vec![file("old").with_mtime(10), file("new").with_mtime(30), file("mid").with_mtime(20)];
    sort_items(&mut items, SortKey::Date, NameCase::Insensitive);
    assert_eq!(names(&items), vec!["new", "mid", "old"]);
}

#[test]
fn test_type_order() {
    let mut items = vec![
        file("untyped"),
        file("notes.txt").with_content_type(ContentType::text_plain()),
        file("pic.png").with_content_type(ContentType::new("image", "png")),
        DirectoryItem::new("App", FileKind::Directory).with_flags(ItemFlags::APP_DIR),
        DirectoryItem::new("src", FileKind::Directory),
        DirectoryItem::new("tty", FileKind::CharDevice),
    ];
    sort_items(&mut items, SortKey::Type, NameCase::Insensitive);
    assert_eq!(
        names(&items),
        vec!["src", "App", "pic.png", "notes.txt", "untyped", "tty"]
    );
}

#[test]
fn test_items_differing_only_by_name_follow_name_order() {
    for key in SortKey::ALL {
        for case in [NameCase::Sensitive, NameCase::Insensitive] {
            let mut items = vec![file("b"), file("B"), file("a")];
            sort_items(&mut items, key, case);
            let mut expected = vec![file("b"), file("B"), file("a")];
            expected.sort_by(|x, y| compare_names(&x.name, &y.name, case));
            assert_eq!(names(&items), names(&expected), "key {:?} case {:?}", key, case);
        }
    }
}

#[test]
fn test_sort_is_idempotent() {
    let mut items = vec![
        file("x").with_size(3),
        file("y").with_size(1),
        file("z").with_size(3),
        file("w").with_size(2),
    ];
    for key in SortKey::ALL {
        sort_items(&mut items, key, NameCase::Insensitive);
        let once: Vec<String> = items.iter().map(|i| i.name.clone()).collect();
        sort_items(&mut items, key, NameCase::Insensitive);
        let twice: Vec<String> = items.iter().map(|i| i.name.clone()).collect();
        assert_eq!(once, twice);
    }
}
