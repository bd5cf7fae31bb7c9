//! Display policy for a window's items: which are shown, in what order, at what size.

pub mod layout;
pub mod sorting;

pub use layout::{DisplayStyle, ItemSize, Point, Rect, Truncation};
pub use sorting::{NameCase, SortKey, compare_items, compare_names, sort_items};

/// Whether an entry passes the hidden-file filter.
///
/// Dotfiles show only with `show_hidden`; `.` and `..` never show.
pub fn is_visible(name: &str, show_hidden: bool) -> bool {
    if name == "." || name == ".." {
        return false;
    }
    show_hidden || !name.starts_with('.')
}

#[cfg(test)]
mod sorting_test;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_filter() {
        assert!(!is_visible(".profile", false));
        assert!(is_visible(".profile", true));
        assert!(is_visible("profile", false));
    }

    #[test]
    fn test_dot_entries_never_visible() {
        for show_hidden in [false, true] {
            assert!(!is_visible(".", show_hidden));
            assert!(!is_visible("..", show_hidden));
        }
        assert!(is_visible("...", true));
    }
}
