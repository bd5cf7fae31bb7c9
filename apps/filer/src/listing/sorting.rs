//! Sorting configuration and logic for window items.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::file_system::{ContentType, DirectoryItem};

// ============================================================================
// Sorting configuration
// ============================================================================

/// Key to sort items by. Every key falls back to the name, so each is a total order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
pub enum SortKey {
    Name,
    #[default]
    Type,
    Date,
    Size,
}

impl SortKey {
    pub const ALL: [SortKey; 4] = [SortKey::Name, SortKey::Type, SortKey::Date, SortKey::Size];

    /// Name as stored in the options file.
    pub fn name(self) -> &'static str {
        match self {
            SortKey::Name => "Name",
            SortKey::Type => "Type",
            SortKey::Date => "Date",
            SortKey::Size => "Size",
        }
    }

    /// Case-insensitive inverse of `name`.
    pub fn from_name(name: &str) -> Option<SortKey> {
        Self::ALL.into_iter().find(|key| key.name().eq_ignore_ascii_case(name.trim()))
    }
}

/// Whether name comparison folds case.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum NameCase {
    Sensitive,
    #[default]
    Insensitive,
}

impl NameCase {
    pub fn from_nocase(nocase: bool) -> Self {
        if nocase { NameCase::Insensitive } else { NameCase::Sensitive }
    }
}

// ============================================================================
// Sorting logic
// ============================================================================

/// Lexicographic name comparison.
///
/// Case-insensitive mode breaks ties between names that differ only in case by raw
/// bytes, so distinct names never compare equal.
pub fn compare_names(a: &str, b: &str, case: NameCase) -> Ordering {
    match case {
        NameCase::Sensitive => a.cmp(b),
        NameCase::Insensitive => a
            .chars()
            .flat_map(char::to_lowercase)
            .cmp(b.chars().flat_map(char::to_lowercase))
            .then_with(|| a.cmp(b)),
    }
}

/// Items with a resolved type come first, then media type, then subtype.
fn compare_content_types(a: Option<&ContentType>, b: Option<&ContentType>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.media_type.cmp(&b.media_type).then_with(|| a.subtype.cmp(&b.subtype)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Compares two items under `key`, falling back to the name.
pub fn compare_items(a: &DirectoryItem, b: &DirectoryItem, key: SortKey, case: NameCase) -> Ordering {
    let primary = match key {
        SortKey::Name => Ordering::Equal,
        SortKey::Type => a
            .kind
            .cmp(&b.kind)
            // Application directories after plain ones of the same kind
            .then_with(|| a.is_app_dir().cmp(&b.is_app_dir()))
            .then_with(|| compare_content_types(a.content_type.as_ref(), b.content_type.as_ref())),
        // Newest and biggest first
        SortKey::Date => b.mtime.cmp(&a.mtime),
        SortKey::Size => b.size.cmp(&a.size),
    };
    primary.then_with(|| compare_names(&a.name, &b.name, case))
}

/// Sorts anything that wraps a DirectoryItem. Stable.
pub fn sort_items<T: AsRef<DirectoryItem>>(items: &mut [T], key: SortKey, case: NameCase) {
    items.sort_by(|a, b| compare_items(a.as_ref(), b.as_ref(), key, case));
}
