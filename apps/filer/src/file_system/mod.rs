//! File system side of the engine: item model, directory reading, the shared directory
//! cache and change watching.

pub(crate) mod cache;
pub(crate) mod events;
pub(crate) mod item;
pub(crate) mod reading;
pub(crate) mod types;
pub(crate) mod watcher;

pub use cache::{Directory, DirectoryCache, SCAN_BATCH_SIZE};
pub use events::{DirEvent, Subscription};
pub use item::{ContentType, DirectoryItem, FileKind, IconSize, ItemFlags, Measurements, format_size, permission_string};
pub use reading::{DirectoryIdentity, canonical_path, read_item};
pub use types::{MimeGuessResolver, TypeResolver};
