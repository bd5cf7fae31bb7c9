//! Directory-window engine for a spatial file manager.
//!
//! Keeps filer windows in sync with a shared, reference-counted cache of directory
//! snapshots, lays items out per display style, orders them, and arbitrates which
//! window owns the primary selection. Drawing, menus and dialogs live elsewhere; this
//! crate only answers "what does the window show and how does it stay correct".

// Warn on redundant path prefixes (e.g., std::path::Path when Path is imported)
#![warn(unused_qualifications)]
// Use log::* macros instead of println!/eprintln! for proper log level control
#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod error;
pub mod file_system;
pub mod filer;
pub mod font_metrics;
mod ignore_poison;
pub mod listing;
pub mod navigation;
pub mod selection;
pub mod settings;
pub mod window;

#[cfg(test)]
mod filer_integration_test;

pub use error::FilerError;
pub use file_system::{ContentType, DirEvent, Directory, DirectoryCache, DirectoryItem, FileKind, ItemFlags};
pub use filer::{Filer, Session};
pub use listing::{DisplayStyle, NameCase, SortKey};
pub use navigation::{InputEvent, Launcher, OpenFlags};
pub use selection::{SelectionArbiter, SelectionHost, SelectionTarget};
pub use settings::FilerOptions;
pub use window::{FilerWindow, PanelType, WindowId};
