//! Error types for the filer engine.
//!
//! Nothing here is fatal to the process: the worst outcome of any error is that one
//! window closes. User-visible errors are also queued on the `Filer` as notices.

use std::path::PathBuf;

use crate::window::WindowId;

/// Error type for filer window operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilerError {
    /// Opening or changing to a directory failed (missing or unreadable).
    DirectoryNotAccessible { path: PathBuf },
    /// A rescan found that the window's directory no longer exists.
    DirectoryMissing { path: PathBuf },
    /// A symbolic link couldn't be read or its target doesn't resolve.
    BrokenSymlink { path: PathBuf, message: String },
    /// No run action is known for this content type.
    NoRunAction { path: PathBuf, content_type: String },
    /// The launcher failed to start a program or application directory.
    LaunchFailed { path: PathBuf, message: String },
    /// The item's kind has no open behavior (devices, sockets, ...).
    UnknownItemKind { name: String },
    /// The window id doesn't refer to an open window.
    NoSuchWindow(WindowId),
    /// The index is past the end of the window's displayed items.
    NoSuchItem { index: usize },
    /// Generic I/O error
    Io(String),
}

impl std::fmt::Display for FilerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DirectoryNotAccessible { path } => write!(f, "Directory '{}' is not accessible", path.display()),
            Self::DirectoryMissing { path } => write!(f, "Directory missing/deleted: {}", path.display()),
            Self::BrokenSymlink { path, message } => write!(
                f,
                "Broken symlink (or you don't have permission to follow it): {}: {}",
                path.display(),
                message
            ),
            Self::NoRunAction { path, content_type } => write!(
                f,
                "No run action specified for files of this type ({}): {}",
                content_type,
                path.display()
            ),
            Self::LaunchFailed { path, message } => write!(f, "Failed to run {}: {}", path.display(), message),
            Self::UnknownItemKind { name } => write!(f, "I don't know how to open '{}'", name),
            Self::NoSuchWindow(id) => write!(f, "No such filer window: {}", id),
            Self::NoSuchItem { index } => write!(f, "No item at index {}", index),
            Self::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for FilerError {}

impl From<std::io::Error> for FilerError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
