//! Turning user intent into navigation: click/key flags and open dispatch.

pub mod flags;
pub mod open;

pub use flags::{InputEvent, OpenFlags, derive_open_flags};
pub use open::{Launcher, OpenAction, SystemLauncher, resolve_open, resolve_symlink};
