//! Persisted filer options.

pub mod options;

pub use options::{FilerOptions, OptionError, ToolbarType, default_options_path, load_options, parse_options, save_options};
