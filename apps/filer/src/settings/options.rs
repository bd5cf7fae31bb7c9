//! Filer options, persisted as a flat JSON object keyed by option name.
//!
//! Each key is read on its own from a `serde_json::Value`, so one bad value doesn't lose
//! the rest of the file: the key keeps its default and the problem is reported.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

use crate::listing::layout::MAX_TRUNCATE;
use crate::listing::{DisplayStyle, SortKey, Truncation};

pub const KEY_SORT_NOCASE: &str = "filer_sort_nocase";
pub const KEY_NEW_WINDOW_ON_1: &str = "filer_new_window_on_1";
pub const KEY_MENU_ON_2: &str = "filer_menu_on_2";
pub const KEY_SINGLE_CLICK: &str = "filer_single_click";
pub const KEY_UNIQUE_WINDOWS: &str = "filer_unique_windows";
pub const KEY_DISPLAY_STYLE: &str = "filer_display_style";
pub const KEY_SORT_BY: &str = "filer_sort_by";
pub const KEY_TOOLBAR: &str = "filer_toolbar";
pub const KEY_TRUNCATE: &str = "filer_truncate";
pub const KEY_WATCH_DIRECTORIES: &str = "filer_watch_directories";

/// Toolbar shown at the top of filer windows.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub enum ToolbarType {
    None,
    #[default]
    Normal,
    Gnome,
}

impl ToolbarType {
    pub fn name(self) -> &'static str {
        match self {
            ToolbarType::None => "None",
            ToolbarType::Normal => "Normal",
            ToolbarType::Gnome => "GNOME",
        }
    }

    pub fn from_name(name: &str) -> Option<ToolbarType> {
        [ToolbarType::None, ToolbarType::Normal, ToolbarType::Gnome]
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(name.trim()))
    }
}

/// A persisted value that couldn't be used. The option keeps its default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionError {
    pub key: String,
    pub message: String,
}

impl std::fmt::Display for OptionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.key, self.message)
    }
}

impl std::error::Error for OptionError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilerOptions {
    /// Fold case when sorting by name
    pub sort_nocase: bool,
    /// Button 1 opens a new window (other buttons reuse the current one)
    pub new_window_on_1: bool,
    /// Button 2 pops up the menu
    pub menu_on_2: bool,
    /// Single click opens items
    pub single_click: bool,
    /// Never show the same directory in two windows
    pub unique_windows: bool,
    /// Style for new windows
    pub display_style: DisplayStyle,
    /// Sort key for new windows
    pub sort_by: SortKey,
    pub toolbar: ToolbarType,
    pub truncation: Truncation,
    /// Rescan directories when they change on disk
    pub watch_directories: bool,
}

impl Default for FilerOptions {
    fn default() -> Self {
        Self {
            sort_nocase: true,
            new_window_on_1: false,
            menu_on_2: false,
            single_click: true,
            unique_windows: false,
            display_style: DisplayStyle::LargeIcons,
            sort_by: SortKey::Type,
            toolbar: ToolbarType::Normal,
            truncation: Truncation::default(),
            watch_directories: true,
        }
    }
}

impl FilerOptions {
    /// The options as they're written to disk.
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert(KEY_SORT_NOCASE.to_string(), Value::Bool(self.sort_nocase));
        map.insert(KEY_NEW_WINDOW_ON_1.to_string(), Value::Bool(self.new_window_on_1));
        map.insert(KEY_MENU_ON_2.to_string(), Value::Bool(self.menu_on_2));
        map.insert(KEY_SINGLE_CLICK.to_string(), Value::Bool(self.single_click));
        map.insert(KEY_UNIQUE_WINDOWS.to_string(), Value::Bool(self.unique_windows));
        map.insert(KEY_DISPLAY_STYLE.to_string(), Value::from(self.display_style.name()));
        map.insert(KEY_SORT_BY.to_string(), Value::from(self.sort_by.name()));
        map.insert(KEY_TOOLBAR.to_string(), Value::from(self.toolbar.name()));
        map.insert(KEY_TRUNCATE.to_string(), Value::from(self.truncation.to_string()));
        map.insert(KEY_WATCH_DIRECTORIES.to_string(), Value::Bool(self.watch_directories));
        Value::Object(map)
    }
}

// ============================================================================
// Value parsing
// ============================================================================

fn parse_bool(value: &Value) -> Result<bool, String> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) if n.as_u64() == Some(0) => Ok(false),
        Value::Number(n) if n.as_u64() == Some(1) => Ok(true),
        Value::String(s) if s.trim() == "0" => Ok(false),
        Value::String(s) if s.trim() == "1" => Ok(true),
        other => Err(format!("Expected a boolean, got {}", other)),
    }
}

fn as_str(value: &Value) -> Result<&str, String> {
    value.as_str().ok_or_else(|| format!("Expected a string, got {}", value))
}

fn parse_display_style(value: &Value) -> Result<DisplayStyle, String> {
    let name = as_str(value)?;
    DisplayStyle::from_name(name).ok_or_else(|| format!("Unknown display style '{}'", name))
}

fn parse_sort_key(value: &Value) -> Result<SortKey, String> {
    let name = as_str(value)?;
    SortKey::from_name(name).ok_or_else(|| format!("Unknown sort type '{}'", name))
}

fn parse_toolbar(value: &Value) -> Result<ToolbarType, String> {
    let name = as_str(value)?;
    ToolbarType::from_name(name).ok_or_else(|| format!("Unknown toolbar type '{}'", name))
}

fn clamp_truncate(value: &str) -> Result<u32, String> {
    let n: i64 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number", value.trim()))?;
    Ok(n.clamp(0, i64::from(MAX_TRUNCATE)) as u32)
}

/// "large, small", each clamped to [0, 250].
fn parse_truncate(value: &Value) -> Result<Truncation, String> {
    let text = as_str(value)?;
    let (large, small) = text
        .split_once(',')
        .ok_or_else(|| format!("Expected 'large, small', got '{}'", text))?;
    Ok(Truncation::new(clamp_truncate(large)?, clamp_truncate(small)?))
}

/// Reads `key` with `parse` into `slot`, recording an error instead if the value is bad.
fn read_key<T>(
    json: &Value,
    key: &str,
    parse: impl Fn(&Value) -> Result<T, String>,
    slot: &mut T,
    errors: &mut Vec<OptionError>,
) {
    let Some(value) = json.get(key) else {
        return;
    };
    match parse(value) {
        Ok(parsed) => *slot = parsed,
        Err(message) => {
            log::warn!("Options: Ignoring {}: {}", key, message);
            errors.push(OptionError {
                key: key.to_string(),
                message,
            });
        }
    }
}

/// Parses the options file contents. Unknown keys are ignored.
pub fn parse_options(contents: &str) -> Result<(FilerOptions, Vec<OptionError>), serde_json::Error> {
    let json: Value = serde_json::from_str(contents)?;
    let mut options = FilerOptions::default();
    let mut errors = Vec::new();

    read_key(&json, KEY_SORT_NOCASE, parse_bool, &mut options.sort_nocase, &mut errors);
    read_key(&json, KEY_NEW_WINDOW_ON_1, parse_bool, &mut options.new_window_on_1, &mut errors);
    read_key(&json, KEY_MENU_ON_2, parse_bool, &mut options.menu_on_2, &mut errors);
    read_key(&json, KEY_SINGLE_CLICK, parse_bool, &mut options.single_click, &mut errors);
    read_key(&json, KEY_UNIQUE_WINDOWS, parse_bool, &mut options.unique_windows, &mut errors);
    read_key(&json, KEY_DISPLAY_STYLE, parse_display_style, &mut options.display_style, &mut errors);
    read_key(&json, KEY_SORT_BY, parse_sort_key, &mut options.sort_by, &mut errors);
    read_key(&json, KEY_TOOLBAR, parse_toolbar, &mut options.toolbar, &mut errors);
    read_key(&json, KEY_TRUNCATE, parse_truncate, &mut options.truncation, &mut errors);
    read_key(&json, KEY_WATCH_DIRECTORIES, parse_bool, &mut options.watch_directories, &mut errors);

    Ok((options, errors))
}

/// `<config dir>/rox-filer/options.json`
pub fn default_options_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("rox-filer").join("options.json"))
}

/// Loads options from `path`.
/// Returns defaults if the file doesn't exist or can't be parsed.
pub fn load_options(path: &Path) -> (FilerOptions, Vec<OptionError>) {
    let Ok(contents) = fs::read_to_string(path) else {
        log::debug!("Options: No options file at {}, using defaults", path.display());
        return (FilerOptions::default(), Vec::new());
    };
    match parse_options(&contents) {
        Ok(loaded) => loaded,
        Err(e) => {
            log::warn!("Options: Failed to parse {}: {}", path.display(), e);
            (FilerOptions::default(), Vec::new())
        }
    }
}

/// Writes `options` to `path` as pretty JSON, creating the directory if needed.
pub fn save_options(path: &Path, options: &FilerOptions) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| format!("Failed to create options dir: {}", e))?;
    }
    let json = serde_json::to_string_pretty(&options.to_json()).map_err(|e| format!("Failed to serialize options: {}", e))?;
    fs::write(path, json).map_err(|e| format!("Failed to write options file: {}", e))?;
    log::debug!("Options: Saved to {}", path.display());
    Ok(())
}
