//! Directory item model and the owner/group name caches.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{LazyLock, RwLock};
use uzers::{get_group_by_gid, get_user_by_uid};

/// Cache for uid→username resolution.
static OWNER_CACHE: LazyLock<RwLock<HashMap<u32, String>>> = LazyLock::new(|| RwLock::new(HashMap::new()));
/// Cache for gid→groupname resolution.
static GROUP_CACHE: LazyLock<RwLock<HashMap<u32, String>>> = LazyLock::new(|| RwLock::new(HashMap::new()));

/// Resolves a uid to a username, with caching.
pub(crate) fn get_owner_name(uid: u32) -> String {
    if let Ok(cache) = OWNER_CACHE.read()
        && let Some(name) = cache.get(&uid)
    {
        return name.clone();
    }
    let name = get_user_by_uid(uid)
        .map(|u| u.name().to_string_lossy().into_owned())
        .unwrap_or_else(|| uid.to_string());
    if let Ok(mut cache) = OWNER_CACHE.write() {
        cache.insert(uid, name.clone());
    }
    name
}

/// Resolves a gid to a group name, with caching.
pub(crate) fn get_group_name(gid: u32) -> String {
    if let Ok(cache) = GROUP_CACHE.read()
        && let Some(name) = cache.get(&gid)
    {
        return name.clone();
    }
    let name = get_group_by_gid(gid)
        .map(|g| g.name().to_string_lossy().into_owned())
        .unwrap_or_else(|| gid.to_string());
    if let Ok(mut cache) = GROUP_CACHE.write() {
        cache.insert(gid, name.clone());
    }
    name
}

// ============================================================================
// Classification
// ============================================================================

/// What sort of filesystem object an item is.
///
/// Declaration order is the primary key of the type ordering.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "camelCase")]
pub enum FileKind {
    Directory,
    #[default]
    File,
    CharDevice,
    BlockDevice,
    /// Only for links whose target can't be stat'ed; live links take their target's kind.
    Symlink,
    Socket,
    Fifo,
    /// lstat failed; the item still lists so the user can see something is there.
    Error,
}

impl FileKind {
    /// Four-character label used at the start of the details line.
    pub fn label(self) -> &'static str {
        match self {
            FileKind::Directory => "Dir ",
            FileKind::File => "File",
            FileKind::CharDevice => "Char",
            FileKind::BlockDevice => "Blck",
            FileKind::Symlink => "Link",
            FileKind::Socket => "Sock",
            FileKind::Fifo => "Pipe",
            FileKind::Error => "Err ",
        }
    }
}

bitflags! {
    /// Boolean attributes of an item.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct ItemFlags: u8 {
        /// Directory containing an executable `AppRun`
        const APP_DIR = 1 << 0;
        /// Regular file with at least one execute bit
        const EXECUTABLE = 1 << 1;
        /// The entry itself is a symbolic link
        const SYMLINK = 1 << 2;
        /// Lives on a different device than its parent directory
        const MOUNT_POINT = 1 << 3;
        /// Mount point that currently has something mounted on it
        const MOUNTED = 1 << 4;
    }
}

/// MIME-style content type, e.g. `text/plain`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContentType {
    pub media_type: String,
    pub subtype: String,
}

impl ContentType {
    pub fn new(media_type: &str, subtype: &str) -> Self {
        Self {
            media_type: media_type.to_string(),
            subtype: subtype.to_string(),
        }
    }

    /// The type forced when opening with the shift modifier.
    pub fn text_plain() -> Self {
        Self::new("text", "plain")
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.media_type, self.subtype)
    }
}

// ============================================================================
// Measurements
// ============================================================================

/// Pixel size of the icon the presentation layer will draw for an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconSize {
    pub width: u32,
    pub height: u32,
}

impl Default for IconSize {
    fn default() -> Self {
        Self {
            width: crate::listing::layout::MAX_ICON_WIDTH,
            height: crate::listing::layout::MAX_ICON_HEIGHT,
        }
    }
}

/// Cached display measurements. Only valid for the fonts they were measured with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measurements {
    pub name_width: u32,
    pub details_width: u32,
    pub icon: IconSize,
}

// ============================================================================
// DirectoryItem
// ============================================================================

/// One entry of a directory. Identity is `name` within the parent directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryItem {
    pub name: String,
    pub kind: FileKind,
    /// Full `st_mode` bits (type and permissions)
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub size: u64,
    /// Modification time, seconds since the epoch
    pub mtime: i64,
    pub flags: ItemFlags,
    pub content_type: Option<ContentType>,
    /// Set when lstat failed; the message is shown instead of the details
    pub lstat_error: Option<String>,
    pub measurements: Measurements,
}

impl DirectoryItem {
    /// Creates a bare item with zeroed metadata.
    pub fn new(name: &str, kind: FileKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            mode: 0,
            uid: 0,
            gid: 0,
            size: 0,
            mtime: 0,
            flags: ItemFlags::empty(),
            content_type: None,
            lstat_error: None,
            measurements: Measurements::default(),
        }
    }

    /// Placeholder for an entry that couldn't be lstat'ed.
    pub fn lstat_failed(name: &str, message: String) -> Self {
        Self {
            lstat_error: Some(message),
            ..Self::new(name, FileKind::Error)
        }
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    pub fn with_mtime(mut self, mtime: i64) -> Self {
        self.mtime = mtime;
        self
    }

    pub fn with_mode(mut self, mode: u32) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_flags(mut self, flags: ItemFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = Some(content_type);
        self
    }

    pub fn with_icon(mut self, width: u32, height: u32) -> Self {
        self.measurements.icon = IconSize { width, height };
        self
    }

    pub fn is_dir(&self) -> bool {
        self.kind == FileKind::Directory
    }

    pub fn is_app_dir(&self) -> bool {
        self.flags.contains(ItemFlags::APP_DIR)
    }

    pub fn is_symlink(&self) -> bool {
        self.flags.contains(ItemFlags::SYMLINK)
    }

    pub fn is_executable(&self) -> bool {
        self.flags.contains(ItemFlags::EXECUTABLE)
    }

    pub fn is_mount_point(&self) -> bool {
        self.flags.contains(ItemFlags::MOUNT_POINT)
    }

    pub fn is_mounted(&self) -> bool {
        self.flags.contains(ItemFlags::MOUNTED)
    }

    /// Whether a rescan should report this entry as updated.
    ///
    /// Measurements belong to whoever displays the item, so they don't count.
    pub fn differs_from(&self, other: &DirectoryItem) -> bool {
        self.kind != other.kind
            || self.mode != other.mode
            || self.uid != other.uid
            || self.gid != other.gid
            || self.size != other.size
            || self.mtime != other.mtime
            || self.flags != other.flags
            || self.content_type != other.content_type
            || self.lstat_error != other.lstat_error
    }

    /// The Full Info detail line: kind, permissions, owner, group, size, mtime.
    pub fn details(&self) -> String {
        if let Some(message) = &self.lstat_error {
            return format!("lstat(2) failed: {}", message);
        }

        let kind = if self.is_app_dir() { "App " } else { self.kind.label() };
        format!(
            "{} {} {:<8} {:<8} {:>6} {}",
            kind,
            permission_string(self.mode),
            truncate_chars(&get_owner_name(self.uid), 8),
            truncate_chars(&get_group_name(self.gid), 8),
            format_size(self.size),
            format_mtime(self.mtime)
        )
    }
}

impl AsRef<DirectoryItem> for DirectoryItem {
    fn as_ref(&self) -> &DirectoryItem {
        self
    }
}

/// Renders permission bits as three comma-separated rwx triples, with s/S and t/T
/// for setuid, setgid and sticky.
pub fn permission_string(mode: u32) -> String {
    let triple = |read: u32, write: u32, exec: u32, special: u32, special_char: char| {
        let mut s = String::with_capacity(3);
        s.push(if mode & read != 0 { 'r' } else { '-' });
        s.push(if mode & write != 0 { 'w' } else { '-' });
        s.push(match (mode & exec != 0, mode & special != 0) {
            (true, true) => special_char,
            (false, true) => special_char.to_ascii_uppercase(),
            (true, false) => 'x',
            (false, false) => '-',
        });
        s
    };

    format!(
        "{},{},{}",
        triple(0o400, 0o200, 0o100, 0o4000, 's'),
        triple(0o040, 0o020, 0o010, 0o2000, 's'),
        triple(0o004, 0o002, 0o001, 0o1000, 't')
    )
}

/// Human-readable size: bytes below 2K, then K, M and G rounded down.
pub fn format_size(size: u64) -> String {
    const UNITS: [&str; 3] = ["K", "M", "G"];
    if size < 2048 {
        return format!("{} b", size);
    }
    let mut value = size;
    let mut unit = 0;
    value >>= 10;
    while value >= 2048 && unit < UNITS.len() - 1 {
        value >>= 10;
        unit += 1;
    }
    format!("{} {}", value, UNITS[unit])
}

fn format_mtime(mtime: i64) -> String {
    use chrono::{Local, TimeZone};
    match Local.timestamp_opt(mtime, 0).single() {
        Some(time) => time.format("%H:%M %d %b %Y").to_string(),
        None => "(invalid time)".to_string(),
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
