//! Deciding what opening an item means, and the launcher that carries it out.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::flags::OpenFlags;
use crate::error::FilerError;
use crate::file_system::{ContentType, DirectoryItem, FileKind};

/// Starts programs and hands files to their openers.
pub trait Launcher {
    /// Runs an application directory's `AppRun`.
    fn run_app(&mut self, app_dir: &Path) -> Result<(), String>;

    /// Runs an executable file with `working_dir` as its current directory.
    fn execute(&mut self, program: &Path, working_dir: &Path) -> Result<(), String>;

    /// Opens `path` with whatever handles `content_type`. `Ok(false)` means no handler.
    fn open_with_type(&mut self, path: &Path, content_type: &ContentType) -> Result<bool, String>;

    /// Mounts (or, when `mounted`, unmounts) a mount point.
    fn toggle_mount(&mut self, mount_point: &Path, _mounted: bool) -> Result<(), String> {
        Err(format!("Mounting isn't supported here: {}", mount_point.display()))
    }
}

/// Launches through the OS: child processes for programs, the `open` crate for files.
#[derive(Debug, Default)]
pub struct SystemLauncher;

impl Launcher for SystemLauncher {
    fn run_app(&mut self, app_dir: &Path) -> Result<(), String> {
        Command::new(app_dir.join("AppRun"))
            .current_dir(app_dir)
            .spawn()
            .map(|_| ())
            .map_err(|e| e.to_string())
    }

    fn execute(&mut self, program: &Path, working_dir: &Path) -> Result<(), String> {
        Command::new(program)
            .current_dir(working_dir)
            .spawn()
            .map(|_| ())
            .map_err(|e| e.to_string())
    }

    fn open_with_type(&mut self, path: &Path, content_type: &ContentType) -> Result<bool, String> {
        log::debug!("Launcher: Opening {} as {}", path.display(), content_type);
        match open::that_detached(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.to_string()),
        }
    }

    fn toggle_mount(&mut self, mount_point: &Path, mounted: bool) -> Result<(), String> {
        let command = if mounted { "umount" } else { "mount" };
        let status = Command::new(command)
            .arg(mount_point)
            .status()
            .map_err(|e| format!("Failed to run {}: {}", command, e))?;
        if status.success() {
            Ok(())
        } else {
            Err(format!("{} {} failed: {}", command, mount_point.display(), status))
        }
    }
}

/// What opening an item should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenAction {
    /// Show the directory containing the link's target, with the target highlighted
    FollowLink { link: PathBuf, same_window: bool },
    RunApp(PathBuf),
    /// Unmount a mounted mount point and stay put
    Unmount(PathBuf),
    OpenDirectory {
        path: PathBuf,
        same_window: bool,
        /// Mount it before opening
        mount_first: bool,
    },
    Execute(PathBuf),
    OpenWithType { path: PathBuf, content_type: ContentType },
    /// Devices, sockets, pipes and friends
    Unknown,
}

/// Decides how to open `item` from a window showing `dir`. Panels never reuse or close
/// themselves.
pub fn resolve_open(dir: &Path, item: &DirectoryItem, flags: OpenFlags, is_panel: bool) -> OpenAction {
    let shift = flags.contains(OpenFlags::SHIFT);
    let same_window = flags.contains(OpenFlags::SAME_WINDOW) && !is_panel;
    let path = dir.join(&item.name);

    if item.is_symlink() && shift {
        return OpenAction::FollowLink { link: path, same_window };
    }

    match item.kind {
        FileKind::Directory => {
            if item.is_app_dir() && !shift {
                OpenAction::RunApp(path)
            } else if item.is_mount_point() && shift && item.is_mounted() {
                OpenAction::Unmount(path)
            } else {
                OpenAction::OpenDirectory {
                    path,
                    same_window,
                    mount_first: item.is_mount_point() && shift,
                }
            }
        }
        FileKind::File => {
            if item.is_executable() && !shift {
                OpenAction::Execute(path)
            } else {
                let content_type = if shift {
                    ContentType::text_plain()
                } else {
                    item.content_type
                        .clone()
                        .unwrap_or_else(|| ContentType::new("application", "octet-stream"))
                };
                OpenAction::OpenWithType { path, content_type }
            }
        }
        _ => OpenAction::Unknown,
    }
}

/// Reads `link` and splits its fully resolved target into (directory, leaf name).
/// Relative targets are taken relative to the link's directory.
pub fn resolve_symlink(link: &Path) -> Result<(PathBuf, String), FilerError> {
    let broken = |message: String| FilerError::BrokenSymlink {
        path: link.to_path_buf(),
        message,
    };

    let target = fs::read_link(link).map_err(|e| broken(e.to_string()))?;
    let absolute = if target.is_absolute() {
        target
    } else {
        link.parent().unwrap_or(Path::new("/")).join(target)
    };
    let real = fs::canonicalize(&absolute).map_err(|e| broken(e.to_string()))?;

    let dir = real.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("/"));
    let leaf = real
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    Ok((dir, leaf))
}
