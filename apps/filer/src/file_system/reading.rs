//! Low-level directory reading and DirectoryItem construction.
//!
//! Pure I/O functions. No caching here; consumed by the scan threads in cache.rs.

use std::fs;
use std::os::unix::fs::{FileTypeExt, MetadataExt};
use std::path::{Path, PathBuf};

use super::item::{DirectoryItem, FileKind, ItemFlags};
use super::types::TypeResolver;

/// Device and inode of a directory. A changed identity under the same path means the
/// directory was replaced and a cached snapshot of it is stale.
pub type DirectoryIdentity = (u64, u64);

/// Resolves `path` to the absolute, symlink-free form used as the cache key.
pub fn canonical_path(path: &Path) -> std::io::Result<PathBuf> {
    fs::canonicalize(path)
}

pub fn directory_identity(path: &Path) -> std::io::Result<DirectoryIdentity> {
    let metadata = fs::metadata(path)?;
    Ok((metadata.dev(), metadata.ino()))
}

/// Checks that `path` is a directory we can list.
pub fn check_readable_dir(path: &Path) -> std::io::Result<()> {
    let metadata = fs::metadata(path)?;
    if !metadata.is_dir() {
        return Err(std::io::Error::new(std::io::ErrorKind::NotADirectory, "not a directory"));
    }
    fs::read_dir(path).map(|_| ())
}

fn kind_of(file_type: fs::FileType) -> FileKind {
    if file_type.is_dir() {
        FileKind::Directory
    } else if file_type.is_file() {
        FileKind::File
    } else if file_type.is_char_device() {
        FileKind::CharDevice
    } else if file_type.is_block_device() {
        FileKind::BlockDevice
    } else if file_type.is_socket() {
        FileKind::Socket
    } else if file_type.is_fifo() {
        FileKind::Fifo
    } else {
        FileKind::Symlink
    }
}

fn has_executable_app_run(dir: &Path) -> bool {
    fs::metadata(dir.join("AppRun"))
        .map(|m| m.is_file() && m.mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// Builds the item for `name` inside `dir`. Never fails: entries that can't be
/// lstat'ed come back as `FileKind::Error` items.
///
/// `parent_dev` is the device of `dir`, for mount point detection.
pub fn read_item(dir: &Path, name: &str, parent_dev: u64, resolver: &dyn TypeResolver) -> DirectoryItem {
    let path = dir.join(name);
    let link_meta = match fs::symlink_metadata(&path) {
        Ok(m) => m,
        Err(e) => return DirectoryItem::lstat_failed(name, e.to_string()),
    };

    let mut flags = ItemFlags::empty();
    let is_symlink = link_meta.file_type().is_symlink();
    let metadata = if is_symlink {
        flags |= ItemFlags::SYMLINK;
        match fs::metadata(&path) {
            Ok(target) => target,
            Err(_) => {
                let mut item = DirectoryItem::new(name, FileKind::Symlink).with_flags(flags);
                item.mode = link_meta.mode();
                item.uid = link_meta.uid();
                item.gid = link_meta.gid();
                item.size = link_meta.len();
                item.mtime = link_meta.mtime();
                return item;
            }
        }
    } else {
        link_meta
    };

    let kind = kind_of(metadata.file_type());
    match kind {
        FileKind::Directory => {
            if has_executable_app_run(&path) {
                flags |= ItemFlags::APP_DIR;
            }
            // Anything on another device is mounted right now
            if !is_symlink && metadata.dev() != parent_dev {
                flags |= ItemFlags::MOUNT_POINT | ItemFlags::MOUNTED;
            }
        }
        FileKind::File if metadata.mode() & 0o111 != 0 => flags |= ItemFlags::EXECUTABLE,
        _ => {}
    }

    let mut item = DirectoryItem::new(name, kind).with_flags(flags);
    item.mode = metadata.mode();
    item.uid = metadata.uid();
    item.gid = metadata.gid();
    item.size = metadata.len();
    item.mtime = metadata.mtime();
    item.content_type = resolver.resolve_type(dir, &item);
    item
}

/// Reads `path` and hands items to `on_batch` in chunks of `batch_size`.
///
/// Stops early when `on_batch` returns false (nobody is listening any more).
/// Returns the number of items read.
pub fn read_directory_batches(
    path: &Path,
    batch_size: usize,
    resolver: &dyn TypeResolver,
    mut on_batch: impl FnMut(Vec<DirectoryItem>) -> bool,
) -> std::io::Result<usize> {
    let parent_dev = fs::metadata(path)?.dev();
    let batch_size = batch_size.max(1);
    let mut batch = Vec::with_capacity(batch_size);
    let mut total = 0;

    for entry in fs::read_dir(path)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        batch.push(read_item(path, &name, parent_dev, resolver));
        total += 1;

        if batch.len() >= batch_size && !on_batch(std::mem::replace(&mut batch, Vec::with_capacity(batch_size))) {
            return Ok(total);
        }
    }

    if !batch.is_empty() {
        on_batch(batch);
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_system::types::MimeGuessResolver;
    use std::os::unix::fs::PermissionsExt;

    fn dev_of(path: &Path) -> u64 {
        fs::metadata(path).unwrap().dev()
    }

    #[test]
    fn test_read_item_classifies_files_and_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("notes.txt"), "hello").unwrap();
        fs::create_dir(tmp.path().join("sub")).unwrap();
        let dev = dev_of(tmp.path());

        let file = read_item(tmp.path(), "notes.txt", dev, &MimeGuessResolver);
        assert_eq!(file.kind, FileKind::File);
        assert_eq!(file.size, 5);
        assert_eq!(file.content_type.as_ref().map(ToString::to_string), Some("text/plain".to_string()));
        assert!(!file.is_executable());

        let dir = read_item(tmp.path(), "sub", dev, &MimeGuessResolver);
        assert_eq!(dir.kind, FileKind::Directory);
        assert!(!dir.is_app_dir());
        assert!(!dir.is_mount_point());
    }

    #[test]
    fn test_read_item_detects_executables_and_app_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let script = tmp.path().join("run.sh");
        fs::write(&script, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let app = tmp.path().join("Edit");
        fs::create_dir(&app).unwrap();
        let app_run = app.join("AppRun");
        fs::write(&app_run, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&app_run, fs::Permissions::from_mode(0o755)).unwrap();
        let dev = dev_of(tmp.path());

        assert!(read_item(tmp.path(), "run.sh", dev, &MimeGuessResolver).is_executable());
        assert!(read_item(tmp.path(), "Edit", dev, &MimeGuessResolver).is_app_dir());
    }

    #[test]
    fn test_read_item_symlinks() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("target")).unwrap();
        std::os::unix::fs::symlink(tmp.path().join("target"), tmp.path().join("good")).unwrap();
        std::os::unix::fs::symlink(tmp.path().join("nowhere"), tmp.path().join("dangling")).unwrap();
        let dev = dev_of(tmp.path());

        let good = read_item(tmp.path(), "good", dev, &MimeGuessResolver);
        assert_eq!(good.kind, FileKind::Directory);
        assert!(good.is_symlink());

        let dangling = read_item(tmp.path(), "dangling", dev, &MimeGuessResolver);
        assert_eq!(dangling.kind, FileKind::Symlink);
        assert!(dangling.is_symlink());
    }

    #[test]
    fn test_read_item_missing_entry_is_error_item() {
        let tmp = tempfile::tempdir().unwrap();
        let item = read_item(tmp.path(), "vanished", dev_of(tmp.path()), &MimeGuessResolver);
        assert_eq!(item.kind, FileKind::Error);
        assert!(item.details().starts_with("lstat(2) failed: "));
    }

    #[test]
    fn test_read_directory_batches_chunks() {
        let tmp = tempfile::tempdir().unwrap();
        for i in 0..5 {
            fs::write(tmp.path().join(format!("f{}", i)), "x").unwrap();
        }

        let mut sizes = Vec::new();
        let total = read_directory_batches(tmp.path(), 2, &MimeGuessResolver, |batch| {
            sizes.push(batch.len());
            true
        })
        .unwrap();

        assert_eq!(total, 5);
        assert_eq!(sizes, vec![2, 2, 1]);
    }

    #[test]
    fn test_read_directory_batches_stops_when_told() {
        let tmp = tempfile::tempdir().unwrap();
        for i in 0..5 {
            fs::write(tmp.path().join(format!("f{}", i)), "x").unwrap();
        }

        let mut calls = 0;
        read_directory_batches(tmp.path(), 1, &MimeGuessResolver, |_| {
            calls += 1;
            false
        })
        .unwrap();
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_check_readable_dir() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("plain"), "x").unwrap();
        assert!(check_readable_dir(tmp.path()).is_ok());
        assert!(check_readable_dir(&tmp.path().join("plain")).is_err());
        assert!(check_readable_dir(&tmp.path().join("missing")).is_err());
    }
}
