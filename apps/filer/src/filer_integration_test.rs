//! End-to-end runs of the directory-window engine against real temporary directories.

use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::filer::SCANNING_CLEAR_DELAY;
use crate::{ContentType, Filer, FilerError, FilerOptions, Launcher, OpenFlags, PanelType, SortKey, WindowId};

fn options() -> FilerOptions {
    FilerOptions {
        watch_directories: false,
        ..FilerOptions::default()
    }
}

fn idle(filer: &mut Filer) {
    assert!(filer.wait_until_idle(Duration::from_secs(5)), "scan did not finish");
}

fn names(filer: &Filer, id: WindowId) -> Vec<String> {
    filer.window(id).unwrap().names().into_iter().map(str::to_string).collect()
}

#[test]
fn test_size_order_then_hidden_by_name() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join("a.txt"), vec![b'a'; 100]).unwrap();
    fs::write(tmp.path().join(".hidden"), "h").unwrap();
    fs::write(tmp.path().join("b.txt"), vec![b'b'; 50]).unwrap();
    let mut filer = Filer::new(FilerOptions {
        sort_by: SortKey::Size,
        ..options()
    });

    let id = filer.open_dir(tmp.path(), PanelType::None).unwrap();
    idle(&mut filer);
    assert_eq!(names(&filer, id), vec!["a.txt", "b.txt"]);

    filer.set_hidden(id, true).unwrap();
    filer.set_sort(id, SortKey::Name).unwrap();
    idle(&mut filer);
    assert_eq!(names(&filer, id), vec![".hidden", "a.txt", "b.txt"]);
}

#[test]
fn test_autoselect_going_up_with_and_without_cursor() {
    let tmp = tempfile::tempdir().unwrap();
    let root = fs::canonicalize(tmp.path()).unwrap();
    fs::write(root.join("a.txt"), "a").unwrap();
    fs::create_dir(root.join("sub")).unwrap();
    fs::write(root.join("sub/inside"), "i").unwrap();
    let mut filer = Filer::new(options());

    let without = filer.open_dir(&root.join("sub"), PanelType::None).unwrap();
    let with = filer.open_dir(&root.join("sub"), PanelType::None).unwrap();
    idle(&mut filer);
    filer.window_mut(with).unwrap().set_cursor(Some(0));

    filer.change_to_parent(without).unwrap();
    filer.change_to_parent(with).unwrap();
    idle(&mut filer);

    let plain = filer.window(without).unwrap();
    assert_eq!(plain.cursor(), None);
    assert_eq!(plain.collection().wink(), plain.collection().find("sub"));

    let cursored = filer.window(with).unwrap();
    assert_eq!(cursored.cursor(), cursored.collection().find("sub"));
}

#[test]
fn test_selection_follows_last_claimer_and_ends_with_it() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    fs::write(first.path().join("one"), "1").unwrap();
    fs::write(second.path().join("two"), "2").unwrap();
    let mut filer = Filer::new(options());
    let a = filer.open_dir(first.path(), PanelType::None).unwrap();
    let b = filer.open_dir(second.path(), PanelType::None).unwrap();
    idle(&mut filer);

    filer.select_item(a, 0, true, 10).unwrap();
    filer.select_item(b, 0, true, 20).unwrap();
    assert_eq!(filer.selection_owner(), Some(b));
    assert_eq!(filer.window(a).unwrap().collection().selected_count(), 0);

    filer.close_window(b).unwrap();
    assert_eq!(filer.selection_owner(), None);
}

#[test]
fn test_deleted_directory_closes_window_on_rescan() {
    let tmp = tempfile::tempdir().unwrap();
    let doomed = tmp.path().join("doomed");
    fs::create_dir(&doomed).unwrap();
    let mut filer = Filer::new(options());
    let id = filer.open_dir(&doomed, PanelType::None).unwrap();
    idle(&mut filer);

    fs::remove_dir(&doomed).unwrap();
    let result = filer.update_dir(id, true);

    assert!(matches!(result, Err(FilerError::DirectoryMissing { .. })));
    assert!(filer.is_empty());
    assert!(matches!(
        filer.take_notices().as_slice(),
        [FilerError::DirectoryMissing { .. }]
    ));
}

#[test]
fn test_scanning_title_clears_after_delay() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join("f"), "f").unwrap();
    let mut filer = Filer::new(options());
    let id = filer.open_dir(tmp.path(), PanelType::None).unwrap();
    idle(&mut filer);
    assert!(filer.window(id).unwrap().is_scanning());

    let due = filer.next_deadline().unwrap();
    filer.pump_at(due + Duration::from_millis(1));

    assert!(!filer.window(id).unwrap().is_scanning());
    assert!(due <= Instant::now() + SCANNING_CLEAR_DELAY);
}

struct Recorder {
    opened: Arc<Mutex<Vec<String>>>,
}

impl Launcher for Recorder {
    fn run_app(&mut self, _app_dir: &Path) -> Result<(), String> {
        Err("not expected".to_string())
    }

    fn execute(&mut self, _program: &Path, _working_dir: &Path) -> Result<(), String> {
        Err("not expected".to_string())
    }

    fn open_with_type(&mut self, path: &Path, content_type: &ContentType) -> Result<bool, String> {
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        self.opened.lock().unwrap().push(format!("{name} {content_type}"));
        Ok(true)
    }
}

#[test]
fn test_shift_open_views_file_as_text_and_closes_window() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join("picture.png"), "not really").unwrap();
    let opened = Arc::new(Mutex::new(Vec::new()));
    let mut filer = Filer::new(options()).with_launcher(Box::new(Recorder {
        opened: Arc::clone(&opened),
    }));
    let id = filer.open_dir(tmp.path(), PanelType::None).unwrap();
    idle(&mut filer);

    filer
        .open_item(id, 0, OpenFlags::SHIFT | OpenFlags::CLOSE_WINDOW)
        .unwrap();

    assert_eq!(*opened.lock().unwrap(), vec!["picture.png text/plain"]);
    assert!(filer.is_empty());
}
