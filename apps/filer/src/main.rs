//! Headless driver: opens a directory window, waits for the scan, logs what it shows.
//!
//! Usage: `filer [DIR]` (defaults to the current directory). Set `RUST_LOG=debug` to
//! watch the cache and reducer at work.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use filer_lib::settings::{default_options_path, load_options};
use filer_lib::{Filer, PanelType};

fn main() -> ExitCode {
    // Respects RUST_LOG (default: info)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let options = match default_options_path() {
        Some(path) => {
            let (options, errors) = load_options(&path);
            for error in errors {
                log::warn!("Options: {}", error);
            }
            options
        }
        None => Default::default(),
    };

    let dir = std::env::args_os().nth(1).map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
    let mut filer = Filer::new(options);
    let id = match filer.open_dir(&dir, PanelType::None) {
        Ok(id) => id,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    if !filer.wait_until_idle(Duration::from_secs(30)) {
        log::warn!("Scan of {} still running, showing what we have", dir.display());
    }

    let Some(window) = filer.window(id) else {
        return ExitCode::FAILURE;
    };
    log::info!("{} in {} order, {}", window.title(), window.sort_key().name(), window.style().name());
    for view in window.collection().items() {
        log::info!("{:<40} {}", view.item.name, view.item.details());
    }
    ExitCode::SUCCESS
}
