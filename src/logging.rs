//! Logging setup.
//!
//! Installs `env_logger` behind the `log` facade. Output goes to stderr, or
//! to one file per day in a log directory with old files cleaned up.
//! `RUST_LOG` overrides the default `info` level.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use env_logger::{Builder, Env, Target};

use crate::error::{PhotoboothError, PhotoboothResult, ResultExt};

/// Maximum number of log files to keep
const MAX_LOG_FILES: usize = 5;

/// Where log records are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    /// Daily files inside this directory.
    Directory(PathBuf),
}

/// Initialize the logging system. Fails if a logger is already installed.
pub fn init_logging(target: LogTarget) -> PhotoboothResult<()> {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));
    builder.format(|buf, record| {
        writeln!(
            buf,
            "{} {:<5} {}",
            Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
            record.level(),
            record.args()
        )
    });

    if let LogTarget::Directory(ref dir) = target {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create log directory {:?}", dir))?;
        cleanup_old_logs(dir);
        let path = current_log_path(dir);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("failed to open log file {:?}", path))?;
        builder.target(Target::Pipe(Box::new(file)));
    }

    builder
        .try_init()
        .map_err(|e| PhotoboothError::Other(format!("logger already initialized: {}", e)))?;

    log::info!("[LOGGING] Logging initialized ({:?})", target);
    Ok(())
}

/// Path of today's log file.
fn current_log_path(log_dir: &Path) -> PathBuf {
    let date = Local::now().format("%Y-%m-%d");
    log_dir.join(format!("photobooth_{}.log", date))
}

/// Keep only the most recent MAX_LOG_FILES log files.
fn cleanup_old_logs(log_dir: &Path) {
    let Ok(entries) = fs::read_dir(log_dir) else {
        return;
    };

    let mut log_files: Vec<_> = entries
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.path()
                .extension()
                .map(|ext| ext == "log")
                .unwrap_or(false)
        })
        .collect();

    // Newest first; the date in the name breaks ties
    log_files.sort_by(|a, b| {
        let a_time = a.metadata().and_then(|m| m.modified()).ok();
        let b_time = b.metadata().and_then(|m| m.modified()).ok();
        b_time
            .cmp(&a_time)
            .then_with(|| b.file_name().cmp(&a.file_name()))
    });

    for file in log_files.into_iter().skip(MAX_LOG_FILES) {
        let _ = fs::remove_file(file.path());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_path_is_dated() {
        let path = current_log_path(Path::new("/var/log/booth"));
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("photobooth_"));
        assert!(name.ends_with(".log"));
        assert_eq!(name.len(), "photobooth_2024-01-01.log".len());
    }

    #[test]
    fn test_cleanup_keeps_newest_logs() {
        let dir = tempfile::tempdir().unwrap();
        for day in 1..=8 {
            fs::write(dir.path().join(format!("photobooth_2024-01-0{}.log", day)), b"x").unwrap();
        }
        fs::write(dir.path().join("notes.txt"), b"keep").unwrap();

        cleanup_old_logs(dir.path());

        let remaining: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|n| n.ends_with(".log"))
            .collect();
        assert_eq!(remaining.len(), MAX_LOG_FILES);
        assert!(dir.path().join("notes.txt").exists());
    }
}
