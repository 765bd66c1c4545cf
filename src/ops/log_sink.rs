use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Local;
use owo_colors::OwoColorize;

use crate::ops::interface::{LogLevel, LogSink};
use crate::utils::error::Result;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const FILE_STAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

pub fn format_line(timestamp: &str, account: &str, level: LogLevel, message: &str) -> String {
    format!("[{timestamp}] [{}] [{account}] {message}", level.as_str())
}

fn colorize(text: &str, level: LogLevel) -> String {
    match level {
        LogLevel::Info => text.blue().to_string(),
        LogLevel::Success => text.green().to_string(),
        LogLevel::Error => text.red().to_string(),
    }
}

/// Prints report lines to stdout and appends them, uncolored, to a per-run log file.
pub struct ConsoleFileSink {
    path: PathBuf,
    file: Mutex<File>,
    console: bool,
}

impl ConsoleFileSink {
    /// Opens `<log_dir>/<kind>-<timestamp>.log`, creating the directory if needed.
    pub fn create(log_dir: impl AsRef<Path>, kind: &str) -> Result<Self> {
        let log_dir = log_dir.as_ref();
        fs::create_dir_all(log_dir)?;
        let path = log_dir.join(format!(
            "{kind}-{}.log",
            Local::now().format(FILE_STAMP_FORMAT)
        ));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
            console: true,
        })
    }

    /// File only; nothing goes to stdout.
    pub fn quiet(mut self) -> Self {
        self.console = false;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogSink for ConsoleFileSink {
    fn record(&self, account: &str, level: LogLevel, message: &str) {
        let now = Local::now().format(TIMESTAMP_FORMAT).to_string();
        if self.console {
            println!(
                "[{now}] [{}] [{account}] {}",
                colorize(level.as_str(), level),
                colorize(message, level)
            );
        }
        let line = format_line(&now, account, level, message);
        let Ok(mut file) = self.file.lock() else {
            log::error!("log file mutex poisoned; dropped: {line}");
            return;
        };
        if let Err(err) = writeln!(file, "{line}") {
            log::error!("failed to write {}: {err}", self.path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_line() {
        assert_eq!(
            format_line("2024-01-02 03:04:05", "a@example.com", LogLevel::Success, "done"),
            "[2024-01-02 03:04:05] [SUCCESS] [a@example.com] done"
        );
    }

    #[test]
    fn test_lines_are_appended_uncolored() {
        let dir = tempfile::tempdir().unwrap();
        let sink = ConsoleFileSink::create(dir.path().join("logs"), "import")
            .unwrap()
            .quiet();
        sink.info("IMPORT", "starting");
        sink.error("b@example.com", "Failed to grant right");

        let name = sink.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("import-") && name.ends_with(".log"));

        let content = fs::read_to_string(sink.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("[INFO] [IMPORT] starting"));
        assert!(lines[1].ends_with("[ERROR] [b@example.com] Failed to grant right"));
        assert!(!content.contains('\u{1b}'));
    }

    #[test]
    fn test_concurrent_writers() {
        let dir = tempfile::tempdir().unwrap();
        let sink = ConsoleFileSink::create(dir.path(), "export").unwrap().quiet();
        std::thread::scope(|s| {
            for t in 0..4 {
                let sink = &sink;
                s.spawn(move || {
                    for i in 0..25 {
                        sink.info(&format!("t{t}"), &format!("line {i}"));
                    }
                });
            }
        });
        let content = fs::read_to_string(sink.path()).unwrap();
        assert_eq!(content.lines().count(), 100);
        assert!(content.lines().all(|l| l.contains("[INFO] [t")));
    }
}
