// cleanup.rs - Removal of report files left behind by scan tools
// Some tools write `{query}*.txt` reports into their working directory.

use colored::*;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

/// Delete regular files in `root` whose name starts with `prefix` and ends
/// with `.txt`. Best-effort: failures are logged and collected, never raised.
pub fn cleanup_report_files(root: &Path, prefix: &str) -> CleanupReport {
    let mut report = CleanupReport::default();

    if prefix.is_empty() {
        return report;
    }

    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!(
                "{}",
                format!("[!] Cannot list {} for cleanup: {}", root.display(), e).yellow()
            );
            report.failed.push((root.to_path_buf(), e.to_string()));
            return report;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        if !path.is_file() || !name.starts_with(prefix) || !name.ends_with(".txt") {
            continue;
        }

        match fs::remove_file(&path) {
            Ok(()) => report.removed.push(path),
            Err(e) => {
                eprintln!("{}", format!("[!] Error deleting {}: {}", name, e).yellow());
                report.failed.push((path, e.to_string()));
            }
        }
    }

    report
}

/// Runs `cleanup_report_files` when dropped, so every exit path of an
/// invocation (success, error, early return) cleans up after the tool.
pub struct ReportCleanupGuard {
    root: PathBuf,
    prefix: String,
    on_done: Option<Box<dyn FnOnce(CleanupReport) + Send>>,
}

impl ReportCleanupGuard {
    pub fn new(root: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            prefix: prefix.into(),
            on_done: None,
        }
    }

    /// Callback receiving the report once cleanup ran
    pub fn on_done(mut self, f: impl FnOnce(CleanupReport) + Send + 'static) -> Self {
        self.on_done = Some(Box::new(f));
        self
    }
}

impl Drop for ReportCleanupGuard {
    fn drop(&mut self) {
        let report = cleanup_report_files(&self.root, &self.prefix);
        if let Some(f) = self.on_done.take() {
            f(report);
        }
    }
}
