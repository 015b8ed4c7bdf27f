use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Polls a file's modification time. Checked at frame boundaries only.
#[derive(Debug, Clone)]
pub struct FileWatcher {
    path: PathBuf,
    last_seen_modified: Option<SystemTime>,
}

impl FileWatcher {
    pub fn new(path: PathBuf) -> Self {
        let last_seen_modified = modified_time(&path);
        Self {
            path,
            last_seen_modified,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True once per change: the mtime moved forward or the file appeared.
    pub fn should_reload(&mut self) -> bool {
        let current = modified_time(&self.path);
        match (self.last_seen_modified, current) {
            (Some(old), Some(now)) if now > old => {
                self.last_seen_modified = Some(now);
                true
            }
            (None, Some(now)) => {
                self.last_seen_modified = Some(now);
                true
            }
            _ => false,
        }
    }

    /// Record the current mtime without reporting a change.
    pub fn mark_seen(&mut self) {
        self.last_seen_modified = modified_time(&self.path);
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).ok().and_then(|m| m.modified().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "qb_watcher_test_{}_{}_{}.txt",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn unchanged_file_does_not_reload() {
        let path = temp_file_path("unchanged");
        fs::write(&path, "a").expect("failed to write temp file");
        let mut watcher = FileWatcher::new(path.clone());
        assert!(!watcher.should_reload());
        let _ = fs::remove_file(path);
    }

    #[test]
    fn appearing_file_reloads_once() {
        let path = temp_file_path("appear");
        let mut watcher = FileWatcher::new(path.clone());
        assert!(!watcher.should_reload());
        fs::write(&path, "a").expect("failed to write temp file");
        assert!(watcher.should_reload());
        assert!(!watcher.should_reload());
        let _ = fs::remove_file(path);
    }

    #[test]
    fn newer_mtime_reloads() {
        let path = temp_file_path("newer");
        fs::write(&path, "a").expect("failed to write temp file");
        let mut watcher = FileWatcher::new(path.clone());
        let file = fs::OpenOptions::new()
            .write(true)
            .open(&path)
            .expect("failed to reopen temp file");
        file.set_modified(SystemTime::now() + Duration::from_secs(5))
            .expect("failed to bump mtime");
        assert!(watcher.should_reload());
        assert!(!watcher.should_reload());
        let _ = fs::remove_file(path);
    }

    #[test]
    fn deleted_file_does_not_reload() {
        let path = temp_file_path("deleted");
        fs::write(&path, "a").expect("failed to write temp file");
        let mut watcher = FileWatcher::new(path.clone());
        fs::remove_file(&path).expect("failed to delete temp file");
        assert!(!watcher.should_reload());
        assert_eq!(watcher.path(), path.as_path());
    }
}
