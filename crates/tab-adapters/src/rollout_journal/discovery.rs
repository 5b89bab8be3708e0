use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::Utc;
use walkdir::WalkDir;

/// Directory a journal file for a session started "now" would land in:
/// `$JOURNAL_ROOT/sessions/YYYY/MM/DD/`.
pub(crate) fn today_session_dir(journal_root: &Path) -> PathBuf {
    let now = Utc::now();
    journal_root
        .join("sessions")
        .join(format!("{:04}", now.format("%Y")))
        .join(format!("{:02}", now.format("%m")))
        .join(format!("{:02}", now.format("%d")))
}

/// Finds the newest `rollout-*.jsonl` file under `journal_root` modified at
/// or after `not_before`, breaking ties between equal mtimes by the greater
/// filename. Used to pick up the file a just-spawned child process is about
/// to start writing, without relying on the child reporting its own journal
/// path.
pub(crate) fn find_newest_journal(journal_root: &Path, not_before: SystemTime) -> Option<PathBuf> {
    let mut best: Option<(SystemTime, PathBuf)> = None;
    for entry in WalkDir::new(journal_root).into_iter().filter_map(|e| e.ok()) {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let filename = path.file_name().and_then(|f| f.to_str()).unwrap_or("");
        if !(filename.starts_with("rollout-") && filename.ends_with(".jsonl")) {
            continue;
        }
        let Ok(metadata) = entry.metadata() else { continue };
        let Ok(modified) = metadata.modified() else { continue };
        if modified < not_before {
            continue;
        }
        let better = match &best {
            None => true,
            Some((best_mtime, best_path)) => {
                modified > *best_mtime || (modified == *best_mtime && path > best_path.as_path())
            }
        };
        if better {
            best = Some((modified, path.to_path_buf()));
        }
    }
    best.map(|(_, path)| path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;

    #[test]
    fn picks_newest_by_mtime_then_lexicographic_name() {
        let dir = tempfile::tempdir().unwrap();
        let now = SystemTime::now();
        let a = dir.path().join("rollout-a.jsonl");
        let b = dir.path().join("rollout-b.jsonl");
        fs::write(&a, "{}").unwrap();
        std::thread::sleep(Duration::from_millis(5));
        fs::write(&b, "{}").unwrap();
        let found = find_newest_journal(dir.path(), now).unwrap();
        assert_eq!(found, b);
    }

    #[test]
    fn ignores_files_older_than_not_before() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("rollout-old.jsonl"), "{}").unwrap();
        let future = SystemTime::now() + Duration::from_secs(3600);
        assert!(find_newest_journal(dir.path(), future).is_none());
    }

    #[test]
    fn ignores_non_rollout_files() {
        let dir = tempfile::tempdir().unwrap();
        let now = SystemTime::now();
        fs::write(dir.path().join("other.jsonl"), "{}").unwrap();
        assert!(find_newest_journal(dir.path(), now).is_none());
    }
}
