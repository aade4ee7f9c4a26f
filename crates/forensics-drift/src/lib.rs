//! Engine D: flags coupled files whose filesystem modification time lags
//! far enough behind the analysis target to suggest they were forgotten.

#![forbid(unsafe_code)]

use std::path::Path;

use forensics_concurrency::map_concurrent;
use forensics_git::mtime_millis;
use tracing::debug;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// A coupled file whose mtime lags the target's by more than `drift_days`.
#[derive(Debug, Clone, PartialEq)]
pub struct DriftEntry {
    pub file: String,
    pub days_old: i64,
}

/// Compare `target_path`'s mtime against each of `coupled_files` (paths
/// relative to `repo_root`), emitting an entry for every file older than
/// `drift_days`. Files whose stat fails (deleted or moved) are skipped
/// silently.
#[must_use]
pub fn analyze(
    repo_root: &Path,
    target_path: &Path,
    coupled_files: &[String],
    drift_days: u32,
) -> Vec<DriftEntry> {
    let target_mtime = match mtime_millis(target_path) {
        Ok(mtime) => mtime,
        Err(err) => {
            debug!(path = %target_path.display(), error = %err, "failed to stat target mtime");
            return Vec::new();
        }
    };

    let repo_root = repo_root.to_path_buf();
    let files = coupled_files.to_vec();
    let stats = map_concurrent(files, forensics_concurrency::DEFAULT_LIMIT, move |file| {
        let full_path = repo_root.join(&file);
        mtime_millis(&full_path).ok().map(|mtime| (file, mtime))
    });

    stats
        .into_iter()
        .flatten()
        .filter_map(|(file, mtime)| {
            let days_old = (target_mtime - mtime) / MILLIS_PER_DAY;
            if days_old > i64::from(drift_days) {
                Some(DriftEntry { file, days_old })
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{Duration, SystemTime};

    fn set_mtime(path: &Path, when: SystemTime) {
        let file = fs::File::options().write(true).open(path).unwrap();
        file.set_modified(when).unwrap();
    }

    #[test]
    fn stale_siblings_are_flagged() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("target.ts");
        let sibling = dir.path().join("sibling.ts");
        fs::write(&target, "t").unwrap();
        fs::write(&sibling, "s").unwrap();

        let now = SystemTime::now();
        set_mtime(&target, now);
        set_mtime(&sibling, now - Duration::from_secs(20 * 86_400));

        let result = analyze(dir.path(), &target, &["sibling.ts".to_string()], 7);
        assert_eq!(result.len(), 1);
        assert!(result[0].days_old > 7);
    }

    #[test]
    fn fresh_siblings_are_not_flagged() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("target.ts");
        let sibling = dir.path().join("sibling.ts");
        fs::write(&target, "t").unwrap();
        fs::write(&sibling, "s").unwrap();

        let now = SystemTime::now();
        set_mtime(&target, now);
        set_mtime(&sibling, now);

        let result = analyze(dir.path(), &target, &["sibling.ts".to_string()], 7);
        assert!(result.is_empty());
    }

    #[test]
    fn missing_coupled_files_are_skipped_silently() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("target.ts");
        fs::write(&target, "t").unwrap();

        let result = analyze(dir.path(), &target, &["deleted.ts".to_string()], 7);
        assert!(result.is_empty());
    }

    #[test]
    fn missing_target_yields_empty_result() {
        let dir = tempfile::tempdir().unwrap();
        let result = analyze(dir.path(), &dir.path().join("ghost.ts"), &[], 7);
        assert!(result.is_empty());
    }
}
