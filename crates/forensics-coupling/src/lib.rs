//! Engine C: mines co-change coupling from a file's recent commit window
//! and attaches an evidence diff to each surviving entry.

#![forbid(unsafe_code)]

use std::collections::HashMap;
use std::path::Path;

use forensics_concurrency::map_concurrent;
use forensics_diff::{DiffSummary, build_diff_summary};
use forensics_git::{commit_files, file_history};
use forensics_ignore::IgnoreFilter;
use forensics_math::round_percent;
use tracing::debug;

const MAX_ENTRIES: usize = 5;
/// A file present only in the repository's initial commit is "coupled" to
/// every other file that commit touched. Below this count the signal is
/// pure noise and coupling analysis is skipped entirely.
const COLD_START_MIN_COMMITS: usize = 3;

/// One file coupled to the analysis target by co-change frequency.
#[derive(Debug, Clone, PartialEq)]
pub struct CoupledEntry {
    pub file: String,
    pub score: u32,
    pub reason: String,
    pub last_hash: String,
    pub evidence: DiffSummary,
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

struct Accumulator {
    count: u32,
    last_hash: String,
    last_message: String,
}

/// Rank files that co-change with `target_file` across its last `window`
/// commits, returning up to 5 entries whose score clears
/// `coupling_threshold_percent`.
#[must_use]
pub fn analyze(
    repo_root: &Path,
    target_file: &str,
    ignore_filter: &IgnoreFilter,
    window: usize,
    max_files_per_commit: u32,
    coupling_threshold_percent: u32,
) -> Vec<CoupledEntry> {
    let commits = match file_history(repo_root, target_file, window) {
        Ok(commits) => commits,
        Err(err) => {
            debug!(target_file, error = %err, "git log failed while mining coupling");
            return Vec::new();
        }
    };

    if commits.len() < COLD_START_MIN_COMMITS {
        return Vec::new();
    }

    let total_commits = commits.len() as u32;
    let target_basename = basename(target_file).to_string();

    let hashes: Vec<String> = commits.iter().map(|c| c.hash.clone()).collect();
    let repo_root_owned = repo_root.to_path_buf();
    let per_commit_files = map_concurrent(hashes, forensics_concurrency::DEFAULT_LIMIT, move |hash| {
        commit_files(&repo_root_owned, &hash).unwrap_or_default()
    });

    let mut accum: HashMap<String, Accumulator> = HashMap::new();
    for (commit, files) in commits.iter().zip(per_commit_files.iter()) {
        if files.len() as u32 > max_files_per_commit {
            continue;
        }
        for file in files {
            if basename(file) == target_basename {
                continue;
            }
            if ignore_filter.is_ignored(file) {
                continue;
            }
            accum
                .entry(file.clone())
                .and_modify(|entry| entry.count += 1)
                .or_insert_with(|| Accumulator {
                    count: 1,
                    last_hash: commit.hash.clone(),
                    last_message: commit.subject.clone(),
                });
        }
    }

    let mut ranked: Vec<(String, Accumulator)> = accum.into_iter().collect();
    ranked.sort_by(|a, b| b.1.count.cmp(&a.1.count).then(a.0.cmp(&b.0)));
    ranked.truncate(MAX_ENTRIES);

    ranked
        .into_iter()
        .filter_map(|(file, acc)| {
            let score = round_percent(f64::from(acc.count), f64::from(total_commits));
            if score <= coupling_threshold_percent {
                return None;
            }
            let evidence = build_diff_summary(repo_root, &acc.last_hash, &file);
            Some(CoupledEntry {
                file,
                score,
                reason: acc.last_message,
                last_hash: acc.last_hash,
                evidence,
            })
        })
        .collect()
}
