//! Answers "why does this code exist": commit message grep, content
//! pickaxe, and line-range log, unified behind one search operation.

#![forbid(unsafe_code)]

use std::path::Path;

use chrono::{TimeZone, Utc};
use forensics_concurrency::map_concurrent;
use forensics_git::{GitCommit, commit_files, log_grep, log_line_range, log_pickaxe};
use tracing::debug;

const FILES_PER_COMMIT_CAP: usize = 5;

/// Which search mode(s) to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    Message,
    Diff,
    Both,
}

/// Which search surfaced a given result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchType {
    Message,
    Diff,
}

/// One history search hit.
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySearchResult {
    pub hash: String,
    pub date: String,
    pub author: String,
    pub message: String,
    pub files_changed: Vec<String>,
    pub match_type: MatchType,
}

/// Parameters for [`search`].
pub struct SearchParams<'a> {
    pub query: &'a str,
    pub path: Option<&'a str>,
    pub mode: SearchMode,
    pub limit: usize,
    pub line_range: Option<(u32, u32)>,
}

/// Whether `params` describe a valid query: a query is required unless a
/// line range is supplied, a line range requires a target path, and after
/// clamping `start` to at least 1, `start <= end` must hold.
#[must_use]
pub fn validate(params: &SearchParams<'_>) -> bool {
    if let Some((start, end)) = params.line_range {
        if params.path.is_none() {
            return false;
        }
        let start = start.max(1);
        start <= end
    } else {
        !params.query.is_empty()
    }
}

fn iso_day(timestamp: i64) -> String {
    Utc.timestamp_opt(timestamp, 0)
        .single()
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

struct Tagged {
    commit: GitCommit,
    match_type: MatchType,
}

fn run_message_search(
    repo_root: &Path,
    query: &str,
    path: Option<&str>,
    limit: usize,
) -> Vec<Tagged> {
    match log_grep(repo_root, query, path, limit) {
        Ok(commits) => commits
            .into_iter()
            .map(|commit| Tagged {
                commit,
                match_type: MatchType::Message,
            })
            .collect(),
        Err(err) => {
            debug!(query, error = %err, "message grep failed");
            Vec::new()
        }
    }
}

fn run_pickaxe_search(
    repo_root: &Path,
    query: &str,
    path: Option<&str>,
    limit: usize,
) -> Vec<Tagged> {
    match log_pickaxe(repo_root, query, path, limit) {
        Ok(commits) => commits
            .into_iter()
            .map(|commit| Tagged {
                commit,
                match_type: MatchType::Diff,
            })
            .collect(),
        Err(err) => {
            debug!(query, error = %err, "pickaxe search failed");
            Vec::new()
        }
    }
}

fn run_line_range_search(
    repo_root: &Path,
    path: &str,
    start: u32,
    end: u32,
    limit: usize,
) -> Vec<Tagged> {
    let start = start.max(1);
    match log_line_range(repo_root, path, start, end, limit) {
        Ok(commits) => commits
            .into_iter()
            .map(|commit| Tagged {
                commit,
                match_type: MatchType::Diff,
            })
            .collect(),
        Err(err) => {
            debug!(path, start, end, error = %err, "line-range search failed");
            Vec::new()
        }
    }
}

/// Run the configured search mode(s), dedupe by hash, attach truncated
/// file lists, and return results sorted newest-first, limited to
/// `params.limit`.
#[must_use]
pub fn search(repo_root: &Path, params: &SearchParams<'_>) -> Vec<HistorySearchResult> {
    if !validate(params) {
        return Vec::new();
    }

    let candidates = if let Some((start, end)) = params.line_range {
        let Some(path) = params.path else {
            return Vec::new();
        };
        run_line_range_search(repo_root, path, start, end, params.limit)
    } else {
        match params.mode {
            SearchMode::Message => {
                run_message_search(repo_root, params.query, params.path, params.limit)
            }
            SearchMode::Diff => {
                run_pickaxe_search(repo_root, params.query, params.path, params.limit)
            }
            SearchMode::Both => {
                let mut combined =
                    run_message_search(repo_root, params.query, params.path, params.limit);
                combined.extend(run_pickaxe_search(
                    repo_root,
                    params.query,
                    params.path,
                    params.limit,
                ));
                combined
            }
        }
    };

    let mut seen = std::collections::HashSet::new();
    let mut deduped: Vec<Tagged> = Vec::new();
    for tagged in candidates {
        if seen.insert(tagged.commit.hash.clone()) {
            deduped.push(tagged);
        }
    }

    let repo_root_owned = repo_root.to_path_buf();
    let hashes: Vec<String> = deduped.iter().map(|t| t.commit.hash.clone()).collect();
    let file_lists = map_concurrent(hashes, forensics_concurrency::DEFAULT_LIMIT, move |hash| {
        commit_files(&repo_root_owned, &hash).unwrap_or_default()
    });

    let mut results: Vec<HistorySearchResult> = deduped
        .into_iter()
        .zip(file_lists)
        .map(|(tagged, files)| HistorySearchResult {
            hash: tagged.commit.short_hash(),
            date: iso_day(tagged.commit.timestamp),
            author: tagged.commit.author_name,
            message: tagged.commit.subject,
            files_changed: files.into_iter().take(FILES_PER_COMMIT_CAP).collect(),
            match_type: tagged.match_type,
        })
        .collect();

    results.sort_by(|a, b| b.date.cmp(&a.date));
    results.truncate(params.limit);
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use forensics_test_support::TempRepo;

    #[test]
    fn validate_requires_nonempty_query_without_line_range() {
        let params = SearchParams {
            query: "",
            path: None,
            mode: SearchMode::Both,
            limit: 20,
            line_range: None,
        };
        assert!(!validate(&params));
    }

    #[test]
    fn validate_allows_empty_query_with_line_range_and_path() {
        let params = SearchParams {
            query: "",
            path: Some("src/a.ts"),
            mode: SearchMode::Both,
            limit: 20,
            line_range: Some((10, 20)),
        };
        assert!(validate(&params));
    }

    #[test]
    fn validate_rejects_line_range_without_path() {
        let params = SearchParams {
            query: "",
            path: None,
            mode: SearchMode::Both,
            limit: 20,
            line_range: Some((10, 20)),
        };
        assert!(!validate(&params));
    }

    #[test]
    fn validate_rejects_start_greater_than_end_after_clamping() {
        let params = SearchParams {
            query: "",
            path: Some("src/a.ts"),
            mode: SearchMode::Both,
            limit: 20,
            line_range: Some((30, 20)),
        };
        assert!(!validate(&params));
    }

    #[test]
    fn message_search_tags_results_as_message_matches() {
        let Some(repo) = TempRepo::new() else {
            return;
        };
        repo.write("a.txt", "1\n");
        repo.commit_all("fix urgent crash");

        let params = SearchParams {
            query: "urgent",
            path: None,
            mode: SearchMode::Message,
            limit: 20,
            line_range: None,
        };
        let results = search(repo.path(), &params);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].match_type, MatchType::Message);
        assert_eq!(results[0].hash.len(), 7);
    }

    #[test]
    fn results_are_sorted_by_date_descending() {
        let Some(repo) = TempRepo::new() else {
            return;
        };
        repo.write("a.txt", "1\n");
        repo.commit_all("alpha commit");
        repo.write("a.txt", "2\n");
        repo.commit_all("alpha commit again");

        let params = SearchParams {
            query: "alpha",
            path: None,
            mode: SearchMode::Message,
            limit: 20,
            line_range: None,
        };
        let results = search(repo.path(), &params);
        assert_eq!(results.len(), 2);
        assert!(results[0].date >= results[1].date);
    }
}
