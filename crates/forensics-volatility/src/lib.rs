//! Engine V: scores a file's recent commit history for distress keywords,
//! decayed by recency, and breaks ownership down by author.

#![forbid(unsafe_code)]

use std::collections::HashMap;
use std::path::Path;

use chrono::{TimeZone, Utc};
use forensics_git::{GitCommit, file_history};
use forensics_math::{clamp_score, recency_decay};
use tracing::debug;

pub const HISTORY_WINDOW: usize = 20;
const HALF_LIFE_DAYS: f64 = 30.0;
const PANIC_COMMIT_MIN_WEIGHT: f64 = 2.0;
const SUBJECT_MAX_CHARS: usize = 60;

/// A single author's share of a file's history.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorDetail {
    pub name: String,
    pub email: String,
    pub commits: u32,
    pub percentage: u32,
    pub first_commit: String,
    pub last_commit: String,
}

/// Recency-decay summary across the sampled commits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecencyDecay {
    pub oldest_commit_days: i64,
    pub newest_commit_days: i64,
    pub average_decay_factor: f64,
}

/// Output of the volatility engine for one file.
#[derive(Debug, Clone, PartialEq)]
pub struct VolatilityResult {
    pub commit_count: u32,
    pub panic_score: u32,
    pub panic_commits: Vec<String>,
    pub last_commit_date: Option<String>,
    pub authors: u32,
    pub author_details: Vec<AuthorDetail>,
    pub top_author: Option<String>,
    pub recency_decay: RecencyDecay,
}

impl VolatilityResult {
    fn empty() -> Self {
        Self {
            commit_count: 0,
            panic_score: 0,
            panic_commits: Vec::new(),
            last_commit_date: None,
            authors: 0,
            author_details: Vec::new(),
            top_author: None,
            recency_decay: RecencyDecay {
                oldest_commit_days: 0,
                newest_commit_days: 0,
                average_decay_factor: 0.0,
            },
        }
    }
}

fn iso_date(timestamp: i64) -> String {
    Utc.timestamp_opt(timestamp, 0)
        .single()
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_default()
}

fn days_ago(timestamp: i64, now: i64) -> i64 {
    ((now - timestamp).max(0)) / 86_400
}

fn max_keyword_weight(message: &str, panic_keywords: &HashMap<String, f64>) -> f64 {
    let lower = message.to_ascii_lowercase();
    panic_keywords
        .iter()
        .filter(|(keyword, _)| lower.contains(keyword.as_str()))
        .map(|(_, weight)| *weight)
        .fold(0.0, f64::max)
}

fn truncated_subject(commit: &GitCommit) -> String {
    let first_line = commit.subject.lines().next().unwrap_or("");
    if first_line.chars().count() <= SUBJECT_MAX_CHARS {
        first_line.to_string()
    } else {
        first_line.chars().take(SUBJECT_MAX_CHARS).collect()
    }
}

/// Compute the volatility result for `file`, fetching up to
/// [`HISTORY_WINDOW`] commits. Git failures are swallowed and surface as an
/// empty result rather than an error.
#[must_use]
pub fn analyze(
    repo_root: &Path,
    file: &str,
    panic_keywords: &HashMap<String, f64>,
    now: i64,
) -> VolatilityResult {
    let commits = match file_history(repo_root, file, HISTORY_WINDOW) {
        Ok(commits) => commits,
        Err(err) => {
            debug!(file, error = %err, "git log failed while scoring volatility");
            return VolatilityResult::empty();
        }
    };

    if commits.is_empty() {
        return VolatilityResult::empty();
    }

    let mut weighted_score = 0.0;
    let mut decay_sum = 0.0;
    let mut panic_candidates: Vec<(f64, i64, String)> = Vec::new();
    let mut oldest_days = i64::MIN;
    let mut newest_days = i64::MAX;

    for commit in &commits {
        let age_days = days_ago(commit.timestamp, now);
        oldest_days = oldest_days.max(age_days);
        newest_days = newest_days.min(age_days);

        let decay = recency_decay(age_days as f64, HALF_LIFE_DAYS);
        decay_sum += decay;

        let weight = max_keyword_weight(&commit.subject, panic_keywords);
        weighted_score += weight * decay;

        if weight >= PANIC_COMMIT_MIN_WEIGHT {
            panic_candidates.push((weight, commit.timestamp, truncated_subject(commit)));
        }
    }

    panic_candidates.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap().then(b.1.cmp(&a.1)));
    let panic_commits = panic_candidates
        .into_iter()
        .take(3)
        .map(|(_, _, subject)| subject)
        .collect();

    let normalized =
        (weighted_score / (HISTORY_WINDOW as f64 * 3.0) * 100.0).round().max(0.0) as u32;
    let panic_score = clamp_score(f64::from(normalized));

    let total_commits = commits.len() as u32;
    let divisor = if total_commits == 0 { 1 } else { total_commits };

    let mut by_author: HashMap<String, AuthorAccumulator> = HashMap::new();
    for commit in &commits {
        let key = if commit.author_email.is_empty() {
            commit.author_name.clone()
        } else {
            commit.author_email.clone()
        };
        let entry = by_author.entry(key).or_insert_with(|| AuthorAccumulator {
            name: commit.author_name.clone(),
            email: commit.author_email.clone(),
            commits: 0,
            first_commit: commit.timestamp,
            last_commit: commit.timestamp,
        });
        entry.commits += 1;
        entry.first_commit = entry.first_commit.min(commit.timestamp);
        entry.last_commit = entry.last_commit.max(commit.timestamp);
    }

    let mut author_details: Vec<AuthorDetail> = by_author
        .into_values()
        .map(|acc| AuthorDetail {
            name: acc.name,
            email: acc.email,
            commits: acc.commits,
            percentage: ((acc.commits as f64 / divisor as f64) * 100.0).round() as u32,
            first_commit: iso_date(acc.first_commit),
            last_commit: iso_date(acc.last_commit),
        })
        .collect();
    author_details.sort_by(|a, b| b.commits.cmp(&a.commits).then(a.name.cmp(&b.name)));

    let top_author = author_details.first().map(|a| a.name.clone());
    let last_commit_date = commits.iter().map(|c| c.timestamp).max().map(iso_date);

    VolatilityResult {
        commit_count: total_commits,
        panic_score,
        panic_commits,
        last_commit_date,
        authors: author_details.len() as u32,
        author_details,
        top_author,
        recency_decay: RecencyDecay {
            oldest_commit_days: oldest_days,
            newest_commit_days: newest_days,
            average_decay_factor: decay_sum / commits.len() as f64,
        },
    }
}

struct AuthorAccumulator {
    name: String,
    email: String,
    commits: u32,
    first_commit: i64,
    last_commit: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commit(hash: &str, ts: i64, email: &str, subject: &str) -> GitCommit {
        GitCommit {
            hash: hash.to_string(),
            timestamp: ts,
            author_name: email.split('@').next().unwrap_or(email).to_string(),
            author_email: email.to_string(),
            subject: subject.to_string(),
        }
    }

    fn keywords() -> HashMap<String, f64> {
        forensics_config::default_panic_keywords()
    }

    #[test]
    fn empty_history_yields_zeroed_result() {
        let result = VolatilityResult::empty();
        assert_eq!(result.commit_count, 0);
        assert_eq!(result.panic_score, 0);
        assert_eq!(result.newest_commit_days, 0);
        assert!(result.top_author.is_none());
    }

    #[test]
    fn author_percentages_sum_near_100() {
        let now = 1_700_000_000i64;
        let commits = vec![
            commit("a", now - 86_400, "alice@example.com", "fix bug"),
            commit("b", now - 2 * 86_400, "alice@example.com", "another fix"),
            commit("c", now - 3 * 86_400, "bob@example.com", "cleanup"),
        ];
        let total = commits.len() as u32;
        let mut by_author: HashMap<String, u32> = HashMap::new();
        for c in &commits {
            *by_author.entry(c.author_email.clone()).or_insert(0) += 1;
        }
        let sum: i64 = by_author
            .values()
            .map(|count| ((*count as f64 / total as f64) * 100.0).round() as i64)
            .sum();
        assert!((95..=105).contains(&sum));
    }

    #[test]
    fn recency_decay_ordering_matches_documented_fixed_points() {
        assert!((recency_decay(0.0, 30.0) - 1.0).abs() < 1e-9);
        assert!((recency_decay(30.0, 30.0) - 0.5).abs() < 1e-9);
        assert!((recency_decay(60.0, 30.0) - 0.25).abs() < 1e-9);
    }

    #[test]
    fn panic_commits_require_weight_at_least_two() {
        let subjects_with_weight = vec![
            (3.0_f64, 1i64, "security fix".to_string()),
            (1.0, 2, "typo fix".to_string()),
        ];
        let survivors: Vec<_> = subjects_with_weight
            .into_iter()
            .filter(|(weight, _, _)| *weight >= PANIC_COMMIT_MIN_WEIGHT)
            .collect();
        assert_eq!(survivors.len(), 1);
    }

    #[test]
    fn max_keyword_weight_picks_highest_tier() {
        let words = keywords();
        let weight = max_keyword_weight("URGENT: fix security vulnerability", &words);
        assert_eq!(weight, 3.0);
    }

    #[test]
    fn truncated_subject_respects_sixty_char_cap() {
        let long_subject = "x".repeat(100);
        let commit = commit("deadbeef", 0, "a@b.com", &long_subject);
        assert_eq!(truncated_subject(&commit).chars().count(), SUBJECT_MAX_CHARS);
    }
}
