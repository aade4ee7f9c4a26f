//! Samples recent commit velocity and derives runtime knobs from it.
//!
//! A low-velocity repository demands stricter coupling evidence; a
//! high-velocity one tolerates a smaller per-file analysis window but a
//! looser coupling threshold because noise from rapid, small commits is
//! higher.

#![forbid(unsafe_code)]

use std::path::Path;

use forensics_concurrency::map_concurrent;
use forensics_config::ThresholdsConfig;
use forensics_git::{commit_files, recent_commits};
use tracing::debug;

pub const WINDOW_DAYS: u32 = 30;
pub const MAX_COMMITS: usize = 500;
pub const SAMPLE_SIZE: usize = 10;

/// Sampled repository velocity, used to tune [`AdaptiveThresholds`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectMetrics {
    pub total_commits: u32,
    pub commits_per_week: f64,
    pub avg_files_per_commit: f64,
}

impl Default for ProjectMetrics {
    fn default() -> Self {
        Self {
            total_commits: 0,
            commits_per_week: 10.0,
            avg_files_per_commit: 3.0,
        }
    }
}

/// Sample the last [`WINDOW_DAYS`] of history at `repo_root`. Any Git
/// failure falls back to [`ProjectMetrics::default`] rather than
/// propagating an error.
pub fn sample(repo_root: &Path) -> ProjectMetrics {
    let commits = match recent_commits(repo_root, WINDOW_DAYS, MAX_COMMITS) {
        Ok(commits) => commits,
        Err(err) => {
            debug!(error = %err, "git log failed while sampling project metrics");
            return ProjectMetrics::default();
        }
    };

    let total_commits = commits.len() as u32;
    let commits_per_week = (f64::from(total_commits) / f64::from(WINDOW_DAYS)) * 7.0;

    let sampled_hashes: Vec<String> = commits
        .iter()
        .take(SAMPLE_SIZE)
        .map(|c| c.hash.clone())
        .collect();
    if sampled_hashes.is_empty() {
        return ProjectMetrics {
            total_commits,
            commits_per_week,
            avg_files_per_commit: 3.0,
        };
    }

    let repo_root = repo_root.to_path_buf();
    let file_counts = map_concurrent(
        sampled_hashes,
        forensics_concurrency::DEFAULT_LIMIT,
        move |hash| commit_files(&repo_root, &hash).map(|f| f.len()).unwrap_or(0),
    );
    let avg_files_per_commit = if file_counts.is_empty() {
        3.0
    } else {
        file_counts.iter().sum::<usize>() as f64 / file_counts.len() as f64
    };

    ProjectMetrics {
        total_commits,
        commits_per_week,
        avg_files_per_commit,
    }
}

/// Runtime knobs that scale with repository velocity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdaptiveThresholds {
    pub coupling_percent: u32,
    pub drift_days: u32,
    pub analysis_window: u32,
    pub max_files_per_commit: u32,
}

impl AdaptiveThresholds {
    /// Derive thresholds from sampled velocity, then apply any configured
    /// override field-by-field (a config override always wins).
    #[must_use]
    pub fn derive(metrics: &ProjectMetrics, overrides: Option<&ThresholdsConfig>) -> Self {
        let mut base = if metrics.commits_per_week < 5.0 {
            Self {
                coupling_percent: 20,
                drift_days: 14,
                analysis_window: 30,
                max_files_per_commit: 15,
            }
        } else if metrics.commits_per_week > 50.0 {
            Self {
                coupling_percent: 10,
                drift_days: 3,
                analysis_window: 100,
                max_files_per_commit: 15,
            }
        } else {
            Self {
                coupling_percent: 15,
                drift_days: 7,
                analysis_window: 50,
                max_files_per_commit: 15,
            }
        };

        if metrics.avg_files_per_commit > 5.0 {
            base.coupling_percent += 5;
        }

        if let Some(overrides) = overrides {
            if let Some(v) = overrides.coupling_percent {
                base.coupling_percent = v;
            }
            if let Some(v) = overrides.drift_days {
                base.drift_days = v;
            }
            if let Some(v) = overrides.analysis_window {
                base.analysis_window = v;
            }
            if let Some(v) = overrides.max_files_per_commit {
                base.max_files_per_commit = v;
            }
        }

        base
    }
}
