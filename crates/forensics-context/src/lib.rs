//! Builds the immutable, per-request context that every engine reads
//! from: repo root, loaded config, compiled ignore filter, and sampled
//! project velocity.

#![forbid(unsafe_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use forensics_cache::Cache;
use forensics_config::{MemoriaConfig, RiskWeightsConfig};
use forensics_git::repo_root;
use forensics_ignore::{IgnoreFilter, normalize_rel_path};
use forensics_metrics::{AdaptiveThresholds, ProjectMetrics, sample};
use tracing::debug;

/// Failure building a context — the only two conditions that abort a
/// request outright, before any engine runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextBuildError {
    PathNotFound,
    NotARepository,
}

/// Everything the Volatility, Coupling, Drift, Importers, and Sibling
/// engines read but never mutate. Built once per `analyze_file` call.
pub struct AnalysisContext {
    pub target_path: PathBuf,
    pub repo_root: PathBuf,
    pub config: MemoriaConfig,
    pub ignore_filter: IgnoreFilter,
    pub metrics: ProjectMetrics,
    pub thresholds: AdaptiveThresholds,
}

impl AnalysisContext {
    /// Resolve `target_path`'s repository, load its config, and sample its
    /// velocity, consulting `cache` before recomputing the ignore filter
    /// or project metrics.
    pub fn build(target_path: &Path, cache: &Cache) -> Result<Self, ContextBuildError> {
        if !target_path.exists() {
            return Err(ContextBuildError::PathNotFound);
        }
        let repo_root_path = repo_root(target_path).ok_or(ContextBuildError::NotARepository)?;

        let config = forensics_config::load(&repo_root_path).unwrap_or_default();

        let ignore_key = format!(
            "ignore:{}:{}",
            repo_root_path.display(),
            config.ignore.join(",")
        );
        let ignore_filter = match cache.get::<IgnoreFilter>(&ignore_key) {
            Some(cached) => cached,
            None => {
                let built = IgnoreFilter::build(&repo_root_path, &config.ignore);
                cache.set(&ignore_key, built.clone());
                built
            }
        };

        let metrics_key = format!("metrics:{}", repo_root_path.display());
        let metrics = match cache.get::<ProjectMetrics>(&metrics_key) {
            Some(cached) => cached,
            None => {
                let sampled = sample(&repo_root_path);
                cache.set(&metrics_key, sampled);
                sampled
            }
        };

        let thresholds = AdaptiveThresholds::derive(&metrics, config.thresholds.as_ref());

        debug!(
            repo_root = %repo_root_path.display(),
            commits_per_week = metrics.commits_per_week,
            "built analysis context"
        );

        Ok(Self {
            target_path: target_path.to_path_buf(),
            repo_root: repo_root_path,
            config,
            ignore_filter,
            metrics,
            thresholds,
        })
    }

    /// The target path expressed relative to `repo_root`, forward-slash
    /// normalized.
    #[must_use]
    pub fn repo_relative(&self) -> Option<String> {
        let rel = self.target_path.strip_prefix(&self.repo_root).ok()?;
        Some(normalize_rel_path(&rel.to_string_lossy()))
    }

    #[must_use]
    pub fn panic_keywords(&self) -> HashMap<String, f64> {
        self.config.effective_panic_keywords()
    }

    #[must_use]
    pub fn risk_weights(&self) -> RiskWeightsConfig {
        self.config.effective_risk_weights()
    }
}
