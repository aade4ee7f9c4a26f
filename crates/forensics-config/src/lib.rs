//! Strict loader and validator for `<repoRoot>/.memoria.json`.
//!
//! Unknown fields reject the whole file; malformed or missing files quietly
//! fold to `None` so defaults apply elsewhere — "no config" is always a
//! valid outcome and never escalates to the caller.

#![forbid(unsafe_code)]

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Parsed, range-validated `.memoria.json` contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemoriaConfig {
    #[serde(default)]
    pub thresholds: Option<ThresholdsConfig>,
    #[serde(default)]
    pub ignore: Vec<String>,
    #[serde(default, rename = "panicKeywords")]
    pub panic_keywords: HashMap<String, f64>,
    #[serde(default, rename = "riskWeights")]
    pub risk_weights: Option<RiskWeightsConfig>,
}

/// Adaptive-threshold overrides. Each field, when present, wins over the
/// velocity-derived default in `forensics-metrics`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThresholdsConfig {
    #[serde(default, rename = "couplingPercent")]
    pub coupling_percent: Option<u32>,
    #[serde(default, rename = "driftDays")]
    pub drift_days: Option<u32>,
    #[serde(default, rename = "analysisWindow")]
    pub analysis_window: Option<u32>,
    #[serde(default, rename = "maxFilesPerCommit")]
    pub max_files_per_commit: Option<u32>,
}

/// Risk-component weights; each must lie in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RiskWeightsConfig {
    pub volatility: f64,
    pub coupling: f64,
    pub drift: f64,
    pub importers: f64,
}

/// Default risk weights, used when `.memoria.json` sets none.
pub const DEFAULT_RISK_WEIGHTS: RiskWeightsConfig = RiskWeightsConfig {
    volatility: 0.35,
    coupling: 0.30,
    drift: 0.20,
    importers: 0.15,
};

impl MemoriaConfig {
    /// Merge configured `panicKeywords` over the built-in default map.
    /// Configured weights for an existing keyword win; new keywords are added.
    #[must_use]
    pub fn effective_panic_keywords(&self) -> HashMap<String, f64> {
        let mut merged = default_panic_keywords();
        for (keyword, weight) in &self.panic_keywords {
            merged.insert(keyword.to_ascii_lowercase(), *weight);
        }
        merged
    }

    /// Risk weights, falling back to the built-in defaults when unset.
    #[must_use]
    pub fn effective_risk_weights(&self) -> RiskWeightsConfig {
        self.risk_weights.unwrap_or(DEFAULT_RISK_WEIGHTS)
    }
}

/// Default panic keyword -> weight map.
#[must_use]
pub fn default_panic_keywords() -> HashMap<String, f64> {
    let mut map = HashMap::new();
    for word in [
        "security",
        "vulnerability",
        "cve",
        "exploit",
        "crash",
        "data loss",
        "corruption",
        "breach",
    ] {
        map.insert(word.to_string(), 3.0);
    }
    for word in [
        "revert",
        "hotfix",
        "urgent",
        "breaking",
        "critical",
        "emergency",
        "rollback",
        "regression",
    ] {
        map.insert(word.to_string(), 2.0);
    }
    for word in [
        "fix", "bug", "patch", "oops", "typo", "issue", "error", "wrong", "mistake", "broken",
    ] {
        map.insert(word.to_string(), 1.0);
    }
    for word in ["refactor", "cleanup", "lint", "format"] {
        map.insert(word.to_string(), 0.5);
    }
    map
}

/// Load and validate `<repo_root>/.memoria.json`.
///
/// Returns `None` whenever the file is absent, unparsable, contains unknown
/// keys, or fails a numeric-range check — never an `Err`. Callers always
/// have a usable (default) configuration to fall back on.
#[must_use]
pub fn load(repo_root: &Path) -> Option<MemoriaConfig> {
    let path = repo_root.join(".memoria.json");
    let raw = match std::fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "no .memoria.json, using defaults");
            return None;
        }
    };

    let config: MemoriaConfig = match serde_json::from_str(&raw) {
        Ok(config) => config,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "malformed .memoria.json, using defaults");
            return None;
        }
    };

    if !validate(&config) {
        debug!(path = %path.display(), "invalid .memoria.json ranges, using defaults");
        return None;
    }

    Some(config)
}

fn validate(config: &MemoriaConfig) -> bool {
    if let Some(thresholds) = &config.thresholds {
        if let Some(v) = thresholds.coupling_percent {
            if !(0..=100).contains(&v) {
                return false;
            }
        }
        if let Some(v) = thresholds.drift_days {
            if !(1..=365).contains(&v) {
                return false;
            }
        }
        if let Some(v) = thresholds.analysis_window {
            if !(10..=500).contains(&v) {
                return false;
            }
        }
        if let Some(v) = thresholds.max_files_per_commit {
            if !(5..=100).contains(&v) {
                return false;
            }
        }
    }
    if let Some(weights) = &config.risk_weights {
        for w in [
            weights.volatility,
            weights.coupling,
            weights.drift,
            weights.importers,
        ] {
            if !(0.0..=1.0).contains(&w) {
                return false;
            }
        }
    }
    true
}
