//! Pure reduction over the engines' outputs into a single compound risk
//! score, level, and the human-readable factors behind it.

#![forbid(unsafe_code)]

use forensics_config::RiskWeightsConfig;
use forensics_math::clamp_score;

/// Bucketed severity of a file's compound risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    #[must_use]
    pub fn from_score(score: u32) -> Self {
        match score {
            0..=24 => RiskLevel::Low,
            25..=49 => RiskLevel::Medium,
            50..=74 => RiskLevel::High,
            _ => RiskLevel::Critical,
        }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }

    #[must_use]
    pub fn action(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Proceed with standard review.",
            RiskLevel::Medium => "Review coupled files before merging.",
            RiskLevel::High => "Request a second reviewer familiar with this area.",
            RiskLevel::Critical => "Pause and confirm the blast radius with the file's top contributor before changing it.",
        }
    }
}

/// Final compound risk result for a file.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskAssessment {
    pub score: u32,
    pub level: RiskLevel,
    pub factors: Vec<String>,
    pub action: String,
}

const PANIC_FACTOR_THRESHOLD: u32 = 30;
const COUPLED_FACTOR_MIN_COUNT: usize = 3;
const IMPORTER_FACTOR_MIN_COUNT: usize = 5;

/// Inputs gathered from the four engines, ready to be weighted and reduced.
pub struct RiskInputs<'a> {
    pub panic_score: u32,
    /// Coupling scores for every coupled entry, already sorted descending.
    pub coupling_scores: &'a [u32],
    pub stale_file_count: usize,
    pub importer_count: usize,
    pub commit_count: u32,
}

/// Combine `inputs` with `weights` into a final [`RiskAssessment`].
#[must_use]
pub fn compute(inputs: &RiskInputs<'_>, weights: RiskWeightsConfig) -> RiskAssessment {
    let volatility_component = f64::from(inputs.panic_score);

    let coupling_component = if inputs.coupling_scores.is_empty() {
        0.0
    } else {
        let top3 = &inputs.coupling_scores[..inputs.coupling_scores.len().min(3)];
        let mean = top3.iter().map(|s| f64::from(*s)).sum::<f64>() / top3.len() as f64;
        (mean * 1.5).min(100.0)
    };

    let drift_component = ((inputs.stale_file_count as f64) * 25.0).min(100.0);
    let importer_component = ((inputs.importer_count as f64) * 10.0).min(100.0);

    let weighted = volatility_component * weights.volatility
        + coupling_component * weights.coupling
        + drift_component * weights.drift
        + importer_component * weights.importers;
    let score = clamp_score(weighted.round());
    let level = RiskLevel::from_score(score);

    let mut factors = Vec::new();
    if inputs.panic_score > PANIC_FACTOR_THRESHOLD {
        factors.push(format!("Elevated panic score ({})", inputs.panic_score));
    }
    if inputs.coupling_scores.len() >= COUPLED_FACTOR_MIN_COUNT {
        factors.push(format!(
            "{} files frequently co-change with this one",
            inputs.coupling_scores.len()
        ));
    }
    if inputs.stale_file_count > 0 {
        factors.push(format!(
            "{} coupled file(s) have drifted out of sync",
            inputs.stale_file_count
        ));
    }
    if inputs.importer_count >= IMPORTER_FACTOR_MIN_COUNT {
        factors.push(format!("{} static dependents found", inputs.importer_count));
    }
    if inputs.commit_count == 0 {
        factors.push("No commit history yet".to_string());
    }

    RiskAssessment {
        score,
        action: level.action().to_string(),
        level,
        factors,
    }
}
