//! Facade crate: wires every engine into the two external entry points —
//! `analyze_file` and `search_history` — described in spec §6. This is the
//! only crate callers need to depend on; everything else in the workspace
//! is an implementation detail reached through here.
//!
//! Control flow for [`analyze_file`]: build an [`AnalysisContext`] once,
//! run Volatility/Coupling/Importers concurrently, run Drift against
//! Coupling's output, run Sibling Guidance only if Volatility saw zero
//! history, reduce everything through the risk calculator, then hand the
//! assembled [`report::AnalysisReportInput`] to the formatter.

#![forbid(unsafe_code)]

pub mod error;

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use forensics_cache::Cache;
use forensics_context::AnalysisContext;
pub use error::ForensicsError;

pub use forensics_config::MemoriaConfig;
pub use forensics_coupling::CoupledEntry;
pub use forensics_drift::DriftEntry;
pub use forensics_history::{HistorySearchResult, MatchType, SearchMode};
pub use forensics_risk::{RiskAssessment, RiskLevel};
pub use forensics_siblings::SiblingGuidance;
pub use forensics_volatility::VolatilityResult;

use forensics_report::AnalysisReportInput;
use tracing::{debug, info_span};

fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Everything one `analyze_file` call computed, before it was rendered to
/// Markdown. Exposed alongside the rendered string for callers (tests, a
/// future MCP transport) that want the structured form.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub file_rel: String,
    pub risk: RiskAssessment,
    pub coupled: Vec<CoupledEntry>,
    pub drift: Vec<DriftEntry>,
    pub importers: Vec<String>,
    pub volatility: VolatilityResult,
    pub siblings: Option<SiblingGuidance>,
}

/// Analyze a single file's risk of modification and return the assembled
/// Markdown brief (spec §6, `analyze_file`).
///
/// # Errors
///
/// Returns [`ForensicsError::NotFound`] if `absolute_path` does not exist,
/// or [`ForensicsError::NotARepository`] if it isn't inside a Git work
/// tree. Every other failure mode (a missing Git binary, a malformed
/// config, a single failed subprocess) is absorbed by the engine that hit
/// it; the report is still produced from whatever signals succeeded.
pub fn analyze_file(absolute_path: &Path) -> Result<String, ForensicsError> {
    let report = analyze_file_structured(absolute_path)?;
    let input = AnalysisReportInput {
        file_rel: &report.file_rel,
        risk: &report.risk,
        coupled: &report.coupled,
        drift: &report.drift,
        importers: &report.importers,
        volatility: &report.volatility,
        siblings: report.siblings.as_ref(),
    };
    Ok(forensics_report::render_analysis(&input))
}

/// Structured form of [`analyze_file`], used by the CLI and tests that
/// want the typed result rather than its Markdown rendering.
pub fn analyze_file_structured(absolute_path: &Path) -> Result<AnalysisReport, ForensicsError> {
    let _span = info_span!("analyze_file", path = %absolute_path.display()).entered();
    let cache = Cache::new();
    analyze_file_with_cache(absolute_path, &cache)
}

/// Same as [`analyze_file_structured`] but reuses a caller-supplied cache,
/// letting repeated analyses of the same repository within one process
/// avoid re-sampling project metrics and the ignore filter.
pub fn analyze_file_with_cache(
    absolute_path: &Path,
    cache: &Cache,
) -> Result<AnalysisReport, ForensicsError> {
    let context = AnalysisContext::build(absolute_path, cache).map_err(|err| match err {
        forensics_context::ContextBuildError::PathNotFound => ForensicsError::NotFound {
            path: absolute_path.display().to_string(),
        },
        forensics_context::ContextBuildError::NotARepository => ForensicsError::NotARepository {
            path: absolute_path.display().to_string(),
        },
    })?;

    let file_rel = context.repo_relative().unwrap_or_else(|| {
        absolute_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    });

    let now = now_unix();
    let panic_keywords = context.panic_keywords();

    // Volatility, Coupling, and Importers are mutually independent and run
    // concurrently; Drift depends on Coupling's output and runs after.
    let (volatility, (coupled, importers)) = rayon::join(
        || {
            forensics_volatility::analyze(&context.repo_root, &file_rel, &panic_keywords, now)
        },
        || {
            rayon::join(
                || {
                    forensics_coupling::analyze(
                        &context.repo_root,
                        &file_rel,
                        &context.ignore_filter,
                        context.thresholds.analysis_window as usize,
                        context.thresholds.max_files_per_commit,
                        context.thresholds.coupling_percent,
                    )
                },
                || {
                    forensics_importers::analyze(
                        &context.repo_root,
                        &file_rel,
                        &context.ignore_filter,
                    )
                },
            )
        },
    );

    let coupled_files: Vec<String> = coupled.iter().map(|entry| entry.file.clone()).collect();
    let drift = forensics_drift::analyze(
        &context.repo_root,
        absolute_path,
        &coupled_files,
        context.thresholds.drift_days,
    );

    let siblings = if volatility.commit_count == 0 {
        Some(forensics_siblings::analyze(
            &context.repo_root,
            &file_rel,
            &panic_keywords,
            now,
        ))
    } else {
        None
    };

    let coupling_scores: Vec<u32> = coupled.iter().map(|entry| entry.score).collect();
    let risk_inputs = forensics_risk::RiskInputs {
        panic_score: volatility.panic_score,
        coupling_scores: &coupling_scores,
        stale_file_count: drift.len(),
        importer_count: importers.len(),
        commit_count: volatility.commit_count,
    };
    let risk = forensics_risk::compute(&risk_inputs, context.risk_weights());

    debug!(
        file_rel,
        risk_score = risk.score,
        coupled = coupled.len(),
        drift = drift.len(),
        importers = importers.len(),
        "analysis complete"
    );

    Ok(AnalysisReport {
        file_rel,
        risk,
        coupled,
        drift,
        importers,
        volatility,
        siblings,
    })
}

/// Parameters for [`search_history`], mirroring the language-neutral
/// contract in spec §6.
#[derive(Debug, Clone)]
pub struct HistorySearchQuery<'a> {
    pub query: &'a str,
    pub path: Option<&'a Path>,
    pub mode: SearchMode,
    pub limit: usize,
    pub start_line: Option<u32>,
    pub end_line: Option<u32>,
}

impl Default for HistorySearchQuery<'_> {
    fn default() -> Self {
        Self {
            query: "",
            path: None,
            mode: SearchMode::Both,
            limit: 20,
            start_line: None,
            end_line: None,
        }
    }
}

/// Search commit history by message grep, content pickaxe, or line-range
/// log, and return the assembled Markdown brief (spec §6, `search_history`).
///
/// # Errors
///
/// Returns [`ForensicsError::NotFound`] / [`ForensicsError::NotARepository`]
/// when a `path` is supplied and fails to resolve, and
/// [`ForensicsError::InvalidQuery`] when the query violates the
/// precondition: non-empty unless both line bounds are supplied, line
/// bounds require a path, and `start <= end` after clamping `start` to at
/// least 1. A total repository failure (spec §7, `NotARepository` on a
/// pathless search) degrades to an empty result rather than an error.
pub fn search_history(params: &HistorySearchQuery<'_>) -> Result<String, ForensicsError> {
    let results = search_history_structured(params)?;
    Ok(forensics_report::render_history(params.query, &results))
}

/// Structured form of [`search_history`].
pub fn search_history_structured(
    params: &HistorySearchQuery<'_>,
) -> Result<Vec<HistorySearchResult>, ForensicsError> {
    let line_range = match (params.start_line, params.end_line) {
        (Some(start), Some(end)) => Some((start.max(1), end)),
        _ => None,
    };

    let repo_root = match params.path {
        Some(path) => {
            if !path.exists() {
                return Err(ForensicsError::NotFound {
                    path: path.display().to_string(),
                });
            }
            match forensics_git::repo_root(path) {
                Some(root) => root,
                None => {
                    debug!(path = %path.display(), "search_history target is not in a git repository");
                    return Ok(Vec::new());
                }
            }
        }
        None => {
            let cwd = std::env::current_dir().unwrap_or_default();
            match forensics_git::repo_root(&cwd) {
                Some(root) => root,
                None => return Ok(Vec::new()),
            }
        }
    };

    let path_rel = match params.path {
        Some(path) => Some(
            path.strip_prefix(&repo_root)
                .map(|rel| forensics_ignore::normalize_rel_path(&rel.to_string_lossy()))
                .unwrap_or_else(|_| path.display().to_string()),
        ),
        None => None,
    };

    let search_params = forensics_history::SearchParams {
        query: params.query,
        path: path_rel.as_deref(),
        mode: params.mode,
        limit: params.limit,
        line_range,
    };

    if !forensics_history::validate(&search_params) {
        return Err(ForensicsError::InvalidQuery {
            reason: "query must be non-empty unless both startLine and endLine are supplied \
                     together with a path, and start must not exceed end"
                .to_string(),
        });
    }

    Ok(forensics_history::search(&repo_root, &search_params))
}
