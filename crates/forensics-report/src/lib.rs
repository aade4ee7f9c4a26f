//! Deterministic Markdown assembly. Section order and heading text are
//! part of the contract: downstream tools regex-extract these headings,
//! so nothing here may depend on hash map iteration order.

#![forbid(unsafe_code)]

use std::fmt::Write as _;

use forensics_coupling::CoupledEntry;
use forensics_drift::DriftEntry;
use forensics_risk::RiskAssessment;
use forensics_siblings::SiblingGuidance;
use forensics_volatility::VolatilityResult;

const BUS_FACTOR_THRESHOLD: u32 = 70;
const PRE_FLIGHT_EXTRA_IMPORTER_CAP: usize = 3;
const STATIC_DEPENDENTS_CAP: usize = 5;
const CONTRIBUTORS_TABLE_CAP: usize = 5;

/// Everything the analysis report needs, gathered by the facade after
/// every engine has run.
pub struct AnalysisReportInput<'a> {
    pub file_rel: &'a str,
    pub risk: &'a RiskAssessment,
    pub coupled: &'a [CoupledEntry],
    pub drift: &'a [DriftEntry],
    pub importers: &'a [String],
    pub volatility: &'a VolatilityResult,
    pub siblings: Option<&'a SiblingGuidance>,
}

fn volatility_status(panic_score: u32) -> &'static str {
    match panic_score {
        0..=19 => "STABLE",
        20..=49 => "ACTIVE",
        50..=74 => "VOLATILE",
        _ => "CRITICAL",
    }
}

/// Render the full Markdown analysis brief for one file.
#[must_use]
pub fn render_analysis(input: &AnalysisReportInput<'_>) -> String {
    let mut out = String::new();

    writeln!(out, "# Forensic Report: `{}`", input.file_rel).unwrap();
    writeln!(out).unwrap();
    writeln!(
        out,
        "RISK: {} ({}/100)",
        input.risk.level.label().to_uppercase(),
        input.risk.score
    )
    .unwrap();
    writeln!(out, "{}", input.risk.action).unwrap();
    writeln!(out).unwrap();

    if !input.risk.factors.is_empty() {
        writeln!(out, "## Risk Factors").unwrap();
        for factor in &input.risk.factors {
            writeln!(out, "- {factor}").unwrap();
        }
        writeln!(out).unwrap();
    }

    writeln!(out, "## COUPLED FILES").unwrap();
    if input.coupled.is_empty() {
        writeln!(out, "No frequently co-changed files found.").unwrap();
    } else {
        for entry in input.coupled {
            writeln!(
                out,
                "### `{}` — {}% ({})",
                entry.file,
                entry.score,
                entry.evidence.change_type.label()
            )
            .unwrap();
            writeln!(out, "> {}", entry.reason).unwrap();
            if entry.evidence.has_breaking_change {
                writeln!(out, "⚠ BREAKING CHANGE DETECTED").unwrap();
            }
            if let Some(addition) = entry.evidence.additions.first() {
                writeln!(out, "```\n+ {addition}").unwrap();
                if let Some(removal) = entry.evidence.removals.first() {
                    writeln!(out, "- {removal}").unwrap();
                }
                writeln!(out, "```").unwrap();
            }
        }
    }
    writeln!(out).unwrap();

    writeln!(out, "## STATIC DEPENDENTS").unwrap();
    if input.importers.is_empty() {
        writeln!(out, "No static dependents found.").unwrap();
    } else {
        for importer in input.importers.iter().take(STATIC_DEPENDENTS_CAP) {
            writeln!(out, "- `{importer}`").unwrap();
        }
    }
    writeln!(out).unwrap();

    writeln!(out, "## PRE-FLIGHT CHECKLIST").unwrap();
    for item in build_pre_flight_checklist(input) {
        writeln!(out, "- [ ] `{item}`").unwrap();
    }
    writeln!(out).unwrap();

    match input.siblings {
        Some(guidance) => {
            writeln!(out, "## NEW FILE").unwrap();
            writeln!(out, "This file has no commit history yet.").unwrap();
            writeln!(out).unwrap();
            render_sibling_patterns(&mut out, guidance);
        }
        None => render_volatility(&mut out, input.volatility),
    }

    out
}

fn build_pre_flight_checklist(input: &AnalysisReportInput<'_>) -> Vec<String> {
    let mut checklist = vec![input.file_rel.to_string()];
    for entry in input.coupled {
        if !checklist.contains(&entry.file) {
            checklist.push(entry.file.clone());
        }
    }
    for entry in input.drift {
        if !checklist.contains(&entry.file) {
            checklist.push(entry.file.clone());
        }
    }
    let mut extras_added = 0;
    for importer in input.importers {
        if extras_added >= PRE_FLIGHT_EXTRA_IMPORTER_CAP {
            break;
        }
        if checklist.contains(importer) {
            continue;
        }
        checklist.push(importer.clone());
        extras_added += 1;
    }
    checklist
}

fn render_volatility(out: &mut String, volatility: &VolatilityResult) {
    writeln!(out, "## VOLATILITY").unwrap();
    writeln!(
        out,
        "Status: {} (panic score {}/100)",
        volatility_status(volatility.panic_score),
        volatility.panic_score
    )
    .unwrap();
    if let Some(last_commit) = &volatility.last_commit_date {
        writeln!(out, "Last touched: {last_commit}").unwrap();
    }

    if let Some(top_author) = &volatility.top_author {
        if let Some(detail) = volatility
            .author_details
            .iter()
            .find(|a| &a.name == top_author)
        {
            if detail.percentage >= BUS_FACTOR_THRESHOLD {
                writeln!(
                    out,
                    "⚠ BUS FACTOR WARNING: {} owns {}% of this file's history",
                    detail.name, detail.percentage
                )
                .unwrap();
            }
        }
    }

    if !volatility.panic_commits.is_empty() {
        writeln!(out).unwrap();
        writeln!(out, "Concerning commits:").unwrap();
        for subject in &volatility.panic_commits {
            writeln!(out, "- {subject}").unwrap();
        }
    }

    if !volatility.author_details.is_empty() {
        writeln!(out).unwrap();
        writeln!(out, "| Author | Commits | % |").unwrap();
        writeln!(out, "|---|---|---|").unwrap();
        for author in volatility.author_details.iter().take(CONTRIBUTORS_TABLE_CAP) {
            writeln!(out, "| {} | {} | {}% |", author.name, author.commits, author.percentage)
                .unwrap();
        }
    }
    writeln!(out).unwrap();
}

fn render_sibling_patterns(out: &mut String, guidance: &SiblingGuidance) {
    writeln!(out, "## SIBLING PATTERNS").unwrap();
    if let Some(hint) = &guidance.missing_test {
        writeln!(out, "- {} (confidence {}%)", hint.description, hint.confidence).unwrap();
    }
    if !guidance.common_imports.is_empty() {
        writeln!(out, "- Commonly imported by siblings:").unwrap();
        for import in &guidance.common_imports {
            writeln!(out, "  - `{import}`").unwrap();
        }
    }
    if let Some(hint) = &guidance.naming_convention {
        writeln!(out, "- {} (confidence {}%)", hint.description, hint.confidence).unwrap();
    }
    writeln!(
        out,
        "- Average sibling volatility: {:.0}/100",
        guidance.average_volatility
    )
    .unwrap();
    writeln!(out).unwrap();
}

/// Render a history-search report for `query`.
#[must_use]
pub fn render_history(query: &str, results: &[forensics_history::HistorySearchResult]) -> String {
    let mut out = String::new();
    writeln!(out, "# History Search: `{query}`").unwrap();
    writeln!(out).unwrap();
    if results.is_empty() {
        writeln!(out, "No matching commits found.").unwrap();
        return out;
    }
    for result in results {
        writeln!(
            out,
            "### `{}` — {} ({})",
            result.hash,
            result.date,
            match result.match_type {
                forensics_history::MatchType::Message => "message",
                forensics_history::MatchType::Diff => "diff",
            }
        )
        .unwrap();
        writeln!(out, "{} — {}", result.message, result.author).unwrap();
        if !result.files_changed.is_empty() {
            writeln!(out, "Files: {}", result.files_changed.join(", ")).unwrap();
        }
        writeln!(out).unwrap();
    }
    out
}
