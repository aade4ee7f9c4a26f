//! Insta snapshot tests for report rendering.
//!
//! Covers: a volatile file with coupling/drift/importers, a brand-new file
//! carrying sibling guidance, and both non-empty and empty history-search
//! results.

use forensics_coupling::CoupledEntry;
use forensics_diff::{ChangeType, DiffSummary};
use forensics_drift::DriftEntry;
use forensics_history::{HistorySearchResult, MatchType};
use forensics_report::{AnalysisReportInput, render_analysis, render_history};
use forensics_risk::{RiskAssessment, RiskLevel};
use forensics_siblings::{PatternHint, SiblingGuidance};
use forensics_volatility::{AuthorDetail, RecencyDecay, VolatilityResult};

#[test]
fn volatile_file_with_coupling_and_drift_md() {
    let risk = RiskAssessment {
        score: 58,
        level: RiskLevel::High,
        factors: vec![
            "Elevated panic score (62)".to_string(),
            "2 coupled file(s) have drifted out of sync".to_string(),
        ],
        action: RiskLevel::High.action().to_string(),
    };

    let coupled = vec![CoupledEntry {
        file: "src/payments/ledger.rs".to_string(),
        score: 67,
        reason: "Co-changed in 8 of 12 recent commits".to_string(),
        last_hash: "a1b2c3d".to_string(),
        evidence: DiffSummary {
            additions: vec!["pub fn reconcile(charge: &Charge) -> Result<()> {".to_string()],
            removals: vec!["fn reconcile(charge: &Charge) {".to_string()],
            hunks: 2,
            net_change: 1,
            has_breaking_change: true,
            change_type: ChangeType::Api,
        },
    }];

    let drift = vec![DriftEntry {
        file: "src/payments/statement.rs".to_string(),
        days_old: 60,
    }];

    let importers = vec![
        "src/api/charge_handler.rs".to_string(),
        "src/jobs/reconcile_job.rs".to_string(),
    ];

    let volatility = VolatilityResult {
        commit_count: 12,
        panic_score: 62,
        panic_commits: vec![
            "fix urgent race condition in charge reconciliation".to_string(),
            "hotfix double-charge bug".to_string(),
        ],
        last_commit_date: Some("2026-06-18".to_string()),
        authors: 2,
        author_details: vec![
            AuthorDetail {
                name: "Priya Nair".to_string(),
                email: "priya@example.com".to_string(),
                commits: 9,
                percentage: 75,
                first_commit: "2025-11-02T00:00:00Z".to_string(),
                last_commit: "2026-06-18T00:00:00Z".to_string(),
            },
            AuthorDetail {
                name: "Sam Okafor".to_string(),
                email: "sam@example.com".to_string(),
                commits: 3,
                percentage: 25,
                first_commit: "2025-12-10T00:00:00Z".to_string(),
                last_commit: "2026-05-01T00:00:00Z".to_string(),
            },
        ],
        top_author: Some("Priya Nair".to_string()),
        recency_decay: RecencyDecay {
            oldest_commit_days: 230,
            newest_commit_days: 14,
            average_decay_factor: 0.41,
        },
    };

    let input = AnalysisReportInput {
        file_rel: "src/payments/charge.rs",
        risk: &risk,
        coupled: &coupled,
        drift: &drift,
        importers: &importers,
        volatility: &volatility,
        siblings: None,
    };

    let md = render_analysis(&input);
    insta::assert_snapshot!(md);
}

#[test]
fn new_file_with_sibling_guidance_md() {
    let risk = RiskAssessment {
        score: 6,
        level: RiskLevel::Low,
        factors: vec!["No commit history yet".to_string()],
        action: RiskLevel::Low.action().to_string(),
    };

    let volatility = VolatilityResult {
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
    };

    let guidance = SiblingGuidance {
        missing_test: Some(PatternHint {
            description: "Test file expected alongside this source file".to_string(),
            confidence: 65,
        }),
        common_imports: vec!["../models/charge.rs".to_string(), "../errors.rs".to_string()],
        naming_convention: Some(PatternHint {
            description: "Sibling files share the naming suffix \"Handler\"".to_string(),
            confidence: 70,
        }),
        average_volatility: 18.0,
        has_tests: true,
    };

    let input = AnalysisReportInput {
        file_rel: "src/handlers/refund.rs",
        risk: &risk,
        coupled: &[],
        drift: &[],
        importers: &[],
        volatility: &volatility,
        siblings: Some(&guidance),
    };

    let md = render_analysis(&input);
    insta::assert_snapshot!(md);
}

#[test]
fn history_search_results_md() {
    let results = vec![
        HistorySearchResult {
            hash: "a1b2c3d".to_string(),
            date: "2026-05-12".to_string(),
            author: "Priya Nair".to_string(),
            message: "fix urgent race condition in charge reconciliation".to_string(),
            files_changed: vec![
                "src/payments/charge.rs".to_string(),
                "src/payments/ledger.rs".to_string(),
            ],
            match_type: MatchType::Message,
        },
        HistorySearchResult {
            hash: "9f8e7d6".to_string(),
            date: "2026-03-02".to_string(),
            author: "Sam Okafor".to_string(),
            message: "guard against race in queue worker".to_string(),
            files_changed: Vec::new(),
            match_type: MatchType::Diff,
        },
    ];

    let md = render_history("race condition", &results);
    insta::assert_snapshot!(md);
}

#[test]
fn empty_history_search_md() {
    let md = render_history("nonexistent token", &[]);
    insta::assert_snapshot!(md);
}
