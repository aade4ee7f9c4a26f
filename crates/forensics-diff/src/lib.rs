//! Fetches a per-file diff at a commit, parses it into a structured
//! summary, and classifies the kind of change it represents.

#![forbid(unsafe_code)]

use std::path::Path;
use std::sync::OnceLock;

use forensics_git::show_file_diff;
use regex::Regex;
use tracing::debug;

const SNIPPET_MAX_CHARS: usize = 1000;
const TRUNCATION_SUFFIX: &str = "\n...(truncated)";
pub const BINARY_MARKER: &str = "[Binary file]";

const BINARY_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "ico", "webp", "tiff", "zip", "tar", "gz", "tgz", "rar",
    "7z", "bz2", "xz", "woff", "woff2", "ttf", "otf", "eot", "mp3", "mp4", "avi", "mov", "wav",
    "ogg", "webm", "flac", "m4a", "exe", "dll", "so", "dylib", "bin", "o", "a", "class", "jar",
    "pdf",
];

/// Whether `path`'s extension is a known binary format.
#[must_use]
pub fn is_binary_path(path: &str) -> bool {
    path.rsplit('.')
        .next()
        .map(|ext| BINARY_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Tag describing what kind of change a diff represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeType {
    Schema,
    Api,
    Import,
    Config,
    Test,
    Style,
    Unknown,
}

impl ChangeType {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            ChangeType::Schema => "schema",
            ChangeType::Api => "api",
            ChangeType::Import => "import",
            ChangeType::Config => "config",
            ChangeType::Test => "test",
            ChangeType::Style => "style",
            ChangeType::Unknown => "unknown",
        }
    }
}

/// Structured summary of a single file's diff at one commit.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffSummary {
    pub additions: Vec<String>,
    pub removals: Vec<String>,
    pub hunks: u32,
    pub net_change: i64,
    pub has_breaking_change: bool,
    pub change_type: ChangeType,
}

impl DiffSummary {
    fn binary() -> Self {
        Self {
            additions: Vec::new(),
            removals: Vec::new(),
            hunks: 0,
            net_change: 0,
            has_breaking_change: false,
            change_type: ChangeType::Unknown,
        }
    }

    fn empty() -> Self {
        Self::binary()
    }
}

/// Fetch `git show <hash> -- <file>`, strip everything before the
/// `diff --git` marker, and truncate to a display-sized snippet. Returns
/// [`BINARY_MARKER`] immediately for binary-extension paths or Git's own
/// "Binary files ... differ" marker, without running any parsing.
#[must_use]
pub fn get_diff_snippet(repo_root: &Path, hash: &str, file: &str) -> String {
    if is_binary_path(file) {
        return BINARY_MARKER.to_string();
    }
    let Some(stripped) = fetch_stripped_diff(repo_root, hash, file) else {
        return String::new();
    };
    truncate_snippet(&stripped)
}

fn truncate_snippet(stripped: &str) -> String {
    if stripped.chars().count() <= SNIPPET_MAX_CHARS {
        stripped.to_string()
    } else {
        let head: String = stripped.chars().take(SNIPPET_MAX_CHARS).collect();
        format!("{head}{TRUNCATION_SUFFIX}")
    }
}

fn fetch_stripped_diff(repo_root: &Path, hash: &str, file: &str) -> Option<String> {
    let raw = match show_file_diff(repo_root, hash, file) {
        Ok(raw) => raw,
        Err(err) => {
            debug!(hash, file, error = %err, "git show failed while fetching diff snippet");
            return None;
        }
    };
    if raw.contains("Binary files") && raw.contains("differ") {
        return None;
    }
    match raw.find("diff --git") {
        Some(idx) => Some(raw[idx..].to_string()),
        None => Some(raw),
    }
}

/// Fetch, parse, and classify the diff of `file` at `hash`. `additions`
/// and `removals` are truncated to 10 entries each, but `net_change` is
/// computed before truncation.
#[must_use]
pub fn build_diff_summary(repo_root: &Path, hash: &str, file: &str) -> DiffSummary {
    if is_binary_path(file) {
        return DiffSummary::binary();
    }
    let Some(stripped) = fetch_stripped_diff(repo_root, hash, file) else {
        return DiffSummary::empty();
    };

    let (additions_full, removals_full, hunks) = parse_diff(&stripped);
    let net_change = additions_full.len() as i64 - removals_full.len() as i64;
    let has_breaking_change = detect_breaking_change(&removals_full);
    let change_type = classify(file, &additions_full, &removals_full);

    DiffSummary {
        additions: additions_full.into_iter().take(10).collect(),
        removals: removals_full.into_iter().take(10).collect(),
        hunks,
        net_change,
        has_breaking_change,
        change_type,
    }
}

/// Split a unified diff into full addition/removal line lists and a hunk count.
fn parse_diff(diff_text: &str) -> (Vec<String>, Vec<String>, u32) {
    let mut additions = Vec::new();
    let mut removals = Vec::new();
    let mut hunks = 0u32;

    for line in diff_text.lines() {
        if line.starts_with("@@") {
            hunks += 1;
        } else if line.starts_with('+') && !line.starts_with("+++") {
            additions.push(line[1..].to_string());
        } else if line.starts_with('-') && !line.starts_with("---") {
            removals.push(line[1..].to_string());
        }
    }
    (additions, removals, hunks)
}

fn breaking_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?i)\b(remove|delete|deprecate)\b|^\s*(export|public|module\.exports)\b|^\s*(export\s+)?(function|interface|type|class)\s+\w+",
        )
        .expect("breaking-change pattern is valid")
    })
}

fn detect_breaking_change(removals: &[String]) -> bool {
    let pattern = breaking_pattern();
    removals.iter().any(|line| pattern.is_match(line))
}

struct ClassifierPatterns {
    schema: Regex,
    api: Regex,
    import: Regex,
    config: Regex,
    test: Regex,
}

fn classifier_patterns() -> &'static ClassifierPatterns {
    static PATTERNS: OnceLock<ClassifierPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| ClassifierPatterns {
        schema: Regex::new(r"(?i)\b(interface|type|class|struct|enum)\s+\w+|^\s*\w+\s*:\s*\w+")
            .unwrap(),
        api: Regex::new(r"(?i)\b(function|return|throw|await)\b|=>").unwrap(),
        import: Regex::new(r"^\s*(import|from|require)\b").unwrap(),
        config: Regex::new(r"(?i)\bconfig\b|\benv\b|^[A-Z][A-Z0-9_]*\s*=|\.(json|ya?ml|toml|ini|env)$")
            .unwrap(),
        test: Regex::new(r"(?i)\b(describe|it|expect)\s*\(|\.(test|spec)\.").unwrap(),
    })
}

/// Classify a file's change, evaluated in priority order: schema, api,
/// import, config, test, style, else unknown.
#[must_use]
pub fn classify(file: &str, additions: &[String], removals: &[String]) -> ChangeType {
    let patterns = classifier_patterns();
    let all_lines = additions.iter().chain(removals.iter());

    for line in all_lines.clone() {
        if patterns.schema.is_match(line) {
            return ChangeType::Schema;
        }
    }
    for line in all_lines.clone() {
        if patterns.api.is_match(line) {
            return ChangeType::Api;
        }
    }
    for line in all_lines.clone() {
        if patterns.import.is_match(line) {
            return ChangeType::Import;
        }
    }
    if patterns.config.is_match(file) {
        return ChangeType::Config;
    }
    for line in all_lines.clone() {
        if patterns.config.is_match(line) {
            return ChangeType::Config;
        }
    }
    if patterns.test.is_match(file) {
        return ChangeType::Test;
    }
    for line in all_lines.clone() {
        if patterns.test.is_match(line) {
            return ChangeType::Test;
        }
    }

    if is_style_only_change(additions, removals) {
        return ChangeType::Style;
    }

    ChangeType::Unknown
}

/// Style-only change: equal-length addition/removal lists where each pair
/// is identical once whitespace is collapsed.
fn is_style_only_change(additions: &[String], removals: &[String]) -> bool {
    if additions.is_empty() || additions.len() != removals.len() {
        return false;
    }
    additions
        .iter()
        .zip(removals.iter())
        .all(|(a, r)| strip_whitespace(a) == strip_whitespace(r))
}

fn strip_whitespace(line: &str) -> String {
    line.chars().filter(|c| !c.is_whitespace()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_extensions_are_recognized() {
        assert!(is_binary_path("assets/logo.PNG"));
        assert!(is_binary_path("vendor/lib.so"));
        assert!(!is_binary_path("src/main.rs"));
    }

    #[test]
    fn get_diff_snippet_short_circuits_on_binary_paths() {
        let dir = tempfile::tempdir().unwrap();
        let snippet = get_diff_snippet(dir.path(), "deadbeef", "assets/logo.png");
        assert_eq!(snippet, BINARY_MARKER);
    }

    #[test]
    fn parse_diff_counts_hunks_and_splits_additions_removals() {
        let diff = "diff --git a/x b/x\n@@ -1,2 +1,2 @@\n-old line\n+new line\n+another\n";
        let (additions, removals, hunks) = parse_diff(diff);
        assert_eq!(hunks, 1);
        assert_eq!(additions, vec!["new line".to_string(), "another".to_string()]);
        assert_eq!(removals, vec!["old line".to_string()]);
    }

    #[test]
    fn net_change_would_reflect_full_arrays_before_truncation() {
        let additions: Vec<String> = (0..15).map(|i| format!("line {i}")).collect();
        let removals: Vec<String> = (0..3).map(|i| format!("old {i}")).collect();
        let net_change = additions.len() as i64 - removals.len() as i64;
        assert_eq!(net_change, 12);
        assert_eq!(additions.into_iter().take(10).count(), 10);
    }

    #[test]
    fn detect_breaking_change_flags_removed_export() {
        let removals = vec!["export function widget() {}".to_string()];
        assert!(detect_breaking_change(&removals));
    }

    #[test]
    fn detect_breaking_change_is_false_for_benign_removals() {
        let removals = vec!["console.log('debug')".to_string()];
        assert!(!detect_breaking_change(&removals));
    }

    #[test]
    fn classify_detects_import_lines() {
        let additions = vec!["import { widget } from './widget'".to_string()];
        assert_eq!(classify("src/app.ts", &additions, &[]), ChangeType::Import);
    }

    #[test]
    fn classify_detects_test_files_by_path() {
        assert_eq!(classify("src/app.test.ts", &[], &[]), ChangeType::Test);
    }

    #[test]
    fn classify_detects_config_files_by_extension() {
        assert_eq!(classify("config/settings.yaml", &[], &[]), ChangeType::Config);
    }

    #[test]
    fn classify_detects_style_only_whitespace_changes() {
        let additions = vec!["  return value;".to_string()];
        let removals = vec!["return value;".to_string()];
        assert_eq!(classify("src/app.ts", &additions, &removals), ChangeType::Style);
    }

    #[test]
    fn classify_falls_back_to_unknown() {
        assert_eq!(classify("README.md", &[], &[]), ChangeType::Unknown);
    }
}
