//! Engine S: activated only for files with zero commit history. Looks at
//! same-extension siblings in the target's directory and surfaces pattern
//! hints (missing test, shared imports, naming convention) a new file
//! should probably follow.

#![forbid(unsafe_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

use forensics_concurrency::map_concurrent;
use regex::Regex;
use tracing::debug;

const IMPORT_SAMPLE_SIBLINGS: usize = 5;
const IMPORT_SAMPLE_LINES: usize = 30;
const MISSING_TEST_CONFIDENCE_FLOOR: u32 = 30;
const NAMING_MIN_OCCURRENCES: usize = 2;
const COMMON_IMPORT_MIN_OCCURRENCES: usize = 2;
const MAX_COMMON_IMPORTS: usize = 5;

/// A single pattern suggestion with a confidence score in `[0, 100]`.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternHint {
    pub description: String,
    pub confidence: u32,
}

/// Guidance synthesized from a new file's directory neighbors.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SiblingGuidance {
    pub missing_test: Option<PatternHint>,
    pub common_imports: Vec<String>,
    pub naming_convention: Option<PatternHint>,
    pub average_volatility: f64,
    pub has_tests: bool,
}

fn stem(path: &str) -> String {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(0) | None => name.to_string(),
        Some(idx) => name[..idx].to_string(),
    }
}

fn extension(path: &str) -> Option<&str> {
    let name = path.rsplit('/').next().unwrap_or(path);
    name.rfind('.').map(|idx| &name[idx + 1..])
}

fn is_test_file(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    lower.contains(".test.") || lower.contains(".spec.")
}

/// Repo-relative sibling file paths sharing the target's extension, in the
/// same directory, excluding the target itself.
fn list_siblings(repo_root: &Path, target_rel: &str) -> Vec<String> {
    let target_ext = match extension(target_rel) {
        Some(ext) => ext.to_string(),
        None => return Vec::new(),
    };
    let dir_rel = target_rel.rsplit_once('/').map(|(d, _)| d).unwrap_or("");
    let dir_abs = if dir_rel.is_empty() {
        repo_root.to_path_buf()
    } else {
        repo_root.join(dir_rel)
    };

    let Ok(entries) = std::fs::read_dir(&dir_abs) else {
        return Vec::new();
    };

    let mut siblings = Vec::new();
    for entry in entries.flatten() {
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if !file_type.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        let rel = if dir_rel.is_empty() {
            name.clone()
        } else {
            format!("{dir_rel}/{name}")
        };
        if rel == target_rel {
            continue;
        }
        if extension(&rel) == Some(target_ext.as_str()) {
            siblings.push(rel);
        }
    }
    siblings.sort();
    siblings
}

fn missing_test_hint(target_rel: &str, siblings: &[String]) -> Option<PatternHint> {
    if is_test_file(target_rel) || siblings.is_empty() {
        return None;
    }
    let with_tests = siblings.iter().filter(|s| is_test_file(s)).count();
    if with_tests == 0 {
        return None;
    }
    let fraction = with_tests as f64 / siblings.len() as f64;
    let confidence =
        (MISSING_TEST_CONFIDENCE_FLOOR + (fraction * 70.0).round() as u32).min(100);
    Some(PatternHint {
        description: "Test file expected alongside this source file".to_string(),
        confidence,
    })
}

fn import_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?:import|from|require)\s*\(?['"]([^'"]+)['"]"#).expect("valid regex")
    })
}

fn common_imports(repo_root: &Path, siblings: &[String]) -> Vec<String> {
    let sample: Vec<String> = siblings.iter().take(IMPORT_SAMPLE_SIBLINGS).cloned().collect();
    if sample.is_empty() {
        return Vec::new();
    }
    let repo_root = repo_root.to_path_buf();
    let imports_per_file = map_concurrent(
        sample.clone(),
        forensics_concurrency::DEFAULT_LIMIT,
        move |rel| {
            let path = repo_root.join(&rel);
            let Ok(contents) = std::fs::read_to_string(&path) else {
                return Vec::new();
            };
            let pattern = import_pattern();
            contents
                .lines()
                .take(IMPORT_SAMPLE_LINES)
                .filter_map(|line| pattern.captures(line).map(|c| c[1].to_string()))
                .collect::<Vec<_>>()
        },
    );

    let mut counts: HashMap<String, usize> = HashMap::new();
    for imports in &imports_per_file {
        for import in imports {
            *counts.entry(import.clone()).or_insert(0) += 1;
        }
    }

    let threshold = ((sample.len() as f64 * 0.5).ceil() as usize).max(COMMON_IMPORT_MIN_OCCURRENCES);
    let mut common: Vec<(String, usize)> = counts
        .into_iter()
        .filter(|(_, count)| *count >= threshold)
        .collect();
    common.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    common.into_iter().take(MAX_COMMON_IMPORTS).map(|(name, _)| name).collect()
}

fn camel_prefix(stem: &str) -> Option<String> {
    let end = stem.find(|c: char| c.is_ascii_uppercase())?;
    if end == 0 {
        return None;
    }
    Some(stem[..end].to_string())
}

fn pascal_suffix(stem: &str) -> Option<String> {
    let start = stem.rfind(|c: char| c.is_ascii_uppercase())?;
    if start == 0 {
        return None;
    }
    Some(stem[start..].to_string())
}

fn naming_convention_hint(siblings: &[String]) -> Option<PatternHint> {
    let mut prefixes: HashMap<String, usize> = HashMap::new();
    let mut suffixes: HashMap<String, usize> = HashMap::new();
    for sibling in siblings {
        let sibling_stem = stem(sibling);
        if let Some(prefix) = camel_prefix(&sibling_stem) {
            *prefixes.entry(prefix).or_insert(0) += 1;
        }
        if let Some(suffix) = pascal_suffix(&sibling_stem) {
            *suffixes.entry(suffix).or_insert(0) += 1;
        }
    }

    let best_prefix = prefixes.into_iter().max_by_key(|(_, count)| *count);
    let best_suffix = suffixes.into_iter().max_by_key(|(_, count)| *count);

    match (best_prefix, best_suffix) {
        (Some((_, p_count)), Some((suffix, s_count))) if s_count >= p_count => {
            naming_hint_from(suffix, s_count, true)
        }
        (Some((prefix, p_count)), _) => naming_hint_from(prefix, p_count, false),
        (None, Some((suffix, s_count))) => naming_hint_from(suffix, s_count, true),
        (None, None) => None,
    }
}

fn naming_hint_from(token: String, count: usize, is_suffix: bool) -> Option<PatternHint> {
    if count < NAMING_MIN_OCCURRENCES {
        return None;
    }
    let description = if is_suffix {
        format!("Sibling files share the naming suffix \"{token}\"")
    } else {
        format!("Sibling files share the naming prefix \"{token}\"")
    };
    Some(PatternHint {
        description,
        confidence: (50 + count * 10).min(100) as u32,
    })
}

/// Build sibling guidance for a brand-new file (zero commit history).
#[must_use]
pub fn analyze(
    repo_root: &Path,
    target_rel: &str,
    panic_keywords: &HashMap<String, f64>,
    now: i64,
) -> SiblingGuidance {
    let siblings = list_siblings(repo_root, target_rel);
    if siblings.is_empty() {
        return SiblingGuidance::default();
    }

    let has_tests = siblings.iter().any(|s| is_test_file(s));
    let missing_test = missing_test_hint(target_rel, &siblings);
    let common_imports = common_imports(repo_root, &siblings);
    let naming_convention = naming_convention_hint(&siblings);

    let repo_root_owned = repo_root.to_path_buf();
    let panic_keywords = panic_keywords.clone();
    let sample: Vec<String> = siblings.iter().take(IMPORT_SAMPLE_SIBLINGS).cloned().collect();
    let volatilities = map_concurrent(sample, forensics_concurrency::DEFAULT_LIMIT, move |rel| {
        forensics_volatility::analyze(&repo_root_owned, &rel, &panic_keywords, now).panic_score
    });
    let average_volatility = if volatilities.is_empty() {
        0.0
    } else {
        volatilities.iter().sum::<u32>() as f64 / volatilities.len() as f64
    };

    debug!(target_rel, sibling_count = siblings.len(), "computed sibling guidance");

    SiblingGuidance {
        missing_test,
        common_imports,
        naming_convention,
        average_volatility,
        has_tests,
    }
}
