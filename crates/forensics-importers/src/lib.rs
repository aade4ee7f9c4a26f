//! Engine I: a deliberately shallow textual scan for files that import the
//! analysis target, catching the typical `import X from './stem'` case in
//! every mainstream language at near-zero cost. Not an AST resolver — the
//! point is cheap signal for files with no Git history yet.

#![forbid(unsafe_code)]

use std::path::Path;

use forensics_git::grep_files;
use forensics_ignore::IgnoreFilter;
use regex::escape;
use tracing::debug;

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn stem(path: &str) -> &str {
    let name = basename(path);
    match name.rfind('.') {
        Some(0) | None => name,
        Some(idx) => &name[..idx],
    }
}

fn is_test_file(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    lower.contains(".test.") || lower.contains(".spec.")
}

/// Find repo-relative paths that appear to import `target_file`.
#[must_use]
pub fn analyze(repo_root: &Path, target_file: &str, ignore_filter: &IgnoreFilter) -> Vec<String> {
    let stem = stem(target_file);
    if stem.is_empty() {
        return Vec::new();
    }
    let pattern = format!("(import|from|require).*['\"].*{}", escape(stem));

    let candidates = match grep_files(repo_root, &pattern) {
        Ok(files) => files,
        Err(err) => {
            debug!(target_file, error = %err, "git grep failed while scanning for importers");
            return Vec::new();
        }
    };

    let target_basename = basename(target_file);
    let target_is_test = is_test_file(target_file);

    let mut seen = std::collections::HashSet::new();
    let mut results = Vec::new();
    for candidate in candidates {
        if candidate == target_file || basename(&candidate) == target_basename {
            continue;
        }
        if ignore_filter.is_ignored(&candidate) {
            continue;
        }
        if target_is_test && is_test_file(&candidate) {
            continue;
        }
        if seen.insert(candidate.clone()) {
            results.push(candidate);
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use forensics_test_support::TempRepo;

    #[test]
    fn stem_strips_extension_and_directory() {
        assert_eq!(stem("src/utils/format.ts"), "format");
        assert_eq!(stem("format.ts"), "format");
        assert_eq!(stem(".eslintrc"), ".eslintrc");
    }

    #[test]
    fn finds_importers_via_git_grep() {
        let Some(repo) = TempRepo::new() else {
            return;
        };
        repo.write("src/format.ts", "export function format() {}\n");
        repo.write("src/app.ts", "import { format } from './format'\n");
        repo.write("src/unrelated.ts", "export const x = 1\n");
        repo.commit_all("init");

        let filter = IgnoreFilter::build(repo.path(), &[]);
        let importers = analyze(repo.path(), "src/format.ts", &filter);
        assert_eq!(importers, vec!["src/app.ts".to_string()]);
    }

    #[test]
    fn excludes_the_target_and_same_named_files() {
        let Some(repo) = TempRepo::new() else {
            return;
        };
        repo.write("src/format.ts", "import { format } from './format'\n");
        repo.commit_all("init");

        let filter = IgnoreFilter::build(repo.path(), &[]);
        let importers = analyze(repo.path(), "src/format.ts", &filter);
        assert!(importers.is_empty());
    }

    #[test]
    fn test_files_do_not_count_as_dependents_of_other_test_files() {
        let Some(repo) = TempRepo::new() else {
            return;
        };
        repo.write("src/format.test.ts", "import { format } from './format'\n");
        repo.write("src/other.test.ts", "import { format } from './format.test'\n");
        repo.commit_all("init");

        let filter = IgnoreFilter::build(repo.path(), &[]);
        let importers = analyze(repo.path(), "src/format.test.ts", &filter);
        assert!(importers.is_empty());
    }
}
