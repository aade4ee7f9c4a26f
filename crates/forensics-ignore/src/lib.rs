//! Merges three pattern sources into one gitignore-style matcher: a built-in
//! universal artifact list, the repo's `.gitignore`, and any `ignore`
//! patterns from `.memoria.json`.

#![forbid(unsafe_code)]

use std::path::Path;

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use tracing::debug;

/// Common artifact directories and binaries across ecosystems, always ignored.
pub const UNIVERSAL_PATTERNS: &[&str] = &[
    "node_modules/",
    "target/",
    "vendor/",
    "dist/",
    "build/",
    "out/",
    "__pycache__/",
    ".venv/",
    "venv/",
    ".git/",
    ".tox/",
    "coverage/",
    ".next/",
    "*.log",
    "*.lock",
    "*.min.js",
    "*.map",
];

/// A compiled matcher over the merged pattern set.
#[derive(Clone)]
pub struct IgnoreFilter {
    matcher: Gitignore,
}

impl IgnoreFilter {
    /// Build a filter for `repo_root`, layering universal patterns, the
    /// repository's `.gitignore`, then `config_ignore` (highest precedence).
    #[must_use]
    pub fn build(repo_root: &Path, config_ignore: &[String]) -> Self {
        let mut builder = GitignoreBuilder::new(repo_root);

        for pattern in UNIVERSAL_PATTERNS {
            let _ = builder.add_line(None, pattern);
        }

        let gitignore_path = repo_root.join(".gitignore");
        if let Ok(contents) = std::fs::read_to_string(&gitignore_path) {
            for line in contents.lines() {
                let _ = builder.add_line(Some(gitignore_path.clone()), line);
            }
        } else {
            debug!(path = %gitignore_path.display(), "no .gitignore present");
        }

        for pattern in config_ignore {
            let _ = builder.add_line(None, pattern);
        }

        let matcher = builder.build().unwrap_or_else(|err| {
            debug!(error = %err, "failed to compile ignore patterns, falling back to empty matcher");
            GitignoreBuilder::new(repo_root)
                .build()
                .expect("empty gitignore builder always compiles")
        });

        Self { matcher }
    }

    /// Whether `repo_relative` (a path relative to the repo root) is ignored.
    #[must_use]
    pub fn is_ignored(&self, repo_relative: &str) -> bool {
        let normalized = normalize_rel_path(repo_relative);
        self.matcher
            .matched(&normalized, normalized.ends_with('/'))
            .is_ignore()
    }
}

/// Normalize a path for cross-platform comparison: backslashes to forward
/// slashes, one leading `./` stripped.
#[must_use]
pub fn normalize_rel_path(path: &str) -> String {
    let out = path.replace('\\', "/");
    out.strip_prefix("./").unwrap_or(&out).to_string()
}
