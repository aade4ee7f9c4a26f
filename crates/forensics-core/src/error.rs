//! The only errors that abort a request outright. Everything else —
//! a failed `git show`, a malformed `.memoria.json`, an unreadable
//! sibling file — is swallowed by the engine that hit it and folded into
//! an empty or default result; see each engine crate's module docs.

use thiserror::Error;

/// Structured failure from [`crate::analyze_file`] or
/// [`crate::search_history`]. Every variant carries a remediation
/// sentence because callers render it directly into a user-visible
/// Markdown error block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ForensicsError {
    /// The supplied path does not exist on disk.
    #[error("path not found: {path}")]
    NotFound { path: String },
    /// The supplied path exists but isn't inside a Git work tree.
    #[error("not inside a git work tree: {path}")]
    NotARepository { path: String },
    /// `search_history` was called with a query that fails the
    /// precondition in spec §6: non-empty unless both line bounds are
    /// supplied, line bounds require a path, and `start <= end`.
    #[error("invalid search_history query: {reason}")]
    InvalidQuery { reason: String },
}

impl ForensicsError {
    /// The "SYSTEM INSTRUCTION" remediation sentence appended to the
    /// error's Markdown rendering (spec §7, "User-visible failures").
    #[must_use]
    pub fn remediation(&self) -> &'static str {
        match self {
            ForensicsError::NotFound { .. } => {
                "SYSTEM INSTRUCTION: retry with an absolute path that exists on disk."
            }
            ForensicsError::NotARepository { .. } => {
                "SYSTEM INSTRUCTION: retry with a path inside a Git work tree."
            }
            ForensicsError::InvalidQuery { .. } => {
                "SYSTEM INSTRUCTION: supply a non-empty query, or both startLine and endLine together with a path."
            }
        }
    }

    /// Render this error as the single Markdown block callers are
    /// expected to surface with `isError = true`.
    #[must_use]
    pub fn to_markdown(&self) -> String {
        format!("# Forensic Report: Error\n\n{self}\n\n{}\n", self.remediation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_markdown_contains_remediation() {
        let err = ForensicsError::NotFound {
            path: "/tmp/ghost.rs".to_string(),
        };
        let md = err.to_markdown();
        assert!(md.contains("SYSTEM INSTRUCTION"));
        assert!(md.contains("/tmp/ghost.rs"));
    }
}
