//! Scratch Git repository fixture shared by every engine crate's tests.
//!
//! Kept in its own crate because `#[cfg(test)]` items in one crate are
//! never visible to another crate's test builds — a dependency's
//! test-only code simply doesn't exist from a downstream crate's point
//! of view.

#![forbid(unsafe_code)]

use std::path::Path;
use std::process::Command;

use forensics_git::git_available;

/// A throwaway, isolated Git repository rooted in a temp directory.
pub struct TempRepo {
    pub dir: tempfile::TempDir,
}

impl TempRepo {
    /// Initialize a fresh repository with a local test identity. Returns
    /// `None` when `git` isn't on `PATH`, so tests can skip gracefully in
    /// environments without it.
    #[must_use]
    pub fn new() -> Option<Self> {
        if !git_available() {
            return None;
        }
        let dir = tempfile::tempdir().ok()?;
        run(dir.path(), &["init", "-q"])?;
        run(dir.path(), &["config", "user.email", "forensics@example.com"])?;
        run(dir.path(), &["config", "user.name", "Forensics Test"])?;
        Some(Self { dir })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `contents` to `rel` (relative to the repo root), creating
    /// parent directories as needed.
    pub fn write(&self, rel: &str, contents: &str) {
        let path = self.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, contents).unwrap();
    }

    /// Stage every change and commit it, returning the new commit hash.
    pub fn commit_all(&self, message: &str) -> String {
        run(self.path(), &["add", "-A"]).expect("git add");
        run(self.path(), &["commit", "-q", "-m", message]).expect("git commit");
        let output = Command::new("git")
            .current_dir(self.path())
            .args(["rev-parse", "HEAD"])
            .output()
            .expect("git rev-parse");
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }
}

fn run(dir: &Path, args: &[&str]) -> Option<()> {
    let status = Command::new("git").current_dir(dir).args(args).output().ok()?;
    if status.status.success() { Some(()) } else { None }
}
