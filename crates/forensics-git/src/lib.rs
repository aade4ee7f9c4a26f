//! Thin Git subprocess adapter.
//!
//! Every function here spawns exactly one `git` invocation and parses its
//! stdout; none of them retry or fall back to a bundled Git implementation.
//! Callers are responsible for routing invocations through
//! `forensics-concurrency::map_concurrent` when fetching per-commit detail
//! for many commits, and for treating a transient failure here as "exclude
//! this commit from the sample" rather than aborting the whole analysis.

#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{Context, Result, bail};
use tracing::{debug, warn};

/// `git log --pretty=format:` string used by every commit-stream command.
/// Kept on one line with `|` separators so multi-line commit subjects never
/// break parsing (a subject containing a literal `|` would, but that's an
/// accepted limitation).
pub const PRETTY_FORMAT: &str = "%H|%at|%an|%ae|%s";

/// One parsed commit record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitCommit {
    pub hash: String,
    /// Author timestamp, Unix seconds.
    pub timestamp: i64,
    pub author_name: String,
    pub author_email: String,
    pub subject: String,
}

impl GitCommit {
    /// 7-character abbreviated hash, as shown in history search results.
    #[must_use]
    pub fn short_hash(&self) -> String {
        self.hash.chars().take(7).collect()
    }
}

fn git_in(dir: &Path) -> Command {
    let mut cmd = Command::new("git");
    cmd.env_remove("GIT_DIR")
        .env_remove("GIT_WORK_TREE")
        .current_dir(dir);
    cmd
}

/// Whether a `git` executable is reachable on `PATH`.
#[must_use]
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Resolve the Git work tree root containing `path` (a file or directory).
#[must_use]
pub fn repo_root(path: &Path) -> Option<PathBuf> {
    let dir = if path.is_dir() {
        path
    } else {
        path.parent().unwrap_or(path)
    };
    let output = git_in(dir)
        .args(["rev-parse", "--show-toplevel"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let root = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if root.is_empty() {
        None
    } else {
        Some(PathBuf::from(root))
    }
}

/// Parse a `PRETTY_FORMAT` commit stream, skipping any line that doesn't
/// look like a commit header (used to tolerate diff/patch noise interleaved
/// by `git log -L`).
fn parse_commit_stream(output: &str) -> Vec<GitCommit> {
    let mut commits = Vec::new();
    for line in output.lines() {
        let mut parts = line.splitn(5, '|');
        let hash = parts.next().unwrap_or("");
        if hash.len() != 40 || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
            continue;
        }
        let (Some(ts), Some(name), Some(email), Some(subject)) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            continue;
        };
        commits.push(GitCommit {
            hash: hash.to_string(),
            timestamp: ts.parse::<i64>().unwrap_or(0),
            author_name: name.to_string(),
            author_email: email.to_string(),
            subject: subject.to_string(),
        });
    }
    commits
}

fn run_log(repo_root: &Path, args: &[String]) -> Result<Vec<GitCommit>> {
    let output = git_in(repo_root)
        .args(args)
        .output()
        .context("failed to spawn git log")?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        warn!(?args, stderr, "git log invocation failed");
        bail!("git log failed: {stderr}");
    }
    Ok(parse_commit_stream(&String::from_utf8_lossy(&output.stdout)))
}

/// Last `max_commits` commits that touched `file` (repo-relative), newest first.
pub fn file_history(repo_root: &Path, file: &str, max_commits: usize) -> Result<Vec<GitCommit>> {
    run_log(
        repo_root,
        &[
            "log".to_string(),
            format!("-n{max_commits}"),
            format!("--pretty=format:{PRETTY_FORMAT}"),
            "--".to_string(),
            file.to_string(),
        ],
    )
}

/// Repo-relative paths changed by `hash`.
pub fn commit_files(repo_root: &Path, hash: &str) -> Result<Vec<String>> {
    let output = git_in(repo_root)
        .args(["diff-tree", "--no-commit-id", "--name-only", "-r", hash])
        .output()
        .context("failed to spawn git diff-tree")?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("git diff-tree failed for {hash}: {stderr}");
    }
    Ok(String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Commits within the last `since_days`, capped at `max_count`.
pub fn recent_commits(
    repo_root: &Path,
    since_days: u32,
    max_count: usize,
) -> Result<Vec<GitCommit>> {
    run_log(
        repo_root,
        &[
            "log".to_string(),
            format!("--since={since_days}.days"),
            format!("--max-count={max_count}"),
            format!("--pretty=format:{PRETTY_FORMAT}"),
        ],
    )
}

/// Raw `git show <hash> -- <file>` output (unparsed diff text).
pub fn show_file_diff(repo_root: &Path, hash: &str, file: &str) -> Result<String> {
    let output = git_in(repo_root)
        .args(["show", hash, "--", file])
        .output()
        .context("failed to spawn git show")?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("git show failed for {hash}:{file}: {stderr}");
    }
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// `git grep -l` for repo-relative paths whose content matches `pattern`
/// (an extended regex). An exit code of 1 (no matches) is not an error.
pub fn grep_files(repo_root: &Path, pattern: &str) -> Result<Vec<String>> {
    let output = git_in(repo_root)
        .args(["grep", "-l", "-I", "-E", pattern])
        .output()
        .context("failed to spawn git grep")?;
    match output.status.code() {
        Some(0) => {}
        Some(1) => return Ok(Vec::new()),
        _ => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("git grep failed: {stderr}");
        }
    }
    Ok(String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Commit subject/body grep: `git log --grep <query> -i`.
pub fn log_grep(
    repo_root: &Path,
    query: &str,
    path: Option<&str>,
    limit: usize,
) -> Result<Vec<GitCommit>> {
    let mut args = vec![
        "log".to_string(),
        "-i".to_string(),
        format!("--grep={query}"),
        format!("--max-count={limit}"),
        format!("--pretty=format:{PRETTY_FORMAT}"),
    ];
    if let Some(p) = path {
        args.push("--".to_string());
        args.push(p.to_string());
    }
    run_log(repo_root, &args)
}

/// Pickaxe search: `git log -S<query>`, matching commits whose occurrence
/// count of the literal string `query` changed.
pub fn log_pickaxe(
    repo_root: &Path,
    query: &str,
    path: Option<&str>,
    limit: usize,
) -> Result<Vec<GitCommit>> {
    let mut args = vec![
        "log".to_string(),
        format!("-S{query}"),
        format!("--max-count={limit}"),
        format!("--pretty=format:{PRETTY_FORMAT}"),
    ];
    if let Some(p) = path {
        args.push("--".to_string());
        args.push(p.to_string());
    }
    run_log(repo_root, &args)
}

/// Line-range follow: `git log -L start,end:path`.
pub fn log_line_range(
    repo_root: &Path,
    path: &str,
    start: u32,
    end: u32,
    limit: usize,
) -> Result<Vec<GitCommit>> {
    run_log(
        repo_root,
        &[
            "log".to_string(),
            format!("-L{start},{end}:{path}"),
            format!("--max-count={limit}"),
            format!("--pretty=format:{PRETTY_FORMAT}"),
        ],
    )
}

/// Modification time of `path`, in Unix milliseconds.
pub fn mtime_millis(path: &Path) -> Result<i64> {
    let meta = std::fs::metadata(path)
        .with_context(|| format!("failed to stat {}", path.display()))?;
    let modified = meta.modified().context("platform has no mtime support")?;
    let millis = modified
        .duration_since(std::time::UNIX_EPOCH)
        .context("mtime before the Unix epoch")?
        .as_millis();
    Ok(millis as i64)
}

#[cfg(test)]
mod tests {
    use forensics_test_support::TempRepo;
    use super::*;

    #[test]
    fn repo_root_resolves_from_nested_file() {
        let Some(repo) = TempRepo::new() else {
            return;
        };
        repo.write("a.txt", "hello\n");
        repo.commit_all("init");
        let nested = repo.path().join("a.txt");
        let root = repo_root(&nested).expect("should resolve repo root");
        assert_eq!(
            std::fs::canonicalize(&root).unwrap(),
            std::fs::canonicalize(repo.path()).unwrap()
        );
    }

    #[test]
    fn repo_root_is_none_outside_a_repository() {
        let Some(dir) = tempfile::tempdir().ok() else {
            return;
        };
        assert!(repo_root(dir.path()).is_none());
    }

    #[test]
    fn file_history_returns_commits_newest_first() {
        let Some(repo) = TempRepo::new() else {
            return;
        };
        repo.write("a.txt", "one\n");
        let first = repo.commit_all("first commit");
        repo.write("a.txt", "two\n");
        let second = repo.commit_all("second commit");

        let history = file_history(repo.path(), "a.txt", 10).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].hash, second);
        assert_eq!(history[1].hash, first);
    }

    #[test]
    fn commit_files_lists_changed_paths() {
        let Some(repo) = TempRepo::new() else {
            return;
        };
        repo.write("a.txt", "one\n");
        repo.write("b.txt", "two\n");
        let hash = repo.commit_all("two files");
        let files = commit_files(repo.path(), &hash).unwrap();
        assert!(files.contains(&"a.txt".to_string()));
        assert!(files.contains(&"b.txt".to_string()));
    }

    #[test]
    fn log_grep_matches_case_insensitively() {
        let Some(repo) = TempRepo::new() else {
            return;
        };
        repo.write("a.txt", "one\n");
        repo.commit_all("URGENT hotfix");
        let results = log_grep(repo.path(), "urgent", None, 20).unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn log_pickaxe_finds_literal_string_changes() {
        let Some(repo) = TempRepo::new() else {
            return;
        };
        repo.write("a.txt", "no marker here\n");
        repo.commit_all("init");
        repo.write("a.txt", "no marker here\nSENTINEL_TOKEN\n");
        let hash = repo.commit_all("add sentinel");
        let results = log_pickaxe(repo.path(), "SENTINEL_TOKEN", None, 20).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].hash, hash);
    }

    #[test]
    fn show_file_diff_returns_unified_diff_text() {
        let Some(repo) = TempRepo::new() else {
            return;
        };
        repo.write("a.txt", "one\n");
        repo.commit_all("init");
        repo.write("a.txt", "one\ntwo\n");
        let hash = repo.commit_all("append");
        let diff = show_file_diff(repo.path(), &hash, "a.txt").unwrap();
        assert!(diff.contains("diff --git"));
        assert!(diff.contains("+two"));
    }

    #[test]
    fn grep_files_finds_matching_content() {
        let Some(repo) = TempRepo::new() else {
            return;
        };
        repo.write("src/foo.ts", "import stem from './stem'\n");
        repo.write("src/bar.ts", "export const bar = 1\n");
        repo.commit_all("init");
        let files = grep_files(repo.path(), "import.*stem").unwrap();
        assert_eq!(files, vec!["src/foo.ts".to_string()]);
    }

    #[test]
    fn grep_files_returns_empty_on_no_matches() {
        let Some(repo) = TempRepo::new() else {
            return;
        };
        repo.write("a.txt", "nothing interesting\n");
        repo.commit_all("init");
        let files = grep_files(repo.path(), "zzz_never_matches").unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn short_hash_is_seven_characters() {
        let commit = GitCommit {
            hash: "0123456789abcdef0123456789abcdef01234567".to_string(),
            timestamp: 0,
            author_name: String::new(),
            author_email: String::new(),
            subject: String::new(),
        };
        assert_eq!(commit.short_hash(), "0123456");
    }
}
