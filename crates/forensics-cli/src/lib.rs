//! Thin `clap` command-line surface over `forensics-core`. Both
//! subcommands print the Markdown string `analyze_file`/`search_history`
//! return; this binary exists only so the library is runnable and
//! demoable from a shell. A real deployment wraps `forensics-core` in the
//! MCP/stdio transport described as out of scope.

#![forbid(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use forensics_core::{ForensicsError, HistorySearchQuery, SearchMode};

/// Repository forensics engine: file-scoped modification-risk analysis
/// and commit-history search.
#[derive(Debug, Parser)]
#[command(name = "forensics", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Produce a forensic risk report for a single file.
    Analyze {
        /// Absolute (or cwd-relative) path to the target file.
        path: PathBuf,
    },
    /// Search commit history by message grep, content pickaxe, or
    /// line-range log.
    Search {
        /// The text to search for. May be empty only when `--lines` is
        /// supplied together with `--path`.
        #[arg(default_value = "")]
        query: String,
        /// Restrict the search to this file's history.
        #[arg(long)]
        path: Option<PathBuf>,
        /// Which search mode(s) to run.
        #[arg(long, value_enum, default_value_t = SearchType::Both)]
        r#type: SearchType,
        /// Maximum number of results to return.
        #[arg(long, default_value_t = 20)]
        limit: usize,
        /// Follow a specific line range, formatted `start:end` (requires
        /// `--path`; activates line-range history search).
        #[arg(long, value_name = "START:END")]
        lines: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SearchType {
    Message,
    Diff,
    Both,
}

impl From<SearchType> for SearchMode {
    fn from(value: SearchType) -> Self {
        match value {
            SearchType::Message => SearchMode::Message,
            SearchType::Diff => SearchMode::Diff,
            SearchType::Both => SearchMode::Both,
        }
    }
}

fn parse_line_range(raw: &str) -> Result<(u32, u32)> {
    let (start, end) = raw
        .split_once(':')
        .ok_or_else(|| anyhow!("--lines must be formatted START:END, got `{raw}`"))?;
    let start: u32 = start
        .trim()
        .parse()
        .with_context(|| format!("invalid start line in `{raw}`"))?;
    let end: u32 = end
        .trim()
        .parse()
        .with_context(|| format!("invalid end line in `{raw}`"))?;
    Ok((start, end))
}

/// Parse arguments from the process environment and run the selected
/// subcommand, printing its Markdown result to stdout.
pub fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init()
        .ok();

    let cli = Cli::parse();
    match cli.command {
        Command::Analyze { path } => {
            let absolute = std::fs::canonicalize(&path).unwrap_or(path);
            match forensics_core::analyze_file(&absolute) {
                Ok(report) => {
                    println!("{report}");
                    Ok(())
                }
                Err(err) => {
                    println!("{}", err.to_markdown());
                    Err(render_error(err))
                }
            }
        }
        Command::Search {
            query,
            path,
            r#type,
            limit,
            lines,
        } => {
            let absolute_path = path.map(|p| std::fs::canonicalize(&p).unwrap_or(p));
            let line_range = lines.as_deref().map(parse_line_range).transpose()?;
            let (start_line, end_line) = match line_range {
                Some((start, end)) => (Some(start), Some(end)),
                None => (None, None),
            };
            let params = HistorySearchQuery {
                query: &query,
                path: absolute_path.as_deref(),
                mode: r#type.into(),
                limit,
                start_line,
                end_line,
            };
            match forensics_core::search_history(&params) {
                Ok(report) => {
                    println!("{report}");
                    Ok(())
                }
                Err(err) => {
                    println!("{}", err.to_markdown());
                    Err(render_error(err))
                }
            }
        }
    }
}

fn render_error(err: ForensicsError) -> anyhow::Error {
    anyhow::Error::msg(err.to_string())
}
