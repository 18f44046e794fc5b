//! `search_code`: regex search over the checkout.
//!
//! Strategies are tried in order: ripgrep first, then `grep -r`, which is
//! available everywhere. A strategy that cannot run (missing binary, bad
//! exit) hands over to the next one. A timeout ends the search outright.
//!
//! `grep --include` only sees basenames, so a glob with a directory part is
//! split: the literal directory becomes the search root and only the last
//! component is passed as the filter.

use std::path::{Component, Path, PathBuf};
use std::process::Output;
use std::time::Duration;

use prbot_core::error::ToolError;
use prbot_core::provider::ToolDefinition;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::bounds::{SEARCH_OUTPUT_LIMIT, clip};

pub const NAME: &str = "search_code";

pub const DEFAULT_MAX_RESULTS: u64 = 50;
pub const MAX_RESULTS_CEILING: u64 = 200;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const CONTEXT_LINES: &str = "2";

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: NAME.into(),
        description: "Search the codebase for a regex pattern. Returns matching lines with \
                      two lines of surrounding context. Use it to find definitions, usages \
                      or specific patterns."
            .into(),
        parameters: serde_json::json!({
            "type": "object",
            "properties": {
                "pattern": {
                    "type": "string",
                    "description": "The regex pattern to search for"
                },
                "file_pattern": {
                    "type": "string",
                    "description": "Optional glob to filter files (e.g. '*.rs', '*.py'). Searches all files when omitted."
                },
                "max_results": {
                    "type": "integer",
                    "description": "Maximum matching lines per file (default 50, at most 200)",
                    "default": DEFAULT_MAX_RESULTS
                }
            },
            "required": ["pattern"]
        }),
    }
}

/// A validated search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub pattern: String,
    /// `None` searches every file
    pub file_pattern: Option<String>,
    /// Already clamped to `1..=MAX_RESULTS_CEILING`
    pub max_results: u64,
}

impl SearchQuery {
    pub fn new(pattern: impl Into<String>, file_pattern: Option<String>, max_results: Option<u64>) -> Self {
        Self {
            pattern: pattern.into(),
            file_pattern: file_pattern.filter(|g| !g.is_empty() && g != "*"),
            max_results: max_results
                .unwrap_or(DEFAULT_MAX_RESULTS)
                .clamp(1, MAX_RESULTS_CEILING),
        }
    }
}

/// One way of running a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStrategy {
    Ripgrep,
    Grep,
}

impl SearchStrategy {
    pub fn program(&self) -> &'static str {
        match self {
            Self::Ripgrep => "rg",
            Self::Grep => "grep",
        }
    }

    fn command(&self, query: &SearchQuery, root: &Path) -> Command {
        let max = query.max_results.to_string();
        let mut cmd = Command::new(self.program());
        match self {
            Self::Ripgrep => {
                cmd.args(["-n", "-C", CONTEXT_LINES, "--max-count", max.as_str()]);
                if let Some(glob) = &query.file_pattern {
                    cmd.args(["-g", glob.as_str()]);
                }
                cmd.args(["--", query.pattern.as_str(), "."]);
            }
            Self::Grep => {
                let scope = GrepScope::for_glob(query.file_pattern.as_deref(), root);
                cmd.args(["-rn", "-C", CONTEXT_LINES, "-m", max.as_str()]);
                if let Some(include) = &scope.include {
                    cmd.arg(format!("--include={include}"));
                }
                cmd.args(["-e", query.pattern.as_str()]);
                cmd.arg(&scope.dir);
            }
        }
        cmd.current_dir(root).kill_on_drop(true);
        cmd
    }
}

/// Where `grep` starts and which basenames it keeps.
#[derive(Debug, PartialEq, Eq)]
struct GrepScope {
    dir: PathBuf,
    include: Option<String>,
}

fn has_glob_chars(s: &str) -> bool {
    s.contains(['*', '?', '[', '{'])
}

impl GrepScope {
    fn for_glob(glob: Option<&str>, root: &Path) -> Self {
        let everything = Self {
            dir: PathBuf::from("."),
            include: None,
        };
        let Some(glob) = glob else {
            return everything;
        };
        let Some((prefix, name)) = glob.rsplit_once('/') else {
            return Self {
                include: Some(glob.to_string()),
                ..everything
            };
        };

        let include = match name {
            "" | "*" | "**" => None,
            name => Some(name.to_string()),
        };
        let prefix = prefix.trim_start_matches("./");
        let dir = Path::new(prefix);
        let literal = !prefix.is_empty()
            && !has_glob_chars(prefix)
            && dir.components().all(|c| matches!(c, Component::Normal(_)));

        // A wildcard or unusable directory part widens the search to the
        // whole checkout, filtered by basename only.
        if literal && root.join(dir).is_dir() {
            Self {
                dir: Path::new(".").join(dir),
                include,
            }
        } else {
            Self { include, ..everything }
        }
    }
}

/// What a single strategy produced.
#[derive(Debug)]
enum Attempt {
    Matches(String),
    NoMatches,
    /// The strategy could not run; try the next one
    Unavailable(String),
}

fn classify(output: std::io::Result<Output>) -> Attempt {
    let output = match output {
        Ok(output) => output,
        Err(e) => return Attempt::Unavailable(e.to_string()),
    };
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    match output.status.code() {
        // Exit 2 with output means some files were unreadable; keep what matched
        _ if !stdout.is_empty() => Attempt::Matches(stdout),
        // Both rg and grep exit 1 for "nothing matched"
        Some(0 | 1) => Attempt::NoMatches,
        _ => Attempt::Unavailable(String::from_utf8_lossy(&output.stderr).trim().to_string()),
    }
}

/// Ordered search strategies sharing one per-attempt timeout.
#[derive(Debug, Clone)]
pub struct CodeSearch {
    strategies: Vec<SearchStrategy>,
    timeout: Duration,
}

impl Default for CodeSearch {
    fn default() -> Self {
        Self {
            strategies: vec![SearchStrategy::Ripgrep, SearchStrategy::Grep],
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl CodeSearch {
    pub fn with_strategies(mut self, strategies: Vec<SearchStrategy>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whole seconds, rounded up so a sub-second timeout never reads as zero.
    fn timeout_secs(&self) -> u64 {
        self.timeout.as_secs() + u64::from(self.timeout.subsec_nanos() > 0)
    }

    pub async fn run(&self, root: &Path, query: &SearchQuery) -> Result<String, ToolError> {
        let mut last_failure = String::from("no search strategy configured");

        for strategy in &self.strategies {
            debug!(program = strategy.program(), pattern = %query.pattern, "Searching");
            let output = tokio::time::timeout(self.timeout, strategy.command(query, root).output())
                .await
                .map_err(|_| ToolError::Timeout {
                    tool_name: NAME.into(),
                    timeout_secs: self.timeout_secs(),
                })?;

            match classify(output) {
                Attempt::Matches(text) => return Ok(render(query, &text)),
                Attempt::NoMatches => {
                    return Ok(format!("No matches found for pattern '{}'", query.pattern));
                }
                Attempt::Unavailable(reason) => {
                    warn!(program = strategy.program(), reason = %reason, "Search strategy failed, trying next");
                    last_failure = format!("{}: {reason}", strategy.program());
                }
            }
        }

        Err(ToolError::ExecutionFailed {
            tool_name: NAME.into(),
            reason: last_failure,
        })
    }
}

fn render(query: &SearchQuery, matches: &str) -> String {
    let body = match clip(matches, SEARCH_OUTPUT_LIMIT) {
        Some(head) => format!("{head}\n\n[... truncated, too many results]"),
        None => matches.to_string(),
    };
    format!("=== Search results for '{}' ===\n\n{body}", query.pattern)
}
