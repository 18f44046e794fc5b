//! Configuration loading, validation, and management for prbot.
//!
//! A review run resolves its configuration exactly once: built-in defaults,
//! then an optional TOML file, then the named environment settings a CI job
//! provides. The resulting [`AppConfig`] is immutable and handed to
//! constructors; nothing else reads the environment.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variable naming an optional TOML config file.
pub const CONFIG_PATH_ENV: &str = "PRBOT_CONFIG";

/// The root configuration structure.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Root of the prompt template tree (`<dir>/<mode>/<domain>.txt`)
    #[serde(default = "default_prompts_dir")]
    pub prompts_dir: PathBuf,

    /// Local repository checkout; defaults to the current directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<PathBuf>,

    /// Path of the CI event payload (JSON)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_path: Option<PathBuf>,

    /// What kind of review to run and where to send it
    #[serde(default)]
    pub review: ReviewConfig,

    /// LLM backend settings
    #[serde(default)]
    pub llm: LlmConfig,

    /// Source-control hosting settings
    #[serde(default)]
    pub github: GitHubConfig,
}

fn default_prompts_dir() -> PathBuf {
    PathBuf::from("prompts")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewConfig {
    /// Domain tag selecting the prompt template (e.g. "rust", "move")
    #[serde(default = "default_domain")]
    pub domain: String,

    #[serde(default)]
    pub mode: ReviewMode,

    #[serde(default)]
    pub output: OutputMode,

    /// Operator-supplied text appended to the system instruction
    #[serde(default)]
    pub extra_instructions: String,

    /// Iteration ceiling for the tool-using loop
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
}

fn default_domain() -> String {
    "generic".into()
}
fn default_max_iterations() -> u32 {
    10
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            domain: default_domain(),
            mode: ReviewMode::default(),
            output: OutputMode::default(),
            extra_instructions: String::new(),
            max_iterations: default_max_iterations(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Maximum tokens per model response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_llm_base_url() -> String {
    "https://api.anthropic.com".into()
}
fn default_model() -> String {
    "claude-sonnet-4-5-20250929".into()
}
fn default_max_tokens() -> u32 {
    4000
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_llm_base_url(),
            model: default_model(),
            max_tokens: default_max_tokens(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    #[serde(default = "default_github_api_url")]
    pub api_url: String,

    /// `owner/name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
}

fn default_github_api_url() -> String {
    "https://api.github.com".into()
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_url: default_github_api_url(),
            repository: None,
        }
    }
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("review", &self.review)
            .field("llm", &self.llm)
            .field("github", &self.github)
            .field("prompts_dir", &self.prompts_dir)
            .field("workspace", &self.workspace)
            .field("event_path", &self.event_path)
            .finish()
    }
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl std::fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("token", &redact(&self.token))
            .field("api_url", &self.api_url)
            .field("repository", &self.repository)
            .finish()
    }
}

/// Which review strategy to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewMode {
    /// One prompt, one response
    #[default]
    Simple,
    /// Plan → per-file analysis → synthesis, by prompt chaining
    Agentic,
    /// The model drives repository tools until it stops asking
    #[serde(alias = "agentic_tool", alias = "agentic-tools", alias = "agentic-with-tools")]
    AgenticTools,
}

impl ReviewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Agentic => "agentic",
            Self::AgenticTools => "agentic_tools",
        }
    }

    /// Sub-directory of the prompt tree holding this mode's templates.
    pub fn template_dir(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Agentic => "agentic",
            Self::AgenticTools => "agentic_tool",
        }
    }
}

impl std::fmt::Display for ReviewMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "simple" => Ok(Self::Simple),
            "agentic" => Ok(Self::Agentic),
            "agentic_tools" | "agentic-tools" | "agentic_tool" | "agentic-with-tools" => {
                Ok(Self::AgenticTools)
            }
            other => Err(ConfigError::ValidationError(format!(
                "unknown review mode '{other}' (expected simple, agentic or agentic_tools)"
            ))),
        }
    }
}

/// Where the finished review goes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Post to the pull request as a single comment
    #[default]
    Comment,
    /// Print to stdout only
    Log,
}

impl OutputMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Comment => "comment",
            Self::Log => "log",
        }
    }
}

impl std::fmt::Display for OutputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "comment" => Ok(Self::Comment),
            "log" => Ok(Self::Log),
            other => Err(ConfigError::ValidationError(format!(
                "unknown output mode '{other}' (expected comment or log)"
            ))),
        }
    }
}

impl AppConfig {
    /// Load configuration for this process.
    ///
    /// Reads the TOML file named by `path` (or `PRBOT_CONFIG`) when present,
    /// then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let from_env = std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from);
        let path = path.map(Path::to_path_buf).or(from_env);
        Self::load_with(path.as_deref(), |key| std::env::var(key).ok())
    }

    /// Load with an explicit environment lookup (used by tests).
    pub fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match path {
            Some(path) => Self::load_from(path)?,
            None => Self::default(),
        };
        config.apply_env(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Apply the named CI settings on top of file/default values.
    fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(domain) = get("LANGUAGE") {
            self.review.domain = domain;
        }
        if let Some(mode) = get("REVIEW_MODE") {
            self.review.mode = mode.parse()?;
        }
        if let Some(output) = get("REVIEW_OUTPUT_MODE") {
            self.review.output = output.parse()?;
        }
        if let Some(extra) = get("EXTRA_INSTRUCTIONS") {
            self.review.extra_instructions = extra;
        }
        if let Some(max) = get("MAX_ITERATIONS") {
            self.review.max_iterations = parse_number("MAX_ITERATIONS", &max)?;
        }

        if let Some(key) = get("ANTHROPIC_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Some(url) = get("ANTHROPIC_BASE_URL") {
            self.llm.base_url = url;
        }
        if let Some(model) = get("CLAUDE_MODEL") {
            self.llm.model = model;
        }
        if let Some(max) = get("MAX_TOKENS") {
            self.llm.max_tokens = parse_number("MAX_TOKENS", &max)?;
        }

        if let Some(token) = get("GITHUB_TOKEN") {
            self.github.token = Some(token);
        }
        if let Some(url) = get("GITHUB_API_URL") {
            self.github.api_url = url;
        }
        if let Some(repo) = get("GITHUB_REPOSITORY") {
            self.github.repository = Some(repo);
        }

        if let Some(path) = get("GITHUB_EVENT_PATH") {
            self.event_path = Some(PathBuf::from(path));
        }
        if let Some(path) = get("GITHUB_WORKSPACE") {
            self.workspace = Some(PathBuf::from(path));
        }
        if let Some(path) = get("PROMPTS_DIR") {
            self.prompts_dir = PathBuf::from(path);
        }

        Ok(())
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.review.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "max_iterations must be at least 1".into(),
            ));
        }
        if self.llm.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "max_tokens must be at least 1".into(),
            ));
        }
        if self.github.repository.is_some() {
            self.repository()?;
        }
        Ok(())
    }

    /// The `(owner, name)` pair of the repository under review.
    pub fn repository(&self) -> Result<(String, String), ConfigError> {
        let full = self
            .github
            .repository
            .as_deref()
            .ok_or(ConfigError::Missing("GITHUB_REPOSITORY"))?;
        match full.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok((owner.to_string(), name.to_string()))
            }
            _ => Err(ConfigError::ValidationError(format!(
                "GITHUB_REPOSITORY '{full}' is not of the form owner/name"
            ))),
        }
    }

    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.llm
            .api_key
            .as_deref()
            .ok_or(ConfigError::Missing("ANTHROPIC_API_KEY"))
    }

    pub fn require_github_token(&self) -> Result<&str, ConfigError> {
        self.github
            .token
            .as_deref()
            .ok_or(ConfigError::Missing("GITHUB_TOKEN"))
    }

    pub fn require_event_path(&self) -> Result<&Path, ConfigError> {
        self.event_path
            .as_deref()
            .ok_or(ConfigError::Missing("GITHUB_EVENT_PATH"))
    }

    /// The local checkout to review against.
    pub fn checkout_dir(&self) -> PathBuf {
        self.workspace
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Generate a TOML string of the effective config (secrets omitted).
    pub fn to_redacted_toml(&self) -> String {
        let mut copy = self.clone();
        copy.llm.api_key = None;
        copy.github.token = None;
        toml::to_string_pretty(&copy).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            review: ReviewConfig::default(),
            llm: LlmConfig::default(),
            github: GitHubConfig::default(),
            prompts_dir: default_prompts_dir(),
            workspace: None,
            event_path: None,
        }
    }
}

fn parse_number(key: &str, raw: &str) -> Result<u32, ConfigError> {
    raw.parse().map_err(|_| {
        ConfigError::ValidationError(format!("{key} must be a positive integer, got '{raw}'"))
    })
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    #[error("Required setting {0} is not set")]
    Missing(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_env() {
        let config = AppConfig::load_with(None, env(&[])).unwrap();
        assert_eq!(config.review.domain, "generic");
        assert_eq!(config.review.mode, ReviewMode::Simple);
        assert_eq!(config.review.output, OutputMode::Comment);
        assert_eq!(config.review.max_iterations, 10);
        assert_eq!(config.llm.max_tokens, 4000);
        assert!(config.require_api_key().is_err());
    }

    #[test]
    fn env_overrides_apply() {
        let config = AppConfig::load_with(
            None,
            env(&[
                ("LANGUAGE", "Rust"),
                ("REVIEW_MODE", "AGENTIC_TOOLS"),
                ("REVIEW_OUTPUT_MODE", "log"),
                ("CLAUDE_MODEL", "claude-test"),
                ("EXTRA_INSTRUCTIONS", "  Be brief.  "),
                ("MAX_ITERATIONS", "3"),
                ("GITHUB_REPOSITORY", "acme/widgets"),
                ("GITHUB_TOKEN", "ghp_secret"),
            ]),
        )
        .unwrap();
        assert_eq!(config.review.domain, "Rust");
        assert_eq!(config.review.mode, ReviewMode::AgenticTools);
        assert_eq!(config.review.output, OutputMode::Log);
        assert_eq!(config.llm.model, "claude-test");
        assert_eq!(config.review.extra_instructions, "Be brief.");
        assert_eq!(config.review.max_iterations, 3);
        assert_eq!(
            config.repository().unwrap(),
            ("acme".to_string(), "widgets".to_string())
        );
        assert_eq!(config.require_github_token().unwrap(), "ghp_secret");
    }

    #[test]
    fn mode_aliases_parse() {
        assert_eq!("agentic_tool".parse::<ReviewMode>().unwrap(), ReviewMode::AgenticTools);
        assert_eq!("agentic-tools".parse::<ReviewMode>().unwrap(), ReviewMode::AgenticTools);
        assert_eq!(" Agentic ".parse::<ReviewMode>().unwrap(), ReviewMode::Agentic);
        assert!("turbo".parse::<ReviewMode>().is_err());
        assert!("email".parse::<OutputMode>().is_err());
    }

    #[test]
    fn file_accepts_every_mode_spelling() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prbot.toml");
        for spelling in ["agentic_tools", "agentic_tool", "agentic-tools", "agentic-with-tools"] {
            std::fs::write(&path, format!("[review]\nmode = \"{spelling}\"\n")).unwrap();
            let config = AppConfig::load_from(&path).unwrap();
            assert_eq!(config.review.mode, ReviewMode::AgenticTools, "{spelling}");
            assert_eq!(spelling.parse::<ReviewMode>().unwrap(), ReviewMode::AgenticTools);
        }
    }

    #[test]
    fn unknown_mode_is_fatal() {
        let result = AppConfig::load_with(None, env(&[("REVIEW_MODE", "deep")]));
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn zero_iterations_rejected() {
        let result = AppConfig::load_with(None, env(&[("MAX_ITERATIONS", "0")]));
        assert!(result.is_err());
        let result = AppConfig::load_with(None, env(&[("MAX_ITERATIONS", "ten")]));
        assert!(result.is_err());
    }

    #[test]
    fn malformed_repository_rejected() {
        let result = AppConfig::load_with(None, env(&[("GITHUB_REPOSITORY", "no-slash")]));
        assert!(result.is_err());
        let result = AppConfig::load_with(None, env(&[("GITHUB_REPOSITORY", "a/b/c")]));
        assert!(result.is_err());
    }

    #[test]
    fn secrets_redacted_in_debug() {
        let config = AppConfig::load_with(
            None,
            env(&[("ANTHROPIC_API_KEY", "sk-ant-xyz"), ("GITHUB_TOKEN", "ghp_abc")]),
        )
        .unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-ant-xyz"));
        assert!(!debug.contains("ghp_abc"));
        assert!(debug.contains("[REDACTED]"));
        assert!(!config.to_redacted_toml().contains("sk-ant-xyz"));
    }

    #[test]
    fn file_then_env_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prbot.toml");
        std::fs::write(
            &path,
            r#"
prompts_dir = "/opt/prompts"

[review]
domain = "move"
mode = "agentic"
max_iterations = 4

[llm]
model = "claude-from-file"
"#,
        )
        .unwrap();

        let config = AppConfig::load_with(Some(&path), env(&[("CLAUDE_MODEL", "claude-from-env")])).unwrap();
        assert_eq!(config.review.domain, "move");
        assert_eq!(config.review.mode, ReviewMode::Agentic);
        assert_eq!(config.review.max_iterations, 4);
        assert_eq!(config.llm.model, "claude-from-env");
        assert_eq!(config.prompts_dir, PathBuf::from("/opt/prompts"));
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/prbot.toml")).unwrap();
        assert_eq!(config.review.domain, "generic");
    }

    #[test]
    fn unparseable_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "review = [").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ConfigError::ParseError { .. })
        ));
    }
}
