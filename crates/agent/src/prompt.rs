//! System prompt assembly from the on-disk template tree.
//!
//! Layout: `<root>/<mode dir>/<domain>.txt`, plus the staged-review templates
//! `<root>/agentic/{planning,per_file,final}_template.txt`. The stage
//! templates are also compiled into the binary, so a staged review works
//! with no template directory at all.

use std::path::PathBuf;

use prbot_config::ReviewMode;
use tracing::debug;

pub const CHAINED_DEFAULT_PROMPT: &str = "You are a strict but constructive senior code reviewer.";
pub const TOOL_DEFAULT_PROMPT: &str = "You are a senior code reviewer.";

const GENERIC_DOMAIN: &str = "generic";

/// The three prompts of a staged review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Planning,
    PerFile,
    Final,
}

impl Stage {
    pub fn template_name(&self) -> &'static str {
        match self {
            Self::Planning => "planning_template",
            Self::PerFile => "per_file_template",
            Self::Final => "final_template",
        }
    }

    /// The template shipped with prbot.
    pub fn bundled(&self) -> &'static str {
        match self {
            Self::Planning => include_str!("../../../prompts/agentic/planning_template.txt"),
            Self::PerFile => include_str!("../../../prompts/agentic/per_file_template.txt"),
            Self::Final => include_str!("../../../prompts/agentic/final_template.txt"),
        }
    }
}

/// Source of base instruction text. Never fails: lookups fall back.
pub trait PromptStore: Send + Sync {
    /// Base instructions for `domain` in `mode`: the domain file, then the
    /// generic file, then a built-in default.
    fn resolve_template(&self, domain: &str, mode: ReviewMode) -> String;

    /// Stage instructions for the staged review: the on-disk file, then the
    /// bundled template.
    fn stage_template(&self, stage: Stage) -> String;
}

/// Built-in default for a mode.
pub fn default_prompt(mode: ReviewMode) -> &'static str {
    match mode {
        ReviewMode::AgenticTools => TOOL_DEFAULT_PROMPT,
        ReviewMode::Simple | ReviewMode::Agentic => CHAINED_DEFAULT_PROMPT,
    }
}

/// Templates read from a directory tree.
#[derive(Debug, Clone)]
pub struct FilePromptStore {
    root: PathBuf,
}

impl FilePromptStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Trimmed file contents; missing, unreadable or blank files are `None`.
    fn read(&self, dir: &str, file: &str) -> Option<String> {
        let path = self.root.join(dir).join(file);
        let text = std::fs::read_to_string(&path).ok()?;
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        debug!(path = %path.display(), "Loaded prompt template");
        Some(text.to_string())
    }
}

impl PromptStore for FilePromptStore {
    fn resolve_template(&self, domain: &str, mode: ReviewMode) -> String {
        let dir = mode.template_dir();
        let domain = domain.trim().to_lowercase();
        let domain = if domain.is_empty() { GENERIC_DOMAIN.to_string() } else { domain };

        self.read(dir, &format!("{domain}.txt"))
            .or_else(|| self.read(dir, &format!("{GENERIC_DOMAIN}.txt")))
            .unwrap_or_else(|| default_prompt(mode).to_string())
    }

    fn stage_template(&self, stage: Stage) -> String {
        self.read(
            ReviewMode::Agentic.template_dir(),
            &format!("{}.txt", stage.template_name()),
        )
        .unwrap_or_else(|| stage.bundled().trim().to_string())
    }
}

/// The system instruction: resolved template plus operator instructions.
pub fn system_prompt(store: &dyn PromptStore, domain: &str, mode: ReviewMode, extra: &str) -> String {
    let base = store.resolve_template(domain, mode);
    let extra = extra.trim();
    if extra.is_empty() {
        base
    } else {
        format!("{base}\n\n{extra}")
    }
}
