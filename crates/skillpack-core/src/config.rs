use crate::agent::Agent;
use crate::error::{InstallError, Result};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_OWNER: &str = "spring-skills";
pub const DEFAULT_REPO: &str = "spring-boot-skills";
pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_PACKAGE: &str = "spring-boot-skills";

/// Packaging artifacts that never belong in an installed skill.
pub const DEFAULT_PRUNE: &[&str] = &[
    "LICENSE",
    "README.md",
    ".gitignore",
    "install.sh",
    "install-symlink.sh",
];

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// ArchiveSource
// ---------------------------------------------------------------------------

/// Where the skill archive comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveSource {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    /// Full archive URL; overrides the GitHub URL built from the other fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Default for ArchiveSource {
    fn default() -> Self {
        Self {
            owner: DEFAULT_OWNER.to_string(),
            repo: DEFAULT_REPO.to_string(),
            branch: DEFAULT_BRANCH.to_string(),
            url: None,
        }
    }
}

impl ArchiveSource {
    pub fn archive_url(&self) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => format!(
                "https://github.com/{}/{}/archive/refs/heads/{}.zip",
                self.owner, self.repo, self.branch
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// FetchPolicy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchPolicy {
    #[serde(default = "default_attempts")]
    pub attempts: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
}

fn default_attempts() -> u32 {
    3
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_backoff_ms() -> u64 {
    500
}

fn default_max_bytes() -> u64 {
    64 * 1024 * 1024
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            timeout_secs: default_timeout_secs(),
            backoff_ms: default_backoff_ms(),
            max_bytes: default_max_bytes(),
        }
    }
}

// ---------------------------------------------------------------------------
// InstallConfig
// ---------------------------------------------------------------------------

/// Everything the installer treats as fixed for a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallConfig {
    #[serde(default)]
    pub source: ArchiveSource,
    #[serde(default = "default_package")]
    pub package: String,
    #[serde(default = "default_prune")]
    pub prune: Vec<String>,
    /// Agents used when none are named, and what `all` expands to.
    #[serde(default = "default_agents")]
    pub agents: Vec<Agent>,
    #[serde(default)]
    pub fetch: FetchPolicy,
}

fn default_package() -> String {
    DEFAULT_PACKAGE.to_string()
}

fn default_prune() -> Vec<String> {
    DEFAULT_PRUNE.iter().map(|s| s.to_string()).collect()
}

fn default_agents() -> Vec<Agent> {
    Agent::ALL.to_vec()
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            source: ArchiveSource::default(),
            package: default_package(),
            prune: default_prune(),
            agents: default_agents(),
            fetch: FetchPolicy::default(),
        }
    }
}

impl InstallConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let config: InstallConfig = serde_yaml::from_str(&data)?;
        Ok(config)
    }

    /// Load `path` if given, otherwise the compiled-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let mut error = |message: String| {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message,
            })
        };

        if !paths::is_valid_slug(&self.package) {
            error(format!(
                "package '{}' must be lowercase alphanumeric with hyphens",
                self.package
            ));
        }
        for name in &self.prune {
            if !paths::is_plain_file_name(name) {
                error(format!("prune entry '{name}' must be a plain file name"));
            }
        }
        if self.agents.is_empty() {
            error("agents must list at least one agent".to_string());
        }
        if self.fetch.attempts == 0 {
            error("fetch.attempts must be at least 1".to_string());
        }
        if self.source.url.is_none()
            && (self.source.owner.is_empty()
                || self.source.repo.is_empty()
                || self.source.branch.is_empty())
        {
            error("source needs owner, repo and branch, or an explicit url".to_string());
        }

        if self.fetch.timeout_secs == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "fetch.timeout_secs is 0; downloads will not time out".to_string(),
            });
        }

        warnings
    }

    /// Fail on the first error-level warning.
    pub fn ensure_valid(&self) -> Result<()> {
        match self
            .validate()
            .into_iter()
            .find(|w| w.level == WarnLevel::Error)
        {
            Some(w) => Err(InstallError::InvalidConfig(w.message)),
            None => Ok(()),
        }
    }
}
