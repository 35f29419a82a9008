use crate::agent::Agent;
use crate::error::{InstallError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const SKILLS_DIR: &str = "skills";

/// Holds the single shared copy when deploying with symlinks.
pub const SHARED_DIR: &str = ".agents";

// ---------------------------------------------------------------------------
// Install level
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallLevel {
    #[default]
    Project,
    User,
}

impl InstallLevel {
    /// Build a level from the two mutually exclusive CLI switches.
    pub fn from_flags(project: bool, user: bool) -> Result<Self> {
        match (project, user) {
            (true, true) => Err(InstallError::ConflictingLevel),
            (_, true) => Ok(InstallLevel::User),
            _ => Ok(InstallLevel::Project),
        }
    }
}

impl fmt::Display for InstallLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstallLevel::Project => f.write_str("project"),
            InstallLevel::User => f.write_str("user"),
        }
    }
}

/// Candidate roots for both levels. `home` is `None` when it cannot be found.
#[derive(Debug, Clone)]
pub struct InstallRoots {
    pub project: PathBuf,
    pub home: Option<PathBuf>,
}

impl InstallRoots {
    /// Project root from `explicit` or the working directory; home from the environment.
    ///
    /// A relative `explicit` root is resolved against the working directory.
    pub fn detect(explicit: Option<&Path>) -> Result<Self> {
        let project = match explicit {
            Some(p) => std::path::absolute(p)?,
            None => std::env::current_dir()?,
        };
        Ok(Self {
            project,
            home: home::home_dir(),
        })
    }

    pub fn root_for(&self, level: InstallLevel) -> Result<&Path> {
        match level {
            InstallLevel::Project => Ok(&self.project),
            InstallLevel::User => self.home.as_deref().ok_or(InstallError::HomeNotFound),
        }
    }
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

/// `<root>/.<agent>/skills/<package>`
pub fn agent_skill_dir(root: &Path, agent: Agent, package: &str) -> PathBuf {
    root.join(agent.config_dir()).join(SKILLS_DIR).join(package)
}

/// `<root>/.agents/skills/<package>`
pub fn shared_skill_dir(root: &Path, package: &str) -> PathBuf {
    root.join(SHARED_DIR).join(SKILLS_DIR).join(package)
}

// ---------------------------------------------------------------------------
// Slug validation
// ---------------------------------------------------------------------------

static SLUG_RE: OnceLock<Regex> = OnceLock::new();

fn slug_re() -> &'static Regex {
    SLUG_RE.get_or_init(|| {
        Regex::new(r"^[a-z0-9][a-z0-9\-]*[a-z0-9]$|^[a-z0-9]$").expect("static slug regex")
    })
}

pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty() && slug.len() <= 64 && slug_re().is_match(slug)
}

/// A prune entry must name a single file at the archive root.
pub fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains('\0')
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
