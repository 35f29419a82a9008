//! The fixed set of agents a skill pack can be installed for.

use crate::error::InstallError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Value accepted by `--agent` that stands for every default agent.
pub const ALL_SENTINEL: &str = "all";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Agent {
    Claude,
    Codex,
    Gemini,
    Opencode,
}

impl Agent {
    pub const ALL: [Agent; 4] = [Agent::Claude, Agent::Codex, Agent::Gemini, Agent::Opencode];

    pub fn name(self) -> &'static str {
        match self {
            Agent::Claude => "claude",
            Agent::Codex => "codex",
            Agent::Gemini => "gemini",
            Agent::Opencode => "opencode",
        }
    }

    /// Configuration directory name relative to the install root, e.g. `.claude`.
    pub fn config_dir(self) -> String {
        format!(".{}", self.name())
    }

    fn known_names() -> String {
        Agent::ALL
            .iter()
            .map(|a| a.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Agent {
    type Err = InstallError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Agent::ALL
            .into_iter()
            .find(|a| a.name() == wanted)
            .ok_or_else(|| InstallError::UnknownAgent {
                name: s.to_string(),
                expected: Agent::known_names(),
            })
    }
}

/// One `--agent` value: a concrete agent or the `all` sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentSelection {
    All,
    Named(Agent),
}

impl FromStr for AgentSelection {
    type Err = InstallError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case(ALL_SENTINEL) {
            return Ok(AgentSelection::All);
        }
        s.parse().map(AgentSelection::Named)
    }
}

/// Expand selections into the final agent list.
///
/// No selection, or any `all`, yields `defaults`. Duplicates collapse and the
/// result keeps canonical agent order, so it is never empty as long as
/// `defaults` is not.
pub fn resolve_agents(selections: &[AgentSelection], defaults: &[Agent]) -> Vec<Agent> {
    let wants_all =
        selections.is_empty() || selections.iter().any(|s| *s == AgentSelection::All);

    let mut picked: Vec<Agent> = if wants_all {
        defaults.to_vec()
    } else {
        selections
            .iter()
            .filter_map(|s| match s {
                AgentSelection::Named(a) => Some(*a),
                AgentSelection::All => None,
            })
            .collect()
    };
    picked.sort();
    picked.dedup();
    picked
}
