//! The install operation: validate, fetch, stage, prune, deploy.

use crate::agent::{resolve_agents, Agent, AgentSelection};
use crate::archive::StagedArchive;
use crate::config::InstallConfig;
use crate::deploy::{self, DeployStrategy};
use crate::error::{InstallError, Result};
use crate::fetch::ArchiveFetcher;
use crate::paths::{self, InstallLevel, InstallRoots};
use crate::prune::prune;
use serde::Serialize;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct InstallRequest {
    pub level: InstallLevel,
    pub selections: Vec<AgentSelection>,
    pub strategy: DeployStrategy,
    pub roots: InstallRoots,
}

impl InstallRequest {
    pub fn new(level: InstallLevel, roots: InstallRoots) -> Self {
        Self {
            level,
            selections: Vec::new(),
            strategy: DeployStrategy::default(),
            roots,
        }
    }

    pub fn with_agents(mut self, selections: Vec<AgentSelection>) -> Self {
        self.selections = selections;
        self
    }

    pub fn with_strategy(mut self, strategy: DeployStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Parse raw `--agent` values, failing on the first unknown name.
    pub fn parse_agents<S: AsRef<str>>(names: &[S]) -> Result<Vec<AgentSelection>> {
        names.iter().map(|n| n.as_ref().parse()).collect()
    }
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct AgentOutcome {
    pub agent: Agent,
    pub destination: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AgentOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InstalledSummary {
    pub package: String,
    pub level: InstallLevel,
    pub strategy: DeployStrategy,
    pub root: PathBuf,
    /// Shared copy the agent symlinks point at, for the link strategy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared: Option<PathBuf>,
    pub pruned: Vec<String>,
    pub outcomes: Vec<AgentOutcome>,
}

impl InstalledSummary {
    pub fn succeeded(&self) -> Vec<Agent> {
        self.outcomes
            .iter()
            .filter(|o| o.is_success())
            .map(|o| o.agent)
            .collect()
    }

    pub fn failed(&self) -> Vec<&AgentOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success()).collect()
    }

    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(AgentOutcome::is_success)
    }
}

/// Where each agent's copy will land.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedTarget {
    pub agent: Agent,
    pub destination: PathBuf,
}

// ---------------------------------------------------------------------------
// Installer
// ---------------------------------------------------------------------------

pub struct Installer<F> {
    config: InstallConfig,
    fetcher: F,
}

impl<F: ArchiveFetcher> Installer<F> {
    pub fn new(config: InstallConfig, fetcher: F) -> Result<Self> {
        config.ensure_valid()?;
        Ok(Self { config, fetcher })
    }

    pub fn config(&self) -> &InstallConfig {
        &self.config
    }

    /// Resolve agents and destinations without touching the network or disk.
    pub fn plan(&self, request: &InstallRequest) -> Result<Vec<PlannedTarget>> {
        let root = request.roots.root_for(request.level)?;
        Ok(resolve_agents(&request.selections, &self.config.agents)
            .into_iter()
            .map(|agent| PlannedTarget {
                agent,
                destination: paths::agent_skill_dir(root, agent, &self.config.package),
            })
            .collect())
    }

    pub fn install(&self, request: &InstallRequest) -> Result<InstalledSummary> {
        self.install_with(request, |_| {})
    }

    /// Like [`Installer::install`], calling `on_outcome` as each agent finishes.
    ///
    /// Fetch and archive errors abort before any destination is touched.
    /// Per-agent filesystem errors are recorded in the summary and the
    /// remaining agents still run.
    pub fn install_with(
        &self,
        request: &InstallRequest,
        mut on_outcome: impl FnMut(&AgentOutcome),
    ) -> Result<InstalledSummary> {
        let targets = self.plan(request)?;
        let root = request.roots.root_for(request.level)?.to_path_buf();

        let url = self.config.source.archive_url();
        tracing::info!(%url, level = %request.level, "fetching skill archive");
        let bytes = self
            .fetcher
            .fetch(&url)
            .map_err(|source| InstallError::Fetch {
                url: url.clone(),
                source,
            })?;

        let staged = StagedArchive::stage(&bytes)?;
        let pruned = prune(staged.root(), &self.config.prune)?;

        let mut outcomes = Vec::with_capacity(targets.len());
        let mut shared = None;

        match request.strategy {
            DeployStrategy::Copy => {
                for target in targets {
                    let error = deploy::replace_with_copy(staged.root(), &target.destination)
                        .err()
                        .map(|e| e.to_string());
                    let outcome = record(target, error);
                    on_outcome(&outcome);
                    outcomes.push(outcome);
                }
            }
            DeployStrategy::Link => {
                let shared_dir = paths::shared_skill_dir(&root, &self.config.package);
                // Every agent depends on the shared copy, so its failure fails them all.
                let shared_error = deploy::replace_with_copy(staged.root(), &shared_dir)
                    .err()
                    .map(|e| e.to_string());
                for target in targets {
                    let error = match &shared_error {
                        None => deploy::replace_with_link(&shared_dir, &target.destination)
                            .err()
                            .map(|e| e.to_string()),
                        Some(e) => Some(e.clone()),
                    };
                    let outcome = record(target, error);
                    on_outcome(&outcome);
                    outcomes.push(outcome);
                }
                if shared_error.is_none() {
                    shared = Some(shared_dir);
                }
            }
        }

        Ok(InstalledSummary {
            package: self.config.package.clone(),
            level: request.level,
            strategy: request.strategy,
            root,
            shared,
            pruned,
            outcomes,
        })
    }
}

fn record(target: PlannedTarget, error: Option<String>) -> AgentOutcome {
    match &error {
        None => {
            tracing::info!(agent = %target.agent, dest = %target.destination.display(), "installed");
        }
        Some(e) => tracing::warn!(agent = %target.agent, error = %e, "install failed"),
    }
    AgentOutcome {
        agent: target.agent,
        destination: target.destination,
        error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::testing::github_archive;
    use crate::error::FetchError;
    use std::cell::Cell;
    use std::collections::BTreeMap;
    use std::path::Path;
    use tempfile::TempDir;
    use walkdir::WalkDir;

    struct FakeFetcher {
        body: std::result::Result<Vec<u8>, u16>,
        calls: Cell<usize>,
    }

    impl FakeFetcher {
        fn serving(body: Vec<u8>) -> Self {
            Self {
                body: Ok(body),
                calls: Cell::new(0),
            }
        }

        fn failing(status: u16) -> Self {
            Self {
                body: Err(status),
                calls: Cell::new(0),
            }
        }
    }

    impl ArchiveFetcher for FakeFetcher {
        fn fetch(&self, _url: &str) -> std::result::Result<Vec<u8>, FetchError> {
            self.calls.set(self.calls.get() + 1);
            match &self.body {
                Ok(b) => Ok(b.clone()),
                Err(code) => Err(FetchError::Status(*code)),
            }
        }
    }

    struct Env {
        project: TempDir,
        home: TempDir,
    }

    impl Env {
        fn new() -> Self {
            Self {
                project: TempDir::new().unwrap(),
                home: TempDir::new().unwrap(),
            }
        }

        fn roots(&self) -> InstallRoots {
            InstallRoots {
                project: self.project.path().to_path_buf(),
                home: Some(self.home.path().to_path_buf()),
            }
        }

        fn request(&self, level: InstallLevel, agents: &[&str]) -> InstallRequest {
            InstallRequest::new(level, self.roots())
                .with_agents(InstallRequest::parse_agents(agents).unwrap())
        }
    }

    fn snapshot(dir: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
        WalkDir::new(dir)
            .into_iter()
            .map(|e| e.unwrap())
            .filter(|e| e.file_type().is_file())
            .map(|e| {
                let rel = e.path().strip_prefix(dir).unwrap().to_path_buf();
                (rel, std::fs::read(e.path()).unwrap())
            })
            .collect()
    }

    fn skill_dir(root: &Path, agent: &str) -> PathBuf {
        root.join(format!(".{agent}/skills/spring-boot-skills"))
    }

    #[test]
    fn installs_named_agents_only() {
        let env = Env::new();
        let installer =
            Installer::new(InstallConfig::default(), FakeFetcher::serving(github_archive()))
                .unwrap();

        let summary = installer
            .install(&env.request(InstallLevel::Project, &["claude", "codex"]))
            .unwrap();

        assert!(summary.is_success());
        assert_eq!(summary.succeeded(), vec![Agent::Claude, Agent::Codex]);
        let root = env.project.path();
        assert!(skill_dir(root, "claude").join("SKILL.md").is_file());
        assert!(skill_dir(root, "codex").join("references/jpa-entities.md").is_file());
        assert!(!root.join(".gemini").exists());
        assert!(!root.join(".opencode").exists());
        assert!(!env.home.path().join(".claude").exists());
    }

    #[test]
    fn user_level_defaults_to_every_agent() {
        let env = Env::new();
        let installer =
            Installer::new(InstallConfig::default(), FakeFetcher::serving(github_archive()))
                .unwrap();

        let summary = installer
            .install(&env.request(InstallLevel::User, &[]))
            .unwrap();

        assert_eq!(summary.succeeded(), Agent::ALL.to_vec());
        for agent in Agent::ALL {
            assert!(skill_dir(env.home.path(), agent.name()).join("SKILL.md").is_file());
        }
        assert!(std::fs::read_dir(env.project.path()).unwrap().next().is_none());
    }

    #[test]
    fn pruned_files_never_reach_destinations() {
        let env = Env::new();
        let installer =
            Installer::new(InstallConfig::default(), FakeFetcher::serving(github_archive()))
                .unwrap();

        let summary = installer
            .install(&env.request(InstallLevel::Project, &["all"]))
            .unwrap();

        assert_eq!(
            summary.pruned,
            vec!["LICENSE", "README.md", ".gitignore", "install.sh"]
        );
        for agent in Agent::ALL {
            let dir = skill_dir(env.project.path(), agent.name());
            for name in &installer.config().prune {
                assert!(!dir.join(name).exists(), "{name} leaked into {agent}");
            }
        }
    }

    #[test]
    fn reinstall_is_idempotent_and_drops_stale_files() {
        let env = Env::new();
        let installer =
            Installer::new(InstallConfig::default(), FakeFetcher::serving(github_archive()))
                .unwrap();
        let request = env.request(InstallLevel::Project, &["gemini"]);

        installer.install(&request).unwrap();
        let dir = skill_dir(env.project.path(), "gemini");
        let first = snapshot(&dir);

        std::fs::write(dir.join("stale.md"), "from an older release").unwrap();
        std::fs::remove_file(dir.join("SKILL.md")).unwrap();

        installer.install(&request).unwrap();
        assert_eq!(snapshot(&dir), first);
    }

    #[test]
    fn fetch_failure_touches_nothing() {
        let env = Env::new();
        let installer =
            Installer::new(InstallConfig::default(), FakeFetcher::failing(500)).unwrap();

        let err = installer
            .install(&env.request(InstallLevel::Project, &[]))
            .unwrap_err();

        assert!(matches!(
            err,
            InstallError::Fetch {
                source: FetchError::Status(500),
                ..
            }
        ));
        assert!(std::fs::read_dir(env.project.path()).unwrap().next().is_none());
    }

    #[test]
    fn corrupt_archive_touches_nothing() {
        let env = Env::new();
        let installer = Installer::new(
            InstallConfig::default(),
            FakeFetcher::serving(b"<html>not a zip</html>".to_vec()),
        )
        .unwrap();

        let err = installer
            .install(&env.request(InstallLevel::Project, &[]))
            .unwrap_err();
        assert!(matches!(err, InstallError::Archive(_)));
        assert!(std::fs::read_dir(env.project.path()).unwrap().next().is_none());
    }

    #[test]
    fn unknown_agent_fails_before_fetch() {
        let env = Env::new();
        let fetcher = FakeFetcher::serving(github_archive());
        let installer = Installer::new(InstallConfig::default(), &fetcher).unwrap();

        let result = InstallRequest::parse_agents(&["claude", "cursor"]).and_then(|agents| {
            installer.install(
                &InstallRequest::new(InstallLevel::Project, env.roots()).with_agents(agents),
            )
        });

        assert!(matches!(result, Err(ref e) if e.is_usage()));
        assert_eq!(fetcher.calls.get(), 0);
        assert!(std::fs::read_dir(env.project.path()).unwrap().next().is_none());
    }

    #[test]
    fn valid_agents_fetch_exactly_once() {
        let env = Env::new();
        let fetcher = FakeFetcher::serving(github_archive());
        let installer = Installer::new(InstallConfig::default(), &fetcher).unwrap();

        let result = InstallRequest::parse_agents(&["claude", "claude"]).and_then(|agents| {
            installer.install(
                &InstallRequest::new(InstallLevel::Project, env.roots()).with_agents(agents),
            )
        });

        assert_eq!(result.unwrap().succeeded(), vec![Agent::Claude]);
        assert_eq!(fetcher.calls.get(), 1);
    }

    #[test]
    fn missing_home_fails_before_fetch() {
        let env = Env::new();
        let fetcher = FakeFetcher::serving(github_archive());
        let installer = Installer::new(InstallConfig::default(), &fetcher).unwrap();
        let mut request = env.request(InstallLevel::User, &[]);
        request.roots.home = None;

        let err = installer.install(&request).unwrap_err();
        assert!(matches!(err, InstallError::HomeNotFound));
        assert_eq!(fetcher.calls.get(), 0);
    }

    #[test]
    fn one_blocked_agent_does_not_stop_the_others() {
        let env = Env::new();
        std::fs::write(env.project.path().join(".codex"), "a file, not a dir").unwrap();
        let installer =
            Installer::new(InstallConfig::default(), FakeFetcher::serving(github_archive()))
                .unwrap();

        let mut seen = Vec::new();
        let summary = installer
            .install_with(&env.request(InstallLevel::Project, &[]), |o| seen.push(o.agent))
            .unwrap();

        assert!(!summary.is_success());
        assert_eq!(seen, Agent::ALL.to_vec());
        let failed = summary.failed();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].agent, Agent::Codex);
        assert_eq!(
            summary.succeeded(),
            vec![Agent::Claude, Agent::Gemini, Agent::Opencode]
        );
        for agent in ["claude", "gemini", "opencode"] {
            assert!(skill_dir(env.project.path(), agent).join("SKILL.md").is_file());
        }
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let config = InstallConfig {
            package: "Not A Slug".into(),
            ..InstallConfig::default()
        };
        let result = Installer::new(config, FakeFetcher::serving(Vec::new()));
        assert!(matches!(result, Err(InstallError::InvalidConfig(_))));
    }

    #[test]
    fn plan_lists_destinations() {
        let env = Env::new();
        let installer =
            Installer::new(InstallConfig::default(), FakeFetcher::serving(Vec::new())).unwrap();
        let plan = installer
            .plan(&env.request(InstallLevel::Project, &["opencode", "claude"]))
            .unwrap();
        assert_eq!(
            plan,
            vec![
                PlannedTarget {
                    agent: Agent::Claude,
                    destination: skill_dir(env.project.path(), "claude"),
                },
                PlannedTarget {
                    agent: Agent::Opencode,
                    destination: skill_dir(env.project.path(), "opencode"),
                },
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn link_strategy_shares_one_copy() {
        let env = Env::new();
        let installer =
            Installer::new(InstallConfig::default(), FakeFetcher::serving(github_archive()))
                .unwrap();
        let request = env
            .request(InstallLevel::Project, &["claude", "gemini"])
            .with_strategy(DeployStrategy::Link);

        let summary = installer.install(&request).unwrap();
        let shared = env.project.path().join(".agents/skills/spring-boot-skills");
        assert_eq!(summary.shared.as_deref(), Some(shared.as_path()));
        assert!(shared.join("SKILL.md").is_file());

        for agent in ["claude", "gemini"] {
            let dir = skill_dir(env.project.path(), agent);
            assert!(std::fs::symlink_metadata(&dir).unwrap().file_type().is_symlink());
            assert_eq!(std::fs::read_link(&dir).unwrap(), shared);
        }

        // Switching back to copies replaces the links with real directories.
        installer
            .install(&request.clone().with_strategy(DeployStrategy::Copy))
            .unwrap();
        let dir = skill_dir(env.project.path(), "claude");
        assert!(!std::fs::symlink_metadata(&dir).unwrap().file_type().is_symlink());
        assert!(dir.join("SKILL.md").is_file());
    }
}
