pub mod agent;
pub mod archive;
pub mod config;
pub mod deploy;
pub mod error;
pub mod fetch;
pub mod installer;
pub mod paths;
pub mod prune;

pub use agent::{Agent, AgentSelection};
pub use config::InstallConfig;
pub use deploy::DeployStrategy;
pub use error::{DeployError, FetchError, InstallError, Result};
pub use fetch::{ArchiveFetcher, HttpFetcher};
pub use installer::{AgentOutcome, InstallRequest, InstalledSummary, Installer, PlannedTarget};
pub use paths::{InstallLevel, InstallRoots};
