pub mod agents;
pub mod config;
pub mod install;

use anyhow::Context;
use skillpack_core::InstallConfig;
use std::path::PathBuf;

/// Flags shared by every command.
pub struct GlobalOpts {
    pub root: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub json: bool,
}

impl GlobalOpts {
    pub fn load_config(&self) -> anyhow::Result<InstallConfig> {
        InstallConfig::load_or_default(self.config.as_deref()).with_context(|| match &self.config {
            Some(p) => format!("failed to load config {}", p.display()),
            None => "failed to build default config".to_string(),
        })
    }
}
