use super::GlobalOpts;
use crate::output::print_json;
use anyhow::Context;
use clap::Args;
use skillpack_core::{
    AgentOutcome, AgentSelection, DeployStrategy, HttpFetcher, InstallLevel, InstallRequest,
    InstallRoots, Installer,
};

#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Install under the project root (default)
    #[arg(long, conflicts_with = "user")]
    pub project: bool,

    /// Install under the home directory
    #[arg(long)]
    pub user: bool,

    /// Agent to install for: claude, codex, gemini, opencode, or all (repeatable)
    #[arg(long = "agent", value_name = "NAME")]
    pub agents: Vec<AgentSelection>,

    /// copy: one copy per agent; link: one shared copy plus per-agent symlinks
    #[arg(long, value_name = "STRATEGY", default_value_t = DeployStrategy::Copy)]
    pub strategy: DeployStrategy,
}

pub fn run(global: &GlobalOpts, args: InstallArgs) -> anyhow::Result<()> {
    let level = InstallLevel::from_flags(args.project, args.user)?;
    let config = global.load_config()?;
    let roots = InstallRoots::detect(global.root.as_deref())
        .context("failed to resolve install root")?;
    let url = config.source.archive_url();

    let installer = Installer::new(config.clone(), HttpFetcher::new(config.fetch.clone()))?;
    let request = InstallRequest::new(level, roots)
        .with_agents(args.agents)
        .with_strategy(args.strategy);

    if !global.json {
        println!(
            "Installing {} ({level} level, {} strategy)",
            config.package, args.strategy
        );
        println!("  source: {url}");
    }

    let json = global.json;
    let summary = installer.install_with(&request, |outcome| {
        if !json {
            print_outcome(outcome);
        }
    })?;

    if json {
        print_json(&summary)?;
    } else {
        if let Some(shared) = &summary.shared {
            println!("  shared:    {}", shared.display());
        }
        let succeeded: Vec<&str> = summary.succeeded().iter().map(|a| a.name()).collect();
        if succeeded.is_empty() {
            println!("\nNo agents installed at {level} level.");
        } else {
            println!(
                "\nInstalled {} for {} at {level} level.",
                summary.package,
                succeeded.join(", ")
            );
        }
    }

    let failed = summary.failed();
    if !failed.is_empty() {
        let names: Vec<&str> = failed.iter().map(|o| o.agent.name()).collect();
        anyhow::bail!(
            "{} of {} agent(s) failed: {}",
            failed.len(),
            summary.outcomes.len(),
            names.join(", ")
        );
    }

    Ok(())
}

fn print_outcome(outcome: &AgentOutcome) {
    match &outcome.error {
        None => println!(
            "  installed: {:<8} → {}",
            outcome.agent.name(),
            outcome.destination.display()
        ),
        Some(e) => println!("  failed:    {:<8} {e}", outcome.agent.name()),
    }
}
