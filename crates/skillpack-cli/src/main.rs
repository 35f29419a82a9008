mod cmd;
mod output;

use clap::{Parser, Subcommand};
use cmd::{config::ConfigSubcommand, install::InstallArgs};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "skillpack",
    about = "Install the Spring Boot skill pack into AI coding agent directories",
    version,
    propagate_version = true,
    args_conflicts_with_subcommands = true
)]
struct Cli {
    /// Project root used for --project installs (default: current directory)
    #[arg(long, global = true, env = "SKILLPACK_ROOT")]
    root: Option<PathBuf>,

    /// YAML file overriding the archive source, prune list, or fetch policy
    #[arg(long, global = true, env = "SKILLPACK_CONFIG")]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(flatten)]
    install: InstallArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List known agents and where the skill pack goes for each
    Agents {
        /// Show user-level destinations instead of project-level ones
        #[arg(long)]
        user: bool,
    },

    /// Inspect the effective configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let global = cmd::GlobalOpts {
        root: cli.root,
        config: cli.config,
        json: cli.json,
    };

    let result = match cli.command {
        None => cmd::install::run(&global, cli.install),
        Some(Commands::Agents { user }) => cmd::agents::run(&global, user),
        Some(Commands::Config { subcommand }) => cmd::config::run(&global, subcommand),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
