use super::GlobalOpts;
use crate::output::print_json;
use clap::Subcommand;
use skillpack_core::config::WarnLevel;

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Print the effective configuration as YAML
    Show,

    /// Validate the configuration for common mistakes
    Validate,
}

pub fn run(global: &GlobalOpts, subcmd: ConfigSubcommand) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Show => show(global),
        ConfigSubcommand::Validate => validate(global),
    }
}

fn show(global: &GlobalOpts) -> anyhow::Result<()> {
    let config = global.load_config()?;
    if global.json {
        return print_json(&config);
    }
    print!("{}", config.to_yaml()?);
    println!("# archive url: {}", config.source.archive_url());
    Ok(())
}

fn validate(global: &GlobalOpts) -> anyhow::Result<()> {
    let config = global.load_config()?;
    let warnings = config.validate();

    if global.json {
        let value = serde_json::json!({
            "warnings": warnings,
        });
        print_json(&value)?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    if warnings.iter().any(|w| w.level == WarnLevel::Error) {
        anyhow::bail!("config validation found errors");
    }

    Ok(())
}
