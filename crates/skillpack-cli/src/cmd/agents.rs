use super::GlobalOpts;
use crate::output::{print_json, print_table};
use skillpack_core::{
    fetch::ArchiveFetcher, FetchError, InstallLevel, InstallRequest, InstallRoots, Installer,
};

/// Planning never downloads, so the installer gets a fetcher that refuses to.
struct NoFetch;

impl ArchiveFetcher for NoFetch {
    fn fetch(&self, _url: &str) -> Result<Vec<u8>, FetchError> {
        Err(FetchError::Transport("fetching is disabled while planning".into()))
    }
}

pub fn run(global: &GlobalOpts, user: bool) -> anyhow::Result<()> {
    let level = InstallLevel::from_flags(false, user)?;
    let config = global.load_config()?;
    let installer = Installer::new(config, NoFetch)?;
    let roots = InstallRoots::detect(global.root.as_deref())?;
    let targets = installer.plan(&InstallRequest::new(level, roots))?;

    if global.json {
        return print_json(&targets);
    }

    let rows = targets
        .iter()
        .map(|t| {
            let status = if t.destination.exists() {
                "installed"
            } else {
                "-"
            };
            vec![
                t.agent.name().to_string(),
                status.to_string(),
                t.destination.display().to_string(),
            ]
        })
        .collect();
    print_table(&["AGENT", "STATUS", "DESTINATION"], rows);
    Ok(())
}
