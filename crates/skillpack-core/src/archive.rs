//! Staging a downloaded zip archive on local disk.
//!
//! Both the downloaded file and the extraction directory live in the system
//! temp dir and are owned by [`StagedArchive`]; dropping it removes them, so
//! every exit path of an install cleans up.

use crate::error::{InstallError, Result};
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use tempfile::{NamedTempFile, TempDir};
use zip::ZipArchive;

const TEMP_PREFIX: &str = "skillpack-";

#[derive(Debug)]
pub struct StagedArchive {
    _download: NamedTempFile,
    dir: TempDir,
}

impl StagedArchive {
    /// Write `bytes` to a temp file and extract it into a fresh temp dir.
    ///
    /// A single wrapper directory shared by every entry (as in GitHub branch
    /// archives) is stripped so [`StagedArchive::root`] holds the content.
    pub fn stage(bytes: &[u8]) -> Result<Self> {
        let mut download = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(".zip")
            .tempfile()
            .map_err(InstallError::Staging)?;
        download.write_all(bytes).map_err(InstallError::Staging)?;
        download.flush().map_err(InstallError::Staging)?;

        let dir = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempdir()
            .map_err(InstallError::Staging)?;

        let file = download.reopen().map_err(InstallError::Staging)?;
        extract(file, dir.path())?;

        Ok(Self {
            _download: download,
            dir,
        })
    }

    /// Directory holding the extracted skill content.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }
}

fn extract(file: std::fs::File, dest: &Path) -> Result<()> {
    let mut archive = ZipArchive::new(file).map_err(|e| InstallError::Archive(e.to_string()))?;
    let names: Vec<String> = archive.file_names().map(str::to_string).collect();
    let wrapper = wrapper_dir(&names);

    let mut files = 0usize;
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| InstallError::Archive(e.to_string()))?;

        let name = entry.name().to_string();
        let Some(enclosed) = entry.enclosed_name().map(Path::to_path_buf) else {
            return Err(InstallError::Archive(format!(
                "entry has unsafe path: {name}"
            )));
        };

        if is_symlink(entry.unix_mode()) {
            tracing::warn!(entry = %name, "skipping symlink archive entry");
            continue;
        }

        let Some(relative) = strip_wrapper(&enclosed, wrapper.as_deref()) else {
            continue;
        };
        let target = dest.join(&relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&target).map_err(InstallError::Staging)?;
            continue;
        }

        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(InstallError::Staging)?;
        }
        let mut out = std::fs::File::create(&target).map_err(InstallError::Staging)?;
        std::io::copy(&mut entry, &mut out)
            .map_err(|e| InstallError::Archive(format!("failed to read {name}: {e}")))?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode((mode & 0o777) | 0o600);
            std::fs::set_permissions(&target, perms).map_err(InstallError::Staging)?;
        }
        files += 1;
    }

    if files == 0 {
        return Err(InstallError::Archive("archive contains no files".to_string()));
    }
    tracing::debug!(files, dest = %dest.display(), "extracted archive");
    Ok(())
}

fn is_symlink(mode: Option<u32>) -> bool {
    mode.is_some_and(|m| m & 0o170000 == 0o120000)
}

/// The top-level directory every entry lives under, if there is exactly one.
fn wrapper_dir(names: &[String]) -> Option<String> {
    let mut wrapper: Option<&str> = None;
    for name in names {
        let (first, _) = name.split_once('/')?;
        match wrapper {
            None => wrapper = Some(first),
            Some(w) if w == first => {}
            Some(_) => return None,
        }
    }
    wrapper.filter(|w| !w.is_empty()).map(str::to_string)
}

fn strip_wrapper(path: &Path, wrapper: Option<&str>) -> Option<PathBuf> {
    let mut components = path.components().peekable();
    let wrapped = matches!(
        (wrapper, components.peek()),
        (Some(w), Some(Component::Normal(first))) if *first == w
    );
    if wrapped {
        components.next();
    }
    let rest: PathBuf = components.collect();
    if rest.as_os_str().is_empty() {
        None
    } else {
        Some(rest)
    }
}
