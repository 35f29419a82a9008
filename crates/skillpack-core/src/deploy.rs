//! Placing staged skill content at its destinations.
//!
//! A destination is only ever swapped whole: the new tree is built in a
//! hidden sibling directory, then the old destination is removed and the new
//! tree renamed over it.

use crate::error::DeployError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::ErrorKind;
use std::path::Path;
use std::str::FromStr;
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployStrategy {
    /// Every agent gets its own copy.
    #[default]
    Copy,
    /// One shared copy; agent destinations are symlinks to it.
    Link,
}

impl fmt::Display for DeployStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeployStrategy::Copy => f.write_str("copy"),
            DeployStrategy::Link => f.write_str("link"),
        }
    }
}

impl FromStr for DeployStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "copy" => Ok(DeployStrategy::Copy),
            "link" | "symlink" => Ok(DeployStrategy::Link),
            other => Err(format!("unknown strategy '{other}': expected copy or link")),
        }
    }
}

/// Replace `dest` with a copy of the tree at `src`.
pub fn replace_with_copy(src: &Path, dest: &Path) -> Result<(), DeployError> {
    let parent = parent_of(dest)?;
    std::fs::create_dir_all(parent).map_err(|e| DeployError::new("create", parent, e))?;

    let staging_parent = staging_parent(dest)?;
    let staging = tempfile::Builder::new()
        .prefix(".skillpack-")
        .tempdir_in(staging_parent)
        .map_err(|e| DeployError::new("stage into", staging_parent, e))?;
    copy_tree(src, staging.path())?;

    remove_existing(dest).map_err(|e| DeployError::new("remove", dest, e))?;
    std::fs::rename(staging.path(), dest).map_err(|e| DeployError::new("move into", dest, e))?;
    Ok(())
}

/// Replace `link` with a directory symlink pointing at `target`.
///
/// A relative `target` is resolved against the working directory, since the
/// OS would otherwise resolve it from the link's own directory.
pub fn replace_with_link(target: &Path, link: &Path) -> Result<(), DeployError> {
    let target =
        std::path::absolute(target).map_err(|e| DeployError::new("resolve", target, e))?;
    let parent = parent_of(link)?;
    std::fs::create_dir_all(parent).map_err(|e| DeployError::new("create", parent, e))?;
    remove_existing(link).map_err(|e| DeployError::new("remove", link, e))?;
    symlink_dir(&target, link).map_err(|e| DeployError::new("link", link, e))?;

    match std::fs::metadata(link) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(DeployError::new(
            "verify link",
            link,
            std::io::Error::new(ErrorKind::InvalidData, "link target is not a directory"),
        )),
        Err(e) => Err(DeployError::new("verify link", link, e)),
    }
}

/// Where the new tree is built before it replaces `dest`.
///
/// One level above `dest`'s parent (`<root>/.<agent>/` for
/// `<root>/.<agent>/skills/<pkg>`), so an interrupted run never leaves an
/// extra entry in the directory agents scan for skills. Same filesystem, so
/// the final rename stays a rename.
pub fn staging_parent(dest: &Path) -> Result<&Path, DeployError> {
    let parent = parent_of(dest)?;
    Ok(parent
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(parent))
}

fn parent_of(path: &Path) -> Result<&Path, DeployError> {
    path.parent().ok_or_else(|| {
        DeployError::new(
            "resolve parent of",
            path,
            std::io::Error::new(ErrorKind::InvalidInput, "path has no parent"),
        )
    })
}

/// Copy regular files and directories under `src` into the existing `dest`.
pub fn copy_tree(src: &Path, dest: &Path) -> Result<(), DeployError> {
    for entry in WalkDir::new(src).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(src).to_path_buf();
            DeployError::new("read", path, e.into())
        })?;
        let Ok(relative) = entry.path().strip_prefix(src) else {
            continue;
        };
        let target = dest.join(relative);
        let file_type = entry.file_type();
        if file_type.is_dir() {
            std::fs::create_dir_all(&target).map_err(|e| DeployError::new("create", &target, e))?;
        } else if file_type.is_file() {
            std::fs::copy(entry.path(), &target)
                .map_err(|e| DeployError::new("copy into", &target, e))?;
        }
    }
    Ok(())
}

/// Remove whatever is at `path`: directory tree, file, or symlink.
pub fn remove_existing(path: &Path) -> std::io::Result<()> {
    let meta = match std::fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };
    if meta.file_type().is_symlink() {
        std::fs::remove_file(path).or_else(|_| std::fs::remove_dir(path))
    } else if meta.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    }
}

#[cfg(unix)]
fn symlink_dir(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink_dir(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_dir(target, link)
}
