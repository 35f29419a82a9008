use crate::error::{InstallError, Result};
use std::io::ErrorKind;
use std::path::Path;

/// Remove each named entry from the top of `root`, returning the names that
/// were present. Absent names are skipped.
pub fn prune(root: &Path, names: &[String]) -> Result<Vec<String>> {
    let mut removed = Vec::new();
    for name in names {
        let path = root.join(name);
        let meta = match std::fs::symlink_metadata(&path) {
            Ok(m) => m,
            Err(e) if e.kind() == ErrorKind::NotFound => continue,
            Err(e) => return Err(InstallError::Staging(e)),
        };
        let result = if meta.is_dir() {
            std::fs::remove_dir_all(&path)
        } else {
            std::fs::remove_file(&path)
        };
        match result {
            Ok(()) => removed.push(name.clone()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(InstallError::Staging(e)),
        }
    }
    tracing::debug!(?removed, "pruned packaging files");
    Ok(removed)
}
