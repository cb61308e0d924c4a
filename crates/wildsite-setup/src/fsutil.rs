use std::fs;
use std::io::ErrorKind;
use std::os::unix::fs::symlink;
use std::path::Path;

use anyhow::{Context, Result};

/// Write a generated file, creating its parent directory if needed.
pub fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    tracing::info!("writing {}", path.display());
    fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
}

/// Remove a file, symlink or directory tree. A missing path is not an error.
pub fn remove_path(path: &Path) -> Result<()> {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!("already absent: {}", path.display());
            return Ok(());
        }
        Err(e) => return Err(e).with_context(|| format!("failed to stat {}", path.display())),
    };

    tracing::info!("removing {}", path.display());
    if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
    .with_context(|| format!("failed to remove {}", path.display()))
}

/// Point `link` at `target`, replacing whatever `link` was before.
pub fn replace_symlink(target: &Path, link: &Path) -> Result<()> {
    remove_path(link)?;
    if let Some(parent) = link.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    tracing::info!("linking {} -> {}", link.display(), target.display());
    symlink(target, link)
        .with_context(|| format!("failed to link {} -> {}", link.display(), target.display()))
}
