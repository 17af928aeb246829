//! Removal of partially written directories.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

const CLEANUP_TARGET: &str = "create_local_addon::fetch::cleanup";

/// Recursively removes `path` without following symbolic links.
///
/// Walks with an explicit stack so deep trees cannot exhaust the call stack.
/// A missing path is not an error.
///
/// # Errors
///
/// Returns the first I/O error raised while listing or deleting entries.
pub fn remove_tree(path: &Path) -> io::Result<()> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(error) => return Err(error),
    };
    if !metadata.is_dir() {
        return remove_leaf(path);
    }

    // Each directory is visited twice: once to queue its children, then again
    // after they are gone to remove it.
    let mut pending: Vec<(PathBuf, bool)> = vec![(path.to_path_buf(), false)];
    while let Some((dir, emptied)) = pending.pop() {
        if emptied {
            fs::remove_dir(&dir)?;
            continue;
        }
        pending.push((dir.clone(), true));
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let child = entry.path();
            if entry.file_type()?.is_dir() {
                pending.push((child, false));
            } else {
                remove_leaf(&child)?;
            }
        }
    }
    Ok(())
}

fn remove_leaf(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        // Directory symlinks on Windows are removed as directories.
        #[cfg(windows)]
        Err(_)
            if fs::symlink_metadata(path).is_ok_and(|meta| meta.file_type().is_symlink()) =>
        {
            fs::remove_dir(path)
        }
        Err(error) => Err(error),
    }
}

/// A freshly created directory that is removed again unless kept.
#[derive(Debug)]
pub(crate) struct PartialDirectory {
    path: PathBuf,
    armed: bool,
}

impl PartialDirectory {
    /// Creates `path`, which must not exist yet.
    pub(crate) fn create(path: &Path) -> io::Result<Self> {
        fs::create_dir(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            armed: true,
        })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Disarms the guard and hands back the directory path.
    pub(crate) fn keep(mut self) -> PathBuf {
        self.armed = false;
        std::mem::take(&mut self.path)
    }
}

impl Drop for PartialDirectory {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match remove_tree(&self.path) {
            Ok(()) => debug!(
                target: CLEANUP_TARGET,
                path = %self.path.display(),
                "removed partial extraction"
            ),
            Err(error) => warn!(
                target: CLEANUP_TARGET,
                path = %self.path.display(),
                %error,
                "failed to remove partial extraction"
            ),
        }
    }
}
