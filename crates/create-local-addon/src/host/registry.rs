//! Reads the add-ons already registered under a host installation.
//!
//! Every non-dot entry of the add-ons directory occupies a directory slot.
//! Display names are only known for directories carrying a parseable
//! manifest with a `productName` string.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, warn};

const REGISTRY_TARGET: &str = "create_local_addon::host::registry";

/// Descriptor file carried by every add-on.
pub const MANIFEST_FILE: &str = "package.json";

/// Snapshot of the add-ons installed under one host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddonInventory {
    directories: BTreeSet<String>,
    names: BTreeMap<String, String>,
}

impl AddonInventory {
    /// Scans `addons_dir`, propagating read failures.
    ///
    /// # Errors
    ///
    /// Returns the I/O error raised while listing the directory itself.
    /// Unreadable manifests inside it are not errors.
    pub fn scan(addons_dir: &Path) -> io::Result<Self> {
        Ok(Self {
            directories: list_addon_directories(addons_dir)?,
            names: list_addon_names(addons_dir)?,
        })
    }

    /// Scans `addons_dir`, treating an unreadable directory as empty.
    #[must_use]
    pub fn scan_or_empty(addons_dir: &Path) -> Self {
        match Self::scan(addons_dir) {
            Ok(inventory) => inventory,
            Err(error) => {
                warn!(
                    target: REGISTRY_TARGET,
                    path = %addons_dir.display(),
                    %error,
                    "could not read existing add-ons; assuming none"
                );
                Self::default()
            }
        }
    }

    /// Occupied directory names.
    #[must_use]
    pub const fn directories(&self) -> &BTreeSet<String> {
        &self.directories
    }

    /// Display names in use.
    #[must_use]
    pub fn display_names(&self) -> BTreeSet<String> {
        self.names.values().cloned().collect()
    }
}

/// Lists every non-dot entry of `addons_dir`.
///
/// Plain files count too: a directory of the same name could not be created.
///
/// # Errors
///
/// Returns the I/O error raised while reading the directory.
pub fn list_addon_directories(addons_dir: &Path) -> io::Result<BTreeSet<String>> {
    let mut directories = BTreeSet::new();
    for entry in fs::read_dir(addons_dir)? {
        let name = entry?.file_name().to_string_lossy().into_owned();
        if !name.starts_with('.') {
            directories.insert(name);
        }
    }
    Ok(directories)
}

/// Maps each add-on directory to the display name in its manifest.
///
/// Entries that are not directories, dot entries, and directories without a
/// readable manifest are skipped.
///
/// # Errors
///
/// Returns the I/O error raised while reading the directory.
pub fn list_addon_names(addons_dir: &Path) -> io::Result<BTreeMap<String, String>> {
    let mut names = BTreeMap::new();
    for entry in fs::read_dir(addons_dir)? {
        let entry = entry?;
        let directory = entry.file_name().to_string_lossy().into_owned();
        let path = entry.path();
        if directory.starts_with('.') || !path.is_dir() {
            continue;
        }
        match read_display_name(&path) {
            Some(display) => {
                names.insert(directory, display);
            }
            None => debug!(
                target: REGISTRY_TARGET,
                directory = %directory,
                "add-on has no readable display name"
            ),
        }
    }
    Ok(names)
}

fn read_display_name(addon_dir: &Path) -> Option<String> {
    let raw = fs::read_to_string(addon_dir.join(MANIFEST_FILE)).ok()?;
    let manifest: Value = serde_json::from_str(&raw).ok()?;
    manifest
        .get("productName")
        .and_then(Value::as_str)
        .map(str::to_owned)
}
