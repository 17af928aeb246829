//! Host application discovery.
//!
//! Maps each host variant to its per-OS application-support directory and
//! picks the installation the new add-on is registered with. The add-ons
//! already present under that installation are read by [`registry`].

pub mod registry;

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use addon_config::Config;
use tracing::{info, warn};

pub use registry::{AddonInventory, MANIFEST_FILE, list_addon_directories, list_addon_names};

const HOST_TARGET: &str = "create_local_addon::host";

/// Subdirectory of a host root holding installed add-ons.
pub const ADDONS_DIR: &str = "addons";

/// Registry file mapping add-on directory names to their enabled state.
pub const ENABLED_ADDONS_FILE: &str = "enabled-addons.json";

/// Installable channels of the host application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HostVariant {
    /// Stable release channel.
    Local,
    /// Beta release channel.
    LocalBeta,
}

impl HostVariant {
    /// Every known variant, in probe order.
    pub const ALL: [Self; 2] = [Self::Local, Self::LocalBeta];

    /// Directory name of the variant under the application-support root.
    #[must_use]
    pub const fn directory_name(self) -> &'static str {
        match self {
            Self::Local => "Local",
            Self::LocalBeta => "Local Beta",
        }
    }
}

impl fmt::Display for HostVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.directory_name())
    }
}

/// A host variant found on disk together with its root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInstallation {
    variant: HostVariant,
    root: PathBuf,
}

impl HostInstallation {
    /// Resolves the installation root of `variant` beneath `app_support`.
    #[must_use]
    pub fn new(variant: HostVariant, app_support: &Path) -> Self {
        Self {
            variant,
            root: app_support.join(variant.directory_name()),
        }
    }

    /// The host variant.
    #[must_use]
    pub const fn variant(&self) -> HostVariant {
        self.variant
    }

    /// Root configuration directory of the host.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory the host loads add-ons from.
    #[must_use]
    pub fn addons_dir(&self) -> PathBuf {
        self.root.join(ADDONS_DIR)
    }

    /// Location of the enabled-add-ons registry file.
    #[must_use]
    pub fn enabled_addons_path(&self) -> PathBuf {
        self.root.join(ENABLED_ADDONS_FILE)
    }
}

/// Per-OS directory the host variants live under.
///
/// An explicit override in the configuration wins over the platform default
/// (`~/Library/Application Support`, roaming AppData, or the XDG config
/// directory).
#[must_use]
pub fn application_support_dir(config: &Config) -> Option<PathBuf> {
    config
        .app_support_dir()
        .map(Path::to_path_buf)
        .or_else(dirs::config_dir)
}

/// Probes `app_support` for every known host variant.
#[must_use]
pub fn locate_installations(app_support: &Path) -> BTreeSet<HostVariant> {
    HostVariant::ALL
        .into_iter()
        .filter(|variant| app_support.join(variant.directory_name()).is_dir())
        .collect()
}

/// Picks the installation to target from the variants present.
///
/// The preferred variant wins when installed; otherwise whichever variant is
/// present is used. Returns `None` when nothing is installed.
#[must_use]
pub fn choose_installation(
    app_support: &Path,
    found: &BTreeSet<HostVariant>,
    prefer_beta: bool,
) -> Option<HostInstallation> {
    let preferred = if prefer_beta {
        HostVariant::LocalBeta
    } else {
        HostVariant::Local
    };

    let variant = if found.contains(&preferred) {
        preferred
    } else {
        let fallback = found.iter().next().copied()?;
        if prefer_beta {
            warn!(
                target: HOST_TARGET,
                preferred = %preferred,
                using = %fallback,
                "preferred host variant is not installed"
            );
        }
        fallback
    };

    info!(target: HOST_TARGET, variant = %variant, "selected host installation");
    Some(HostInstallation::new(variant, app_support))
}
