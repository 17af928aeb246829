//! Decides where the add-on's files are written.
//!
//! Placement is a pure function of the configuration flags and two paths;
//! callers are expected to canonicalise the paths first so that equivalent
//! spellings compare equal.

use std::fmt;
use std::path::{Path, PathBuf};

use addon_config::Config;

use crate::host::ADDONS_DIR;

/// Where the add-on's files live relative to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementMode {
    /// Files are written into the host's add-ons directory.
    Direct,
    /// Files are written to the working directory and linked into the host.
    Symlinked,
}

impl fmt::Display for PlacementMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Direct => "direct",
            Self::Symlinked => "symlinked",
        })
    }
}

/// Resolved placement decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// Placement mode.
    pub mode: PlacementMode,
    /// Directory the add-on directory is created in.
    pub target_root: PathBuf,
    /// Set when direct placement was forced because the invocation happened
    /// inside the host's add-ons directory.
    pub forced_direct: bool,
}

impl Placement {
    /// Whether the link step should run for this placement.
    ///
    /// Only symlinked placements link, and only when linking was not turned
    /// off; a symlinked placement without a link is valid but inert.
    #[must_use]
    pub const fn creates_link(&self, config: &Config) -> bool {
        matches!(self.mode, PlacementMode::Symlinked) && config.should_symlink()
    }

    /// Whether the working directory's entries constrain the directory name.
    #[must_use]
    pub const fn is_indirect(&self) -> bool {
        matches!(self.mode, PlacementMode::Symlinked)
    }
}

/// Resolves the placement for a run.
///
/// Rules, first match wins: invoking from `host_root/addons` forces direct
/// placement; `place_directly` selects direct placement; anything else is
/// symlinked from the invocation directory.
#[must_use]
pub fn resolve_placement(config: &Config, invocation_dir: &Path, host_root: &Path) -> Placement {
    let addons_dir = host_root.join(ADDONS_DIR);
    if invocation_dir == addons_dir {
        return Placement {
            mode: PlacementMode::Direct,
            target_root: addons_dir,
            forced_direct: true,
        };
    }
    if config.place_directly {
        return Placement {
            mode: PlacementMode::Direct,
            target_root: addons_dir,
            forced_direct: false,
        };
    }
    Placement {
        mode: PlacementMode::Symlinked,
        target_root: invocation_dir.to_path_buf(),
        forced_direct: false,
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    const HOST: &str = "/support/Local";

    fn config(place_directly: bool, do_not_symlink: bool) -> Config {
        Config {
            place_directly,
            do_not_symlink,
            ..Config::default()
        }
        .normalised()
    }

    #[rstest]
    #[case::defaults(false, false)]
    #[case::place_directly(true, false)]
    #[case::no_symlink(false, true)]
    #[case::both(true, true)]
    fn inside_addons_dir_is_always_direct(#[case] place_directly: bool, #[case] no_link: bool) {
        let cfg = config(place_directly, no_link);
        let addons = Path::new(HOST).join("addons");
        let placement = resolve_placement(&cfg, &addons, Path::new(HOST));
        assert_eq!(placement.mode, PlacementMode::Direct);
        assert_eq!(placement.target_root, addons);
        assert!(placement.forced_direct);
        assert!(!placement.creates_link(&cfg));
    }

    #[test]
    fn place_directly_targets_addons_dir() {
        let cfg = config(true, false);
        let placement = resolve_placement(&cfg, Path::new("/work"), Path::new(HOST));
        assert_eq!(placement.mode, PlacementMode::Direct);
        assert_eq!(placement.target_root, Path::new(HOST).join("addons"));
        assert!(!placement.forced_direct);
        assert!(!placement.creates_link(&cfg));
    }

    #[test]
    fn default_placement_links_from_working_directory() {
        let cfg = config(false, false);
        let placement = resolve_placement(&cfg, Path::new("/work"), Path::new(HOST));
        assert_eq!(placement.mode, PlacementMode::Symlinked);
        assert_eq!(placement.target_root, Path::new("/work"));
        assert!(placement.creates_link(&cfg));
        assert!(placement.is_indirect());
    }

    #[test]
    fn do_not_symlink_keeps_symlinked_mode_without_link() {
        let cfg = config(false, true);
        let placement = resolve_placement(&cfg, Path::new("/work"), Path::new(HOST));
        assert_eq!(placement.mode, PlacementMode::Symlinked);
        assert_eq!(placement.target_root, Path::new("/work"));
        assert!(!placement.creates_link(&cfg));
    }

    #[rstest]
    #[case("/work")]
    #[case("/support/Local")]
    #[case("/support/Local/addons")]
    fn resolution_is_deterministic(#[case] invocation: &str) {
        let cfg = config(false, false);
        let first = resolve_placement(&cfg, Path::new(invocation), Path::new(HOST));
        let second = resolve_placement(&cfg, Path::new(invocation), Path::new(HOST));
        assert_eq!(first, second);
    }
}
