//! Phases of a run and the state carried between them.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use crate::activation::ActivationOutcome;
use crate::host::{AddonInventory, HostInstallation};
use crate::naming::ResolvedNames;
use crate::placement::Placement;

/// Pipeline phases, in the only order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    /// Locating the host and deciding placement.
    Initializing,
    /// Negotiating names.
    Prompting,
    /// Fetching the boilerplate and updating its manifest.
    Writing,
    /// Linking, building and enabling.
    Installing,
    /// Terminal phase.
    Ending,
}

impl Phase {
    /// The phase that follows this one, if any.
    #[must_use]
    pub const fn successor(self) -> Option<Self> {
        match self {
            Self::Initializing => Some(Self::Prompting),
            Self::Prompting => Some(Self::Writing),
            Self::Writing => Some(Self::Installing),
            Self::Installing => Some(Self::Ending),
            Self::Ending => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Initializing => "initializing",
            Self::Prompting => "prompting",
            Self::Writing => "writing",
            Self::Installing => "installing",
            Self::Ending => "ending",
        })
    }
}

/// What the run targets once the host has been found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Selected host installation.
    pub host: HostInstallation,
    /// Where the add-on's files go.
    pub placement: Placement,
    /// Add-ons already installed under the host.
    pub inventory: AddonInventory,
    /// Entries of the working directory when it receives the files.
    pub working_entries: Option<BTreeSet<String>>,
}

/// Session state, tagged by the phase about to run.
///
/// Each variant carries exactly what the phases so far have produced, so a
/// later phase cannot observe a value that was never computed.
#[derive(Debug)]
pub enum SessionState {
    /// Nothing resolved yet.
    Initializing,
    /// Host and placement resolved.
    Prompting {
        /// Resolved target.
        target: Target,
    },
    /// Names agreed.
    Writing {
        /// Resolved target.
        target: Target,
        /// Agreed names.
        names: ResolvedNames,
    },
    /// Files on disk with the manifest updated.
    Installing {
        /// Resolved target.
        target: Target,
        /// Agreed names.
        names: ResolvedNames,
        /// Populated add-on directory.
        addon_path: PathBuf,
    },
    /// Run finished.
    Ending(Completion),
}

impl SessionState {
    /// The phase this state is waiting to run.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        match self {
            Self::Initializing => Phase::Initializing,
            Self::Prompting { .. } => Phase::Prompting,
            Self::Writing { .. } => Phase::Writing,
            Self::Installing { .. } => Phase::Installing,
            Self::Ending(_) => Phase::Ending,
        }
    }
}

/// Report of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Host installation the add-on was registered with.
    pub host: HostInstallation,
    /// Placement that was used.
    pub placement: Placement,
    /// Agreed names.
    pub names: ResolvedNames,
    /// Directory holding the add-on's files.
    pub addon_path: PathBuf,
    /// Result of the link, build and enable steps.
    pub activation: ActivationOutcome,
}
