//! The installation pipeline.
//!
//! [`Pipeline::run`] drives a [`SessionState`] through the phases of
//! [`Phase`] in order. Every transition consumes the previous state and
//! returns the next one; a fatal error ends the run on the spot. Each phase
//! cleans up whatever partial state it created itself.

mod error;
mod state;

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use addon_config::Config;
use tracing::{debug, info, warn};

pub use self::error::{ErrorClass, PipelineError};
pub use self::state::{Completion, Phase, SessionState, Target};
use crate::activation::{ActivationRequest, BuildRunner, activate};
use crate::fetch::{ArchiveTransport, FetchRequest, fetch_and_place};
use crate::host::{
    AddonInventory, application_support_dir, choose_installation, locate_installations,
};
use crate::manifest::update_manifest;
use crate::naming::{Occupancy, Prompter, ResolvedNames, negotiate};
use crate::placement::resolve_placement;

const PIPELINE_TARGET: &str = "create_local_addon::pipeline";

/// Names supplied on the command line and the directory the run started in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    /// Proposed display name.
    pub product_name: Option<String>,
    /// Proposed directory name.
    pub directory_name: Option<String>,
    /// Working directory of the process.
    pub working_dir: PathBuf,
}

/// One run of the installer with its collaborators.
pub struct Pipeline<'a> {
    config: &'a Config,
    invocation: Invocation,
    prompter: &'a mut dyn Prompter,
    transport: &'a dyn ArchiveTransport,
    builder: &'a dyn BuildRunner,
}

impl<'a> Pipeline<'a> {
    /// Assembles a run.
    pub fn new(
        config: &'a Config,
        invocation: Invocation,
        prompter: &'a mut dyn Prompter,
        transport: &'a dyn ArchiveTransport,
        builder: &'a dyn BuildRunner,
    ) -> Self {
        Self {
            config,
            invocation,
            prompter,
            transport,
            builder,
        }
    }

    /// Runs every phase to completion.
    ///
    /// # Errors
    ///
    /// Returns the [`PipelineError`] of the first phase that fails fatally.
    pub fn run(mut self) -> Result<Completion, PipelineError> {
        let mut state = SessionState::Initializing;
        loop {
            let phase = state.phase();
            state = match self.transition(state) {
                Ok(SessionState::Ending(completion)) => {
                    debug_assert_eq!(phase.successor(), Some(Phase::Ending));
                    debug!(
                        target: PIPELINE_TARGET,
                        from = %phase,
                        to = %Phase::Ending,
                        "phase complete"
                    );
                    return Ok(completion);
                }
                Ok(next) => next,
                Err(error) => {
                    debug!(
                        target: PIPELINE_TARGET,
                        %phase,
                        class = %error.class(),
                        "phase failed"
                    );
                    return Err(error);
                }
            };
            debug_assert_eq!(phase.successor(), Some(state.phase()), "phase skipped");
            debug!(target: PIPELINE_TARGET, from = %phase, to = %state.phase(), "phase complete");
        }
    }

    /// Runs the phase `state` is waiting for and returns the following state.
    fn transition(&mut self, state: SessionState) -> Result<SessionState, PipelineError> {
        match state {
            SessionState::Initializing => Ok(SessionState::Prompting {
                target: self.initialise()?,
            }),
            SessionState::Prompting { target } => {
                let names = self.negotiate_names(&target)?;
                Ok(SessionState::Writing { target, names })
            }
            SessionState::Writing { target, names } => {
                let addon_path =
                    self.write_addon(&target, &names.directory_name, &names.display_name)?;
                Ok(SessionState::Installing {
                    target,
                    names,
                    addon_path,
                })
            }
            SessionState::Installing {
                target,
                names,
                addon_path,
            } => {
                let activation = activate(
                    &ActivationRequest {
                        host: &target.host,
                        addon_path: &addon_path,
                        directory_name: &names.directory_name,
                        create_link: target.placement.creates_link(self.config),
                        enable: self.config.should_enable(),
                    },
                    self.builder,
                )?;
                Ok(SessionState::Ending(Completion {
                    host: target.host,
                    placement: target.placement,
                    names,
                    addon_path,
                    activation,
                }))
            }
            SessionState::Ending(completion) => Ok(SessionState::Ending(completion)),
        }
    }

    fn initialise(&self) -> Result<Target, PipelineError> {
        let app_support =
            application_support_dir(self.config).ok_or(PipelineError::NoApplicationSupport)?;
        let found = locate_installations(&app_support);
        let host = choose_installation(&app_support, &found, self.config.prefer_beta)
            .ok_or_else(|| PipelineError::NoInstallation {
                searched: app_support.clone(),
            })?;

        let invocation_dir = canonical_or_given(&self.invocation.working_dir);
        let host_root = canonical_or_given(host.root());
        let placement = resolve_placement(self.config, &invocation_dir, &host_root);
        if placement.forced_direct {
            warn!(
                target: PIPELINE_TARGET,
                addons_dir = %placement.target_root.display(),
                "running inside the host's add-ons directory; placing the add-on directly"
            );
        }
        info!(
            target: PIPELINE_TARGET,
            mode = %placement.mode,
            target_root = %placement.target_root.display(),
            "placement resolved"
        );

        let inventory = AddonInventory::scan_or_empty(&host.addons_dir());
        let working_entries = placement
            .is_indirect()
            .then(|| working_entries(&placement.target_root));
        Ok(Target {
            host,
            placement,
            inventory,
            working_entries,
        })
    }

    fn negotiate_names(&mut self, target: &Target) -> Result<ResolvedNames, PipelineError> {
        let occupancy = Occupancy {
            display_names: target.inventory.display_names(),
            directories: target.inventory.directories().clone(),
            working_entries: target.working_entries.clone(),
        };
        negotiate(
            self.invocation.product_name.as_deref(),
            self.invocation.directory_name.as_deref(),
            &occupancy,
            &mut *self.prompter,
        )
        .map_err(PipelineError::from)
    }

    fn write_addon(
        &self,
        target: &Target,
        directory_name: &str,
        display_name: &str,
    ) -> Result<PathBuf, PipelineError> {
        let addon_path = fetch_and_place(
            self.transport,
            &FetchRequest {
                url: &self.config.archive_url,
                archive_root: &self.config.archive_root,
                target_root: &target.placement.target_root,
                directory_name,
            },
        )?;
        update_manifest(&addon_path, directory_name, display_name)?;
        Ok(addon_path)
    }
}

fn canonical_or_given(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Names present in the working directory, empty when it cannot be read.
fn working_entries(dir: &Path) -> BTreeSet<String> {
    let read = || -> io::Result<BTreeSet<String>> {
        let mut names = BTreeSet::new();
        for entry in fs::read_dir(dir)? {
            names.insert(entry?.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    };
    read().unwrap_or_else(|error| {
        warn!(
            target: PIPELINE_TARGET,
            path = %dir.display(),
            %error,
            "could not list the working directory; assuming it is empty"
        );
        BTreeSet::new()
    })
}
