//! Name negotiation for the new add-on.
//!
//! Resolves a display name and a directory name, prompting for whichever was
//! not supplied and re-prompting for the directory name until it collides
//! with nothing the host or the working directory already holds.

pub mod prompt;

use std::collections::BTreeSet;
use std::fmt;

use tracing::{info, warn};

pub use prompt::{Prompt, PromptError, Prompter, StdioPrompter};

const NAMING_TARGET: &str = "create_local_addon::naming";

/// Display name offered when none was supplied.
pub const DEFAULT_DISPLAY_NAME: &str = "Local Add-on";

const DISPLAY_NAME_QUESTION: &str = "Product name for the new add-on";
const DIRECTORY_NAME_QUESTION: &str = "Directory name for the new add-on";

/// Names already taken, checked against every directory-name candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Occupancy {
    /// Display names of installed add-ons.
    pub display_names: BTreeSet<String>,
    /// Entries of the host's add-ons directory.
    pub directories: BTreeSet<String>,
    /// Entries of the working directory; only set for linked placement.
    pub working_entries: Option<BTreeSet<String>>,
}

/// Why a directory-name candidate was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conflict {
    /// Empty, or hidden from the host by a leading dot.
    Unusable,
    /// Matches an installed add-on's display name.
    DisplayName,
    /// Matches an entry of the host's add-ons directory.
    Directory,
    /// Matches an entry of the working directory.
    WorkingDirectory,
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unusable => "is not a usable directory name",
            Self::DisplayName => "matches the name of an installed add-on",
            Self::Directory => "is already taken in the add-ons directory",
            Self::WorkingDirectory => "already exists in the current directory",
        })
    }
}

impl Occupancy {
    /// First reason `candidate` cannot be used, if any.
    #[must_use]
    pub fn conflict(&self, candidate: &str) -> Option<Conflict> {
        if candidate.is_empty() || candidate.starts_with('.') {
            return Some(Conflict::Unusable);
        }
        if self.display_names.contains(candidate) {
            return Some(Conflict::DisplayName);
        }
        if self.directories.contains(candidate) {
            return Some(Conflict::Directory);
        }
        if self
            .working_entries
            .as_ref()
            .is_some_and(|entries| entries.contains(candidate))
        {
            return Some(Conflict::WorkingDirectory);
        }
        None
    }
}

/// Outcome of negotiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedNames {
    /// Human-facing product name.
    pub display_name: String,
    /// Directory and internal package name.
    pub directory_name: String,
}

/// Collapses whitespace and path-separator runs into single hyphens.
///
/// Surrounding whitespace is dropped first. Applying it twice changes
/// nothing.
#[must_use]
pub fn sanitize_directory_name(raw: &str) -> String {
    let mut sanitized = String::with_capacity(raw.len());
    let mut in_run = false;
    for ch in raw.trim().chars() {
        if ch.is_whitespace() || ch == '/' || ch == '\\' {
            if !in_run {
                sanitized.push('-');
                in_run = true;
            }
        } else {
            sanitized.push(ch);
            in_run = false;
        }
    }
    sanitized
}

/// Directory name suggested for `display_name`.
#[must_use]
pub fn default_directory_name(display_name: &str) -> String {
    sanitize_directory_name(&display_name.to_lowercase())
}

/// Resolves a unique pair of names.
///
/// Supplied names are used without prompting when acceptable. The loop only
/// ends on a directory name free of every [`Occupancy`] set; there is no
/// retry limit.
///
/// # Errors
///
/// Returns [`PromptError`] when the prompter can no longer produce answers.
pub fn negotiate<P: Prompter + ?Sized>(
    proposed_display: Option<&str>,
    proposed_directory: Option<&str>,
    occupancy: &Occupancy,
    prompter: &mut P,
) -> Result<ResolvedNames, PromptError> {
    let display_name = match proposed_display.map(str::trim).filter(|name| !name.is_empty()) {
        Some(name) => name.to_owned(),
        None => {
            let prompt = Prompt::new(DISPLAY_NAME_QUESTION, DEFAULT_DISPLAY_NAME);
            prompt.resolve(&prompter.ask(&prompt)?)
        }
    };

    let directory_prompt = Prompt::new(
        DIRECTORY_NAME_QUESTION,
        default_directory_name(&display_name),
    );
    let mut directory_name = match proposed_directory {
        Some(raw) => sanitize_reporting(raw),
        None => ask_directory_name(&directory_prompt, prompter)?,
    };

    while let Some(conflict) = occupancy.conflict(&directory_name) {
        warn!(
            target: NAMING_TARGET,
            directory = %directory_name,
            "directory name {conflict}; choose another"
        );
        directory_name = ask_directory_name(&directory_prompt, prompter)?;
    }

    if occupancy.display_names.contains(&display_name) {
        warn!(
            target: NAMING_TARGET,
            display = %display_name,
            "another installed add-on already uses this product name"
        );
    }

    info!(
        target: NAMING_TARGET,
        display = %display_name,
        directory = %directory_name,
        "add-on names resolved"
    );
    Ok(ResolvedNames {
        display_name,
        directory_name,
    })
}

fn ask_directory_name<P: Prompter + ?Sized>(
    prompt: &Prompt,
    prompter: &mut P,
) -> Result<String, PromptError> {
    let answer = prompt.resolve(&prompter.ask(prompt)?);
    Ok(sanitize_reporting(&answer))
}

fn sanitize_reporting(raw: &str) -> String {
    let sanitized = sanitize_directory_name(raw);
    if sanitized != raw.trim() {
        warn!(
            target: NAMING_TARGET,
            requested = %raw,
            using = %sanitized,
            "directory name contained spaces or separators; substituted hyphens"
        );
    }
    sanitized
}
