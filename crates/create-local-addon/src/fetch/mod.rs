//! Boilerplate download and extraction.
//!
//! The archive is streamed from its transport straight through a gzip
//! decoder into the tar reader, so nothing is buffered on disk. Only entries
//! under the archive's expected top-level folder are written, with that
//! folder stripped, into a directory that must not exist beforehand. Links
//! may only point at other entries of the add-on, and nothing is written
//! through an existing symbolic link. When anything fails after the
//! directory has been created it is removed again before the error is
//! returned.

mod cleanup;
mod transport;

use std::ffi::OsStr;
use std::fs;
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use tar::Archive;
use thiserror::Error;
use tracing::{debug, info};

use self::cleanup::PartialDirectory;
pub use self::cleanup::remove_tree;
use self::transport::TrackedSource;
pub use self::transport::{ArchiveTransport, HttpTransport};

pub(crate) const FETCH_TARGET: &str = "create_local_addon::fetch";

/// Errors raised while downloading or unpacking the boilerplate.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The archive could not be requested or the server refused it.
    #[error("failed to download '{url}': {message}")]
    Transport {
        /// Requested URL.
        url: String,
        /// Transport failure description.
        message: String,
    },
    /// The destination already exists.
    #[error("refusing to overwrite existing path '{}'", path.display())]
    TargetExists {
        /// Path that would have been written.
        path: PathBuf,
    },
    /// The parent of the destination could not be prepared.
    #[error("failed to prepare '{}'", path.display())]
    Prepare {
        /// Directory being created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The stream was not a usable archive or could not be written out.
    #[error("failed to extract archive into '{}': {message}", path.display())]
    Extract {
        /// Destination directory.
        path: PathBuf,
        /// What went wrong.
        message: String,
        /// Underlying I/O error, when there is one.
        #[source]
        source: Option<io::Error>,
    },
}

impl FetchError {
    fn extract(path: &Path, message: impl Into<String>, source: Option<io::Error>) -> Self {
        Self::Extract {
            path: path.to_path_buf(),
            message: message.into(),
            source,
        }
    }
}

/// Where and how the boilerplate is unpacked.
#[derive(Debug, Clone, Copy)]
pub struct FetchRequest<'a> {
    /// Archive URL.
    pub url: &'a str,
    /// Top-level folder every archive entry lives under.
    pub archive_root: &'a str,
    /// Directory the add-on directory is created in.
    pub target_root: &'a Path,
    /// Name of the add-on directory.
    pub directory_name: &'a str,
}

impl FetchRequest<'_> {
    /// Full path of the add-on directory.
    #[must_use]
    pub fn destination(&self) -> PathBuf {
        self.target_root.join(self.directory_name)
    }
}

/// Downloads the archive and unpacks it into the requested directory.
///
/// Returns the path of the populated add-on directory.
///
/// # Errors
///
/// Returns [`FetchError::TargetExists`] if the destination is already
/// present, [`FetchError::Transport`] when the download fails or the
/// connection drops mid-stream, and [`FetchError::Extract`] when the stream
/// cannot be unpacked. Once the directory exists, any failure removes it
/// again before returning.
pub fn fetch_and_place<T>(transport: &T, request: &FetchRequest<'_>) -> Result<PathBuf, FetchError>
where
    T: ArchiveTransport + ?Sized,
{
    let destination = request.destination();
    if fs::symlink_metadata(&destination).is_ok() {
        return Err(FetchError::TargetExists { path: destination });
    }
    fs::create_dir_all(request.target_root).map_err(|source| FetchError::Prepare {
        path: request.target_root.to_path_buf(),
        source,
    })?;

    info!(target: FETCH_TARGET, url = request.url, "downloading boilerplate");
    let stream = transport.open(request.url)?;

    let partial = PartialDirectory::create(&destination).map_err(|source| {
        if source.kind() == io::ErrorKind::AlreadyExists {
            FetchError::TargetExists {
                path: destination.clone(),
            }
        } else {
            FetchError::Prepare {
                path: destination.clone(),
                source,
            }
        }
    })?;
    let source = TrackedSource::new(stream);
    let failure = source.failure();
    let written = unpack(source, request.archive_root, partial.path()).map_err(|error| {
        // A broken connection surfaces as a decoder or tar error.
        match failure.take() {
            Some(message) => FetchError::Transport {
                url: request.url.to_owned(),
                message,
            },
            None => error,
        }
    })?;
    info!(
        target: FETCH_TARGET,
        path = %destination.display(),
        entries = written,
        "boilerplate extracted"
    );
    Ok(partial.keep())
}

/// Unpacks a gzip-compressed tar stream, returning the number of entries
/// written below `destination`.
fn unpack<R: Read>(stream: R, archive_root: &str, destination: &Path) -> Result<usize, FetchError> {
    let mut archive = Archive::new(GzDecoder::new(stream));
    archive.set_preserve_mtime(true);
    let entries = archive
        .entries()
        .map_err(|error| FetchError::extract(destination, "unreadable archive", Some(error)))?;

    let mut written = 0_usize;
    for entry in entries {
        let mut entry = entry.map_err(|error| {
            FetchError::extract(destination, "corrupt archive entry", Some(error))
        })?;
        if entry.header().entry_type().is_pax_global_extensions() {
            continue;
        }
        let raw = entry
            .path()
            .map_err(|error| FetchError::extract(destination, "unreadable entry path", Some(error)))?
            .into_owned();
        let Some(relative) = strip_archive_root(&raw, archive_root)
            .map_err(|message| FetchError::extract(destination, message, None))?
        else {
            continue;
        };

        refuse_linked_components(destination, &relative)?;
        let output = destination.join(&relative);
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent).map_err(|error| {
                FetchError::extract(
                    destination,
                    format!("cannot create '{}'", parent.display()),
                    Some(error),
                )
            })?;
        }

        let kind = entry.header().entry_type();
        let link = if kind.is_symlink() || kind.is_hard_link() {
            entry
                .link_name()
                .map_err(|error| {
                    FetchError::extract(destination, "unreadable link target", Some(error))
                })?
                .map(std::borrow::Cow::into_owned)
        } else {
            None
        };
        let outcome = match (kind.is_hard_link(), link) {
            (true, Some(link)) => {
                let source = hard_link_source(&link, archive_root, destination, &relative)?;
                fs::hard_link(source, &output)
            }
            (_, Some(link)) => {
                check_symlink_target(&link, destination, &relative)?;
                entry.unpack(&output).map(drop)
            }
            (true, None) => {
                return Err(FetchError::extract(
                    destination,
                    format!("link '{}' has no target", relative.display()),
                    None,
                ));
            }
            (false, None) => entry.unpack(&output).map(drop),
        };
        outcome.map_err(|error| {
            FetchError::extract(
                destination,
                format!("cannot write '{}'", relative.display()),
                Some(error),
            )
        })?;
        debug!(target: FETCH_TARGET, entry = %relative.display(), "unpacked");
        written += 1;
    }

    if written == 0 {
        return Err(FetchError::extract(
            destination,
            format!("archive has no entries under '{archive_root}'"),
            None,
        ));
    }
    Ok(written)
}

/// Fails when any existing path between `destination` and the entry is a
/// symbolic link, so no write is ever redirected through one.
fn refuse_linked_components(destination: &Path, relative: &Path) -> Result<(), FetchError> {
    let mut current = destination.to_path_buf();
    for component in relative.components() {
        current.push(component);
        match fs::symlink_metadata(&current) {
            Ok(metadata) if metadata.file_type().is_symlink() => {
                return Err(FetchError::extract(
                    destination,
                    format!("entry '{}' would be written through a link", relative.display()),
                    None,
                ));
            }
            Ok(_) => {}
            Err(error) if error.kind() == io::ErrorKind::NotFound => break,
            Err(error) => {
                return Err(FetchError::extract(
                    destination,
                    format!("cannot inspect '{}'", current.display()),
                    Some(error),
                ));
            }
        }
    }
    Ok(())
}

/// Symbolic links must stay relative and must not climb out of their folder.
fn check_symlink_target(link: &Path, destination: &Path, relative: &Path) -> Result<(), FetchError> {
    let escapes = link
        .components()
        .any(|component| !matches!(component, Component::Normal(_) | Component::CurDir));
    if escapes || link.as_os_str().is_empty() {
        return Err(FetchError::extract(
            destination,
            format!(
                "link '{}' points outside the add-on ('{}')",
                relative.display(),
                link.display()
            ),
            None,
        ));
    }
    Ok(())
}

/// Resolves a hard link's target, which names another archive entry, to a
/// path inside `destination`.
fn hard_link_source(
    link: &Path,
    archive_root: &str,
    destination: &Path,
    relative: &Path,
) -> Result<PathBuf, FetchError> {
    let outside = || {
        FetchError::extract(
            destination,
            format!(
                "link '{}' points outside the add-on ('{}')",
                relative.display(),
                link.display()
            ),
            None,
        )
    };
    let target = strip_archive_root(link, archive_root)
        .map_err(|_| outside())?
        .ok_or_else(outside)?;
    refuse_linked_components(destination, &target)?;
    Ok(destination.join(target))
}

/// Maps an archive entry path to its location relative to the add-on root.
///
/// Returns `Ok(None)` for the top-level folder itself and an error for
/// entries outside it or paths that would escape the destination.
fn strip_archive_root(path: &Path, archive_root: &str) -> Result<Option<PathBuf>, String> {
    let mut components = path
        .components()
        .filter(|component| !matches!(component, Component::CurDir));
    match components.next() {
        Some(Component::Normal(first)) if first == OsStr::new(archive_root) => {}
        _ => {
            return Err(format!(
                "entry '{}' is outside the expected folder '{archive_root}'",
                path.display()
            ));
        }
    }

    let mut relative = PathBuf::new();
    for component in components {
        match component {
            Component::Normal(part) => relative.push(part),
            _ => {
                return Err(format!(
                    "entry '{}' escapes the destination",
                    path.display()
                ));
            }
        }
    }
    Ok((!relative.as_os_str().is_empty()).then_some(relative))
}
