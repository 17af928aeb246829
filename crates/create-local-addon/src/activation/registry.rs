//! The host's enabled-add-ons registry.

use std::fs;
use std::io;
use std::path::Path;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info};

use crate::manifest::render_pretty;

const ENABLE_TARGET: &str = "create_local_addon::activation::registry";

/// Failures reading or writing the enabled-add-ons file.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The file exists but could not be read.
    #[error("read failed")]
    Read(#[source] io::Error),
    /// The file is not valid JSON.
    #[error("invalid JSON")]
    Parse(#[source] serde_json::Error),
    /// The file holds something other than a JSON object.
    #[error("expected a JSON object mapping add-on names to booleans")]
    NotAnObject,
    /// The updated map could not be serialised.
    #[error("serialisation failed")]
    Serialise(#[source] serde_json::Error),
    /// The file could not be written.
    #[error("write failed")]
    Write(#[source] io::Error),
}

/// Marks `directory_name` as enabled in the registry at `path`.
///
/// A missing file is treated as an empty registry. Existing entries keep
/// their values and order.
///
/// # Errors
///
/// Returns [`RegistryError`] when the file cannot be read, parsed or
/// written. Nothing is written when reading fails.
pub fn enable_addon(path: &Path, directory_name: &str) -> Result<(), RegistryError> {
    let mut entries = read_registry(path)?;
    entries.insert(directory_name.to_owned(), Value::Bool(true));
    let rendered = render_pretty(&entries).map_err(RegistryError::Serialise)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(RegistryError::Write)?;
    }
    fs::write(path, rendered).map_err(RegistryError::Write)?;
    info!(
        target: ENABLE_TARGET,
        addon = directory_name,
        registry = %path.display(),
        "add-on enabled"
    );
    Ok(())
}

fn read_registry(path: &Path) -> Result<Map<String, Value>, RegistryError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            debug!(
                target: ENABLE_TARGET,
                registry = %path.display(),
                "registry missing; starting empty"
            );
            return Ok(Map::new());
        }
        Err(error) => return Err(RegistryError::Read(error)),
    };
    if text.trim().is_empty() {
        return Ok(Map::new());
    }
    match serde_json::from_str(&text).map_err(RegistryError::Parse)? {
        Value::Object(entries) => Ok(entries),
        _ => Err(RegistryError::NotAnObject),
    }
}
