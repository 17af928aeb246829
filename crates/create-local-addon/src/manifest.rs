//! Rewrites the extracted add-on's `package.json` to carry the chosen names.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::info;

use crate::host::MANIFEST_FILE;

const MANIFEST_TARGET: &str = "create_local_addon::manifest";

/// Errors raised while updating the add-on manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The manifest could not be read.
    #[error("failed to read manifest '{}'", path.display())]
    Read {
        /// Manifest path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The manifest is not valid JSON.
    #[error("manifest '{}' is not valid JSON", path.display())]
    Parse {
        /// Manifest path.
        path: PathBuf,
        /// Parser error.
        #[source]
        source: serde_json::Error,
    },
    /// The manifest parsed but is not a JSON object.
    #[error("manifest '{}' must contain a JSON object", path.display())]
    NotAnObject {
        /// Manifest path.
        path: PathBuf,
    },
    /// The updated manifest could not be serialised.
    #[error("failed to serialise manifest '{}'", path.display())]
    Serialise {
        /// Manifest path.
        path: PathBuf,
        /// Serialiser error.
        #[source]
        source: serde_json::Error,
    },
    /// The updated manifest could not be written back.
    #[error("failed to write manifest '{}'", path.display())]
    Write {
        /// Manifest path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Sets `name` and `slug` to `directory_name` and `productName` to
/// `display_name` in the manifest under `addon_path`.
///
/// Other keys keep their values and their order. The file is rewritten as
/// two-space indented JSON ending in a newline.
///
/// # Errors
///
/// Returns [`ManifestError`] when the manifest is missing, malformed, or
/// cannot be written.
pub fn update_manifest(
    addon_path: &Path,
    directory_name: &str,
    display_name: &str,
) -> Result<(), ManifestError> {
    let path = addon_path.join(MANIFEST_FILE);
    let text = fs::read_to_string(&path).map_err(|source| ManifestError::Read {
        path: path.clone(),
        source,
    })?;
    let mut document: Value = serde_json::from_str(&text).map_err(|source| {
        ManifestError::Parse {
            path: path.clone(),
            source,
        }
    })?;
    let Some(fields) = document.as_object_mut() else {
        return Err(ManifestError::NotAnObject { path });
    };
    apply_names(fields, directory_name, display_name);

    let rendered = render_pretty(&document).map_err(|source| ManifestError::Serialise {
        path: path.clone(),
        source,
    })?;
    fs::write(&path, rendered).map_err(|source| ManifestError::Write {
        path: path.clone(),
        source,
    })?;

    info!(
        target: MANIFEST_TARGET,
        path = %path.display(),
        name = directory_name,
        product_name = display_name,
        "manifest updated"
    );
    Ok(())
}

fn apply_names(fields: &mut Map<String, Value>, directory_name: &str, display_name: &str) {
    fields.insert("name".to_owned(), Value::from(directory_name));
    fields.insert("productName".to_owned(), Value::from(display_name));
    fields.insert("slug".to_owned(), Value::from(directory_name));
}

/// Serialises `value` with two-space indentation and a trailing newline.
pub(crate) fn render_pretty<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut buffer = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"  "));
    value.serialize(&mut serializer)?;
    buffer.push(b'\n');
    Ok(buffer)
}
