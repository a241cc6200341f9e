//! Resolution pipeline: reads data files, applies deprecations, builds the
//! catalog.
//!
//! Provides format detection (RON/TOML/JSON), file discovery, and
//! deserialization helpers used by [`load_catalog`].

use crate::schema::InstallationTypeSpec;
use homestead_core::catalog::{Catalog, CatalogBuilder, CatalogError};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Base name (without extension) of the installation type data file.
pub const INSTALLATIONS_FILE: &str = "installations";

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur during data loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// A required data file was not found in the given directory.
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: String, dir: PathBuf },

    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// The parsed specs did not form a valid catalog.
    #[error("invalid catalog in {file}: {source}")]
    Catalog {
        file: PathBuf,
        #[source]
        source: CatalogError,
    },

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Scan a directory for a data file with the given base name (without
/// extension).
///
/// Looks for `{base_name}.ron`, `{base_name}.toml`, and `{base_name}.json`.
/// Returns `Ok(None)` if no file is found, or `Err(ConflictingFormats)` if
/// multiple formats exist for the same base name.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let extensions = ["ron", "toml", "json"];
    let mut found: Option<PathBuf> = None;

    for ext in &extensions {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if candidate.exists() {
            if let Some(ref existing) = found {
                return Err(DataLoadError::ConflictingFormats {
                    a: existing.clone(),
                    b: candidate,
                });
            }
            found = Some(candidate);
        }
    }

    Ok(found)
}

/// Like [`find_data_file`], but returns an error if no file is found.
pub fn require_data_file(dir: &Path, base_name: &str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name.to_string(),
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

/// Read a file and deserialize it according to its format (detected from
/// extension).
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| DataLoadError::Parse {
            file: path.to_path_buf(),
            detail: e.to_string(),
        }),
        Format::Json => serde_json::from_str(&content).map_err(|e| DataLoadError::Parse {
            file: path.to_path_buf(),
            detail: e.to_string(),
        }),
        Format::Toml => toml::from_str(&content).map_err(|e| DataLoadError::Parse {
            file: path.to_path_buf(),
            detail: e.to_string(),
        }),
    }
}

/// Deserialize a list from a file. For TOML files, extracts the array at the
/// given `toml_key` from a top-level table. For RON and JSON, deserializes
/// directly as `Vec<T>`.
pub fn deserialize_list<T: DeserializeOwned>(
    path: &Path,
    toml_key: &str,
) -> Result<Vec<T>, DataLoadError> {
    let format = detect_format(path)?;
    if format != Format::Toml {
        return deserialize_file(path);
    }

    let content = std::fs::read_to_string(path)?;
    let table: toml::Value = toml::from_str(&content).map_err(|e| DataLoadError::Parse {
        file: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    let array = table
        .get(toml_key)
        .ok_or_else(|| DataLoadError::Parse {
            file: path.to_path_buf(),
            detail: format!("missing key '{toml_key}' in TOML file"),
        })?
        .clone();
    array
        .try_into()
        .map_err(|e: toml::de::Error| DataLoadError::Parse {
            file: path.to_path_buf(),
            detail: e.to_string(),
        })
}

// ===========================================================================
// Catalog resolution
// ===========================================================================

/// Build a catalog from parsed specs: register every type, then apply the
/// deprecation flags in the builder's mutation phase.
pub fn catalog_from_specs(specs: &[InstallationTypeSpec]) -> Result<Catalog, CatalogError> {
    let mut builder = CatalogBuilder::new();
    for spec in specs {
        builder.register(spec.to_def());
    }
    for spec in specs {
        if spec.deprecated {
            builder.deprecate(&spec.name)?;
        }
        if let Some(at_block) = spec.deprecate_at {
            builder.schedule_deprecation(&spec.name, at_block)?;
        }
    }
    builder.build()
}

/// Load the installation catalog from a data directory.
pub fn load_catalog(dir: &Path) -> Result<Catalog, DataLoadError> {
    let path = require_data_file(dir, INSTALLATIONS_FILE)?;
    let specs: Vec<InstallationTypeSpec> = deserialize_list(&path, INSTALLATIONS_FILE)?;
    catalog_from_specs(&specs).map_err(|source| DataLoadError::Catalog { file: path, source })
}

// ===========================================================================
// Tests
// ===========================================================================
