use crate::catalog::schema::{Catalog, ValidationError};
use crate::template::TemplateError;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failure to turn a catalog file into passes.
///
/// Every variant that can arise from catalog text carries the catalog's
/// path once it is known, so a message always names the offending file.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("cannot read idiom catalog {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("idiom catalog{} is not valid TOML: {source}", origin(path))]
    Toml {
        path: Option<PathBuf>,
        source: toml_edit::de::Error,
    },

    #[error("idiom catalog{} is invalid: {source}", origin(path))]
    Validation {
        path: Option<PathBuf>,
        source: ValidationError,
    },

    #[error("idiom '{id}'{} does not compile: {source}", origin(path))]
    Template {
        id: String,
        path: Option<PathBuf>,
        source: TemplateError,
    },
}

impl CatalogError {
    /// The catalog file this error came from, when known.
    pub fn path(&self) -> Option<&Path> {
        match self {
            CatalogError::Io { path, .. } => Some(path),
            CatalogError::Toml { path, .. }
            | CatalogError::Validation { path, .. }
            | CatalogError::Template { path, .. } => path.as_deref(),
        }
    }

    /// Attach `path` unless the error already names a file.
    pub(crate) fn with_path(mut self, path: &Path) -> Self {
        match &mut self {
            CatalogError::Io { .. } => {}
            CatalogError::Toml { path: slot, .. }
            | CatalogError::Validation { path: slot, .. }
            | CatalogError::Template { path: slot, .. } => {
                slot.get_or_insert_with(|| path.to_path_buf());
            }
        }
        self
    }
}

fn origin(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|path| format!(" {}", path.display()))
        .unwrap_or_default()
}

/// Parse and validate catalog text.
pub fn load_from_str(input: &str) -> Result<Catalog, CatalogError> {
    let catalog: Catalog = toml_edit::de::from_str(input)
        .map_err(|source| CatalogError::Toml { path: None, source })?;
    catalog
        .validate()
        .map_err(|source| CatalogError::Validation { path: None, source })?;
    Ok(catalog)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<Catalog, CatalogError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents).map_err(|error| error.with_path(path))
}
