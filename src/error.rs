// SPDX-License-Identifier: PMPL-1.0-or-later

//! Error taxonomy for catalog operations.
//!
//! Every failure is a synchronous signal to the caller. Nothing here is
//! retried internally; batch operations either reject the whole batch up
//! front or proceed record by record.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    /// A directory that must already exist (catalog root, zip target dir,
    /// scan path) is missing.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("no extractor registered for extension \"{extension}\" ({path})")]
    UnknownExtractor { extension: String, path: PathBuf },

    /// Dynamic flush with an empty queue. Guards against mass-disabling a
    /// domain by accident.
    #[error("tried to save dynamic messages but none were queued")]
    MissingMessages,

    #[error("invalid translation batch: {0}")]
    InvalidTranslation(String),

    #[error("locale {0} was not found in config")]
    UnsupportedLocale(String),

    #[error("domain {0} was not found in config")]
    UnsupportedDomain(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("malformed catalog: {0}")]
    MalformedCatalog(String),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
}

impl CatalogError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CatalogError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
