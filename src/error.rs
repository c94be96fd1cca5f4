//! Error taxonomies for resolution and store failures.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Why a single row's price could not be resolved.
///
/// Every variant folds into the unmatched sentinel at the batch level; none
/// of them aborts a run.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ResolveError {
    #[error("identity cannot be mapped to a lookup key for this source")]
    UnsupportedIdentity,

    #[error("page did not become ready within {0:?}")]
    RemoteTimeout(Duration),

    #[error("remote request failed: {0}")]
    Remote(String),

    #[error("could not parse a price from {0:?}")]
    ParseFailure(String),
}

impl ResolveError {
    /// True for failures worth another attempt under the retry policy.
    pub fn is_transient(&self) -> bool {
        matches!(self, ResolveError::RemoteTimeout(_) | ResolveError::Remote(_))
    }
}

/// Store-level failures. `Missing` and `Locked` (past the retry budget) are
/// the only errors that abort a whole run.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("workbook not found at {0}")]
    Missing(PathBuf),

    #[error("no sheet named {0:?}")]
    UnknownSheet(String),

    #[error("destination is locked by another process")]
    Locked,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}
