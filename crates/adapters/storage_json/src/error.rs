//! Storage-specific error type wrapping filesystem errors.

use std::path::PathBuf;

use slingwatch_domain::error::SlingError;

/// Errors originating from the JSON file store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading or removing the snapshot file failed.
    #[error("snapshot file error")]
    Io(#[from] std::io::Error),

    /// Every write attempt failed.
    #[error("unable to write {path} after {attempts} attempts")]
    Write {
        path: PathBuf,
        attempts: u32,
        #[source]
        source: std::io::Error,
    },
}

impl From<StoreError> for SlingError {
    fn from(err: StoreError) -> Self {
        Self::Storage(Box::new(err))
    }
}
