//! Revisit store module
//!
//! This module decides whether a resource must be (re)downloaded:
//! - `RevisitStore`: persisted URI → expiry map with an explicit lifecycle
//! - `Expiry`: recorded expiry values, including "never" and "unspecified"
//! - `expiry_from_headers`: derives the next expiry from caching headers
//! - `persist`: the versioned on-disk state format

mod expiry;
pub mod persist;
mod revisit;

pub use expiry::{expiry_from_headers, Expiry};
pub use revisit::{ExpiredUris, RevisitStore, NEVER_EXPIRES_YEARS, STATE_FILE};

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during revisit store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Cannot use revisit store: not initialized. Maybe the initialization failed?")]
    NotInitialized,

    #[error("Cannot initialize revisit store: already initialized")]
    AlreadyInitialized,

    #[error("Revisit store lock poisoned")]
    Poisoned,

    #[error("Invalid data folder: {0}")]
    InvalidDataDir(String),

    #[error("IO error on '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed revisit state at line {line}: {message}")]
    Format { line: usize, message: String },
}

impl StoreError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result type for revisit store operations
pub type StoreResult<T> = Result<T, StoreError>;
