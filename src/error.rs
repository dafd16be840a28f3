//! Error types for the voice archive
//!
//! Every public operation returns a tagged result. Read failures never show
//! up here: reads degrade to defaults or an empty collection instead.

use std::path::PathBuf;
use thiserror::Error;

/// Boxed error used by the database layer
pub type DynError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for archive operations
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Stage at which an admission failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionStage {
    /// Copying the temporary audio file into the managed directory
    Copy,
    /// Appending the metadata record
    Persist,
}

impl std::fmt::Display for AdmissionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdmissionStage::Copy => write!(f, "copy"),
            AdmissionStage::Persist => write!(f, "persist"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("failed to initialize archive at {path}: {source}")]
    Initialization {
        path: PathBuf,
        #[source]
        source: DynError,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("recording not saved ({stage} failed): {source}")]
    Admission {
        stage: AdmissionStage,
        #[source]
        source: DynError,
    },

    #[error("failed to persist {what}: {source}")]
    Persist {
        what: &'static str,
        #[source]
        source: DynError,
    },

    #[error("failed to delete recording file {path}: {source}")]
    Delete {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("playback failed for {path}: {reason}")]
    Playback { path: PathBuf, reason: String },

    #[error("configuration error: {0}")]
    Config(String),
}

impl ArchiveError {
    /// Critical failures are the ones forwarded to the error reporter
    pub fn is_critical(&self) -> bool {
        matches!(self, ArchiveError::Admission { .. })
    }
}
