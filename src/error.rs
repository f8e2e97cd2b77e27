//! Error taxonomy for the record store and lifecycle coordinator

use crate::agent::GenerationError;
use crate::types::EntityKind;

/// Errors surfaced to the presentation layer
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No record with this kind and id exists
    #[error("{kind} '{id}' not found")]
    NotFound { kind: EntityKind, id: String },

    /// The record exists but could not be parsed
    #[error("{kind} '{id}' is corrupt: {reason}")]
    CorruptRecord {
        kind: EntityKind,
        id: String,
        reason: String,
    },

    /// The id cannot be used as part of a record filename
    #[error("invalid record id '{0}'")]
    InvalidId(String),

    /// A prerequisite entity is absent
    #[error("missing input: {0}")]
    MissingInput(String),

    /// The roadmap version counter cannot advance
    #[error("roadmap '{id}' is already at version {version} and cannot be revised further")]
    VersionLimit { id: String, version: u32 },

    /// The generation backend failed
    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),

    /// Filesystem failure while reading or writing records
    #[error("storage I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Error::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
