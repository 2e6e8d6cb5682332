//! Error taxonomy for the matching core.

use thiserror::Error;
use uuid::Uuid;

use crate::repository::RepositoryError;

/// Errors surfaced by the matching and dispatch operations.
///
/// Per-geofence alert failures are deliberately NOT represented here; they
/// are reported inside the dispatch result list so partial success stays
/// visible to the caller.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed point or shape data. Rejected before matching, never retried.
    #[error("invalid geometry: {reason}")]
    InvalidGeometry { reason: String },

    /// Re-evaluation was requested for an incident that does not exist.
    #[error("incident {id} not found")]
    IncidentNotFound { id: Uuid },

    /// A collaborator failed before dispatch could start.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl Error {
    pub fn invalid_geometry(reason: impl Into<String>) -> Self {
        Error::InvalidGeometry {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
