//! Storage ports consumed by the matching core.
//!
//! The core is independent of any storage technology; collaborators inject
//! implementations of these traits. [`memory`] provides hash-map backed
//! implementations for tests and for embedding without a backend.

pub mod memory;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Alert, Geofence, Incident};

/// A failure from a storage collaborator.
///
/// The transient/permanent split drives the dispatcher's retry decision:
/// only transient failures are retried.
#[derive(Debug, Clone, Error)]
pub enum RepositoryError {
    /// Worth retrying: timeouts, dropped connections, backend overload
    #[error("transient storage failure: {message}")]
    Transient { message: String },

    /// Not worth retrying: constraint violations, malformed requests
    #[error("storage failure: {message}")]
    Permanent { message: String },
}

impl RepositoryError {
    pub fn transient(message: impl Into<String>) -> Self {
        RepositoryError::Transient {
            message: message.into(),
        }
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        RepositoryError::Permanent {
            message: message.into(),
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, RepositoryError::Transient { .. })
    }
}

/// Result of an atomic insert-if-absent on the alert store.
#[derive(Debug, Clone)]
pub enum AlertInsert {
    Created(Alert),
    /// An alert with the same (incident_id, geofence_id) key already exists
    Exists,
}

impl AlertInsert {
    pub fn created(&self) -> bool {
        matches!(self, AlertInsert::Created(_))
    }
}

#[async_trait]
pub trait GeofenceRepository: Send + Sync {
    /// All geofences currently eligible for matching. Feeds index rebuilds.
    async fn list_active(&self) -> Result<Vec<Geofence>, RepositoryError>;
}

#[async_trait]
pub trait IncidentRepository: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<Incident>, RepositoryError>;

    async fn insert(&self, incident: Incident) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait AlertRepository: Send + Sync {
    /// Atomically create an alert keyed by (incident_id, geofence_id) unless
    /// one already exists.
    ///
    /// This is the primitive the dedup contract rests on: uniqueness must be
    /// enforced by the store itself (unique constraint or equivalent), not
    /// by callers, because concurrent triggers may race on the same key.
    async fn create_if_absent(
        &self,
        incident_id: Uuid,
        geofence_id: Uuid,
    ) -> Result<AlertInsert, RepositoryError>;
}
