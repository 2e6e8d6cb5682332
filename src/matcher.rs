//! Incident-to-geofence matching.

use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::error::Result;
use crate::index::GeofenceIndex;
use crate::models::Incident;

/// Matches a single incident against an immutable index snapshot.
///
/// Purely a query: invoking it repeatedly for the same incident has no side
/// effects, so re-evaluation after the geofence set changes is always safe.
pub struct IncidentMatcher {
    index: Arc<GeofenceIndex>,
}

impl IncidentMatcher {
    pub fn new(index: Arc<GeofenceIndex>) -> Self {
        Self { index }
    }

    /// Ids of every geofence containing the incident's location.
    ///
    /// An empty result means no geofence covers the point; that is a normal
    /// outcome, not a failure.
    pub fn match_incident(&self, incident: &Incident) -> Result<Vec<Uuid>> {
        let matched = self.index.query(&incident.location)?;
        debug!(
            "Incident {} at ({}, {}) matched {} geofences",
            incident.id,
            incident.location.lat,
            incident.location.lon,
            matched.len()
        );
        Ok(matched)
    }
}
