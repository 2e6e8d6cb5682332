//! Alert records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An alert issued to a geofence's subscribers for one incident.
///
/// At most one alert ever exists per (incident_id, geofence_id) pair; the
/// alert store enforces this with an atomic insert-if-absent. Alerts are
/// append-only and never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub incident_id: Uuid,
    pub geofence_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Alert {
    pub fn new(incident_id: Uuid, geofence_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            incident_id,
            geofence_id,
            created_at: Utc::now(),
        }
    }

    /// The uniqueness key for deduplication
    pub fn dedup_key(&self) -> (Uuid, Uuid) {
        (self.incident_id, self.geofence_id)
    }
}
