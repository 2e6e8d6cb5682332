//! Hash-map backed repositories.
//!
//! Used by the test suite and useful for embedding the core without a
//! storage backend. The alert store implements the same atomic
//! insert-if-absent contract a database unique constraint would provide,
//! plus injectable transient failures for exercising retry and
//! partial-failure paths.

use async_trait::async_trait;
use hashbrown::hash_map::Entry;
use hashbrown::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use super::{
    AlertInsert, AlertRepository, GeofenceRepository, IncidentRepository, RepositoryError,
};
use crate::models::{Alert, Geofence, Incident};

#[derive(Default)]
pub struct MemoryGeofenceRepository {
    geofences: Mutex<Vec<Geofence>>,
}

impl MemoryGeofenceRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, geofence: Geofence) {
        self.geofences.lock().unwrap().push(geofence);
    }
}

#[async_trait]
impl GeofenceRepository for MemoryGeofenceRepository {
    async fn list_active(&self) -> Result<Vec<Geofence>, RepositoryError> {
        Ok(self.geofences.lock().unwrap().clone())
    }
}

#[derive(Default)]
pub struct MemoryIncidentRepository {
    incidents: Mutex<HashMap<Uuid, Incident>>,
}

impl MemoryIncidentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IncidentRepository for MemoryIncidentRepository {
    async fn get(&self, id: Uuid) -> Result<Option<Incident>, RepositoryError> {
        Ok(self.incidents.lock().unwrap().get(&id).cloned())
    }

    async fn insert(&self, incident: Incident) -> Result<(), RepositoryError> {
        self.incidents.lock().unwrap().insert(incident.id, incident);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryAlertRepository {
    alerts: Mutex<HashMap<(Uuid, Uuid), Alert>>,
    /// Remaining injected transient failures per geofence id
    failures: Mutex<HashMap<Uuid, u32>>,
}

impl MemoryAlertRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `times` create calls for this geofence fail transiently.
    pub fn fail_transiently(&self, geofence_id: Uuid, times: u32) {
        self.failures.lock().unwrap().insert(geofence_id, times);
    }

    pub fn alert_count(&self) -> usize {
        self.alerts.lock().unwrap().len()
    }

    pub fn alerts_for_incident(&self, incident_id: Uuid) -> Vec<Alert> {
        self.alerts
            .lock()
            .unwrap()
            .values()
            .filter(|alert| alert.incident_id == incident_id)
            .cloned()
            .collect()
    }

    pub fn get(&self, incident_id: Uuid, geofence_id: Uuid) -> Option<Alert> {
        self.alerts
            .lock()
            .unwrap()
            .get(&(incident_id, geofence_id))
            .cloned()
    }
}

#[async_trait]
impl AlertRepository for MemoryAlertRepository {
    async fn create_if_absent(
        &self,
        incident_id: Uuid,
        geofence_id: Uuid,
    ) -> Result<AlertInsert, RepositoryError> {
        if let Some(remaining) = self.failures.lock().unwrap().get_mut(&geofence_id) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(RepositoryError::transient(format!(
                    "injected failure for geofence {}",
                    geofence_id
                )));
            }
        }

        let mut alerts = self.alerts.lock().unwrap();
        match alerts.entry((incident_id, geofence_id)) {
            Entry::Occupied(_) => Ok(AlertInsert::Exists),
            Entry::Vacant(entry) => {
                let alert = Alert::new(incident_id, geofence_id);
                entry.insert(alert.clone());
                Ok(AlertInsert::Created(alert))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_if_absent_is_atomic_per_key() {
        let repo = MemoryAlertRepository::new();
        let incident = Uuid::new_v4();
        let fence = Uuid::new_v4();

        let first = repo.create_if_absent(incident, fence).await.unwrap();
        assert!(first.created());

        let second = repo.create_if_absent(incident, fence).await.unwrap();
        assert!(!second.created());
        assert_eq!(repo.alert_count(), 1);
    }

    #[tokio::test]
    async fn test_injected_failures_are_consumed() {
        let repo = MemoryAlertRepository::new();
        let incident = Uuid::new_v4();
        let fence = Uuid::new_v4();
        repo.fail_transiently(fence, 1);

        let err = repo.create_if_absent(incident, fence).await.unwrap_err();
        assert!(err.is_transient());

        // Budget consumed, next call succeeds
        assert!(repo
            .create_if_absent(incident, fence)
            .await
            .unwrap()
            .created());
    }
}
