//! Composition root: the two alerting triggers and the index lifecycle.

use std::sync::{Arc, RwLock};

use tracing::info;
use uuid::Uuid;

use crate::config::Config;
use crate::dispatch::{AlertDispatcher, MatchResult};
use crate::error::{Error, Result};
use crate::index::GeofenceIndex;
use crate::matcher::IncidentMatcher;
use crate::models::{Incident, NewIncident};
use crate::repository::{AlertRepository, GeofenceRepository, IncidentRepository};

/// Outcome of the incident-creation trigger.
#[derive(Debug)]
pub struct IncidentAlerts {
    pub incident: Incident,
    pub alert_results: Vec<MatchResult>,
}

/// Wires the repositories, the index, the matcher, and the dispatcher into
/// the two operations the surrounding application invokes.
///
/// The index is held as an immutable snapshot behind a lock: a refresh
/// builds a whole new index and swaps the `Arc`, so concurrent matches keep
/// reading their snapshot and never observe a partially updated set.
pub struct AlertingService {
    geofences: Arc<dyn GeofenceRepository>,
    incidents: Arc<dyn IncidentRepository>,
    dispatcher: AlertDispatcher,
    index: RwLock<Arc<GeofenceIndex>>,
    config: Config,
}

impl AlertingService {
    /// Build the service and load the initial geofence snapshot.
    pub async fn new(
        geofences: Arc<dyn GeofenceRepository>,
        incidents: Arc<dyn IncidentRepository>,
        alerts: Arc<dyn AlertRepository>,
        config: Config,
    ) -> Result<Self> {
        let service = Self {
            geofences,
            incidents,
            dispatcher: AlertDispatcher::new(alerts, config.dispatch.clone()),
            index: RwLock::new(Arc::new(GeofenceIndex::empty())),
            config,
        };
        service.refresh_index().await?;
        Ok(service)
    }

    /// Rebuild the index from the geofence repository and publish the new
    /// snapshot atomically. Call after the geofence set changes.
    pub async fn refresh_index(&self) -> Result<()> {
        let geofences = self.geofences.list_active().await?;
        let count = geofences.len();
        let index = GeofenceIndex::build_with(geofences, &self.config.index)?;

        *self.index.write().unwrap() = Arc::new(index);
        info!("Geofence index refreshed with {} fences", count);
        Ok(())
    }

    /// The current index snapshot.
    pub fn current_index(&self) -> Arc<GeofenceIndex> {
        Arc::clone(&self.index.read().unwrap())
    }

    /// Persist a new incident, match it against the current geofence set,
    /// and dispatch one alert per matching fence.
    pub async fn create_incident_with_geofence_detection(
        &self,
        new: NewIncident,
    ) -> Result<IncidentAlerts> {
        new.location.validate()?;

        let incident = Incident::create(new);
        self.incidents.insert(incident.clone()).await?;

        let matcher = IncidentMatcher::new(self.current_index());
        let matched = matcher.match_incident(&incident)?;
        info!(
            "Incident {} ({}) matched {} geofences",
            incident.id,
            incident.severity,
            matched.len()
        );

        let alert_results = self.dispatcher.dispatch(incident.id, &matched).await;
        Ok(IncidentAlerts {
            incident,
            alert_results,
        })
    }

    /// Re-run matching and dispatch for an existing incident against the
    /// current geofence set. Safe to call any number of times: existing
    /// alerts are reported as already-alerted, never duplicated.
    pub async fn create_alerts_for_existing_incident(
        &self,
        incident_id: Uuid,
    ) -> Result<Vec<MatchResult>> {
        let incident = self
            .incidents
            .get(incident_id)
            .await?
            .ok_or(Error::IncidentNotFound { id: incident_id })?;

        let matcher = IncidentMatcher::new(self.current_index());
        let matched = matcher.match_incident(&incident)?;

        Ok(self.dispatcher.dispatch(incident.id, &matched).await)
    }
}
