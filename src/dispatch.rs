//! Alert creation with deduplication, retry, and partial-failure handling.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::DispatchConfig;
use crate::repository::{AlertInsert, AlertRepository, RepositoryError};

/// Per-geofence outcome of one dispatch call. Transient value, not persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub geofence_id: Uuid,
    pub disposition: AlertDisposition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AlertDisposition {
    /// A new alert was created for this geofence
    Created,
    /// An alert already existed; the attempt was an idempotent no-op
    AlreadyAlerted,
    /// Alert creation failed after exhausting the retry budget
    Failed { reason: String },
}

impl MatchResult {
    pub fn succeeded(&self) -> bool {
        !matches!(self.disposition, AlertDisposition::Failed { .. })
    }
}

/// Converts matched geofences into alert records.
///
/// Every attempt goes through the alert store's atomic insert-if-absent, so
/// re-running dispatch for an incident never duplicates alerts regardless of
/// which trigger invoked it. One geofence's failure never aborts its
/// siblings; the caller always gets a full per-geofence result list.
///
/// Cancellation: dropping the returned future stops issuing new storage
/// calls. Alerts already committed stay committed; partial completion is a
/// valid terminal state since alerts are append-only.
pub struct AlertDispatcher {
    alerts: Arc<dyn AlertRepository>,
    config: DispatchConfig,
}

impl AlertDispatcher {
    pub fn new(alerts: Arc<dyn AlertRepository>, config: DispatchConfig) -> Self {
        Self { alerts, config }
    }

    /// Attempt one alert per geofence id. Results keep the input order.
    pub async fn dispatch(&self, incident_id: Uuid, geofence_ids: &[Uuid]) -> Vec<MatchResult> {
        stream::iter(geofence_ids.iter().copied())
            .map(|geofence_id| self.dispatch_one(incident_id, geofence_id))
            .buffered(self.config.concurrency.max(1))
            .collect()
            .await
    }

    async fn dispatch_one(&self, incident_id: Uuid, geofence_id: Uuid) -> MatchResult {
        let mut attempt = 0;
        let disposition = loop {
            match self.try_create(incident_id, geofence_id).await {
                Ok(AlertInsert::Created(alert)) => {
                    debug!(
                        "Created alert {} for incident {} in geofence {}",
                        alert.id, incident_id, geofence_id
                    );
                    break AlertDisposition::Created;
                }
                Ok(AlertInsert::Exists) => {
                    debug!(
                        "Alert for incident {} in geofence {} already exists, skipping",
                        incident_id, geofence_id
                    );
                    break AlertDisposition::AlreadyAlerted;
                }
                Err(err) if err.is_transient() && attempt < self.config.retry_attempts => {
                    attempt += 1;
                    warn!(
                        "Alert creation for geofence {} failed ({}), retry {}/{}",
                        geofence_id, err, attempt, self.config.retry_attempts
                    );
                    sleep(self.config.retry_backoff()).await;
                }
                Err(err) => {
                    warn!(
                        "Alert creation for geofence {} failed permanently: {}",
                        geofence_id, err
                    );
                    break AlertDisposition::Failed {
                        reason: err.to_string(),
                    };
                }
            }
        };

        MatchResult {
            geofence_id,
            disposition,
        }
    }

    async fn try_create(
        &self,
        incident_id: Uuid,
        geofence_id: Uuid,
    ) -> Result<AlertInsert, RepositoryError> {
        match timeout(
            self.config.storage_timeout(),
            self.alerts.create_if_absent(incident_id, geofence_id),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(RepositoryError::transient(format!(
                "alert creation timed out after {:?}",
                self.config.storage_timeout()
            ))),
        }
    }
}
