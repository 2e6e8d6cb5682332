//! Incident records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::GeoPoint;

/// Incident severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Moderate,
    High,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Moderate => write!(f, "moderate"),
            Severity::High => write!(f, "high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// Incident lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncidentStatus {
    Open,
    Acknowledged,
    Resolved,
}

/// Data for creating a new incident. Everything else on [`Incident`] is
/// assigned at creation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewIncident {
    pub location: GeoPoint,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A reported incident. The location is set at creation and never mutated
/// by the matching core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Incident {
    pub id: Uuid,
    pub location: GeoPoint,
    pub severity: Severity,
    pub status: IncidentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Incident {
    /// Create an open incident from submitted data
    pub fn create(new: NewIncident) -> Self {
        Self {
            id: Uuid::new_v4(),
            location: new.location,
            severity: new.severity,
            status: IncidentStatus::Open,
            description: new.description,
            created_at: Utc::now(),
        }
    }
}
