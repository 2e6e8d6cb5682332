//! Core data models for geofence alerting.

pub mod alert;
pub mod geofence;
pub mod incident;

pub use alert::Alert;
pub use geofence::{GeoPoint, Geofence, Shape};
pub use incident::{Incident, IncidentStatus, NewIncident, Severity};
