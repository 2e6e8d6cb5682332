//! Perimeter - geofence matching and alert dispatch
//!
//! Determines which registered geofences contain an incident's location and
//! issues exactly one alert per matching fence, with idempotent re-evaluation.
//! Storage and transport are collaborator concerns behind the repository
//! traits; this crate is the library-level core.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod index;
pub mod logging;
pub mod matcher;
pub mod models;
pub mod repository;
pub mod service;

pub use config::{Config, DispatchConfig, IndexConfig};
pub use dispatch::{AlertDisposition, AlertDispatcher, MatchResult};
pub use error::{Error, Result};
pub use index::GeofenceIndex;
pub use matcher::IncidentMatcher;
pub use models::{Alert, GeoPoint, Geofence, Incident, NewIncident, Severity, Shape};
pub use service::{AlertingService, IncidentAlerts};
