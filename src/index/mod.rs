//! Geofence containment index.
//!
//! Answers "which geofences contain point P" with an R-tree over shape
//! bounding boxes and exact containment tests on the candidates. Boundary
//! points are contained (inclusive policy). Geofences crossing the
//! antimeridian are unsupported and yield undefined results.

mod containment;
mod spatial;

pub use containment::{haversine_distance_m, PreparedShape};
pub use spatial::GeofenceIndex;
