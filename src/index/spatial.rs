//! R-tree spatial index over geofence shapes.

use hashbrown::HashSet;
use rayon::prelude::*;
use rstar::{RTree, RTreeObject, AABB};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::containment::PreparedShape;
use crate::config::IndexConfig;
use crate::error::{Error, Result};
use crate::models::{GeoPoint, Geofence};

/// Wrapper for R-tree indexing of a single geofence
#[derive(Clone, Debug)]
pub struct IndexedGeofence {
    pub geofence: Arc<Geofence>,
    shape: PreparedShape,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedGeofence {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

impl IndexedGeofence {
    fn new(geofence: Geofence) -> Result<Self> {
        geofence.shape.validate().map_err(|err| match err {
            Error::InvalidGeometry { reason } => {
                Error::invalid_geometry(format!("geofence {}: {}", geofence.id, reason))
            }
            other => other,
        })?;

        let shape = PreparedShape::prepare(&geofence.shape);
        let (min_lon, min_lat, max_lon, max_lat) = shape.bbox().ok_or_else(|| {
            Error::invalid_geometry(format!("geofence {}: degenerate shape", geofence.id))
        })?;

        Ok(Self {
            geofence: Arc::new(geofence),
            shape,
            envelope: AABB::from_corners([min_lon, min_lat], [max_lon, max_lat]),
        })
    }
}

/// Read-only spatial index answering "which geofences contain point P".
///
/// The R-tree narrows candidates by bounding-box intersection; the exact
/// containment test (inclusive boundary) then filters candidates. The index
/// has no write path: the owning service rebuilds it and publishes the new
/// instance as an immutable snapshot.
#[derive(Debug)]
pub struct GeofenceIndex {
    tree: RTree<IndexedGeofence>,
    /// Candidate count above which containment tests run on the rayon pool
    parallel_threshold: usize,
}

impl GeofenceIndex {
    /// An index containing no geofences; every query returns empty.
    pub fn empty() -> Self {
        Self {
            tree: RTree::new(),
            parallel_threshold: IndexConfig::default().parallel_threshold,
        }
    }

    /// Build a spatial index from validated geofences.
    ///
    /// Fails with `InvalidGeometry` on the first malformed shape rather than
    /// silently skipping it: a dropped fence would silently drop its alerts.
    pub fn build(geofences: Vec<Geofence>) -> Result<Self> {
        Self::build_with(geofences, &IndexConfig::default())
    }

    pub fn build_with(geofences: Vec<Geofence>, config: &IndexConfig) -> Result<Self> {
        let indexed: Vec<IndexedGeofence> = geofences
            .into_iter()
            .map(IndexedGeofence::new)
            .collect::<Result<_>>()?;

        let tree = RTree::bulk_load(indexed);
        info!("Spatial index built with {} geofences", tree.size());

        Ok(Self {
            tree,
            parallel_threshold: config.parallel_threshold.max(1),
        })
    }

    /// Find the ids of all geofences containing the point.
    ///
    /// The result is deduplicated; no ordering is guaranteed. An empty
    /// result is a normal outcome, not an error.
    pub fn query(&self, point: &GeoPoint) -> Result<Vec<Uuid>> {
        point.validate()?;

        let query_envelope = AABB::from_point([point.lon, point.lat]);
        let candidates: Vec<&IndexedGeofence> = self
            .tree
            .locate_in_envelope_intersecting(&query_envelope)
            .collect();

        // Containment tests are pure, so wide candidate sets can fan out
        // across the rayon pool
        let hits: Vec<Uuid> = if candidates.len() >= self.parallel_threshold {
            candidates
                .par_iter()
                .filter(|ig| ig.shape.contains(point))
                .map(|ig| ig.geofence.id)
                .collect()
        } else {
            candidates
                .iter()
                .filter(|ig| ig.shape.contains(point))
                .map(|ig| ig.geofence.id)
                .collect()
        };

        debug!(
            "Index query at ({}, {}): {} candidates, {} contained",
            point.lat,
            point.lon,
            candidates.len(),
            hits.len()
        );

        let mut seen = HashSet::with_capacity(hits.len());
        Ok(hits.into_iter().filter(|id| seen.insert(*id)).collect())
    }

    /// Get total number of indexed geofences
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Iterate over all indexed geofences
    pub fn geofences(&self) -> impl Iterator<Item = &Arc<Geofence>> {
        self.tree.iter().map(|ig| &ig.geofence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Shape;

    fn circle_fence(name: &str, lat: f64, lon: f64, radius_m: f64) -> Geofence {
        Geofence::new(
            name,
            Uuid::new_v4(),
            Shape::Circle {
                center: GeoPoint::new(lat, lon),
                radius_meters: radius_m,
            },
        )
    }

    #[test]
    fn test_empty_index_matches_nothing() {
        let index = GeofenceIndex::empty();
        let hits = index.query(&GeoPoint::new(40.0, -73.0)).unwrap();
        assert!(hits.is_empty());
        assert!(index.is_empty());
    }

    #[test]
    fn test_query_returns_containing_fences_only() {
        let g1 = circle_fence("midtown", 40.0, -73.0, 5000.0);
        let g2 = circle_fence("uptown", 40.5, -73.0, 1000.0);
        let g1_id = g1.id;

        let index = GeofenceIndex::build(vec![g1, g2]).unwrap();
        assert_eq!(index.len(), 2);

        let hits = index.query(&GeoPoint::new(40.01, -73.0)).unwrap();
        assert_eq!(hits, vec![g1_id]);
    }

    #[test]
    fn test_overlapping_fences_all_match() {
        let g1 = circle_fence("inner", 40.0, -73.0, 5000.0);
        let g2 = circle_fence("outer", 40.0, -73.0, 20_000.0);
        let expected: HashSet<Uuid> = [g1.id, g2.id].into_iter().collect();

        let index = GeofenceIndex::build(vec![g1, g2]).unwrap();
        let hits = index.query(&GeoPoint::new(40.01, -73.0)).unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits.into_iter().collect::<HashSet<_>>(), expected);
    }

    #[test]
    fn test_polygon_fence_in_index() {
        let polygon = Geofence::new(
            "district",
            Uuid::new_v4(),
            Shape::Polygon {
                vertices: vec![
                    GeoPoint::new(40.0, -73.1),
                    GeoPoint::new(40.0, -72.9),
                    GeoPoint::new(40.2, -72.9),
                    GeoPoint::new(40.2, -73.1),
                ],
            },
        );
        let id = polygon.id;

        let index = GeofenceIndex::build(vec![polygon]).unwrap();
        assert_eq!(index.query(&GeoPoint::new(40.1, -73.0)).unwrap(), vec![id]);
        assert!(index.query(&GeoPoint::new(40.3, -73.0)).unwrap().is_empty());
    }

    #[test]
    fn test_build_rejects_invalid_shape() {
        let bad = Geofence::new(
            "bad",
            Uuid::new_v4(),
            Shape::Circle {
                center: GeoPoint::new(40.0, -73.0),
                radius_meters: -1.0,
            },
        );
        let err = GeofenceIndex::build(vec![bad]).unwrap_err();
        assert!(matches!(err, Error::InvalidGeometry { .. }));
    }

    #[test]
    fn test_query_rejects_invalid_point() {
        let index = GeofenceIndex::build(vec![circle_fence("a", 40.0, -73.0, 1000.0)]).unwrap();
        let err = index.query(&GeoPoint::new(95.0, -73.0)).unwrap_err();
        assert!(matches!(err, Error::InvalidGeometry { .. }));
    }

    #[test]
    fn test_parallel_and_serial_paths_agree() {
        let fences: Vec<Geofence> = (0..40)
            .map(|i| circle_fence(&format!("ring-{}", i), 40.0, -73.0, 2000.0 + i as f64 * 100.0))
            .collect();
        let point = GeoPoint::new(40.01, -73.0);

        let serial = GeofenceIndex::build_with(
            fences.clone(),
            &IndexConfig {
                parallel_threshold: usize::MAX,
            },
        )
        .unwrap();
        let parallel = GeofenceIndex::build_with(
            fences,
            &IndexConfig {
                parallel_threshold: 1,
            },
        )
        .unwrap();

        let mut a = serial.query(&point).unwrap();
        let mut b = parallel.query(&point).unwrap();
        a.sort();
        b.sort();
        assert_eq!(a, b);
    }
}
