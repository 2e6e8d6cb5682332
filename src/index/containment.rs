//! Exact shape containment tests.
//!
//! Boundary policy is inclusive: a point exactly on a polygon edge, or
//! exactly at radius distance from a circle center, is contained. Circle
//! distances use the haversine great-circle metric, since fences span
//! kilometers and flat Euclidean distance would be wrong at that scale.

use geo::{BoundingRect, Distance, Haversine, Intersects, LineString, Point, Polygon};

use crate::models::{GeoPoint, Shape};

/// Mean earth radius in meters, matching the haversine metric.
const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Great-circle distance between two points in meters.
pub fn haversine_distance_m(a: &GeoPoint, b: &GeoPoint) -> f64 {
    Haversine.distance(Point::new(a.lon, a.lat), Point::new(b.lon, b.lat))
}

/// A shape prepared for repeated containment testing.
///
/// Polygon rings are converted to `geo` geometry once, at index build time,
/// so per-query work is only the predicate evaluation.
#[derive(Debug, Clone)]
pub enum PreparedShape {
    Circle { center: GeoPoint, radius_m: f64 },
    Polygon(Polygon<f64>),
}

impl PreparedShape {
    /// Prepare a validated shape. The vertex ring is closed by `Polygon::new`
    /// if the input does not repeat its first vertex.
    pub fn prepare(shape: &Shape) -> Self {
        match shape {
            Shape::Circle {
                center,
                radius_meters,
            } => PreparedShape::Circle {
                center: *center,
                radius_m: *radius_meters,
            },
            Shape::Polygon { vertices } => {
                let ring: LineString<f64> = vertices
                    .iter()
                    .map(|v| (v.lon, v.lat))
                    .collect::<Vec<_>>()
                    .into();
                PreparedShape::Polygon(Polygon::new(ring, vec![]))
            }
        }
    }

    /// Inclusive containment test.
    pub fn contains(&self, point: &GeoPoint) -> bool {
        match self {
            PreparedShape::Circle { center, radius_m } => {
                haversine_distance_m(center, point) <= *radius_m
            }
            // Intersects, not Contains: the boundary counts as inside
            PreparedShape::Polygon(polygon) => {
                polygon.intersects(&Point::new(point.lon, point.lat))
            }
        }
    }

    /// Bounding box as (min_lon, min_lat, max_lon, max_lat).
    ///
    /// Circle boxes are padded from the angular radius and may be wider than
    /// the exact footprint; the exact containment test runs on candidates
    /// afterwards, so padding only affects candidate count. Returns `None`
    /// only for degenerate polygons, which validation rejects upstream.
    pub fn bbox(&self) -> Option<(f64, f64, f64, f64)> {
        match self {
            PreparedShape::Circle { center, radius_m } => Some(circle_bbox(center, *radius_m)),
            PreparedShape::Polygon(polygon) => polygon
                .bounding_rect()
                .map(|rect| (rect.min().x, rect.min().y, rect.max().x, rect.max().y)),
        }
    }
}

fn circle_bbox(center: &GeoPoint, radius_m: f64) -> (f64, f64, f64, f64) {
    let angular_deg = (radius_m / EARTH_RADIUS_M).to_degrees();

    let min_lat = (center.lat - angular_deg).max(-90.0);
    let max_lat = (center.lat + angular_deg).min(90.0);

    // Meridians converge toward the poles, so the longitude span is governed
    // by the parallel with the smallest cosine inside the box.
    let cos_lat = min_lat
        .to_radians()
        .cos()
        .min(max_lat.to_radians().cos());

    if min_lat <= -90.0 || max_lat >= 90.0 || cos_lat < 1e-6 {
        return (-180.0, min_lat, 180.0, max_lat);
    }

    let lon_delta = angular_deg / cos_lat;
    (
        center.lon - lon_delta,
        min_lat,
        center.lon + lon_delta,
        max_lat,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circle(lat: f64, lon: f64, radius_m: f64) -> PreparedShape {
        PreparedShape::prepare(&Shape::Circle {
            center: GeoPoint::new(lat, lon),
            radius_meters: radius_m,
        })
    }

    fn polygon(vertices: &[(f64, f64)]) -> PreparedShape {
        PreparedShape::prepare(&Shape::Polygon {
            vertices: vertices
                .iter()
                .map(|(lat, lon)| GeoPoint::new(*lat, *lon))
                .collect(),
        })
    }

    #[test]
    fn test_haversine_distance_sanity() {
        // 0.01 degrees of latitude is roughly 1.11 km
        let a = GeoPoint::new(40.0, -73.0);
        let b = GeoPoint::new(40.01, -73.0);
        let d = haversine_distance_m(&a, &b);
        assert!((d - 1112.0).abs() < 10.0, "got {}", d);
    }

    #[test]
    fn test_circle_contains_nearby_point() {
        let shape = circle(40.0, -73.0, 5000.0);
        assert!(shape.contains(&GeoPoint::new(40.01, -73.0)));
        assert!(!shape.contains(&GeoPoint::new(40.5, -73.0)));
    }

    #[test]
    fn test_circle_boundary_is_inclusive() {
        let center = GeoPoint::new(40.0, -73.0);
        let point = GeoPoint::new(40.01, -73.0);
        let distance = haversine_distance_m(&center, &point);

        let exactly_at = circle(40.0, -73.0, distance);
        assert!(exactly_at.contains(&point));

        let just_inside_radius = circle(40.0, -73.0, distance - 1.0);
        assert!(!just_inside_radius.contains(&point));
    }

    #[test]
    fn test_convex_polygon_containment() {
        // Unit square near the equator
        let square = polygon(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)]);
        assert!(square.contains(&GeoPoint::new(0.5, 0.5)));
        assert!(!square.contains(&GeoPoint::new(1.5, 0.5)));
        assert!(!square.contains(&GeoPoint::new(-0.5, 0.5)));
    }

    #[test]
    fn test_polygon_boundary_is_inclusive() {
        let square = polygon(&[(0.0, 0.0), (0.0, 2.0), (2.0, 2.0), (2.0, 0.0)]);
        // On an edge
        assert!(square.contains(&GeoPoint::new(0.0, 1.0)));
        // On a vertex
        assert!(square.contains(&GeoPoint::new(2.0, 2.0)));
    }

    #[test]
    fn test_concave_polygon_containment() {
        // L-shape with a reflex vertex at (2, 2)
        let l_shape = polygon(&[
            (0.0, 0.0),
            (0.0, 4.0),
            (2.0, 4.0),
            (2.0, 2.0),
            (4.0, 2.0),
            (4.0, 0.0),
        ]);
        // Inside both arms of the L
        assert!(l_shape.contains(&GeoPoint::new(1.0, 3.0)));
        assert!(l_shape.contains(&GeoPoint::new(3.0, 1.0)));
        // In the notch, outside the polygon
        assert!(!l_shape.contains(&GeoPoint::new(3.0, 3.0)));
    }

    #[test]
    fn test_circle_bbox_covers_footprint() {
        let shape = circle(40.0, -73.0, 5000.0);
        let (min_lon, min_lat, max_lon, max_lat) = shape.bbox().unwrap();
        // ~5 km is ~0.045 degrees of latitude
        assert!(min_lat < 39.96 && max_lat > 40.04);
        assert!(min_lon < -73.05 && max_lon > -72.95);
        // Contained points must fall inside the box
        assert!(min_lat <= 40.01 && 40.01 <= max_lat);
    }

    #[test]
    fn test_circle_bbox_near_pole_spans_all_longitudes() {
        let shape = circle(89.99, 0.0, 50_000.0);
        let (min_lon, _, max_lon, max_lat) = shape.bbox().unwrap();
        assert_eq!(min_lon, -180.0);
        assert_eq!(max_lon, 180.0);
        assert_eq!(max_lat, 90.0);
    }
}
