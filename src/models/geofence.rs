//! Geofence records and their shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Geographic point (lat/lon, WGS84 degrees)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Range-check against WGS84 bounds. Coordinates must be finite,
    /// latitude in [-90, 90] and longitude in [-180, 180].
    pub fn validate(&self) -> Result<()> {
        if !self.lat.is_finite() || !self.lon.is_finite() {
            return Err(Error::invalid_geometry(format!(
                "non-finite coordinates ({}, {})",
                self.lat, self.lon
            )));
        }
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(Error::invalid_geometry(format!(
                "latitude {} out of range [-90, 90]",
                self.lat
            )));
        }
        if !(-180.0..=180.0).contains(&self.lon) {
            return Err(Error::invalid_geometry(format!(
                "longitude {} out of range [-180, 180]",
                self.lon
            )));
        }
        Ok(())
    }
}

/// Geofence shape.
///
/// Polygons are given as an ordered vertex ring, implicitly closed.
/// Shapes crossing the antimeridian are not supported; containment results
/// for them are undefined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shape {
    Circle {
        center: GeoPoint,
        radius_meters: f64,
    },
    Polygon {
        vertices: Vec<GeoPoint>,
    },
}

impl Shape {
    /// Validate shape invariants: finite positive radius for circles,
    /// at least three in-range vertices for polygons.
    pub fn validate(&self) -> Result<()> {
        match self {
            Shape::Circle {
                center,
                radius_meters,
            } => {
                center.validate()?;
                if !radius_meters.is_finite() || *radius_meters <= 0.0 {
                    return Err(Error::invalid_geometry(format!(
                        "circle radius {} must be a positive finite number of meters",
                        radius_meters
                    )));
                }
                Ok(())
            }
            Shape::Polygon { vertices } => {
                if vertices.len() < 3 {
                    return Err(Error::invalid_geometry(format!(
                        "polygon has {} vertices, need at least 3",
                        vertices.len()
                    )));
                }
                for vertex in vertices {
                    vertex.validate()?;
                }
                Ok(())
            }
        }
    }
}

/// A registered geographic region that triggers alerts for incidents
/// falling inside it. Immutable once created for matching purposes;
/// edits produce a new record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Geofence {
    pub id: Uuid,
    pub name: String,
    /// Subscriber that receives alerts for this fence
    pub owner_id: Uuid,
    pub shape: Shape,
    pub created_at: DateTime<Utc>,
}

impl Geofence {
    pub fn new(name: &str, owner_id: Uuid, shape: Shape) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            owner_id,
            shape,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_range_checks() {
        assert!(GeoPoint::new(40.0, -73.0).validate().is_ok());
        assert!(GeoPoint::new(90.0, 180.0).validate().is_ok());
        assert!(GeoPoint::new(91.0, 0.0).validate().is_err());
        assert!(GeoPoint::new(0.0, -181.0).validate().is_err());
        assert!(GeoPoint::new(f64::NAN, 0.0).validate().is_err());
    }

    #[test]
    fn test_circle_requires_positive_radius() {
        let center = GeoPoint::new(40.0, -73.0);
        for radius in [0.0, -5.0, f64::INFINITY] {
            let shape = Shape::Circle {
                center,
                radius_meters: radius,
            };
            assert!(shape.validate().is_err(), "radius {} accepted", radius);
        }
    }

    #[test]
    fn test_polygon_requires_three_vertices() {
        let shape = Shape::Polygon {
            vertices: vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 1.0)],
        };
        assert!(shape.validate().is_err());
    }

    #[test]
    fn test_shape_serde_tagging() {
        let shape = Shape::Circle {
            center: GeoPoint::new(40.0, -73.0),
            radius_meters: 5000.0,
        };
        let value = serde_json::to_value(&shape).unwrap();
        assert_eq!(value["type"], "circle");
        assert_eq!(value["radius_meters"], 5000.0);

        let back: Shape = serde_json::from_value(value).unwrap();
        assert_eq!(back, shape);
    }
}
