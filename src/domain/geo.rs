// Geographic and frame primitives shared by spawn configs and telemetry
use serde::{Deserialize, Serialize};

/// Geodetic position of a vessel. Heading is in degrees, 0 = north.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LatLongPosition {
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
    #[serde(default)]
    pub elevation: f64,
    #[serde(default)]
    pub heading: f64,
}

impl LatLongPosition {
    pub fn new(latitude: f64, longitude: f64, elevation: f64, heading: f64) -> Self {
        Self {
            latitude,
            longitude,
            elevation,
            heading,
        }
    }

    pub fn at(point: GeoPoint) -> Self {
        Self::new(point.lat, point.lng, 0.0, 0.0)
    }

    pub fn geo_point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// A bare map coordinate (waypoints, clicked locations)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Orientation in quaternion form
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quaternion {
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };
}

/// Mounting frame for sensors and actuators, independent of the vessel's geodetic position
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vector3,
    pub orientation: Quaternion,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pose_is_identity() {
        let pose = Pose::default();
        assert_eq!(pose.position, Vector3::default());
        assert_eq!(pose.orientation, Quaternion::IDENTITY);
    }

    #[test]
    fn test_position_missing_fields_default_to_zero() {
        let pos: LatLongPosition = serde_json::from_str(r#"{"latitude": 1.5}"#).unwrap();
        assert_eq!(pos, LatLongPosition::new(1.5, 0.0, 0.0, 0.0));
    }

    #[test]
    fn test_position_seeded_from_point() {
        let pos = LatLongPosition::at(GeoPoint::new(1.24, 103.71));
        assert_eq!(pos.geo_point(), GeoPoint::new(1.24, 103.71));
        assert_eq!(pos.heading, 0.0);
    }
}
