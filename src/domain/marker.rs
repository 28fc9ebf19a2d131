// Map marker model derived from vessel telemetry
use super::geo::{GeoPoint, LatLongPosition};
use super::spawn_config::VesselSpawnConfig;
use serde::{Deserialize, Serialize};

/// Icon width at zoom 0
pub const BASE_ICON_SIZE: f64 = 0.5;

/// Icon height / width
pub const ICON_ASPECT_RATIO: f64 = 1.625;

/// Icon width for a map zoom level
pub fn icon_size(zoom: f64) -> f64 {
    BASE_ICON_SIZE + zoom
}

/// Sized and rotated vessel icon. Rotation is applied around the icon centre.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MarkerIcon {
    pub width: f64,
    pub height: f64,
    pub anchor: [f64; 2],
    pub rotation_deg: f64,
}

impl MarkerIcon {
    pub fn new(zoom: f64, heading: f64) -> Self {
        let width = icon_size(zoom);
        let height = width * ICON_ASPECT_RATIO;
        Self {
            width,
            height,
            anchor: [width / 2.0, height / 2.0],
            rotation_deg: heading,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VesselMarker {
    pub vessel_name: String,
    pub position: GeoPoint,
    pub icon: MarkerIcon,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<String>,
}

/// Pixel offset inside the map container
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Menu opened by a right-click on the map
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ContextMenu {
    pub coordinate: GeoPoint,
    pub offset: PixelPoint,
}

impl ContextMenu {
    /// Spawn dialog pre-seeded with the clicked coordinate
    pub fn open_spawn_dialog(&self) -> VesselSpawnConfig {
        VesselSpawnConfig::seeded_at(self.coordinate)
    }
}

/// Tooltip text for a vessel: its name, plus the extra info line when present
pub fn tooltip_for(vessel_name: &str, pose: &LatLongPosition, info: Option<&str>) -> String {
    let base = format!(
        "{} ({:.5}, {:.5}) hdg {}",
        vessel_name, pose.latitude, pose.longitude, pose.heading
    );
    match info {
        Some(info) if !info.is_empty() => format!("{} - {}", base, info),
        _ => base,
    }
}
