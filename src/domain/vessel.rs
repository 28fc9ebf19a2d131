// Vessel state as reported by the telemetry stream
use super::geo::LatLongPosition;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VesselData {
    pub vessel_name: String,
    pub pose: LatLongPosition,
    #[serde(
        default,
        rename = "additionalInfo",
        alias = "additional_info",
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_info: Option<String>,
}

/// One telemetry message worth of vessels. A newer batch supersedes this one entirely.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VesselBatch {
    pub vessels: Vec<VesselData>,
    pub received_at: DateTime<Utc>,
}

impl VesselBatch {
    pub fn new(vessels: Vec<VesselData>) -> Self {
        Self {
            vessels,
            received_at: Utc::now(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.vessels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vessels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_wire_vessel() {
        let json = r#"{"vessel_name":"v1","pose":{"latitude":1.24,"longitude":103.71,"elevation":0,"heading":90},"additionalInfo":"speed 4kn"}"#;
        let vessel: VesselData = serde_json::from_str(json).unwrap();

        assert_eq!(vessel.vessel_name, "v1");
        assert_eq!(vessel.pose.heading, 90.0);
        assert_eq!(vessel.additional_info.as_deref(), Some("speed 4kn"));
    }

    #[test]
    fn test_empty_batch() {
        let batch = VesselBatch::empty();
        assert!(batch.is_empty());
        assert_eq!(batch.len(), 0);
    }
}
