// Port for the simulation backend's REST interface
use async_trait::async_trait;
use serde::Serialize;

/// Command type understood by the backend as "spawn vessel"
pub const CMD_SPAWN_VESSEL: i32 = 0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoPointWire {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

/// Body of `POST /instance/{instance}/vessel`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpawnCommand {
    pub cmd_type: i32,
    pub sdf_string: String,
    pub model_name: String,
    pub vessel_name: String,
    pub geo_point: GeoPointWire,
    pub heading: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("no instance selected")]
    NoInstanceSelected,

    #[error("could not reach the simulation backend: {0}")]
    Network(String),

    #[error("backend rejected the request with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[async_trait]
pub trait SimulationApi: Send + Sync {
    /// Spawn a vessel into a running instance
    async fn spawn_vessel(&self, instance: &str, command: &SpawnCommand) -> Result<(), SubmissionError>;
}
