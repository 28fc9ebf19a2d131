// Application state for HTTP handlers
use crate::application::map_sync::MarkerLayers;
use crate::application::spawn_dispatcher::SpawnDispatcher;
use crate::application::telemetry_client::TelemetrySession;
use crate::infrastructure::config::SharedSettings;
use std::path::PathBuf;
use tokio::sync::Mutex;

pub struct AppState {
    pub dispatcher: SpawnDispatcher,
    pub session: TelemetrySession,
    pub markers: Mutex<MarkerLayers>,
    pub settings: SharedSettings,
    pub settings_file: PathBuf,
}
