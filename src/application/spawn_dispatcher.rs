// Spawn dispatcher - Use case for submitting a vessel spawn configuration
use crate::application::param_serializer::serialize;
use crate::application::simulation_api::{
    CMD_SPAWN_VESSEL, GeoPointWire, SimulationApi, SpawnCommand, SubmissionError,
};
use crate::domain::spawn_config::VesselSpawnConfig;
use crate::infrastructure::config::SharedSettings;
use std::sync::Arc;

#[derive(Clone)]
pub struct SpawnDispatcher {
    api: Arc<dyn SimulationApi>,
    settings: SharedSettings,
}

impl SpawnDispatcher {
    pub fn new(api: Arc<dyn SimulationApi>, settings: SharedSettings) -> Self {
        Self { api, settings }
    }

    /// Wrap a config's parameter document and identity into the backend command
    pub fn build_command(config: &VesselSpawnConfig) -> SpawnCommand {
        SpawnCommand {
            cmd_type: CMD_SPAWN_VESSEL,
            sdf_string: serialize(config),
            model_name: config.model_name.clone(),
            vessel_name: config.vessel_name.clone(),
            geo_point: GeoPointWire {
                latitude: config.position.latitude,
                longitude: config.position.longitude,
                altitude: config.position.elevation,
            },
            heading: config.position.heading,
        }
    }

    /// Submit once to the selected instance. Failures go back to the caller, nothing is retried.
    pub async fn dispatch(&self, config: VesselSpawnConfig) -> Result<SpawnCommand, SubmissionError> {
        let instance = self.settings.read().await.selected_instance.clone();
        if instance.is_empty() {
            return Err(SubmissionError::NoInstanceSelected);
        }

        let command = Self::build_command(&config);
        tracing::info!(
            "Spawning vessel {} ({}) on instance {}",
            command.vessel_name,
            command.model_name,
            instance
        );

        if let Err(e) = self.api.spawn_vessel(&instance, &command).await {
            tracing::error!("Spawn of {} failed: {}", command.vessel_name, e);
            return Err(e);
        }
        Ok(command)
    }
}
