use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

pub const DEFAULT_SETTINGS_PATH: &str = "config/console";
pub const DEFAULT_TELEMETRY_PORT: u16 = 5000;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ConsoleSettings {
    pub server: ServerSettings,
    /// Instance targeted by spawns and the telemetry identity message
    pub selected_instance: String,
    pub http: HttpSettings,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ServerSettings {
    pub host: String,
    pub api_port: u16,
    pub telemetry_port: u16,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct HttpSettings {
    pub bind: String,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                api_port: 8000,
                telemetry_port: DEFAULT_TELEMETRY_PORT,
            },
            selected_instance: "lotusim".to_string(),
            http: HttpSettings {
                bind: "0.0.0.0:8090".to_string(),
            },
        }
    }
}

impl ConsoleSettings {
    pub fn api_base_url(&self) -> String {
        format!("http://{}:{}", self.server.host, self.server.api_port)
    }

    pub fn telemetry_url(&self) -> String {
        format!("ws://{}:{}", self.server.host, self.server.telemetry_port)
    }
}

/// Settings resolved once at startup and handed to every component that needs them
pub type SharedSettings = Arc<RwLock<ConsoleSettings>>;

pub fn shared(settings: ConsoleSettings) -> SharedSettings {
    Arc::new(RwLock::new(settings))
}

/// Defaults, then the optional settings file, then `LOTUS__*` environment overrides
pub fn load_settings(path: &str) -> anyhow::Result<ConsoleSettings> {
    let settings = config::Config::builder()
        .add_source(config::Config::try_from(&ConsoleSettings::default())?)
        .add_source(config::File::with_name(path).required(false))
        .add_source(
            config::Environment::with_prefix("LOTUS")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

/// Persist settings as TOML so the next session starts from them
pub async fn save_settings(path: &Path, settings: &ConsoleSettings) -> anyhow::Result<()> {
    let text = toml::to_string_pretty(settings)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    tokio::fs::write(path, text).await?;
    Ok(())
}
