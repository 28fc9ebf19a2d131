// Main entry point - Dependency injection and server setup
use axum::{
    Router,
    routing::{get, post, put},
};
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use lotus_console::application::map_sync::MarkerLayers;
use lotus_console::application::spawn_dispatcher::SpawnDispatcher;
use lotus_console::application::telemetry_client::{SessionCommand, TelemetryClient, TelemetrySession};
use lotus_console::infrastructure::config::{DEFAULT_SETTINGS_PATH, load_settings, shared};
use lotus_console::infrastructure::rest_api::RestSimulationApi;
use lotus_console::infrastructure::websocket_transport::WebSocketTransport;
use lotus_console::presentation::app_state::AppState;
use lotus_console::presentation::handlers::{
    context_menu, health_check, preview_spawn, select_instance, spawn_vessel, telemetry_connect,
    telemetry_disconnect, telemetry_state, vessel_marker_stream, vessel_markers,
};

const INITIAL_ZOOM: f64 = 13.0;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration once; everything below gets it passed in
    let settings_path =
        std::env::var("LOTUS_SETTINGS").unwrap_or_else(|_| DEFAULT_SETTINGS_PATH.to_string());
    let settings = load_settings(&settings_path)?;
    let addr: SocketAddr = settings.http.bind.parse()?;
    let api_base_url = settings.api_base_url();
    let settings = shared(settings);

    // Adapters (infrastructure layer)
    let api = Arc::new(RestSimulationApi::new(api_base_url));
    let transport = Arc::new(WebSocketTransport);

    // Use cases (application layer)
    let dispatcher = SpawnDispatcher::new(api, settings.clone());
    let session = TelemetrySession::spawn(TelemetryClient::new(settings.clone(), transport));
    session.send(SessionCommand::Connect).await?;

    let state = Arc::new(AppState {
        dispatcher,
        session,
        markers: Mutex::new(MarkerLayers::new(INITIAL_ZOOM)),
        settings,
        settings_file: settings_file(&settings_path),
    });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/telemetry/state", get(telemetry_state))
        .route("/telemetry/connect", post(telemetry_connect))
        .route("/telemetry/disconnect", post(telemetry_disconnect))
        .route("/settings/instance", put(select_instance))
        .route("/vessels/markers", get(vessel_markers))
        .route("/vessels/markers/stream", get(vessel_marker_stream))
        .route("/map/context-menu", post(context_menu))
        .route("/vessels/preview", post(preview_spawn))
        .route("/vessels/spawn", post(spawn_vessel))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tracing::info!("Starting lotus-console on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Dropping the state drops the telemetry session, which closes the feed
    tracing::info!("lotus-console stopped");
    Ok(())
}

/// Settings are loaded by base name; they are written back as TOML
fn settings_file(path: &str) -> PathBuf {
    let path = PathBuf::from(path);
    if path.extension().is_some() {
        path
    } else {
        path.with_extension("toml")
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Could not listen for shutdown signal: {}", e);
    }
}
