// HTTP request handlers for the operator console
use crate::application::map_sync::MapSynchronizer;
use crate::application::param_serializer::serialize;
use crate::application::simulation_api::SubmissionError;
use crate::application::telemetry_client::{ConnectionState, SessionCommand};
use crate::domain::geo::GeoPoint;
use crate::domain::marker::{ContextMenu, PixelPoint, VesselMarker};
use crate::domain::spawn_config::VesselSpawnConfig;
use crate::infrastructure::config::save_settings;
use crate::presentation::app_state::AppState;
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
};
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_stream::{StreamExt, wrappers::WatchStream};

const DEFAULT_ZOOM: f64 = 13.0;

#[derive(Deserialize)]
pub struct ZoomQuery {
    pub zoom: Option<f64>,
}

#[derive(Deserialize)]
pub struct SelectInstance {
    pub instance: String,
}

#[derive(Deserialize)]
pub struct RightClick {
    pub coordinate: GeoPoint,
    pub click: PixelPoint,
    #[serde(default)]
    pub container_origin: PixelPoint,
}

#[derive(Serialize)]
pub struct ContextMenuResponse {
    pub menu: ContextMenu,
    pub spawn_dialog: VesselSpawnConfig,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

fn error_response(status: StatusCode, message: impl ToString) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
        .into_response()
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn telemetry_state(State(state): State<Arc<AppState>>) -> Json<ConnectionState> {
    Json(state.session.state())
}

pub async fn telemetry_connect(State(state): State<Arc<AppState>>) -> Response {
    session_command(&state, SessionCommand::Connect).await
}

pub async fn telemetry_disconnect(State(state): State<Arc<AppState>>) -> Response {
    session_command(&state, SessionCommand::Disconnect).await
}

async fn session_command(state: &AppState, command: SessionCommand) -> Response {
    match state.session.send(command).await {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(e) => error_response(StatusCode::SERVICE_UNAVAILABLE, e),
    }
}

/// Switch the target instance, persist it, and remount the telemetry connection.
/// The shared settings only change once the new instance is on disk.
pub async fn select_instance(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SelectInstance>,
) -> Response {
    let mut updated = state.settings.read().await.clone();
    updated.selected_instance = request.instance;

    if let Err(e) = save_settings(&state.settings_file, &updated).await {
        tracing::error!("Could not persist settings: {}", e);
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, e);
    }

    tracing::info!("Selected instance {}", updated.selected_instance);
    *state.settings.write().await = updated;
    session_command(&state, SessionCommand::Remount).await
}

/// Markers for the latest telemetry batch, at the caller's zoom
pub async fn vessel_markers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ZoomQuery>,
) -> Json<Vec<VesselMarker>> {
    let batch = state.session.batches().borrow().clone();
    let mut layers = state.markers.lock().await;
    Json(layers.sync(query.zoom, &batch).to_vec())
}

/// Server-sent marker updates, one event per telemetry batch
pub async fn vessel_marker_stream(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ZoomQuery>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let mut map = MapSynchronizer::new(query.zoom.unwrap_or(DEFAULT_ZOOM));
    let stream = WatchStream::new(state.session.batches())
        .map(move |batch| Event::default().event("markers").json_data(map.sync(&batch)));

    Sse::new(stream).keep_alive(KeepAlive::default())
}

pub async fn context_menu(Json(request): Json<RightClick>) -> Json<ContextMenuResponse> {
    let menu =
        MapSynchronizer::right_click(request.coordinate, request.click, request.container_origin);
    Json(ContextMenuResponse {
        menu,
        spawn_dialog: menu.open_spawn_dialog(),
    })
}

/// Parameter document for a config, without submitting it
pub async fn preview_spawn(Json(config): Json<VesselSpawnConfig>) -> String {
    serialize(&config)
}

pub async fn spawn_vessel(
    State(state): State<Arc<AppState>>,
    Json(config): Json<VesselSpawnConfig>,
) -> Response {
    match state.dispatcher.dispatch(config).await {
        Ok(command) => (StatusCode::CREATED, Json(command)).into_response(),
        Err(e @ SubmissionError::NoInstanceSelected) => error_response(StatusCode::BAD_REQUEST, e),
        Err(e) => error_response(StatusCode::BAD_GATEWAY, e),
    }
}
