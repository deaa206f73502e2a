//! Axum-based HTTP API for the host
//!
//! Exposes the coordinator snapshot, derived entities, the SMS login flow
//! and command dispatch. Handlers never poll the vendor API themselves;
//! reads come from the latest snapshot.

use crate::api::AuthClient;
use crate::config::Config;
use crate::coordinator::FleetCoordinator;
use crate::credentials::CredentialSink;
use crate::entities::{self, EntitySet};
use crate::error::ElectroCarsError;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::WatchStream;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<FleetCoordinator>,
    pub auth: Arc<AuthClient>,
    pub credentials: Arc<dyn CredentialSink>,
    pub config: Arc<Config>,
}

#[derive(Deserialize)]
pub struct PhoneBody {
    pub phone: String,
}

#[derive(Deserialize)]
pub struct CodeBody {
    pub code: String,
}

#[derive(Deserialize)]
pub struct CommandBody {
    pub command: i64,
}

fn error_reply(status: StatusCode, error: &str) -> (StatusCode, Json<serde_json::Value>) {
    (status, Json(json!({ "error": error })))
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.coordinator.snapshot();
    let stats = state.coordinator.stats();
    Json(json!({
        "auth_state": state.auth.state(),
        "cadence": snapshot.cadence,
        "interval_secs": snapshot.interval_secs,
        "interval": entities::interval_label(snapshot.interval()),
        "last_active": snapshot.last_active,
        "updated_at": snapshot.updated_at,
        "car_count": snapshot.cars.len(),
        "polls": stats,
    }))
}

async fn cars(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.coordinator.snapshot().cars.clone())
}

async fn entity_set(State(state): State<AppState>) -> impl IntoResponse {
    Json(EntitySet::from_snapshot(&state.coordinator.snapshot()))
}

async fn events(State(state): State<AppState>) -> impl IntoResponse {
    let stream = WatchStream::new(state.coordinator.subscribe())
        .map(|snapshot| Event::default().event("snapshot").json_data(&*snapshot));
    Sse::new(stream).keep_alive(KeepAlive::default())
}

async fn get_config(State(state): State<AppState>) -> impl IntoResponse {
    let json = serde_json::to_value(state.config.as_ref())
        .unwrap_or(json!({"error":"serialization"}));
    Json(json)
}

async fn get_config_schema() -> impl IntoResponse {
    let schema = schemars::schema_for!(crate::config::Config);
    Json(serde_json::to_value(&schema).unwrap_or(json!({"error":"schema"})))
}

async fn request_code(
    State(state): State<AppState>,
    Json(body): Json<PhoneBody>,
) -> impl IntoResponse {
    match state.auth.request_code(&body.phone).await {
        Ok(true) => (StatusCode::OK, Json(json!({"ok": true}))),
        Ok(false) => error_reply(StatusCode::BAD_GATEWAY, "sms_failed"),
        Err(ElectroCarsError::Validation { .. }) => {
            error_reply(StatusCode::BAD_REQUEST, "unknown")
        }
        Err(_) => error_reply(StatusCode::BAD_GATEWAY, "sms_failed"),
    }
}

async fn exchange_code(
    State(state): State<AppState>,
    Json(body): Json<CodeBody>,
) -> impl IntoResponse {
    let credential = match state.auth.exchange_code(&body.code).await {
        Ok(Some(credential)) => credential,
        Ok(None) | Err(ElectroCarsError::Validation { .. } | ElectroCarsError::Auth { .. }) => {
            return error_reply(StatusCode::BAD_REQUEST, "invalid_code");
        }
        Err(_) => return error_reply(StatusCode::BAD_GATEWAY, "unknown"),
    };

    let stored = credential.to_stored();
    let sink = state.credentials.clone();
    let persisted = tokio::task::spawn_blocking(move || sink.store(&stored)).await;
    if !matches!(persisted, Ok(Ok(()))) {
        crate::logging::get_logger("web").error("Failed to persist credentials after login");
        return error_reply(StatusCode::INTERNAL_SERVER_ERROR, "unknown");
    }

    state.coordinator.request_refresh();
    (
        StatusCode::OK,
        Json(json!({"ok": true, "phone": credential.phone})),
    )
}

async fn car_buttons(
    State(state): State<AppState>,
    Path(car_id): Path<String>,
) -> impl IntoResponse {
    let snapshot = state.coordinator.snapshot();
    let Some(car) = snapshot.car(&car_id) else {
        return error_reply(StatusCode::NOT_FOUND, "unknown_car");
    };
    let Some(imei) = car.imei() else {
        return (StatusCode::OK, Json(json!([])));
    };

    match entities::discover_buttons(&state.coordinator, &imei).await {
        Ok(Some(buttons)) => (StatusCode::OK, Json(json!(buttons))),
        Ok(None) => error_reply(StatusCode::BAD_GATEWAY, "commands_unavailable"),
        Err(e) => error_reply(StatusCode::BAD_GATEWAY, &e.to_string()),
    }
}

async fn send_command(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
    Json(body): Json<CommandBody>,
) -> impl IntoResponse {
    match state
        .coordinator
        .send_command(&device_id, body.command)
        .await
    {
        Ok(ok) => (StatusCode::OK, Json(json!({"ok": ok}))),
        Err(e) => error_reply(StatusCode::BAD_GATEWAY, &e.to_string()),
    }
}

async fn refresh(State(state): State<AppState>) -> impl IntoResponse {
    state.coordinator.request_refresh();
    (StatusCode::ACCEPTED, Json(json!({"ok": true})))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/status", get(status))
        .route("/api/cars", get(cars))
        .route("/api/cars/{car_id}/buttons", get(car_buttons))
        .route("/api/entities", get(entity_set))
        .route("/api/events", get(events))
        .route("/api/config", get(get_config))
        .route("/api/config/schema", get(get_config_schema))
        .route("/api/auth/code", post(request_code))
        .route("/api/auth/token", post(exchange_code))
        .route("/api/devices/{device_id}/commands", post(send_command))
        .route("/api/refresh", post(refresh))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

pub async fn serve(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let router = build_router(state);

    let logger = crate::logging::get_logger("web");
    logger.info(&format!(
        "Starting web server; requested host={}, port={}",
        host, port
    ));

    let addr = match host.parse::<IpAddr>() {
        Ok(ip) => SocketAddr::new(ip, port),
        Err(_) => {
            logger.warn(&format!("Invalid host '{}'; falling back to 127.0.0.1", host));
            ([127, 0, 0, 1], port).into()
        }
    };

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ElectroCarsError::web(format!("Failed to bind {}: {}", addr, e)))?;
    let local_addr = listener.local_addr()?;
    logger.info(&format!(
        "Web server listening at http://{}:{}",
        local_addr.ip(),
        local_addr.port()
    ));

    axum::serve(listener, router).await?;
    Ok(())
}
