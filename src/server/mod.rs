//! HTTP control surface.
//!
//! One registration endpoint plus a health probe. Registration is
//! synchronous with the validation probe: the caller waits until the
//! candidate page has been fetched and checked.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::Result;
use crate::models::WatchList;
use crate::pipeline::{RegistrationGateway, RegistrationOutcome};
use crate::services::SnapshotStore;

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<RegistrationGateway>,
    pub watch_list: Arc<WatchList>,
    pub store: Arc<SnapshotStore>,
}

#[derive(Debug, Deserialize)]
pub struct WatchRequest {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct WatchResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub watched_targets: usize,
    pub snapshots: usize,
}

/// Build the control router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/watch", post(watch_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Bind and serve the control endpoint. Runs until process shutdown.
pub async fn serve(state: AppState, bind_addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!(addr = bind_addr, "control endpoint listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Register a new watch target.
async fn watch_handler(
    State(state): State<AppState>,
    Json(request): Json<WatchRequest>,
) -> (StatusCode, Json<WatchResponse>) {
    match state.gateway.register(&request.url).await {
        Ok(RegistrationOutcome::Accepted(target)) => (
            StatusCode::OK,
            Json(WatchResponse {
                status: "accepted",
                name: Some(target.display_name),
                reason: None,
            }),
        ),
        Ok(RegistrationOutcome::Rejected(reason)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(WatchResponse {
                status: "rejected",
                name: None,
                reason: Some(reason.to_string()),
            }),
        ),
        Err(err) => {
            error!(url = %request.url, error = %err, "registration failed internally");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(WatchResponse {
                    status: "error",
                    name: None,
                    reason: None,
                }),
            )
        }
    }
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        watched_targets: state.watch_list.len(),
        snapshots: state.store.len(),
    })
}
