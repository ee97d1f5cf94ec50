//! HTTP endpoint handlers

use std::{convert::Infallible, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap},
    response::{
        sse::{Event, KeepAlive, Sse},
        Json,
    },
};
use futures::stream::{self, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::{
    document::DocumentSource,
    state::{AppState, ConfigUpdate, ContainerSize},
    tasks::TimerCommand,
    ui::{DragEvent, KeyInput, Projection},
};
use super::responses::{
    api_error, bad_request, ApiError, ApiResponse, ConfigResponse, DocumentResponse,
    HealthResponse, KeyResponse, StatusResponse,
};

/// Body of `POST /drag`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DragRequest {
    pub event: DragEvent,
}

/// Handle POST /key - Route a key press
pub async fn key_handler(
    State(state): State<Arc<AppState>>,
    Json(input): Json<KeyInput>,
) -> Result<Json<KeyResponse>, ApiError> {
    let reply = state.press_key(input).await.map_err(api_error)?;
    Ok(Json(KeyResponse {
        outcome: reply.outcome,
        prevent_default: reply.prevent_default,
        effect: reply.effect,
        projection: state.projection(),
    }))
}

/// Handle POST /document - Load a dropped or picked file
pub async fn document_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<DocumentResponse>, ApiError> {
    let media_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    info!(
        "Document upload: {} bytes, type {}",
        body.len(),
        media_type.as_deref().unwrap_or("none")
    );

    let source = DocumentSource::new(media_type, body.to_vec());
    match state.load_document(source).await {
        Ok(document) => {
            info!("Document loaded with {} pages", document.page_count);
            Ok(Json(DocumentResponse::loaded(document)))
        }
        Err(e) => {
            warn!("Document rejected: {}", e);
            Err(api_error(e))
        }
    }
}

/// Handle POST /drag - Show or hide the drop overlay
pub async fn drag_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DragRequest>,
) -> Result<Json<ApiResponse>, ApiError> {
    let changed = state.drag(request.event).await.map_err(api_error)?;
    Ok(Json(ApiResponse::from_outcome(
        changed,
        format!("Drag {:?}", request.event),
        state.projection(),
    )))
}

/// Handle POST /page/:page - Jump to a page and reset the timer
pub async fn page_handler(
    State(state): State<Arc<AppState>>,
    Path(page): Path<u32>,
) -> Result<Json<ApiResponse>, ApiError> {
    let changed = state.go_to_page(page).await.map_err(api_error)?;
    let message = if changed {
        format!("Showing page {}", page)
    } else {
        format!("Page {} is not available", page)
    };
    Ok(Json(ApiResponse::from_outcome(changed, message, state.projection())))
}

/// Handle POST /timer/:action - Direct timer control
pub async fn timer_handler(
    State(state): State<Arc<AppState>>,
    Path(action): Path<String>,
) -> Result<Json<ApiResponse>, ApiError> {
    let command: TimerCommand = action.parse().map_err(bad_request)?;
    let changed = state.timer(command).await.map_err(api_error)?;
    info!("Timer {} endpoint called, changed: {}", action, changed);
    Ok(Json(ApiResponse::from_outcome(
        changed,
        format!("Timer {}", action),
        state.projection(),
    )))
}

/// Handle GET /config - Current timer settings
pub async fn get_config_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ConfigResponse>, ApiError> {
    let config = state.config().await.map_err(api_error)?;
    Ok(Json(ConfigResponse::new(config)))
}

/// Handle PUT /config - Partial settings update, all or nothing
pub async fn put_config_handler(
    State(state): State<Arc<AppState>>,
    Json(update): Json<ConfigUpdate>,
) -> Result<Json<ConfigResponse>, ApiError> {
    let config = state.configure(update).await.map_err(api_error)?;
    Ok(Json(ConfigResponse::new(config)))
}

/// Handle POST /resize - Viewer container changed size
pub async fn resize_handler(
    State(state): State<Arc<AppState>>,
    Json(container): Json<ContainerSize>,
) -> Result<Json<ApiResponse>, ApiError> {
    let scheduled = state.resize(container).await.map_err(api_error)?;
    Ok(Json(ApiResponse::from_outcome(
        scheduled,
        format!("Container {}x{}", container.width, container.height),
        state.projection(),
    )))
}

/// Handle GET /projection - What the display shows right now
pub async fn projection_handler(State(state): State<Arc<AppState>>) -> Json<Projection> {
    Json(state.projection())
}

/// Handle GET /events - Projection and notification stream
pub async fn events_handler(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!("Event stream subscriber connected");

    // first poll yields the current projection, later ones wait for a change
    let projections = stream::unfold(
        (state.subscribe_projection(), true),
        |(mut rx, first)| async move {
            if !first && rx.changed().await.is_err() {
                return None;
            }
            let projection = rx.borrow_and_update().clone();
            Some((("projection", serde_json::to_string(&projection)), (rx, false)))
        },
    );

    let notifications = stream::unfold(state.subscribe_notifications(), |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(note) => {
                    return Some((("notification", serde_json::to_string(&note)), rx));
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Event stream lagged, {} notifications skipped", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    let events = stream::select(projections, notifications).filter_map(|(name, data)| async move {
        match data {
            Ok(data) => Some(Ok(Event::default().event(name).data(data))),
            Err(e) => {
                warn!("Failed to serialize {} event: {}", name, e);
                None
            }
        }
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

/// Handle GET /status - Return current presenter status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let (last_action, last_action_time) = state.get_last_action();

    Json(StatusResponse {
        projection: state.projection(),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    })
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
