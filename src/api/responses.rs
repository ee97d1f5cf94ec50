//! API response structures

use axum::{http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::{DocumentError, LocalizedMessage, PresenterError},
    state::TimerConfig,
    tasks::{ClientEffect, DocumentInfo},
    ui::{KeyOutcome, Projection},
};

/// API response structure for state change endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub projection: Projection,
}

impl ApiResponse {
    /// Create a new API response
    pub fn new(status: &str, message: String, projection: Projection) -> Self {
        Self {
            status: status.to_string(),
            message,
            timestamp: Utc::now(),
            projection,
        }
    }

    /// The request changed something
    pub fn applied(message: String, projection: Projection) -> Self {
        Self::new("applied", message, projection)
    }

    /// Valid request that had nothing to do in the current state
    pub fn ignored(message: String, projection: Projection) -> Self {
        Self::new("ignored", message, projection)
    }

    pub fn from_outcome(changed: bool, message: String, projection: Projection) -> Self {
        if changed {
            Self::applied(message, projection)
        } else {
            Self::ignored(message, projection)
        }
    }
}

/// Reply to `POST /key`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyResponse {
    pub outcome: KeyOutcome,
    pub prevent_default: bool,
    pub effect: Option<ClientEffect>,
    pub projection: Projection,
}

/// Reply to `POST /document`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentResponse {
    pub status: String,
    pub document: DocumentInfo,
    pub timestamp: DateTime<Utc>,
}

impl DocumentResponse {
    pub fn loaded(document: DocumentInfo) -> Self {
        Self {
            status: "loaded".to_string(),
            document,
            timestamp: Utc::now(),
        }
    }
}

/// Reply to `GET|PUT /config`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigResponse {
    pub config: TimerConfig,
    pub timestamp: DateTime<Utc>,
}

impl ConfigResponse {
    pub fn new(config: TimerConfig) -> Self {
        Self {
            config,
            timestamp: Utc::now(),
        }
    }
}

/// Status response with presenter projection and server metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub projection: Projection,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Body of every failed request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub code: String,
    /// Bilingual text for errors the user should see
    pub message: Option<LocalizedMessage>,
    pub detail: String,
    pub timestamp: DateTime<Utc>,
}

impl ErrorResponse {
    pub fn new(code: &str, message: Option<LocalizedMessage>, detail: String) -> Self {
        Self {
            status: "error".to_string(),
            code: code.to_string(),
            message,
            detail,
            timestamp: Utc::now(),
        }
    }
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Map a presenter error to its HTTP status and body
pub fn api_error(err: PresenterError) -> ApiError {
    let status = match &err {
        PresenterError::Document(DocumentError::InvalidInput { .. }) => {
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        }
        PresenterError::Document(DocumentError::Decode(_)) => StatusCode::UNPROCESSABLE_ENTITY,
        PresenterError::Document(DocumentError::Superseded) => StatusCode::CONFLICT,
        PresenterError::Config(_) => StatusCode::UNPROCESSABLE_ENTITY,
        PresenterError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
    };

    let notification = match &err {
        PresenterError::Document(e) => e.notification(),
        PresenterError::Config(e) => Some(e.notification()),
        PresenterError::Unavailable => None,
    };
    let body = match notification {
        Some(note) => ErrorResponse::new(&note.code, Some(note.message), note.detail),
        None => {
            let code = match &err {
                PresenterError::Unavailable => "unavailable",
                _ => "superseded",
            };
            ErrorResponse::new(code, None, err.to_string())
        }
    };

    (status, Json(body))
}

/// Request that failed before reaching the presenter
pub fn bad_request(detail: String) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::new("bad_request", None, detail)),
    )
}
