//! Shared state, router and error mapping

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use wwr_core::Tracker;

use crate::{legacy, routes};

/// Shared application state
pub struct AppState {
    tracker: RwLock<Tracker>,
}

impl AppState {
    pub fn new(tracker: Tracker) -> Arc<Self> {
        Arc::new(Self {
            tracker: RwLock::new(tracker),
        })
    }

    /// A panicked writer either finished its rewrite or rolled back, so the
    /// tracker is still consistent and the poison flag can be ignored.
    pub fn read(&self) -> RwLockReadGuard<'_, Tracker> {
        self.tracker.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Tracker> {
        self.tracker.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Tracker errors as HTTP responses
#[derive(Debug)]
pub struct ApiError(wwr_core::Error);

impl From<wwr_core::Error> for ApiError {
    fn from(err: wwr_core::Error) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            wwr_core::Error::NotFound(_) => StatusCode::NOT_FOUND,
            wwr_core::Error::AlreadyExists(_) => StatusCode::CONFLICT,
            wwr_core::Error::InvalidField { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        (
            status,
            Json(ApiResponse::<()>::err(self.0.to_string())),
        )
            .into_response()
    }
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Build the full router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            legacy::PATH,
            get(legacy::get_request).post(legacy::post_request),
        )
        .merge(routes::router())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
