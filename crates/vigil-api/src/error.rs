use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError { status: StatusCode::BAD_REQUEST, message: msg.into() }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        ApiError { status: StatusCode::NOT_FOUND, message: msg.into() }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError { status: StatusCode::INTERNAL_SERVER_ERROR, message: msg.into() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.message }));
        (self.status, body).into_response()
    }
}

impl From<vigil_store::StoreError> for ApiError {
    fn from(e: vigil_store::StoreError) -> Self {
        ApiError::internal(e.to_string())
    }
}

impl From<vigil_config::ConfigError> for ApiError {
    fn from(e: vigil_config::ConfigError) -> Self {
        ApiError::bad_request(e.to_string())
    }
}

impl From<vigil_graph::GraphError> for ApiError {
    fn from(e: vigil_graph::GraphError) -> Self {
        ApiError::bad_request(e.to_string())
    }
}

impl From<vigil_reconciler::ReconcileError> for ApiError {
    fn from(e: vigil_reconciler::ReconcileError) -> Self {
        match e {
            vigil_reconciler::ReconcileError::Config(inner) => inner.into(),
            vigil_reconciler::ReconcileError::Graph(inner) => inner.into(),
            vigil_reconciler::ReconcileError::Store(inner) => inner.into(),
        }
    }
}
