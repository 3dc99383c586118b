use super::ErrorResponse;
use crate::config::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use hotsearch_mcp::protocol::JsonRpcError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Body of `POST /api`
#[derive(Debug, Deserialize)]
pub struct ApiRequest {
    pub method: String,
    #[serde(default)]
    pub params: Option<serde_json::Value>,
}

/// Reply for a method that could not be served
#[derive(Debug, Serialize)]
pub struct MethodErrorResponse {
    pub error: JsonRpcError,
}

/// Run one MCP method and reply with its result
pub async fn call(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let request: ApiRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!("Rejected /api body: {}", e);
            return (StatusCode::BAD_REQUEST, Json(ErrorResponse::new("Invalid request")))
                .into_response();
        }
    };

    tracing::debug!("/api {}", request.method);
    match state.dispatcher.handle(&request.method, request.params).await {
        Ok(result) => Json(result).into_response(),
        Err(error) => {
            (status_for(&error), Json(MethodErrorResponse { error })).into_response()
        }
    }
}

fn status_for(error: &JsonRpcError) -> StatusCode {
    match error.code {
        JsonRpcError::RESOURCE_NOT_FOUND => StatusCode::NOT_FOUND,
        JsonRpcError::INTERNAL_ERROR => StatusCode::BAD_GATEWAY,
        _ => StatusCode::BAD_REQUEST,
    }
}
