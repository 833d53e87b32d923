use axum::extract::State;
use axum::{Json, Router, routing::post};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::assist::{AssistService, AssistTask, CompletionService, Prioritization, Summary};
use crate::web::error::{ApiError, ApiJson, ErrorResponse};

#[derive(Clone)]
pub struct AssistState {
    pub completion: Arc<dyn CompletionService>,
}

/// Body shared by both assist endpoints.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AssistRequest {
    pub tasks: Vec<AssistTask>,
}

pub fn create_api_router(state: AssistState) -> Router {
    Router::new()
        .route("/assist/summarize", post(summarize_handler))
        .route("/assist/prioritize", post(prioritize_handler))
        .with_state(state)
}

/// Handler for POST /api/assist/summarize
#[tracing::instrument(skip(state, payload))]
#[utoipa::path(
    post,
    path = "/api/assist/summarize",
    request_body = AssistRequest,
    responses(
        (status = 200, description = "Summary, empty and degraded when the assistant is unavailable", body = Summary),
        (status = 400, description = "Malformed body", body = ErrorResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "Assist"
)]
pub async fn summarize_handler(
    State(state): State<AssistState>,
    ApiJson(payload): ApiJson<AssistRequest>,
) -> Result<Json<Summary>, ApiError> {
    let service = AssistService::new(state.completion.clone());
    Ok(Json(service.summarize(&payload.tasks).await))
}

/// Handler for POST /api/assist/prioritize
#[tracing::instrument(skip(state, payload))]
#[utoipa::path(
    post,
    path = "/api/assist/prioritize",
    request_body = AssistRequest,
    responses(
        (status = 200, description = "Suggested priorities for the submitted tasks", body = Prioritization),
        (status = 400, description = "Malformed body", body = ErrorResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "Assist"
)]
pub async fn prioritize_handler(
    State(state): State<AssistState>,
    ApiJson(payload): ApiJson<AssistRequest>,
) -> Result<Json<Prioritization>, ApiError> {
    let service = AssistService::new(state.completion.clone());
    Ok(Json(service.prioritize(&payload.tasks).await))
}
