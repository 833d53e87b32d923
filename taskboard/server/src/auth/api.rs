use axum::extract::State;
use axum::http::StatusCode;
use axum::{Json, Router, routing::post};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::auth::{AuthState, User, UserService, encode_jwt};
use crate::web::error::{ApiError, ApiJson, ErrorResponse};

/// JSON request payload for registration
#[derive(Deserialize, Serialize, Debug, ToSchema)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// JSON request payload for login
#[derive(Deserialize, Serialize, Debug, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// JSON response for a successful login
#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct LoginResponse {
    /// Bearer token to send in the `Authorization` header
    pub token: String,
    pub user: User,
}

/// Creates the router for the public authentication endpoints.
pub fn create_api_router(state: Arc<AuthState>) -> Router {
    Router::new()
        .route("/auth/register", post(register_handler))
        .route("/auth/login", post(login_handler))
        .with_state(state)
}

/// Handler for POST /api/auth/register - Creates a user account.
#[tracing::instrument(skip(state, payload))]
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = User),
        (status = 400, description = "Malformed name, email or password", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    ),
    tag = "Auth"
)]
pub async fn register_handler(
    State(state): State<Arc<AuthState>>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let service = UserService::new(&state.db);
    let user = service
        .register(&payload.name, &payload.email, &payload.password)
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Handler for POST /api/auth/login - Exchanges credentials for a bearer token.
#[tracing::instrument(skip(state, payload))]
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 401, description = "Invalid email or password", body = ErrorResponse)
    ),
    tag = "Auth"
)]
pub async fn login_handler(
    State(state): State<Arc<AuthState>>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let service = UserService::new(&state.db);
    let user = service.login(&payload.email, &payload.password).await?;
    let token = encode_jwt(user.id, &state.jwt_secret)?;
    Ok(Json(LoginResponse { token, user }))
}
