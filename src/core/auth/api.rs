//! Auth API endpoints
//!
//! - POST /auth/sign-up - Register a new user
//! - POST /auth/sign-in - Sign in and get tokens
//! - POST /auth/refresh-token - Rotate the refresh token
//! - GET /auth/verify/{token} - Mark the email as verified
//! - DELETE /auth/logout - End the caller's session
//! - DELETE /auth/logout-all - Revoke every session (admin)
//! - GET /health - Liveness check

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde::Serialize;
use std::sync::Arc;

use crate::core::auth::error::{AuthError, ErrorKind};
use crate::core::auth::guard::{AccessGuard, AuthRequest, Authenticated, RoutePolicy};
use crate::core::auth::jwt::TokenPair;
use crate::core::auth::service::{AuthService, Credentials, RefreshRequest};
use crate::core::directory::Identity;

/// Auth API state containing the auth service and its guard
#[derive(Clone)]
pub struct AuthApiState {
    pub auth_service: AuthService,
    pub guard: AccessGuard,
}

impl AuthApiState {
    pub fn new(auth_service: AuthService) -> Self {
        Self {
            guard: AccessGuard::new(auth_service.clone()),
            auth_service,
        }
    }
}

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

impl ApiError {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
        }
    }
}

impl From<ErrorKind> for StatusCode {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Infrastructure => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Convert AuthError to API response
impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = StatusCode::from(self.kind());

        // Backend detail stays in the logs
        let message = match &self {
            AuthError::Infrastructure(detail) => {
                tracing::error!("Backend unavailable: {}", detail);
                "Service temporarily unavailable".to_string()
            }
            AuthError::InternalError(detail) => {
                tracing::error!("Internal error: {}", detail);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = ApiError::new(message, self.code());

        (status, Json(body)).into_response()
    }
}

/// Create the auth API router
pub fn auth_api_router(state: AuthApiState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route("/auth/sign-up", post(sign_up_handler))
        .route("/auth/sign-in", post(sign_in_handler))
        .route("/auth/refresh-token", post(refresh_handler))
        .route("/auth/verify/{token}", get(verify_handler))
        .route("/auth/logout", delete(logout_handler))
        .route("/auth/logout-all", delete(logout_all_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// POST /auth/sign-up
async fn sign_up_handler(
    State(state): State<Arc<AuthApiState>>,
    Json(credentials): Json<Credentials>,
) -> Result<(StatusCode, Json<Identity>), AuthError> {
    let identity = state.auth_service.sign_up(credentials).await?;

    Ok((StatusCode::CREATED, Json(identity)))
}

/// POST /auth/sign-in
async fn sign_in_handler(
    State(state): State<Arc<AuthApiState>>,
    Json(credentials): Json<Credentials>,
) -> Result<(StatusCode, Json<TokenPair>), AuthError> {
    let request = AuthRequest::with_credentials(credentials);
    let caller = state.guard.check(&RoutePolicy::credential(), &request).await?;

    let Authenticated::Credentials(identity) = caller else {
        return Err(AuthError::InvalidCredentials);
    };

    let tokens = state.auth_service.issue_session(&identity).await?;
    tracing::info!(user_id = %identity.id, "User signed in");

    Ok((StatusCode::CREATED, Json(tokens)))
}

/// POST /auth/refresh-token
async fn refresh_handler(
    State(state): State<Arc<AuthApiState>>,
    Json(request): Json<RefreshRequest>,
) -> Result<(StatusCode, Json<TokenPair>), AuthError> {
    let tokens = state.auth_service.refresh(&request.refresh_token).await?;

    Ok((StatusCode::CREATED, Json(tokens)))
}

/// GET /auth/verify/{token}
async fn verify_handler(
    State(state): State<Arc<AuthApiState>>,
    Path(token): Path<String>,
) -> Result<StatusCode, AuthError> {
    state.auth_service.verify_email(&token).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /auth/logout
async fn logout_handler(
    State(state): State<Arc<AuthApiState>>,
    headers: HeaderMap,
) -> Result<StatusCode, AuthError> {
    let request = bearer_request(&headers)?;
    let caller = state.guard.check(&RoutePolicy::bearer(), &request).await?;

    state.auth_service.logout(caller.email()).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /auth/logout-all
async fn logout_all_handler(
    State(state): State<Arc<AuthApiState>>,
    headers: HeaderMap,
) -> Result<StatusCode, AuthError> {
    let request = bearer_request(&headers)?;
    let caller = state.guard.check(&RoutePolicy::admin(), &request).await?;

    tracing::info!(user_id = %caller.id(), "Logout-all requested");
    state.auth_service.logout_all().await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /health
async fn health_handler() -> &'static str {
    "OK"
}

fn bearer_request(headers: &HeaderMap) -> Result<AuthRequest, AuthError> {
    Ok(AuthRequest::with_bearer(extract_bearer_token(headers)?))
}

/// Extract Bearer token from Authorization header
fn extract_bearer_token(headers: &HeaderMap) -> Result<String, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingToken)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::MissingToken)?;

    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }

    Ok(token.to_string())
}
