//! Authentication route handlers.
//!
//! Registration and login answer with the user and a bearer token. The
//! router is wrapped in a per-IP rate limiter.

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware::map_response,
    routing::post,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use storerate_core::{Validator, validation::messages};

use super::{MessageResponse, non_blank, parse_email, required};
use crate::error::{Result, add_breadcrumb};
use crate::extract::Json;
use crate::middleware::{RequireAuth, auth_rate_limiter, json_rate_limit_response};
use crate::models::User;
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

/// Build the auth router, rate limited per client IP.
pub fn router(trust_proxy_headers: bool) -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/change-password", post(change_password))
        .layer(auth_rate_limiter(trust_proxy_headers))
        .layer(map_response(json_rate_limit_response))
}

/// Registration request.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub address: Option<String>,
}

/// Login request.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Password change request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

/// The authenticated user and their bearer token.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

/// Register a new `USER` account.
///
/// POST /api/auth/register
async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    Validator::new()
        .name(req.name.as_deref())
        .email(req.email.as_deref())
        .password(req.password.as_deref())
        .address(req.address.as_deref())
        .finish()?;

    let name = required(req.name, messages::NAME)?;
    let email = parse_email(&required(req.email, messages::EMAIL)?)?;
    let password = required(req.password, messages::PASSWORD)?;

    let user = AuthService::new(state.pool())
        .register(name, email, &password, non_blank(req.address))
        .await?;
    let token = state.tokens().issue(user.id).map_err(AuthError::from)?;

    info!(user_id = %user.id, "User registered");
    Ok((StatusCode::CREATED, Json(AuthResponse { user, token })))
}

/// Exchange email and password for a token.
///
/// POST /api/auth/login
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    Validator::new()
        .email(req.email.as_deref())
        .password_present(req.password.as_deref())
        .finish()?;

    let email = parse_email(&required(req.email, messages::EMAIL)?)?;
    let password = required(req.password, messages::PASSWORD_REQUIRED)?;

    let user = AuthService::new(state.pool())
        .login(&email, &password)
        .await?;
    let token = state.tokens().issue(user.id).map_err(AuthError::from)?;

    add_breadcrumb("auth", "User logged in", None);
    info!(user_id = %user.id, "User logged in");
    Ok(Json(AuthResponse { user, token }))
}

/// Replace the caller's password after checking the current one.
///
/// POST /api/auth/change-password
async fn change_password(
    RequireAuth(actor): RequireAuth,
    State(state): State<AppState>,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>> {
    Validator::new()
        .current_password_present(req.current_password.as_deref())
        .password(req.new_password.as_deref())
        .finish()?;

    let current = required(req.current_password, messages::CURRENT_PASSWORD_REQUIRED)?;
    let new = required(req.new_password, messages::PASSWORD)?;

    AuthService::new(state.pool())
        .change_password(actor.id, &current, &new)
        .await?;

    Ok(Json(MessageResponse {
        message: "Password updated successfully",
    }))
}
