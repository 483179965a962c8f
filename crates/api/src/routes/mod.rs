//! HTTP route handlers for the ratings API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                     - Liveness
//! GET  /health/ready               - Readiness (database reachable)
//!
//! # Auth (rate limited)
//! POST /api/auth/register          - Create a USER account, returns a token
//! POST /api/auth/login             - Exchange credentials for a token
//! POST /api/auth/change-password   - Replace the caller's password
//!
//! # Users
//! GET    /api/users                - List with filters (admin)
//! POST   /api/users                - Create with any role (admin)
//! GET    /api/users/{id}           - Profile (self or admin)
//! PUT    /api/users/{id}           - Partial update (self or admin)
//! DELETE /api/users/{id}           - Delete (admin)
//!
//! # Stores
//! GET    /api/stores               - List with filters and aggregates
//! GET    /api/stores/{id}          - Detail, raters for admin or owner
//! POST   /api/stores               - Create (admin)
//! PUT    /api/stores/{id}          - Partial update (admin)
//! DELETE /api/stores/{id}          - Delete with its ratings (admin)
//!
//! # Ratings
//! POST   /api/ratings              - Submit or update the caller's rating
//! GET    /api/ratings/store/{id}   - Ratings of a store (admin or owner)
//! GET    /api/ratings/user/{id}    - Ratings by a user (self or admin)
//! GET    /api/ratings/{id}         - One rating (author or admin)
//! DELETE /api/ratings/{id}         - Delete (author or admin)
//!
//! # Dashboard
//! GET  /api/dashboard/admin        - Platform totals (admin)
//! GET  /api/dashboard/store-owner  - Own store summary (store owner)
//! ```

pub mod auth;
pub mod dashboard;
pub mod ratings;
pub mod stores;
pub mod users;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::Serialize;

use storerate_core::{Email, ValidationErrors, validation::messages};

use crate::db::RepositoryError;
use crate::error::AppError;
use crate::state::AppState;

/// All API routes, without the health checks and outer layers.
///
/// `trust_proxy_headers` decides how the auth rate limiter identifies clients.
pub fn router(trust_proxy_headers: bool) -> Router<AppState> {
    Router::new()
        .nest("/api/auth", auth::router(trust_proxy_headers))
        .nest("/api/users", users::router())
        .nest("/api/stores", stores::router())
        .nest("/api/ratings", ratings::router())
        .nest("/api/dashboard", dashboard::router())
}

/// Health check routes.
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(ready))
}

/// Liveness check. Always succeeds while the process is serving.
async fn health() -> &'static str {
    "ok"
}

/// Readiness check - verifies the database connection.
async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    match sqlx::query("SELECT 1").execute(state.pool()).await {
        Ok(_) => (StatusCode::OK, "ok"),
        Err(e) => {
            tracing::error!("Readiness check failed: {e}");
            (StatusCode::SERVICE_UNAVAILABLE, "database unavailable")
        }
    }
}

/// `{"message": ...}` acknowledgement body.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Take a field the validator has already required.
fn required(field: Option<String>, message: &str) -> Result<String, ValidationErrors> {
    field.ok_or_else(|| ValidationErrors::single(message))
}

/// Parse an email the validator has already accepted. Surrounding
/// whitespace is dropped and the address is lowercased.
pub fn parse_email(raw: &str) -> Result<Email, ValidationErrors> {
    Email::parse(&raw.trim().to_lowercase()).map_err(|_| ValidationErrors::single(messages::EMAIL))
}

/// Blank optional text counts as absent.
fn non_blank(field: Option<String>) -> Option<String> {
    field.filter(|v| !v.trim().is_empty())
}

/// Convert a repository error, giving `NotFound` a resource-specific message.
fn not_found_as(message: &'static str) -> impl FnOnce(RepositoryError) -> AppError {
    move |e| match e {
        RepositoryError::NotFound => AppError::not_found(message),
        other => other.into(),
    }
}


#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use super::test_support::{bearer_for, body_json, request, send};
    use super::*;

    #[test]
    fn test_parse_email_normalizes() {
        let email = parse_email("  Normal.User@Example.COM ").unwrap();
        assert_eq!(email.as_str(), "normal.user@example.com");
        assert!(parse_email("nope").is_err());
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  ".to_string())), None);
        assert_eq!(non_blank(Some("12 Main St".to_string())).as_deref(), Some("12 Main St"));
    }

    #[test]
    fn test_not_found_as() {
        let err = not_found_as("Store not found")(RepositoryError::NotFound);
        assert!(matches!(err, AppError::NotFound(m) if m == "Store not found"));
    }

    #[tokio::test]
    async fn test_health() {
        let response = send(request("GET", "/health", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_ready_without_database() {
        let response = send(request("GET", "/health/ready", None)).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let response = send(request("GET", "/api/nothing-here", None)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_protected_routes_require_token() {
        for (method, uri) in [
            ("GET", "/api/users"),
            ("GET", "/api/users/1"),
            ("DELETE", "/api/stores/1"),
            ("GET", "/api/ratings/1"),
            ("GET", "/api/dashboard/admin"),
            ("GET", "/api/dashboard/store-owner"),
        ] {
            let response = send(request(method, uri, None)).await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{method} {uri}");
            assert_eq!(
                body_json(response).await,
                json!({ "message": "Authentication required" })
            );
        }
    }

    #[tokio::test]
    async fn test_garbage_token_is_invalid() {
        let response = send(request("GET", "/api/users/1", Some("Bearer a.b.c"))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await, json!({ "message": "Invalid token" }));
    }

    #[tokio::test]
    async fn test_database_failure_is_opaque() {
        let authorization = bearer_for(1);
        let response = send(request("GET", "/api/users/1", Some(&authorization))).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({ "message": "Internal server error" })
        );
    }
}
