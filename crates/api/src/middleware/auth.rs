//! Authentication extractors.
//!
//! Callers authenticate with `Authorization: Bearer <token>`. The token only
//! proves *who* the caller is; their role is re-read from the database on
//! every request so role changes and deletions take effect immediately.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use tracing::{Span, debug, warn};

use storerate_core::{Actor, UserId};

use crate::db::UserRepository;
use crate::error::{AppError, set_sentry_user};
use crate::state::AppState;

const AUTHENTICATION_REQUIRED: &str = "Authentication required";
const INVALID_TOKEN: &str = "Invalid token";
const USER_NOT_FOUND: &str = "User not found";

/// Extractor that requires a valid bearer token for an existing user.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(actor): RequireAuth) -> impl IntoResponse {
///     format!("Hello, user {}!", actor.id)
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RequireAuth(pub Actor);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::Unauthorized(AUTHENTICATION_REQUIRED.to_string()))?;

        let user_id = state.tokens().verify(token).map_err(|e| {
            debug!(error = %e, "Rejected bearer token");
            AppError::Unauthorized(INVALID_TOKEN.to_string())
        })?;

        let actor = load_actor(state, user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized(USER_NOT_FOUND.to_string()))?;

        Ok(Self(actor))
    }
}

/// Extractor that identifies the caller when a usable token is present.
///
/// Missing, invalid or expired tokens all yield `None` instead of rejecting,
/// so public endpoints stay public.
#[derive(Debug, Clone, Copy)]
pub struct OptionalAuth(pub Option<Actor>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(user_id) = bearer_token(parts).and_then(|t| state.tokens().verify(t).ok()) else {
            return Ok(Self(None));
        };

        match load_actor(state, user_id).await {
            Ok(actor) => Ok(Self(actor)),
            Err(e) => {
                warn!(error = %e, "Could not resolve optional caller");
                Ok(Self(None))
            }
        }
    }
}

/// Look up the caller's current role and tag the request with their identity.
async fn load_actor(state: &AppState, user_id: UserId) -> Result<Option<Actor>, AppError> {
    let Some(user) = UserRepository::new(state.pool()).get_by_id(user_id).await? else {
        return Ok(None);
    };

    Span::current().record("user_id", user.id.as_i32());
    set_sentry_user(&user.id, Some(user.email.as_str()));

    Ok(Some(Actor::new(user.id, user.role)))
}

/// Token from an `Authorization: Bearer` header; the scheme is case-insensitive.
fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts(authorization: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/users/1");
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&parts(Some("Bearer abc.def.ghi"))), Some("abc.def.ghi"));
        assert_eq!(bearer_token(&parts(Some("bearer  abc"))), Some("abc"));
        assert_eq!(bearer_token(&parts(Some("Basic dXNlcjpwYXNz"))), None);
        assert_eq!(bearer_token(&parts(Some("Bearer "))), None);
        assert_eq!(bearer_token(&parts(Some("Bearer"))), None);
        assert_eq!(bearer_token(&parts(None)), None);
    }
}
