//! HTTP middleware stack for the API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transactions)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (recorded into the span)
//! 4. CORS
//! 5. Rate limiting (governor), `/api/auth` only
//!
//! Authentication is not a layer: handlers opt in with the [`RequireAuth`]
//! and [`OptionalAuth`] extractors.

pub mod auth;
pub mod rate_limit;
pub mod request_id;

pub use auth::{OptionalAuth, RequireAuth};
pub use rate_limit::{auth_rate_limiter, json_rate_limit_response};
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
