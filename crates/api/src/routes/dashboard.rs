//! Dashboard route handlers.

use axum::{Router, extract::State, routing::get};

use crate::db::dashboard;
use crate::error::{AppError, Result};
use crate::extract::Json;
use crate::middleware::RequireAuth;
use crate::models::{OwnerDashboard, PlatformTotals};
use crate::state::AppState;

/// Build the dashboard router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin", get(admin))
        .route("/store-owner", get(store_owner))
}

/// Platform-wide totals.
///
/// GET /api/dashboard/admin
async fn admin(
    RequireAuth(actor): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<PlatformTotals>> {
    if !actor.view_admin_dashboard().is_allowed() {
        return Err(AppError::forbidden());
    }

    Ok(Json(dashboard::platform_totals(state.pool()).await?))
}

/// The caller's store with its average and raters, newest first.
///
/// GET /api/dashboard/store-owner
async fn store_owner(
    RequireAuth(actor): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<OwnerDashboard>> {
    if !actor.view_owner_dashboard().is_allowed() {
        return Err(AppError::forbidden());
    }

    let summary = dashboard::owner_dashboard(state.pool(), actor.id)
        .await?
        .ok_or_else(|| AppError::not_found("Store not found for this owner"))?;
    Ok(Json(summary))
}
