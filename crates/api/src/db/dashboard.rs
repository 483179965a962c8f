//! Aggregate queries behind the dashboards.

use sqlx::PgPool;
use tracing::instrument;

use storerate_core::UserId;

use super::{RepositoryError, StoreRepository};
use crate::models::{OwnerDashboard, PlatformTotals};

/// Count users, stores and ratings in one round trip.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
#[instrument(skip(pool))]
pub async fn platform_totals(pool: &PgPool) -> Result<PlatformTotals, RepositoryError> {
    let (total_users, total_stores, total_ratings): (i64, i64, i64) = sqlx::query_as(
        r"
        SELECT (SELECT COUNT(*) FROM users),
               (SELECT COUNT(*) FROM stores),
               (SELECT COUNT(*) FROM ratings)
        ",
    )
    .fetch_one(pool)
    .await?;

    Ok(PlatformTotals {
        total_users,
        total_stores,
        total_ratings,
    })
}

/// The owner's store with its aggregate and raters, or `None` when the owner
/// has no store bound.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a query fails.
/// Returns `RepositoryError::DataCorruption` if a stored email is invalid.
#[instrument(skip(pool), fields(owner_id = %owner))]
pub async fn owner_dashboard(
    pool: &PgPool,
    owner: UserId,
) -> Result<Option<OwnerDashboard>, RepositoryError> {
    let stores = StoreRepository::new(pool);

    let Some(summary) = stores.get_by_owner(owner).await? else {
        return Ok(None);
    };
    let rating_users = stores.raters(summary.store.id).await?;

    Ok(Some(OwnerDashboard {
        store: summary.store,
        average_rating: summary.average_rating,
        total_ratings: summary.rating_count,
        rating_users,
    }))
}
