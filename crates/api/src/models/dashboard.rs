//! Dashboard aggregates.

use serde::Serialize;

use super::store::{Store, StoreRater};

/// Platform-wide row counts for the admin dashboard.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformTotals {
    pub total_users: i64,
    pub total_stores: i64,
    pub total_ratings: i64,
}

/// The store owner's view of their store.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerDashboard {
    pub store: Store,
    pub average_rating: f64,
    pub total_ratings: i64,
    /// Raters, newest rating first.
    pub rating_users: Vec<StoreRater>,
}
