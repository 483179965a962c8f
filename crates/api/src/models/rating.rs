//! Rating domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use storerate_core::{Email, RatingId, Stars, StoreId, UserId};

/// One user's star rating of one store.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub id: RatingId,
    pub user_id: UserId,
    pub store_id: StoreId,
    pub rating: Stars,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Outcome of an upsert.
#[derive(Debug, Clone)]
pub struct RatingSubmission {
    pub rating: Rating,
    /// `true` when the row was inserted, `false` when an existing one was updated.
    pub created: bool,
}

/// The author embedded in a store's rating list.
#[derive(Debug, Clone, Serialize)]
pub struct RatingAuthor {
    pub id: UserId,
    pub name: String,
    pub email: Email,
}

/// A rating together with who wrote it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingWithUser {
    #[serde(flatten)]
    pub rating: Rating,
    pub user: RatingAuthor,
}

/// The store embedded in a user's rating list.
#[derive(Debug, Clone, Serialize)]
pub struct RatedStore {
    pub id: StoreId,
    pub name: String,
    pub email: Email,
    pub address: Option<String>,
}

/// A rating together with the store it is about.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingWithStore {
    #[serde(flatten)]
    pub rating: Rating,
    pub store: RatedStore,
}
