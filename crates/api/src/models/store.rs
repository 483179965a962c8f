//! Store domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use storerate_core::{Email, Stars, StoreId, UserId};

/// A rated store (domain type).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    /// Unique store ID.
    pub id: StoreId,
    /// Display name (20-60 characters).
    pub name: String,
    /// Contact email, unique across stores.
    pub email: Email,
    /// Postal address.
    pub address: Option<String>,
    /// The `STORE_OWNER` bound to this store.
    pub owner_id: Option<UserId>,
    /// When the store was created.
    pub created_at: DateTime<Utc>,
    /// When the store was last updated.
    pub updated_at: DateTime<Utc>,
}

/// A store with its live rating aggregate.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreWithRating {
    #[serde(flatten)]
    pub store: Store,
    /// Mean rating, `0.0` when unrated.
    pub average_rating: f64,
    pub rating_count: i64,
}

/// A store as seen by a (possibly anonymous) browser.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreListing {
    #[serde(flatten)]
    pub store: StoreWithRating,
    /// The caller's own rating, `null` when unrated or anonymous.
    pub user_rating: Option<Stars>,
}

/// Store detail; `ratings` is present only for callers allowed to see raters.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreDetail {
    #[serde(flatten)]
    pub listing: StoreListing,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratings: Option<Vec<StoreRater>>,
}

/// A user who rated a store, with their rating.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreRater {
    /// The rater's user ID.
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub rating: Stars,
    /// When the rating was first submitted.
    pub created_at: DateTime<Utc>,
}

/// Values for inserting a store.
#[derive(Debug)]
pub struct NewStore {
    pub name: String,
    pub email: Email,
    pub address: Option<String>,
    pub owner_id: Option<UserId>,
}

/// What to do with a store's owner on update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OwnerChange {
    /// Leave the owner as is.
    #[default]
    Keep,
    /// Detach the current owner.
    Clear,
    /// Bind the store to this user.
    Assign(UserId),
}

impl OwnerChange {
    /// Build from a request field where absent means keep and `null` means clear.
    #[must_use]
    pub fn from_field(field: Option<Option<UserId>>) -> Self {
        match field {
            None => Self::Keep,
            Some(None) => Self::Clear,
            Some(Some(owner)) => Self::Assign(owner),
        }
    }
}

/// A partial store update. `None` leaves the column unchanged.
#[derive(Debug, Default)]
pub struct StoreChanges {
    pub name: Option<String>,
    pub email: Option<Email>,
    pub address: Option<String>,
    pub owner: OwnerChange,
}

/// Store list filters. Both match case-insensitive substrings.
#[derive(Debug, Default)]
pub struct StoreFilter {
    pub name: Option<String>,
    pub address: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_listing() -> StoreListing {
        StoreListing {
            store: StoreWithRating {
                store: Store {
                    id: StoreId::new(1),
                    name: "Grocery Emporium Main Street".to_string(),
                    email: Email::parse("grocery@example.com").unwrap(),
                    address: Some("123 Main St".to_string()),
                    owner_id: Some(UserId::new(2)),
                    created_at: Utc::now(),
                    updated_at: Utc::now(),
                },
                average_rating: 4.5,
                rating_count: 2,
            },
            user_rating: Stars::new(5).ok(),
        }
    }

    #[test]
    fn test_listing_is_flat_camel_case() {
        let json = serde_json::to_value(sample_listing()).unwrap();
        assert_eq!(json["ownerId"], 2);
        assert_eq!(json["averageRating"], 4.5);
        assert_eq!(json["ratingCount"], 2);
        assert_eq!(json["userRating"], 5);
        assert_eq!(json["name"], "Grocery Emporium Main Street");
    }

    #[test]
    fn test_detail_hides_raters_when_absent() {
        let detail = StoreDetail {
            listing: sample_listing(),
            ratings: None,
        };
        let json = serde_json::to_value(detail).unwrap();
        assert!(json.get("ratings").is_none());
    }

    #[test]
    fn test_owner_change_from_field() {
        assert_eq!(OwnerChange::from_field(None), OwnerChange::Keep);
        assert_eq!(OwnerChange::from_field(Some(None)), OwnerChange::Clear);
        assert_eq!(
            OwnerChange::from_field(Some(Some(UserId::new(4)))),
            OwnerChange::Assign(UserId::new(4))
        );
    }
}
