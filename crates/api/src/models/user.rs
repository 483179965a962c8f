//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use storerate_core::{Email, Role, UserId};

use super::store::StoreWithRating;

/// A platform account (domain type).
///
/// The password hash never leaves the repository layer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name (20-60 characters).
    pub name: String,
    /// Login email, unique across users.
    pub email: Email,
    /// Postal address.
    pub address: Option<String>,
    /// Current role.
    pub role: Role,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

/// A row of the admin user list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    #[serde(flatten)]
    pub user: User,
    /// Average rating of the store this user owns, if any.
    pub store_rating: Option<f64>,
}

/// A single user record, with the owned store for store owners.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: User,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<StoreWithRating>,
}

/// Values for inserting a user.
#[derive(Debug)]
pub struct NewUser {
    pub name: String,
    pub email: Email,
    /// Argon2 PHC string.
    pub password_hash: String,
    pub address: Option<String>,
    pub role: Role,
}

/// A partial profile update. `None` leaves the column unchanged.
#[derive(Debug, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<Email>,
    pub address: Option<String>,
    pub role: Option<Role>,
}

impl UserChanges {
    /// `true` when nothing would change.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.address.is_none() && self.role.is_none()
    }
}

/// Admin list filters. Text filters match case-insensitive substrings.
#[derive(Debug, Default)]
pub struct UserFilter {
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub role: Option<Role>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: UserId::new(7),
            name: "Normal User One Test Account".to_string(),
            email: Email::parse("user1@example.com").unwrap(),
            address: None,
            role: Role::User,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_user_serializes_camel_case_without_password() {
        let json = serde_json::to_value(sample_user()).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["role"], "USER");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("password").is_none());
        assert!(json.get("passwordHash").is_none());
    }

    #[test]
    fn test_summary_flattens_user() {
        let summary = UserSummary {
            user: sample_user(),
            store_rating: None,
        };
        let json = serde_json::to_value(summary).unwrap();
        assert_eq!(json["email"], "user1@example.com");
        assert!(json["storeRating"].is_null());
    }

    #[test]
    fn test_profile_omits_missing_store() {
        let profile = UserProfile {
            user: sample_user(),
            store: None,
        };
        let json = serde_json::to_value(profile).unwrap();
        assert!(json.get("store").is_none());
    }

    #[test]
    fn test_user_changes_is_empty() {
        assert!(UserChanges::default().is_empty());
        let changes = UserChanges {
            role: Some(Role::Admin),
            ..UserChanges::default()
        };
        assert!(!changes.is_empty());
    }
}
