//! Demo fixtures.
//!
//! Loads five accounts, five stores and a handful of ratings. Running it
//! again reuses whatever already exists (matched by email) and re-applies
//! the ratings, so the command is safe to repeat.

use std::collections::HashMap;

use sqlx::PgPool;

use storerate_api::db::{RatingRepository, StoreRepository, UserRepository};
use storerate_api::models::{NewStore, Store, User};
use storerate_api::routes::parse_email;
use storerate_api::services::auth::AuthService;
use storerate_core::{Role, Stars, UserId, Validator};

use super::{CommandError, connect};

/// Password for seeded accounts unless `--password` is given.
pub const DEFAULT_PASSWORD: &str = "Storerate@2024";

struct UserFixture {
    name: &'static str,
    email: &'static str,
    address: &'static str,
    role: Role,
}

struct StoreFixture {
    name: &'static str,
    email: &'static str,
    address: &'static str,
    /// Email of an entry in [`USERS`].
    owner: Option<&'static str>,
}

/// Store owners are created as plain users; binding a store elevates them.
static USERS: [UserFixture; 5] = [
    UserFixture {
        name: "System Administrator Account",
        email: "admin@example.com",
        address: "123 Admin Street, Admin City, Admin Country",
        role: Role::Admin,
    },
    UserFixture {
        name: "Store Owner One Demo Account",
        email: "store@example.com",
        address: "456 Store Avenue, Store City, Store Country",
        role: Role::User,
    },
    UserFixture {
        name: "Normal User One Demo Account",
        email: "user@example.com",
        address: "789 User Boulevard, User City, User Country",
        role: Role::User,
    },
    UserFixture {
        name: "Store Owner Two Demo Account",
        email: "store2@example.com",
        address: "101 Another Store Street, Store City, Store Country",
        role: Role::User,
    },
    UserFixture {
        name: "Normal User Two Demo Account",
        email: "user2@example.com",
        address: "202 Another User Avenue, User City, User Country",
        role: Role::User,
    },
];

static STORES: [StoreFixture; 5] = [
    StoreFixture {
        name: "Grocery Emporium Main Street",
        email: "store@example.com",
        address: "12 Market Road, Store City, Store Country",
        owner: Some("store@example.com"),
    },
    StoreFixture {
        name: "Tech Haven Electronics Outlet",
        email: "store2@example.com",
        address: "34 Circuit Lane, Store City, Store Country",
        owner: Some("store2@example.com"),
    },
    StoreFixture {
        name: "Fashion Forward Clothing Boutique",
        email: "fashion@example.com",
        address: "56 Runway Avenue, Style City, Store Country",
        owner: None,
    },
    StoreFixture {
        name: "Book Nook Reading Corner Shop",
        email: "books@example.com",
        address: "78 Chapter Street, Library Town, Store Country",
        owner: None,
    },
    StoreFixture {
        name: "Health Mart Wellness Center",
        email: "health@example.com",
        address: "90 Vitality Road, Wellness City, Store Country",
        owner: None,
    },
];

/// `(store email, user email, stars)`.
static RATINGS: [(&str, &str, i64); 5] = [
    ("store@example.com", "user@example.com", 4),
    ("store2@example.com", "user@example.com", 3),
    ("store@example.com", "user2@example.com", 5),
    ("fashion@example.com", "user@example.com", 4),
    ("books@example.com", "user2@example.com", 5),
];

/// Seed the database.
///
/// # Errors
///
/// Returns `CommandError::Invalid` if `password` breaks the password rules.
/// Returns `CommandError` if the database is unreachable or a write fails.
pub async fn run(password: &str) -> Result<(), CommandError> {
    Validator::new().password(Some(password)).finish()?;

    let pool = connect().await?;

    let mut users = HashMap::with_capacity(USERS.len());
    for fixture in &USERS {
        let user = seed_user(&pool, fixture, password).await?;
        users.insert(fixture.email, user.id);
    }

    let mut stores = HashMap::with_capacity(STORES.len());
    for fixture in &STORES {
        let owner = fixture.owner.and_then(|email| users.get(email).copied());
        let store = seed_store(&pool, fixture, owner).await?;
        stores.insert(fixture.email, store.id);
    }

    let ratings = RatingRepository::new(&pool);
    for &(store, user, stars) in &RATINGS {
        if let (Some(&store_id), Some(&user_id)) = (stores.get(store), users.get(user)) {
            ratings.submit(user_id, store_id, Stars::new(stars)?).await?;
        }
    }

    tracing::info!(
        users = users.len(),
        stores = stores.len(),
        ratings = RATINGS.len(),
        "Seed complete"
    );
    Ok(())
}

async fn seed_user(
    pool: &PgPool,
    fixture: &UserFixture,
    password: &str,
) -> Result<User, CommandError> {
    let email = parse_email(fixture.email)?;

    if let Some(existing) = UserRepository::new(pool).get_by_email(&email).await? {
        tracing::info!(email = %existing.email, "User exists, skipping");
        return Ok(existing);
    }

    let user = AuthService::new(pool)
        .create_account(
            fixture.name.to_string(),
            email,
            password,
            Some(fixture.address.to_string()),
            fixture.role,
        )
        .await?;
    tracing::info!(user_id = %user.id, email = %user.email, "Seeded user");
    Ok(user)
}

async fn seed_store(
    pool: &PgPool,
    fixture: &StoreFixture,
    owner: Option<UserId>,
) -> Result<Store, CommandError> {
    let email = parse_email(fixture.email)?;
    let stores = StoreRepository::new(pool);

    if let Some(existing) = stores.get_by_email(&email).await? {
        tracing::info!(email = %existing.email, "Store exists, skipping");
        return Ok(existing);
    }

    let store = stores
        .create(&NewStore {
            name: fixture.name.to_string(),
            email,
            address: Some(fixture.address.to_string()),
            owner_id: owner,
        })
        .await?;
    tracing::info!(store_id = %store.id, owner_id = ?store.owner_id, "Seeded store");
    Ok(store)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_user_fixtures_pass_account_rules() {
        for user in &USERS {
            assert!(
                Validator::new()
                    .name(Some(user.name))
                    .email(Some(user.email))
                    .address(Some(user.address))
                    .finish()
                    .is_ok(),
                "{} breaks the account rules",
                user.name
            );
        }
    }

    #[test]
    fn test_store_fixtures_pass_store_rules() {
        for store in &STORES {
            assert!(
                Validator::new()
                    .name(Some(store.name))
                    .email(Some(store.email))
                    .address(Some(store.address))
                    .finish()
                    .is_ok(),
                "{} breaks the store rules",
                store.name
            );
        }
    }

    #[test]
    fn test_default_password_is_accepted() {
        assert!(Validator::new().password(Some(DEFAULT_PASSWORD)).finish().is_ok());
    }

    fn user(email: &str) -> &'static UserFixture {
        USERS.iter().find(|u| u.email == email).unwrap()
    }

    #[test]
    fn test_each_owner_binds_one_store() {
        let owners: Vec<&str> = STORES.iter().filter_map(|s| s.owner).collect();
        let unique: HashSet<&str> = owners.iter().copied().collect();
        assert_eq!(owners.len(), unique.len());
        assert!(owners.iter().all(|email| user(email).role == Role::User));
    }

    #[test]
    fn test_ratings_reference_known_fixtures() {
        let owners: HashSet<&str> = STORES.iter().filter_map(|s| s.owner).collect();
        for &(store, rater, stars) in &RATINGS {
            assert!(STORES.iter().any(|s| s.email == store));
            assert_eq!(user(rater).role, Role::User);
            assert!(!owners.contains(rater));
            assert!(Stars::new(stars).is_ok());
        }
    }
}
