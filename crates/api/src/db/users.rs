//! User repository for database operations.
//!
//! Queries are built at runtime with `sqlx::query_as` and decoded through
//! private row types, then converted into validated domain types.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, instrument};

use storerate_core::{Email, Role, UserId, Validator};

use super::{RepositoryError, filter_pattern, map_write_error};
use crate::models::{NewUser, User, UserChanges, UserFilter, UserSummary};

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: UserId,
    name: String,
    email: String,
    address: Option<String>,
    role: Role,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            name: row.name,
            email,
            address: row.address,
            role: row.role,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserSummaryRow {
    #[sqlx(flatten)]
    user: UserRow,
    store_rating: Option<f64>,
}

#[derive(Debug, sqlx::FromRow)]
struct UserPasswordRow {
    #[sqlx(flatten)]
    user: UserRow,
    password: String,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List users matching the filter, each with the average rating of the
    /// store they own.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored email is invalid.
    #[instrument(skip(self))]
    pub async fn list(&self, filter: &UserFilter) -> Result<Vec<UserSummary>, RepositoryError> {
        let rows: Vec<UserSummaryRow> = sqlx::query_as(
            r"
            SELECT u.id, u.name, u.email, u.address, u.role, u.created_at, u.updated_at,
                   (SELECT COALESCE(AVG(r.rating), 0)::float8
                    FROM stores s
                    LEFT JOIN ratings r ON r.store_id = s.id
                    WHERE s.owner_id = u.id
                    GROUP BY s.id) AS store_rating
            FROM users u
            WHERE ($1::text IS NULL OR u.name ILIKE $1)
              AND ($2::text IS NULL OR u.email ILIKE $2)
              AND ($3::text IS NULL OR u.address ILIKE $3)
              AND ($4::user_role IS NULL OR u.role = $4)
            ORDER BY u.id
            ",
        )
        .bind(filter_pattern(filter.name.as_deref()))
        .bind(filter_pattern(filter.email.as_deref()))
        .bind(filter_pattern(filter.address.as_deref()))
        .bind(filter.role)
        .fetch_all(self.pool)
        .await?;

        debug!(count = rows.len(), "Listed users");

        rows.into_iter()
            .map(|row| {
                Ok(UserSummary {
                    user: row.user.try_into()?,
                    store_rating: row.store_rating,
                })
            })
            .collect()
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(
            r"
            SELECT id, name, email, address, role, created_at, updated_at
            FROM users
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    #[instrument(skip(self, email))]
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(
            r"
            SELECT id, name, email, address, role, created_at, updated_at
            FROM users
            WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Get a user and their password hash by email (for login).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    #[instrument(skip(self, email))]
    pub async fn get_with_password(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row: Option<UserPasswordRow> = sqlx::query_as(
            r"
            SELECT id, name, email, address, role, created_at, updated_at, password
            FROM users
            WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some((r.user.try_into()?, r.password))),
            None => Ok(None),
        }
    }

    /// Get a user's password hash by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn get_password_hash(&self, id: UserId) -> Result<Option<String>, RepositoryError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT password FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(|(hash,)| hash))
    }

    /// Create a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Invalid` if the name or address break the field rules.
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, new), fields(role = %new.role))]
    pub async fn create(&self, new: &NewUser) -> Result<User, RepositoryError> {
        Validator::new()
            .name(Some(new.name.as_str()))
            .address(new.address.as_deref())
            .finish()?;

        let row: UserRow = sqlx::query_as(
            r"
            INSERT INTO users (name, email, password, address, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, address, role, created_at, updated_at
            ",
        )
        .bind(&new.name)
        .bind(new.email.as_str())
        .bind(&new.password_hash)
        .bind(new.address.as_deref())
        .bind(new.role)
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_write_error(e, "email already exists"))?;

        debug!(user_id = %row.id, "Created user");
        row.try_into()
    }

    /// Apply a partial update.
    ///
    /// The user row is locked first, so a concurrent store binding cannot
    /// slip in between the ownership check and the role change.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Invalid` if a provided field breaks the field rules.
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::OwnsStore` if the role would become `USER`
    /// while a store is still bound to the user.
    /// Returns `RepositoryError::Conflict` if the new email is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, changes), fields(user_id = %id))]
    pub async fn update(&self, id: UserId, changes: &UserChanges) -> Result<User, RepositoryError> {
        Validator::new()
            .optional_name(changes.name.as_deref())
            .address(changes.address.as_deref())
            .finish()?;

        let mut tx = self.pool.begin().await?;

        let locked: Option<(UserId,)> =
            sqlx::query_as("SELECT id FROM users WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Err(RepositoryError::NotFound);
        }

        if changes.role == Some(Role::User) {
            let (owns_store,): (bool,) =
                sqlx::query_as("SELECT EXISTS (SELECT 1 FROM stores WHERE owner_id = $1)")
                    .bind(id)
                    .fetch_one(&mut *tx)
                    .await?;
            if owns_store {
                return Err(RepositoryError::OwnsStore);
            }
        }

        let row: UserRow = sqlx::query_as(
            r"
            UPDATE users
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                address = COALESCE($4, address),
                role = COALESCE($5::user_role, role),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, email, address, role, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(changes.name.as_deref())
        .bind(changes.email.as_ref().map(Email::as_str))
        .bind(changes.address.as_deref())
        .bind(changes.role)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "email already exists"))?;

        tx.commit().await?;

        row.try_into()
    }

    /// Replace a user's password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, password_hash), fields(user_id = %id))]
    pub async fn update_password(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE users
            SET password = $2, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(password_hash)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Delete a user. Their ratings go with them and any store they owned
    /// is detached.
    ///
    /// # Returns
    ///
    /// Returns `true` if the user was deleted, `false` if they didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn delete(&self, id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
