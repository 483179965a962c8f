//! Rating repository for database operations.
//!
//! Store averages are never stored: every read computes `AVG(rating)` from
//! the live rows, so a write is visible to the very next query.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, instrument};

use storerate_core::{Email, RatingId, Stars, StoreId, UserId};

use super::{RepositoryError, map_write_error};
use crate::models::{
    RatedStore, Rating, RatingAuthor, RatingSubmission, RatingWithStore, RatingWithUser,
};

#[derive(Debug, sqlx::FromRow)]
struct RatingRow {
    id: RatingId,
    user_id: UserId,
    store_id: StoreId,
    rating: Stars,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<RatingRow> for Rating {
    fn from(row: RatingRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            store_id: row.store_id,
            rating: row.rating,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UpsertRow {
    #[sqlx(flatten)]
    rating: RatingRow,
    inserted: bool,
}

#[derive(Debug, sqlx::FromRow)]
struct RatingWithUserRow {
    #[sqlx(flatten)]
    rating: RatingRow,
    author_name: String,
    author_email: String,
}

#[derive(Debug, sqlx::FromRow)]
struct RatingWithStoreRow {
    #[sqlx(flatten)]
    rating: RatingRow,
    store_name: String,
    store_email: String,
    store_address: Option<String>,
}

fn parse_email(raw: &str) -> Result<Email, RepositoryError> {
    Email::parse(raw)
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid email in database: {e}")))
}

/// Repository for rating database operations.
pub struct RatingRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RatingRepository<'a> {
    /// Create a new rating repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert or update the caller's rating of a store in one statement.
    ///
    /// Concurrent submissions for the same pair serialize on the unique key;
    /// the last writer wins.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user or store doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self), fields(user_id = %user_id, store_id = %store_id, stars = %stars))]
    pub async fn submit(
        &self,
        user_id: UserId,
        store_id: StoreId,
        stars: Stars,
    ) -> Result<RatingSubmission, RepositoryError> {
        let row: UpsertRow = sqlx::query_as(
            r"
            INSERT INTO ratings (user_id, store_id, rating)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, store_id)
            DO UPDATE SET rating = EXCLUDED.rating, updated_at = NOW()
            RETURNING id, user_id, store_id, rating, created_at, updated_at,
                      (xmax = 0) AS inserted
            ",
        )
        .bind(user_id)
        .bind(store_id)
        .bind(stars)
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_write_error(e, "rating already exists"))?;

        debug!(rating_id = %row.rating.id, created = row.inserted, "Stored rating");

        Ok(RatingSubmission {
            rating: row.rating.into(),
            created: row.inserted,
        })
    }

    /// Mean rating of a store, `0.0` when it has none.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(store_id = %store_id))]
    pub async fn average_for_store(&self, store_id: StoreId) -> Result<f64, RepositoryError> {
        let (average,): (f64,) = sqlx::query_as(
            "SELECT COALESCE(AVG(rating), 0)::float8 FROM ratings WHERE store_id = $1",
        )
        .bind(store_id)
        .fetch_one(self.pool)
        .await?;

        Ok(average)
    }

    /// Number of ratings a store has received.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(store_id = %store_id))]
    pub async fn count_for_store(&self, store_id: StoreId) -> Result<i64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM ratings WHERE store_id = $1")
            .bind(store_id)
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }

    /// Get a rating by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(rating_id = %id))]
    pub async fn get_by_id(&self, id: RatingId) -> Result<Option<Rating>, RepositoryError> {
        let row: Option<RatingRow> = sqlx::query_as(
            r"
            SELECT id, user_id, store_id, rating, created_at, updated_at
            FROM ratings
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Rating::from))
    }

    /// All ratings of a store with their authors, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored email is invalid.
    #[instrument(skip(self), fields(store_id = %store_id))]
    pub async fn list_for_store(
        &self,
        store_id: StoreId,
    ) -> Result<Vec<RatingWithUser>, RepositoryError> {
        let rows: Vec<RatingWithUserRow> = sqlx::query_as(
            r"
            SELECT r.id, r.user_id, r.store_id, r.rating, r.created_at, r.updated_at,
                   u.name AS author_name, u.email AS author_email
            FROM ratings r
            JOIN users u ON u.id = r.user_id
            WHERE r.store_id = $1
            ORDER BY r.created_at DESC, r.id DESC
            ",
        )
        .bind(store_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let user = RatingAuthor {
                    id: row.rating.user_id,
                    name: row.author_name,
                    email: parse_email(&row.author_email)?,
                };
                Ok(RatingWithUser {
                    rating: row.rating.into(),
                    user,
                })
            })
            .collect()
    }

    /// All ratings written by a user with the rated stores, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored email is invalid.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn list_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<RatingWithStore>, RepositoryError> {
        let rows: Vec<RatingWithStoreRow> = sqlx::query_as(
            r"
            SELECT r.id, r.user_id, r.store_id, r.rating, r.created_at, r.updated_at,
                   s.name AS store_name, s.email AS store_email, s.address AS store_address
            FROM ratings r
            JOIN stores s ON s.id = r.store_id
            WHERE r.user_id = $1
            ORDER BY r.created_at DESC, r.id DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let store = RatedStore {
                    id: row.rating.store_id,
                    name: row.store_name,
                    email: parse_email(&row.store_email)?,
                    address: row.store_address,
                };
                Ok(RatingWithStore {
                    rating: row.rating.into(),
                    store,
                })
            })
            .collect()
    }

    /// Delete a rating.
    ///
    /// # Returns
    ///
    /// Returns `true` if the rating was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(rating_id = %id))]
    pub async fn delete(&self, id: RatingId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM ratings WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
