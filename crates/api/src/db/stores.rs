//! Store repository for database operations.
//!
//! Binding an owner and detaching one both touch the owner's role, so every
//! write that changes `owner_id` runs in a transaction together with the
//! role update:
//!
//! - a `USER` bound to a store becomes `STORE_OWNER` (an `ADMIN` stays `ADMIN`);
//! - a `STORE_OWNER` left without a store goes back to `USER`.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use tracing::{debug, info, instrument};

use storerate_core::{Email, Stars, StoreId, UserId, Validator};

use super::{RepositoryError, filter_pattern, map_write_error};
use crate::models::{
    NewStore, OwnerChange, Store, StoreChanges, StoreFilter, StoreListing, StoreRater,
    StoreWithRating,
};

#[derive(Debug, sqlx::FromRow)]
struct StoreRow {
    id: StoreId,
    name: String,
    email: String,
    address: Option<String>,
    owner_id: Option<UserId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<StoreRow> for Store {
    type Error = RepositoryError;

    fn try_from(row: StoreRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid store email in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            name: row.name,
            email,
            address: row.address,
            owner_id: row.owner_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StoreListingRow {
    #[sqlx(flatten)]
    store: StoreRow,
    average_rating: f64,
    rating_count: i64,
    user_rating: Option<Stars>,
}

impl TryFrom<StoreListingRow> for StoreListing {
    type Error = RepositoryError;

    fn try_from(row: StoreListingRow) -> Result<Self, Self::Error> {
        Ok(Self {
            store: StoreWithRating {
                store: row.store.try_into()?,
                average_rating: row.average_rating,
                rating_count: row.rating_count,
            },
            user_rating: row.user_rating,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StoreRaterRow {
    id: UserId,
    name: String,
    email: String,
    rating: Stars,
    created_at: DateTime<Utc>,
}

impl TryFrom<StoreRaterRow> for StoreRater {
    type Error = RepositoryError;

    fn try_from(row: StoreRaterRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            name: row.name,
            email,
            rating: row.rating,
            created_at: row.created_at,
        })
    }
}

const STORE_CONFLICT: &str = "store email or owner already in use";

/// Repository for store database operations.
pub struct StoreRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StoreRepository<'a> {
    /// Create a new store repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List stores matching the filter with their live rating aggregate and
    /// the viewer's own rating.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored email is invalid.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: &StoreFilter,
        viewer: Option<UserId>,
    ) -> Result<Vec<StoreListing>, RepositoryError> {
        let rows: Vec<StoreListingRow> = sqlx::query_as(
            r"
            SELECT s.id, s.name, s.email, s.address, s.owner_id, s.created_at, s.updated_at,
                   COALESCE(AVG(r.rating), 0)::float8 AS average_rating,
                   COUNT(r.id) AS rating_count,
                   (SELECT own.rating FROM ratings own
                    WHERE own.store_id = s.id AND own.user_id = $1) AS user_rating
            FROM stores s
            LEFT JOIN ratings r ON r.store_id = s.id
            WHERE ($2::text IS NULL OR s.name ILIKE $2)
              AND ($3::text IS NULL OR s.address ILIKE $3)
            GROUP BY s.id
            ORDER BY s.name, s.id
            ",
        )
        .bind(viewer)
        .bind(filter_pattern(filter.name.as_deref()))
        .bind(filter_pattern(filter.address.as_deref()))
        .fetch_all(self.pool)
        .await?;

        debug!(count = rows.len(), "Listed stores");

        rows.into_iter().map(StoreListing::try_from).collect()
    }

    /// Get a store by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored email is invalid.
    #[instrument(skip(self), fields(store_id = %id))]
    pub async fn get_by_id(&self, id: StoreId) -> Result<Option<Store>, RepositoryError> {
        let row: Option<StoreRow> = sqlx::query_as(
            r"
            SELECT id, name, email, address, owner_id, created_at, updated_at
            FROM stores
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Store::try_from).transpose()
    }

    /// Get a store by its contact email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored email is invalid.
    #[instrument(skip(self, email))]
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<Store>, RepositoryError> {
        let row: Option<StoreRow> = sqlx::query_as(
            r"
            SELECT id, name, email, address, owner_id, created_at, updated_at
            FROM stores
            WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(Store::try_from).transpose()
    }

    /// Get a store with its aggregate and the viewer's own rating.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored email is invalid.
    #[instrument(skip(self), fields(store_id = %id))]
    pub async fn get_listing(
        &self,
        id: StoreId,
        viewer: Option<UserId>,
    ) -> Result<Option<StoreListing>, RepositoryError> {
        let row: Option<StoreListingRow> = sqlx::query_as(
            r"
            SELECT s.id, s.name, s.email, s.address, s.owner_id, s.created_at, s.updated_at,
                   COALESCE(AVG(r.rating), 0)::float8 AS average_rating,
                   COUNT(r.id) AS rating_count,
                   (SELECT own.rating FROM ratings own
                    WHERE own.store_id = s.id AND own.user_id = $2) AS user_rating
            FROM stores s
            LEFT JOIN ratings r ON r.store_id = s.id
            WHERE s.id = $1
            GROUP BY s.id
            ",
        )
        .bind(id)
        .bind(viewer)
        .fetch_optional(self.pool)
        .await?;

        row.map(StoreListing::try_from).transpose()
    }

    /// Get the store bound to `owner`, with its aggregate.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored email is invalid.
    #[instrument(skip(self), fields(owner_id = %owner))]
    pub async fn get_by_owner(
        &self,
        owner: UserId,
    ) -> Result<Option<StoreWithRating>, RepositoryError> {
        let row: Option<StoreListingRow> = sqlx::query_as(
            r"
            SELECT s.id, s.name, s.email, s.address, s.owner_id, s.created_at, s.updated_at,
                   COALESCE(AVG(r.rating), 0)::float8 AS average_rating,
                   COUNT(r.id) AS rating_count,
                   NULL::integer AS user_rating
            FROM stores s
            LEFT JOIN ratings r ON r.store_id = s.id
            WHERE s.owner_id = $1
            GROUP BY s.id
            ",
        )
        .bind(owner)
        .fetch_optional(self.pool)
        .await?;

        row.map(|r| StoreListing::try_from(r).map(|listing| listing.store))
            .transpose()
    }

    /// Users who rated a store, newest rating first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored email is invalid.
    #[instrument(skip(self), fields(store_id = %id))]
    pub async fn raters(&self, id: StoreId) -> Result<Vec<StoreRater>, RepositoryError> {
        let rows: Vec<StoreRaterRow> = sqlx::query_as(
            r"
            SELECT u.id, u.name, u.email, r.rating, r.created_at
            FROM ratings r
            JOIN users u ON u.id = r.user_id
            WHERE r.store_id = $1
            ORDER BY r.created_at DESC, r.id DESC
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(StoreRater::try_from).collect()
    }

    /// Whether another store already uses `email`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, email))]
    pub async fn email_taken(
        &self,
        email: &Email,
        except: Option<StoreId>,
    ) -> Result<bool, RepositoryError> {
        let (taken,): (bool,) = sqlx::query_as(
            r"
            SELECT EXISTS (
                SELECT 1 FROM stores
                WHERE email = $1 AND ($2::integer IS NULL OR id <> $2)
            )
            ",
        )
        .bind(email.as_str())
        .bind(except)
        .fetch_one(self.pool)
        .await?;

        Ok(taken)
    }

    /// Create a store, elevating the owner if one is given.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Invalid` if the name or address break the field rules.
    /// Returns `RepositoryError::NotFound` if the owner doesn't exist.
    /// Returns `RepositoryError::Conflict` if the email or owner is already taken.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, new), fields(owner_id = ?new.owner_id))]
    pub async fn create(&self, new: &NewStore) -> Result<Store, RepositoryError> {
        Validator::new()
            .name(Some(new.name.as_str()))
            .address(new.address.as_deref())
            .finish()?;

        let mut tx = self.pool.begin().await?;

        if let Some(owner) = new.owner_id {
            elevate_owner(&mut tx, owner).await?;
        }

        let row: StoreRow = sqlx::query_as(
            r"
            INSERT INTO stores (name, email, address, owner_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, address, owner_id, created_at, updated_at
            ",
        )
        .bind(&new.name)
        .bind(new.email.as_str())
        .bind(new.address.as_deref())
        .bind(new.owner_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, STORE_CONFLICT))?;

        tx.commit().await?;

        debug!(store_id = %row.id, "Created store");
        row.try_into()
    }

    /// Apply a partial update, moving owner roles along with `owner_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Invalid` if a provided field breaks the field rules.
    /// Returns `RepositoryError::NotFound` if the store or the new owner doesn't exist.
    /// Returns `RepositoryError::Conflict` if the email or owner is already taken.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, changes), fields(store_id = %id, owner = ?changes.owner))]
    pub async fn update(
        &self,
        id: StoreId,
        changes: &StoreChanges,
    ) -> Result<Store, RepositoryError> {
        Validator::new()
            .optional_name(changes.name.as_deref())
            .address(changes.address.as_deref())
            .finish()?;

        let mut tx = self.pool.begin().await?;

        let current: Option<(Option<UserId>,)> =
            sqlx::query_as("SELECT owner_id FROM stores WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let (previous_owner,) = current.ok_or(RepositoryError::NotFound)?;

        let (set_owner, owner_id) = match changes.owner {
            OwnerChange::Keep => (false, None),
            OwnerChange::Clear => (true, None),
            OwnerChange::Assign(owner) => {
                if previous_owner != Some(owner) {
                    elevate_owner(&mut tx, owner).await?;
                }
                (true, Some(owner))
            }
        };

        let row: StoreRow = sqlx::query_as(
            r"
            UPDATE stores
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                address = COALESCE($4, address),
                owner_id = CASE WHEN $5 THEN $6 ELSE owner_id END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, email, address, owner_id, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(changes.name.as_deref())
        .bind(changes.email.as_ref().map(Email::as_str))
        .bind(changes.address.as_deref())
        .bind(set_owner)
        .bind(owner_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, STORE_CONFLICT))?;

        if let Some(previous) = previous_owner
            && row.owner_id != Some(previous)
        {
            demote_former_owner(&mut tx, previous).await?;
        }

        tx.commit().await?;

        row.try_into()
    }

    /// Delete a store and its ratings, demoting the owner.
    ///
    /// # Returns
    ///
    /// Returns `true` if the store was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(store_id = %id))]
    pub async fn delete(&self, id: StoreId) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let deleted: Option<(Option<UserId>,)> =
            sqlx::query_as("DELETE FROM stores WHERE id = $1 RETURNING owner_id")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some((owner,)) = deleted else {
            return Ok(false);
        };

        if let Some(owner) = owner {
            demote_former_owner(&mut tx, owner).await?;
        }

        tx.commit().await?;

        Ok(true)
    }
}

/// Lock the prospective owner and make them a `STORE_OWNER` if they are a
/// plain `USER`.
async fn elevate_owner(conn: &mut PgConnection, owner: UserId) -> Result<(), RepositoryError> {
    let exists: Option<(UserId,)> = sqlx::query_as("SELECT id FROM users WHERE id = $1 FOR UPDATE")
        .bind(owner)
        .fetch_optional(&mut *conn)
        .await?;
    if exists.is_none() {
        return Err(RepositoryError::NotFound);
    }

    let result = sqlx::query(
        r"
        UPDATE users
        SET role = 'STORE_OWNER', updated_at = NOW()
        WHERE id = $1 AND role = 'USER'
        ",
    )
    .bind(owner)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() > 0 {
        info!(user_id = %owner, "Elevated user to store owner");
    }

    Ok(())
}

/// Return a `STORE_OWNER` who no longer owns any store to `USER`.
async fn demote_former_owner(conn: &mut PgConnection, owner: UserId) -> Result<(), RepositoryError> {
    let result = sqlx::query(
        r"
        UPDATE users
        SET role = 'USER', updated_at = NOW()
        WHERE id = $1
          AND role = 'STORE_OWNER'
          AND NOT EXISTS (SELECT 1 FROM stores WHERE owner_id = $1)
        ",
    )
    .bind(owner)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() > 0 {
        info!(user_id = %owner, "Demoted former store owner to user");
    }

    Ok(())
}
