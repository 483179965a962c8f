//! Store route handlers.
//!
//! Browsing is public; a bearer token only adds the caller's own rating and,
//! for admins and the store's owner, the list of raters. Writes are
//! admin-only.

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use serde::{Deserialize, Deserializer};
use tracing::info;

use storerate_core::{Actor, StoreId, UserId, Validator, validation::messages};

use super::{MessageResponse, non_blank, not_found_as, parse_email, required};
use crate::db::{StoreRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::extract::{Json, Path, Query};
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::models::{
    NewStore, OwnerChange, Store, StoreChanges, StoreDetail, StoreFilter, StoreListing,
};
use crate::state::AppState;

const STORE_NOT_FOUND: &str = "Store not found";
const OWNER_NOT_FOUND: &str = "Owner user not found";
const EMAIL_TAKEN: &str = "Store with this email already exists";
const OWNER_TAKEN: &str = "Owner already has a store";

/// Build the stores router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(show).put(update).delete(remove))
}

/// Filters for the store list.
#[derive(Debug, Default, Deserialize)]
pub struct StoreListQuery {
    pub name: Option<String>,
    pub address: Option<String>,
}

/// Admin request to create a store.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStoreRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub owner_id: Option<i32>,
}

/// Partial store update. `ownerId` absent keeps the owner, `null` clears it.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStoreRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub owner_id: Option<Option<i32>>,
}

/// Wrap any present value (including `null`) in `Some`.
fn present<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// List stores with their rating aggregate.
///
/// GET /api/stores
async fn list(
    OptionalAuth(actor): OptionalAuth,
    State(state): State<AppState>,
    Query(query): Query<StoreListQuery>,
) -> Result<Json<Vec<StoreListing>>> {
    let filter = StoreFilter {
        name: query.name,
        address: query.address,
    };
    let stores = StoreRepository::new(state.pool())
        .list(&filter, actor.map(|a| a.id))
        .await?;
    Ok(Json(stores))
}

/// Store detail.
///
/// GET /api/stores/{id}
async fn show(
    OptionalAuth(actor): OptionalAuth,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<StoreDetail>> {
    let id = StoreId::new(id);
    let stores = StoreRepository::new(state.pool());

    let listing = stores
        .get_listing(id, actor.map(|a| a.id))
        .await?
        .ok_or_else(|| AppError::not_found(STORE_NOT_FOUND))?;

    let ratings = if can_view_raters(actor, listing.store.store.owner_id) {
        Some(stores.raters(id).await?)
    } else {
        None
    };

    Ok(Json(StoreDetail { listing, ratings }))
}

fn can_view_raters(actor: Option<Actor>, owner: Option<UserId>) -> bool {
    actor.is_some_and(|a| a.view_store_raters(owner).is_allowed())
}

/// Create a store, optionally binding an owner.
///
/// POST /api/stores
async fn create(
    RequireAuth(actor): RequireAuth,
    State(state): State<AppState>,
    Json(req): Json<CreateStoreRequest>,
) -> Result<(StatusCode, Json<Store>)> {
    if !actor.manage_stores().is_allowed() {
        return Err(AppError::forbidden());
    }

    Validator::new()
        .name(req.name.as_deref())
        .email(req.email.as_deref())
        .address(req.address.as_deref())
        .finish()?;

    let name = required(req.name, messages::NAME)?;
    let email = parse_email(&required(req.email, messages::EMAIL)?)?;
    let owner_id = req.owner_id.map(UserId::new);

    let stores = StoreRepository::new(state.pool());
    if stores.email_taken(&email, None).await? {
        return Err(AppError::Conflict(EMAIL_TAKEN.to_string()));
    }
    if let Some(owner) = owner_id {
        check_owner_available(&state, owner, None).await?;
    }

    let store = stores
        .create(&NewStore {
            name,
            email,
            address: non_blank(req.address),
            owner_id,
        })
        .await
        .map_err(not_found_as(OWNER_NOT_FOUND))?;

    info!(admin_id = %actor.id, store_id = %store.id, owner_id = ?store.owner_id, "Store created");
    Ok((StatusCode::CREATED, Json(store)))
}

/// Partially update a store, including reassigning or clearing its owner.
///
/// PUT /api/stores/{id}
async fn update(
    RequireAuth(actor): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(req): Json<UpdateStoreRequest>,
) -> Result<Json<Store>> {
    if !actor.manage_stores().is_allowed() {
        return Err(AppError::forbidden());
    }

    Validator::new()
        .optional_name(req.name.as_deref())
        .optional_email(req.email.as_deref())
        .address(req.address.as_deref())
        .finish()?;

    let id = StoreId::new(id);
    let stores = StoreRepository::new(state.pool());
    let current = stores
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found(STORE_NOT_FOUND))?;

    let email = req.email.as_deref().map(parse_email).transpose()?;
    if let Some(email) = &email
        && stores.email_taken(email, Some(id)).await?
    {
        return Err(AppError::Conflict(EMAIL_TAKEN.to_string()));
    }

    let owner = OwnerChange::from_field(req.owner_id.map(|o| o.map(UserId::new)));
    if let OwnerChange::Assign(owner) = owner
        && current.owner_id != Some(owner)
    {
        check_owner_available(&state, owner, Some(id)).await?;
    }

    let changes = StoreChanges {
        name: req.name,
        email,
        address: req.address,
        owner,
    };
    let store = stores
        .update(id, &changes)
        .await
        .map_err(not_found_as(STORE_NOT_FOUND))?;

    info!(admin_id = %actor.id, store_id = %store.id, owner_id = ?store.owner_id, "Store updated");
    Ok(Json(store))
}

/// The prospective owner must exist and not own another store.
async fn check_owner_available(
    state: &AppState,
    owner: UserId,
    store: Option<StoreId>,
) -> Result<()> {
    if UserRepository::new(state.pool())
        .get_by_id(owner)
        .await?
        .is_none()
    {
        return Err(AppError::not_found(OWNER_NOT_FOUND));
    }

    if let Some(owned) = StoreRepository::new(state.pool()).get_by_owner(owner).await?
        && Some(owned.store.id) != store
    {
        return Err(AppError::Conflict(OWNER_TAKEN.to_string()));
    }

    Ok(())
}

/// Delete a store and its ratings.
///
/// DELETE /api/stores/{id}
async fn remove(
    RequireAuth(actor): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>> {
    if !actor.manage_stores().is_allowed() {
        return Err(AppError::forbidden());
    }

    let id = StoreId::new(id);
    if !StoreRepository::new(state.pool()).delete(id).await? {
        return Err(AppError::not_found(STORE_NOT_FOUND));
    }

    info!(admin_id = %actor.id, store_id = %id, "Store deleted");
    Ok(Json(MessageResponse {
        message: "Store deleted successfully",
    }))
}
