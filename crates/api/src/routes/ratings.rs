//! Rating route handlers.
//!
//! Ratings are looked up before the access check, so a missing rating is a
//! 404 for everyone and an existing one is a 403 for non-authors.

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use storerate_core::{
    RatingId, StoreId, UserId, Validator, validation::messages, validation::parse_rating,
};

use super::not_found_as;
use crate::db::{RatingRepository, StoreRepository};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::extract::{Json, Path};
use crate::middleware::RequireAuth;
use crate::models::{Rating, RatingWithStore, RatingWithUser};
use crate::state::AppState;

const STORE_NOT_FOUND: &str = "Store not found";
const RATING_NOT_FOUND: &str = "Rating not found";

/// Build the ratings router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(submit))
        .route("/store/{store_id}", get(for_store))
        .route("/user/{user_id}", get(for_user))
        .route("/{id}", get(show).delete(remove))
}

/// Rating submission. `rating` stays raw JSON so a wrong type is reported
/// as a rule violation instead of a malformed body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRatingRequest {
    pub store_id: Option<i32>,
    pub rating: Option<Value>,
}

/// A rating with the store's aggregate after the change.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingResponse {
    #[serde(flatten)]
    pub rating: Rating,
    pub average_rating: f64,
    pub rating_count: i64,
}

/// Acknowledgement of a deleted rating.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingDeleted {
    pub message: &'static str,
    pub store_id: StoreId,
    pub average_rating: f64,
    pub rating_count: i64,
}

/// Submit a rating, or change the caller's existing one for that store.
///
/// POST /api/ratings
async fn submit(
    RequireAuth(actor): RequireAuth,
    State(state): State<AppState>,
    Json(req): Json<SubmitRatingRequest>,
) -> Result<(StatusCode, Json<RatingResponse>)> {
    if !actor.submit_rating().is_allowed() {
        return Err(AppError::forbidden());
    }

    Validator::new()
        .store_id(req.store_id)
        .rating(req.rating.as_ref())
        .finish()?;

    let store_id = req
        .store_id
        .map(StoreId::new)
        .ok_or_else(|| AppError::Validation(vec![messages::STORE_ID_REQUIRED.to_string()]))?;
    let stars = req
        .rating
        .as_ref()
        .and_then(parse_rating)
        .ok_or_else(|| AppError::Validation(vec![messages::RATING.to_string()]))?;

    let ratings = RatingRepository::new(state.pool());
    let submission = ratings
        .submit(actor.id, store_id, stars)
        .await
        .map_err(not_found_as(STORE_NOT_FOUND))?;
    let average_rating = ratings.average_for_store(store_id).await?;
    let rating_count = ratings.count_for_store(store_id).await?;

    let store_label = store_id.to_string();
    add_breadcrumb(
        "rating",
        if submission.created { "Rating submitted" } else { "Rating updated" },
        Some(&[("store_id", store_label.as_str())]),
    );
    info!(
        user_id = %actor.id,
        store_id = %store_id,
        stars = %stars,
        created = submission.created,
        "Rating saved"
    );

    let status = if submission.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(RatingResponse {
            rating: submission.rating,
            average_rating,
            rating_count,
        }),
    ))
}

/// Ratings of one store with their authors.
///
/// GET /api/ratings/store/{store_id}
async fn for_store(
    RequireAuth(actor): RequireAuth,
    State(state): State<AppState>,
    Path(store_id): Path<i32>,
) -> Result<Json<Vec<RatingWithUser>>> {
    let store_id = StoreId::new(store_id);
    let store = StoreRepository::new(state.pool())
        .get_by_id(store_id)
        .await?
        .ok_or_else(|| AppError::not_found(STORE_NOT_FOUND))?;

    if !actor.view_store_raters(store.owner_id).is_allowed() {
        return Err(AppError::forbidden());
    }

    let ratings = RatingRepository::new(state.pool())
        .list_for_store(store_id)
        .await?;
    Ok(Json(ratings))
}

/// Ratings written by one user with the rated stores.
///
/// GET /api/ratings/user/{user_id}
async fn for_user(
    RequireAuth(actor): RequireAuth,
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
) -> Result<Json<Vec<RatingWithStore>>> {
    let user_id = UserId::new(user_id);
    if !actor.list_user_ratings(user_id).is_allowed() {
        return Err(AppError::forbidden());
    }

    let ratings = RatingRepository::new(state.pool())
        .list_for_user(user_id)
        .await?;
    Ok(Json(ratings))
}

/// One rating.
///
/// GET /api/ratings/{id}
async fn show(
    RequireAuth(actor): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Rating>> {
    let rating = RatingRepository::new(state.pool())
        .get_by_id(RatingId::new(id))
        .await?
        .ok_or_else(|| AppError::not_found(RATING_NOT_FOUND))?;

    if !actor.access_rating(rating.user_id).is_allowed() {
        return Err(AppError::forbidden());
    }

    Ok(Json(rating))
}

/// Delete a rating and report the store's new average.
///
/// DELETE /api/ratings/{id}
async fn remove(
    RequireAuth(actor): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<RatingDeleted>> {
    let ratings = RatingRepository::new(state.pool());
    let rating = ratings
        .get_by_id(RatingId::new(id))
        .await?
        .ok_or_else(|| AppError::not_found(RATING_NOT_FOUND))?;

    if !actor.access_rating(rating.user_id).is_allowed() {
        return Err(AppError::forbidden());
    }

    if !ratings.delete(rating.id).await? {
        return Err(AppError::not_found(RATING_NOT_FOUND));
    }
    let average_rating = ratings.average_for_store(rating.store_id).await?;
    let rating_count = ratings.count_for_store(rating.store_id).await?;

    info!(actor_id = %actor.id, rating_id = %rating.id, store_id = %rating.store_id, "Rating deleted");
    Ok(Json(RatingDeleted {
        message: "Rating deleted successfully",
        store_id: rating.store_id,
        average_rating,
        rating_count,
    }))
}
