//! User management route handlers.
//!
//! Non-admins may only read and edit their own record. For users, the
//! access check runs before the lookup, so probing another ID never reveals
//! whether it exists.

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use serde::Deserialize;
use tracing::info;

use storerate_core::{Role, UserId, Validator, validation::messages};

use super::{MessageResponse, non_blank, not_found_as, parse_email, required};
use crate::db::{StoreRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::extract::{Json, Path, Query};
use crate::middleware::RequireAuth;
use crate::models::{User, UserChanges, UserFilter, UserProfile, UserSummary};
use crate::services::auth::AuthService;
use crate::state::AppState;

const USER_NOT_FOUND: &str = "User not found";
const EMAIL_TAKEN: &str = "User with this email already exists";

/// Build the users router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(show).put(update).delete(remove))
}

/// Filters for the user list. `role=ALL` is the same as no role filter.
#[derive(Debug, Default, Deserialize)]
pub struct UserListQuery {
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub role: Option<String>,
}

impl UserListQuery {
    fn into_filter(self) -> Result<UserFilter> {
        let role = match non_blank(self.role) {
            None => None,
            Some(r) if r.eq_ignore_ascii_case("ALL") => None,
            Some(r) => Some(
                r.parse::<Role>()
                    .map_err(|_| AppError::Validation(vec![messages::ROLE.to_string()]))?,
            ),
        };

        Ok(UserFilter {
            name: self.name,
            email: self.email,
            address: self.address,
            role,
        })
    }
}

/// Admin request to create a user with any role.
#[derive(Debug, Default, Deserialize)]
pub struct CreateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub address: Option<String>,
    pub role: Option<String>,
}

/// Partial profile update. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub role: Option<String>,
}

/// List users with their store rating.
///
/// GET /api/users
async fn list(
    RequireAuth(actor): RequireAuth,
    State(state): State<AppState>,
    Query(query): Query<UserListQuery>,
) -> Result<Json<Vec<UserSummary>>> {
    if !actor.manage_users().is_allowed() {
        return Err(AppError::forbidden());
    }

    let filter = query.into_filter()?;
    let users = UserRepository::new(state.pool()).list(&filter).await?;
    Ok(Json(users))
}

/// Create a user with any role.
///
/// POST /api/users
async fn create(
    RequireAuth(actor): RequireAuth,
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>)> {
    if !actor.manage_users().is_allowed() {
        return Err(AppError::forbidden());
    }

    Validator::new()
        .name(req.name.as_deref())
        .email(req.email.as_deref())
        .password(req.password.as_deref())
        .address(req.address.as_deref())
        .optional_role(req.role.as_deref())
        .finish()?;

    let name = required(req.name, messages::NAME)?;
    let email = parse_email(&required(req.email, messages::EMAIL)?)?;
    let password = required(req.password, messages::PASSWORD)?;
    let role = req
        .role
        .map(|r| r.parse::<Role>())
        .transpose()
        .map_err(|_| AppError::Validation(vec![messages::ROLE.to_string()]))?
        .unwrap_or_default();

    let user = AuthService::new(state.pool())
        .create_account(name, email, &password, non_blank(req.address), role)
        .await?;

    info!(admin_id = %actor.id, user_id = %user.id, role = %user.role, "Admin created user");
    Ok((StatusCode::CREATED, Json(user)))
}

/// Fetch a profile. A store owner's profile carries their store.
///
/// GET /api/users/{id}
async fn show(
    RequireAuth(actor): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<UserProfile>> {
    let id = UserId::new(id);
    if !actor.access_user(id).is_allowed() {
        return Err(AppError::forbidden());
    }

    let user = UserRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found(USER_NOT_FOUND))?;

    let store = match user.role {
        Role::StoreOwner => StoreRepository::new(state.pool()).get_by_owner(user.id).await?,
        Role::Admin | Role::User => None,
    };

    Ok(Json(UserProfile { user, store }))
}

/// Partially update a profile. Only admins may change roles.
///
/// PUT /api/users/{id}
async fn update(
    RequireAuth(actor): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<User>> {
    let id = UserId::new(id);
    if !actor.access_user(id).is_allowed() {
        return Err(AppError::forbidden());
    }
    if req.role.is_some() && !actor.assign_roles().is_allowed() {
        return Err(AppError::Forbidden("Cannot change role".to_string()));
    }

    Validator::new()
        .optional_name(req.name.as_deref())
        .optional_email(req.email.as_deref())
        .address(req.address.as_deref())
        .optional_role(req.role.as_deref())
        .finish()?;

    let email = req.email.as_deref().map(parse_email).transpose()?;
    let role = req
        .role
        .as_deref()
        .map(str::parse::<Role>)
        .transpose()
        .map_err(|_| AppError::Validation(vec![messages::ROLE.to_string()]))?;

    let users = UserRepository::new(state.pool());

    if let Some(email) = &email
        && let Some(existing) = users.get_by_email(email).await?
        && existing.id != id
    {
        return Err(AppError::Conflict(EMAIL_TAKEN.to_string()));
    }

    let changes = UserChanges {
        name: req.name,
        email,
        address: req.address,
        role,
    };

    let user = users
        .update(id, &changes)
        .await
        .map_err(not_found_as(USER_NOT_FOUND))?;

    info!(actor_id = %actor.id, user_id = %user.id, "User updated");
    Ok(Json(user))
}

/// Delete a user, their ratings, and detach their store.
///
/// DELETE /api/users/{id}
async fn remove(
    RequireAuth(actor): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>> {
    if !actor.manage_users().is_allowed() {
        return Err(AppError::forbidden());
    }

    let id = UserId::new(id);
    if !UserRepository::new(state.pool()).delete(id).await? {
        return Err(AppError::not_found(USER_NOT_FOUND));
    }

    info!(admin_id = %actor.id, user_id = %id, "User deleted");
    Ok(Json(MessageResponse {
        message: "User deleted successfully",
    }))
}
