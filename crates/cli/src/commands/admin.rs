//! Administrator bootstrap.
//!
//! The HTTP API only lets admins create admins, so the first one comes from here.

use storerate_api::routes::parse_email;
use storerate_api::services::auth::AuthService;
use storerate_core::{Role, Validator};

use super::{CommandError, connect};

/// Create an account with the `ADMIN` role.
///
/// # Errors
///
/// Returns `CommandError::Invalid` if a field breaks the account rules.
/// Returns `CommandError::Auth` if the email is already registered.
pub async fn create_admin(
    name: &str,
    email: &str,
    password: &str,
    address: Option<String>,
) -> Result<(), CommandError> {
    Validator::new()
        .name(Some(name))
        .email(Some(email))
        .address(address.as_deref())
        .password(Some(password))
        .finish()?;
    let email = parse_email(email)?;

    let pool = connect().await?;
    let user = AuthService::new(&pool)
        .create_account(name.to_string(), email, password, address, Role::Admin)
        .await?;

    tracing::info!(user_id = %user.id, email = %user.email, "Administrator created");
    Ok(())
}
