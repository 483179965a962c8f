//! Field validation rules.
//!
//! Every rule is a pure predicate (`is_valid_*`). [`Validator`] strings the
//! predicates together and collects a human-readable message for each rule
//! that fails, so callers report all problems in one response instead of
//! stopping at the first.
//!
//! The same validator runs at the HTTP boundary (request bodies) and again
//! in the repositories right before a write.
//!
//! ```
//! use storerate_core::validation::{Validator, messages};
//!
//! let result = Validator::new()
//!     .name(Some("Too short"))
//!     .email(Some("not-an-email"))
//!     .password(Some("Secret!Pass1"))
//!     .finish();
//!
//! let errors = result.unwrap_err();
//! assert_eq!(errors.messages(), [messages::NAME, messages::EMAIL]);
//! ```

use serde_json::Value;

use crate::types::{Email, Role, Stars};

/// Minimum length of a user or store name, in characters.
pub const NAME_MIN_LENGTH: usize = 20;
/// Maximum length of a user or store name, in characters.
pub const NAME_MAX_LENGTH: usize = 60;
/// Maximum length of an address, in characters.
pub const ADDRESS_MAX_LENGTH: usize = 400;
/// Minimum password length, in characters.
pub const PASSWORD_MIN_LENGTH: usize = 8;
/// Maximum password length, in characters.
pub const PASSWORD_MAX_LENGTH: usize = 16;
/// A password must contain at least one of these.
pub const PASSWORD_SPECIAL_CHARACTERS: &str = "!@#$%^&*(),.?\":{}|<>";

/// Messages reported for each failed rule.
pub mod messages {
    pub const NAME: &str = "Name must be between 20 and 60 characters";
    pub const EMAIL: &str = "Please provide a valid email address";
    pub const ADDRESS: &str = "Address must not exceed 400 characters";
    pub const PASSWORD: &str = "Password must be 8-16 characters and include at least one uppercase letter and one special character";
    pub const PASSWORD_REQUIRED: &str = "Password is required";
    pub const CURRENT_PASSWORD_REQUIRED: &str = "Current password is required";
    pub const ROLE: &str = "Invalid role. Role must be ADMIN, USER, or STORE_OWNER";
    pub const STORE_ID_REQUIRED: &str = "Store ID is required";
    pub const RATING: &str = "Rating must be an integer between 1 and 5";
}

/// One or more failed validation rules.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("validation failed: {}", .0.join("; "))]
pub struct ValidationErrors(Vec<String>);

impl ValidationErrors {
    /// A single failed rule.
    #[must_use]
    pub fn single(message: &str) -> Self {
        Self(vec![message.to_owned()])
    }

    /// The messages, in the order the rules were checked.
    #[must_use]
    pub fn messages(&self) -> &[String] {
        &self.0
    }

    /// Consume into the list of messages.
    #[must_use]
    pub fn into_messages(self) -> Vec<String> {
        self.0
    }
}

// =============================================================================
// Predicates
// =============================================================================

/// Name length is within `20..=60` characters.
#[must_use]
pub fn is_valid_name(name: &str) -> bool {
    (NAME_MIN_LENGTH..=NAME_MAX_LENGTH).contains(&name.chars().count())
}

/// Address is at most 400 characters.
#[must_use]
pub fn is_valid_address(address: &str) -> bool {
    address.chars().count() <= ADDRESS_MAX_LENGTH
}

/// Password is 8-16 characters with an uppercase letter and a special character.
#[must_use]
pub fn is_valid_password(password: &str) -> bool {
    let length = password.chars().count();
    (PASSWORD_MIN_LENGTH..=PASSWORD_MAX_LENGTH).contains(&length)
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password
            .chars()
            .any(|c| PASSWORD_SPECIAL_CHARACTERS.contains(c))
}

/// Email has the shape accepted by [`Email::parse`].
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    Email::parse(email).is_ok()
}

/// Parse a JSON rating value: a whole number in `1..=5`.
///
/// `4` and `4.0` are the same rating; `4.5` is not a rating. Numeric strings
/// are rejected; clients must send a JSON number.
#[must_use]
#[allow(clippy::float_cmp)] // exact: only whole numbers qualify
pub fn parse_rating(value: &Value) -> Option<Stars> {
    let whole = value.as_i64().or_else(|| {
        let f = value.as_f64()?;
        (Stars::MIN..=Stars::MAX)
            .find(|&n| f64::from(n) == f)
            .map(i64::from)
    })?;
    Stars::new(whole).ok()
}

// =============================================================================
// Validator
// =============================================================================

/// Collects failed rules across several fields.
///
/// Methods taking `Option` treat `None` (and, for required text fields, an
/// empty string) as "missing". Required-field methods report missing values;
/// `optional_*` methods only check values that are present.
#[derive(Debug, Default)]
#[must_use]
pub struct Validator {
    errors: Vec<String>,
}

impl Validator {
    /// Start an empty validation run.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `message` unless `ok` holds.
    pub fn check(&mut self, ok: bool, message: &str) -> &mut Self {
        if !ok {
            self.errors.push(message.to_owned());
        }
        self
    }

    /// Required name.
    pub fn name(&mut self, name: Option<&str>) -> &mut Self {
        self.check(name.is_some_and(is_valid_name), messages::NAME)
    }

    /// Name, checked only when present.
    pub fn optional_name(&mut self, name: Option<&str>) -> &mut Self {
        self.check(name.is_none_or(is_valid_name), messages::NAME)
    }

    /// Required email.
    pub fn email(&mut self, email: Option<&str>) -> &mut Self {
        self.check(email.is_some_and(is_valid_email), messages::EMAIL)
    }

    /// Email, checked only when present.
    pub fn optional_email(&mut self, email: Option<&str>) -> &mut Self {
        self.check(email.is_none_or(is_valid_email), messages::EMAIL)
    }

    /// Address is always optional.
    pub fn address(&mut self, address: Option<&str>) -> &mut Self {
        self.check(address.is_none_or(is_valid_address), messages::ADDRESS)
    }

    /// Required password that must satisfy the complexity rule.
    pub fn password(&mut self, password: Option<&str>) -> &mut Self {
        self.check(password.is_some_and(is_valid_password), messages::PASSWORD)
    }

    /// Password that must merely be present (login).
    pub fn password_present(&mut self, password: Option<&str>) -> &mut Self {
        self.check(
            password.is_some_and(|p| !p.is_empty()),
            messages::PASSWORD_REQUIRED,
        )
    }

    /// Current password for a password change.
    pub fn current_password_present(&mut self, password: Option<&str>) -> &mut Self {
        self.check(
            password.is_some_and(|p| !p.is_empty()),
            messages::CURRENT_PASSWORD_REQUIRED,
        )
    }

    /// Role, checked only when present.
    pub fn optional_role(&mut self, role: Option<&str>) -> &mut Self {
        self.check(
            role.is_none_or(|r| r.parse::<Role>().is_ok()),
            messages::ROLE,
        )
    }

    /// Store reference on a rating submission.
    pub fn store_id(&mut self, store_id: Option<i32>) -> &mut Self {
        self.check(store_id.is_some(), messages::STORE_ID_REQUIRED)
    }

    /// Rating value on a rating submission.
    pub fn rating(&mut self, rating: Option<&Value>) -> &mut Self {
        self.check(
            rating.and_then(parse_rating).is_some(),
            messages::RATING,
        )
    }

    /// Finish the run.
    ///
    /// # Errors
    ///
    /// Returns every recorded message if any rule failed.
    pub fn finish(&mut self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(std::mem::take(&mut self.errors)))
        }
    }
}
