//! Star rating value.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when a value is outside the 1-5 star range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("rating must be between {min} and {max}, got {value}", min = Stars::MIN, max = Stars::MAX)]
pub struct StarsError {
    /// The rejected value.
    pub value: i64,
}

/// A star rating in the inclusive range `1..=5`.
///
/// Only constructible through [`Stars::new`] (or deserialization, which
/// applies the same check), so any `Stars` held by the program is in range.
///
/// ```
/// use storerate_core::Stars;
///
/// assert_eq!(Stars::new(4).unwrap().get(), 4);
/// assert!(Stars::new(0).is_err());
/// assert!(Stars::new(6).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i32")]
pub struct Stars(i32);

impl Stars {
    /// Lowest accepted rating.
    pub const MIN: i32 = 1;
    /// Highest accepted rating.
    pub const MAX: i32 = 5;

    /// Create a rating, rejecting values outside `1..=5`.
    ///
    /// # Errors
    ///
    /// Returns `StarsError` if the value is out of range.
    pub fn new(value: i64) -> Result<Self, StarsError> {
        match i32::try_from(value) {
            Ok(v) if (Self::MIN..=Self::MAX).contains(&v) => Ok(Self(v)),
            _ => Err(StarsError { value }),
        }
    }

    /// The rating as an integer.
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl TryFrom<i64> for Stars {
    type Error = StarsError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Stars> for i32 {
    fn from(stars: Stars) -> Self {
        stars.0
    }
}

impl fmt::Display for Stars {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Stars {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i32 as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <i32 as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Stars {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let raw = <i32 as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(i64::from(raw))?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Stars {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <i32 as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        assert!(Stars::new(1).is_ok());
        assert!(Stars::new(5).is_ok());
        assert_eq!(Stars::new(0), Err(StarsError { value: 0 }));
        assert_eq!(Stars::new(6), Err(StarsError { value: 6 }));
        assert!(Stars::new(-3).is_err());
        assert!(Stars::new(i64::MAX).is_err());
    }

    #[test]
    fn test_deserialize_checks_range() {
        let stars: Stars = serde_json::from_str("3").unwrap();
        assert_eq!(stars.get(), 3);
        assert!(serde_json::from_str::<Stars>("9").is_err());
        assert!(serde_json::from_str::<Stars>("2.5").is_err());
    }

    #[test]
    fn test_serialize_as_number() {
        assert_eq!(serde_json::to_string(&Stars::new(5).unwrap()).unwrap(), "5");
    }

    #[test]
    fn test_error_message() {
        assert_eq!(
            StarsError { value: 7 }.to_string(),
            "rating must be between 1 and 5, got 7"
        );
    }
}
