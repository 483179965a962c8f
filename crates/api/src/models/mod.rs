//! Domain models for the ratings API.
//!
//! These are validated domain objects, separate from the database row types
//! in [`crate::db`]. Every model serializes with camelCase keys.

pub mod dashboard;
pub mod rating;
pub mod store;
pub mod user;

pub use dashboard::{OwnerDashboard, PlatformTotals};
pub use rating::{
    RatedStore, Rating, RatingAuthor, RatingSubmission, RatingWithStore, RatingWithUser,
};
pub use store::{
    NewStore, OwnerChange, Store, StoreChanges, StoreDetail, StoreFilter, StoreListing,
    StoreRater, StoreWithRating,
};
pub use user::{NewUser, User, UserChanges, UserFilter, UserProfile, UserSummary};
