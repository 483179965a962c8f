//! Role-based access policy.
//!
//! Every authorization decision in the platform goes through an [`Actor`]
//! method. Each method matches on [`Role`] exhaustively, so adding a role is a
//! compile error at every decision point until it is handled.
//!
//! Ownership rule: outside of `ADMIN`, a caller may only touch user and
//! rating records whose owning identity is the caller's own.

use crate::types::{Role, UserId};

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// The operation may proceed.
    Allow,
    /// The caller lacks permission (HTTP 403).
    Deny,
}

impl Access {
    const fn when(condition: bool) -> Self {
        if condition { Self::Allow } else { Self::Deny }
    }

    /// `true` for [`Access::Allow`].
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// The authenticated caller: identity plus the role loaded from storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    /// Caller's user ID.
    pub id: UserId,
    /// Caller's current role.
    pub role: Role,
}

impl Actor {
    /// Create an actor.
    #[must_use]
    pub const fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }

    const fn is_self(&self, target: UserId) -> bool {
        self.id.as_i32() == target.as_i32()
    }

    /// List, create and delete user accounts.
    #[must_use]
    pub const fn manage_users(&self) -> Access {
        match self.role {
            Role::Admin => Access::Allow,
            Role::User | Role::StoreOwner => Access::Deny,
        }
    }

    /// Read or update the profile of `target`.
    #[must_use]
    pub const fn access_user(&self, target: UserId) -> Access {
        match self.role {
            Role::Admin => Access::Allow,
            Role::User | Role::StoreOwner => Access::when(self.is_self(target)),
        }
    }

    /// Set a user's role directly. Users never change their own role; owners
    /// are elevated only through store assignment.
    #[must_use]
    pub const fn assign_roles(&self) -> Access {
        match self.role {
            Role::Admin => Access::Allow,
            Role::User | Role::StoreOwner => Access::Deny,
        }
    }

    /// Create, update and delete stores.
    #[must_use]
    pub const fn manage_stores(&self) -> Access {
        match self.role {
            Role::Admin => Access::Allow,
            Role::User | Role::StoreOwner => Access::Deny,
        }
    }

    /// See who rated a store owned by `store_owner`.
    #[must_use]
    pub const fn view_store_raters(&self, store_owner: Option<UserId>) -> Access {
        match (self.role, store_owner) {
            (Role::Admin, _) => Access::Allow,
            (Role::StoreOwner, Some(owner)) => Access::when(self.is_self(owner)),
            (Role::StoreOwner, None) | (Role::User, _) => Access::Deny,
        }
    }

    /// Submit or update a rating. Store owners have a read-only role.
    #[must_use]
    pub const fn submit_rating(&self) -> Access {
        match self.role {
            Role::Admin | Role::User => Access::Allow,
            Role::StoreOwner => Access::Deny,
        }
    }

    /// Read or delete a rating written by `author`.
    #[must_use]
    pub const fn access_rating(&self, author: UserId) -> Access {
        match self.role {
            Role::Admin => Access::Allow,
            Role::User | Role::StoreOwner => Access::when(self.is_self(author)),
        }
    }

    /// List every rating written by `target`.
    #[must_use]
    pub const fn list_user_ratings(&self, target: UserId) -> Access {
        match self.role {
            Role::Admin => Access::Allow,
            Role::User | Role::StoreOwner => Access::when(self.is_self(target)),
        }
    }

    /// Platform-wide totals.
    #[must_use]
    pub const fn view_admin_dashboard(&self) -> Access {
        match self.role {
            Role::Admin => Access::Allow,
            Role::User | Role::StoreOwner => Access::Deny,
        }
    }

    /// The caller's own store aggregate.
    #[must_use]
    pub const fn view_owner_dashboard(&self) -> Access {
        match self.role {
            Role::StoreOwner => Access::Allow,
            Role::Admin | Role::User => Access::Deny,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADMIN: Actor = Actor::new(UserId::new(1), Role::Admin);
    const OWNER: Actor = Actor::new(UserId::new(2), Role::StoreOwner);
    const USER: Actor = Actor::new(UserId::new(3), Role::User);
    const OTHER_USER: UserId = UserId::new(5);

    #[test]
    fn test_only_admin_manages_users_and_stores() {
        assert_eq!(ADMIN.manage_users(), Access::Allow);
        assert_eq!(OWNER.manage_users(), Access::Deny);
        assert_eq!(USER.manage_users(), Access::Deny);

        assert_eq!(ADMIN.manage_stores(), Access::Allow);
        assert_eq!(OWNER.manage_stores(), Access::Deny);
        assert_eq!(USER.manage_stores(), Access::Deny);
    }

    #[test]
    fn test_user_profile_is_self_or_admin() {
        assert_eq!(USER.access_user(USER.id), Access::Allow);
        assert_eq!(USER.access_user(OTHER_USER), Access::Deny);
        assert_eq!(OWNER.access_user(OWNER.id), Access::Allow);
        assert_eq!(OWNER.access_user(USER.id), Access::Deny);
        assert_eq!(ADMIN.access_user(OTHER_USER), Access::Allow);
    }

    #[test]
    fn test_user_reading_other_profile_is_always_denied() {
        for target in 1..=50 {
            let target = UserId::new(target);
            if target != USER.id {
                assert_eq!(USER.access_user(target), Access::Deny);
            }
        }
    }

    #[test]
    fn test_role_assignment_is_admin_only() {
        assert!(ADMIN.assign_roles().is_allowed());
        assert!(!OWNER.assign_roles().is_allowed());
        assert!(!USER.assign_roles().is_allowed());
    }

    #[test]
    fn test_store_raters_visible_to_admin_and_owner() {
        assert_eq!(ADMIN.view_store_raters(None), Access::Allow);
        assert_eq!(ADMIN.view_store_raters(Some(OWNER.id)), Access::Allow);
        assert_eq!(OWNER.view_store_raters(Some(OWNER.id)), Access::Allow);
        assert_eq!(OWNER.view_store_raters(Some(UserId::new(9))), Access::Deny);
        assert_eq!(OWNER.view_store_raters(None), Access::Deny);
        assert_eq!(USER.view_store_raters(Some(USER.id)), Access::Deny);
    }

    #[test]
    fn test_store_owner_cannot_submit_ratings() {
        assert_eq!(USER.submit_rating(), Access::Allow);
        assert_eq!(ADMIN.submit_rating(), Access::Allow);
        assert_eq!(OWNER.submit_rating(), Access::Deny);
    }

    #[test]
    fn test_rating_access_is_author_or_admin() {
        assert_eq!(USER.access_rating(USER.id), Access::Allow);
        assert_eq!(USER.access_rating(OTHER_USER), Access::Deny);
        assert_eq!(ADMIN.access_rating(OTHER_USER), Access::Allow);

        assert_eq!(USER.list_user_ratings(USER.id), Access::Allow);
        assert_eq!(USER.list_user_ratings(OTHER_USER), Access::Deny);
        assert_eq!(ADMIN.list_user_ratings(OTHER_USER), Access::Allow);
    }

    #[test]
    fn test_dashboards() {
        assert_eq!(ADMIN.view_admin_dashboard(), Access::Allow);
        assert_eq!(OWNER.view_admin_dashboard(), Access::Deny);
        assert_eq!(USER.view_admin_dashboard(), Access::Deny);

        assert_eq!(OWNER.view_owner_dashboard(), Access::Allow);
        assert_eq!(ADMIN.view_owner_dashboard(), Access::Deny);
        assert_eq!(USER.view_owner_dashboard(), Access::Deny);
    }
}
