//! Store Ratings Core - Shared types library.
//!
//! This crate provides common types used across all store ratings components:
//! - `api` - JSON REST API server
//! - `cli` - Command-line tools for migrations, seeding and admin bootstrap
//! - `integration-tests` - End-to-end tests against `PostgreSQL`
//!
//! # Architecture
//!
//! The core crate contains only types, pure validation and the access policy -
//! no I/O, no database access, no HTTP. This keeps the business rules testable
//! in isolation and lets both boundaries (request handlers and repositories)
//! apply the exact same checks.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, emails, roles and star values
//! - [`validation`] - Field rules that report every violation at once
//! - [`access`] - Role-based authorization decisions

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod access;
pub mod types;
pub mod validation;

pub use access::{Access, Actor};
pub use types::*;
pub use validation::{ValidationErrors, Validator};
