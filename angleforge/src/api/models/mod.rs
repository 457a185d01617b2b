//! API request and response data models.
//!
//! These structs define the public JSON contract (camelCase field names) and are kept apart from
//! the database models in [`crate::db::models`]. All of them derive `utoipa::ToSchema` for the
//! OpenAPI document.

pub mod admin;
pub mod angles;
pub mod auth;
pub mod billing;
pub mod collections;
pub mod content;
pub mod usage;
pub mod users;
