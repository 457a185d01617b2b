//! HTTP request handlers for all API endpoints.
//!
//! Every handler that touches user data takes a [`CurrentUser`](crate::api::models::users::CurrentUser)
//! extractor and scopes its reads and writes to that user. Resources owned by someone else are
//! reported as not found.

pub mod admin;
pub mod angles;
pub mod auth;
pub mod billing;
pub mod collections;
pub mod content;
pub mod usage;
