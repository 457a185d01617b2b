//! Authentication.
//!
//! Users sign up and log in with email and password. A successful login issues a signed JWT which
//! is set as an HTTP-only session cookie and also returned in the response body, so non-browser
//! clients can send it as `Authorization: Bearer <token>`.
//!
//! # Modules
//!
//! - [`current_user`]: The [`CurrentUser`](crate::api::models::users::CurrentUser) extractor
//! - [`password`]: Password hashing and verification using Argon2
//! - [`session`]: JWT creation/verification and session cookies
//!
//! # Usage in Handlers
//!
//! ```ignore
//! use angleforge::api::models::users::CurrentUser;
//!
//! async fn protected_handler(current_user: CurrentUser) -> String {
//!     format!("Hello, {}!", current_user.email)
//! }
//! ```

pub mod current_user;
pub mod password;
pub mod session;
