//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: Request/response data structures
//!
//! # API Structure
//!
//! All routes live under `/api`:
//!
//! - **Authentication** (`/api/auth/*`): signup, login, logout, current user
//! - **Usage** (`/api/usage`, `/api/plans`): daily quota and plan catalogue
//! - **Angles** (`/api/angles/*`): generation, saving, used-state, export
//! - **Collections** (`/api/collections/*`): angle folders
//! - **Content** (`/api/content/*`): long-form generation and saved content
//! - **Billing** (`/api/billing/*`): checkout and the payment provider webhook
//! - **Admin** (`/api/admin/*`): plan overrides
//!
//! The OpenAPI document is served at `/api/openapi.json`, with interactive docs at `/api/docs`.

pub mod handlers;
pub mod models;
