//! Database layer for data persistence and access.
//!
//! Uses SQLx with PostgreSQL and follows the repository pattern:
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  (API request handlers, services)
//! └──────┬──────┘
//!        ↓
//! ┌─────────────┐
//! │ Repositories│  (db::handlers - queries)
//! └──────┬──────┘
//!        ↓
//! ┌─────────────┐
//! │   Models    │  (db::models - database records)
//! └──────┬──────┘
//!        ↓
//! ┌─────────────┐
//! │  PostgreSQL │
//! └─────────────┘
//! ```
//!
//! Migrations live in the crate's `migrations/` directory and are embedded with
//! [`crate::migrator`].

pub mod errors;
pub mod handlers;
pub mod models;
