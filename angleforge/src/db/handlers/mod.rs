//! Repository implementations for database access.
//!
//! Each repository wraps a borrowed `PgConnection` (a pooled connection or an open transaction)
//! and exposes strongly-typed operations returning models from [`crate::db::models`].
//!
//! - [`Users`]: accounts, plan assignment
//! - [`Plans`]: read-only plan catalogue
//! - [`UsageLogs`]: daily generation counters
//! - [`Angles`], [`Collections`]: saved ideas and their folders
//! - [`GeneratedContents`]: long-form copy attached to angles
//! - [`BillingEvents`]: processed checkout sessions
//!
//! ```ignore
//! let mut tx = pool.begin().await?;
//! let mut users = Users::new(&mut tx);
//! let user = users.set_plan(user_id, PlanName::Pro).await?;
//! tx.commit().await?;
//! ```

pub mod angles;
pub mod billing_events;
pub mod collections;
pub mod generated_content;
pub mod plans;
pub mod repository;
pub mod usage;
pub mod users;

pub use angles::Angles;
pub use billing_events::BillingEvents;
pub use collections::Collections;
pub use generated_content::GeneratedContents;
pub use plans::Plans;
pub use repository::Repository;
pub use usage::UsageLogs;
pub use users::Users;
