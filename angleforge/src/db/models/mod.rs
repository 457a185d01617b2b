//! Database record models matching table schemas.
//!
//! These structs are what repositories accept and return. They are kept separate from the API
//! models in [`crate::api::models`] so storage and wire representations can evolve
//! independently.
//!
//! - [`users`]: User accounts joined with their plan
//! - [`plans`]: Subscription tier reference data
//! - [`usage`]: Per-user, per-day generation counters
//! - [`angles`]: Saved marketing angles
//! - [`collections`]: User-defined angle folders
//! - [`generated_content`]: Long-form copy expanded from an angle
//! - [`billing_events`]: Processed checkout sessions

pub mod angles;
pub mod billing_events;
pub mod collections;
pub mod generated_content;
pub mod plans;
pub mod usage;
pub mod users;
