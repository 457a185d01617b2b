//! Common type definitions.
//!
//! All entity IDs are UUIDs wrapped in type aliases:
//!
//! - [`UserId`]: User account identifier
//! - [`PlanId`]: Subscription plan identifier
//! - [`AngleId`]: Saved angle identifier
//! - [`CollectionId`]: Collection identifier
//! - [`ContentId`]: Generated content identifier
//!
//! # Utility Functions
//!
//! - [`abbrev_uuid`]: Abbreviate UUIDs to first 8 chars for logging

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

pub type UserId = Uuid;
pub type PlanId = Uuid;
pub type AngleId = Uuid;
pub type CollectionId = Uuid;
pub type ContentId = Uuid;

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}

/// Named subscription tiers. The `plans` table is keyed by these names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum PlanName {
    Free,
    Pro,
}

impl PlanName {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanName::Free => "Free",
            PlanName::Pro => "Pro",
        }
    }
}

impl fmt::Display for PlanName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PlanName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Free" => Ok(PlanName::Free),
            "Pro" => Ok(PlanName::Pro),
            other => Err(format!("Unknown plan: {other}")),
        }
    }
}
