//! Database models for subscription plans.

use crate::types::PlanId;
use chrono::{DateTime, Utc};

/// Database response for a plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanDBResponse {
    pub id: PlanId,
    pub name: String,
    pub daily_limit: i32,
    pub price_cents: i32,
    pub angles_per_generation: i32,
    pub created_at: DateTime<Utc>,
}
