//! API models for usage and the plan catalogue.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{db::models::plans::PlanDBResponse, types::PlanId, usage::LimitCheck};

/// Today's usage against the caller's plan
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UsageResponse {
    pub daily_count: i32,
    pub daily_limit: i32,
    /// Plan name, lower-cased (`free` or `pro`)
    pub plan: String,
}

impl From<LimitCheck> for UsageResponse {
    fn from(check: LimitCheck) -> Self {
        Self {
            daily_count: check.current_count,
            daily_limit: check.limit,
            plan: check.plan_name.to_lowercase(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: PlanId,
    pub name: String,
    pub daily_limit: i32,
    /// Monthly price in cents
    pub price_cents: i32,
    pub angles_per_generation: i32,
}

impl From<PlanDBResponse> for PlanResponse {
    fn from(db: PlanDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            daily_limit: db.daily_limit,
            price_cents: db.price_cents,
            angles_per_generation: db.angles_per_generation,
        }
    }
}
