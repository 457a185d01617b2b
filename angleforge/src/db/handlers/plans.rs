//! Database repository for the plan catalogue.

use crate::db::{errors::Result, models::plans::PlanDBResponse};
use crate::types::{PlanId, PlanName};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection};
use tracing::instrument;

#[derive(Debug, Clone, FromRow)]
struct Plan {
    pub id: PlanId,
    pub name: String,
    pub daily_limit: i32,
    pub price_cents: i32,
    pub angles_per_generation: i32,
    pub created_at: DateTime<Utc>,
}

impl From<Plan> for PlanDBResponse {
    fn from(plan: Plan) -> Self {
        Self {
            id: plan.id,
            name: plan.name,
            daily_limit: plan.daily_limit,
            price_cents: plan.price_cents,
            angles_per_generation: plan.angles_per_generation,
            created_at: plan.created_at,
        }
    }
}

/// Plans are seeded by migration and never written at runtime, so this repository is read-only.
pub struct Plans<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Plans<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// All plans, cheapest first
    #[instrument(skip(self), err)]
    pub async fn list(&mut self) -> Result<Vec<PlanDBResponse>> {
        let plans = sqlx::query_as::<_, Plan>(
            "SELECT id, name, daily_limit, price_cents, angles_per_generation, created_at FROM plans ORDER BY price_cents, name",
        )
        .fetch_all(&mut *self.db)
        .await?;

        Ok(plans.into_iter().map(PlanDBResponse::from).collect())
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_name(&mut self, name: PlanName) -> Result<Option<PlanDBResponse>> {
        let plan = sqlx::query_as::<_, Plan>(
            "SELECT id, name, daily_limit, price_cents, angles_per_generation, created_at FROM plans WHERE name = $1",
        )
        .bind(name.as_str())
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(plan.map(PlanDBResponse::from))
    }
}
