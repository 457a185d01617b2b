//! API models for the authenticated user.

use crate::db::models::users::UserDBResponse;
use crate::types::{PlanName, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The authenticated caller, as resolved from the session token and the database.
///
/// Plan and limit are read fresh from the database on every request, so an upgrade takes effect
/// without logging in again.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: String,
    pub is_admin: bool,
    pub plan: PlanName,
    pub daily_limit: i32,
}

impl CurrentUser {
    pub fn is_pro(&self) -> bool {
        self.plan == PlanName::Pro
    }
}

impl From<UserDBResponse> for CurrentUser {
    fn from(db: UserDBResponse) -> Self {
        // Unknown plan names can only come from manual edits; treat them as the free tier.
        let plan = db.plan_name.parse().unwrap_or(PlanName::Free);
        Self {
            id: db.id,
            email: db.email,
            is_admin: db.is_admin,
            plan,
            daily_limit: db.daily_limit,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub email: String,
    pub plan: PlanName,
    pub daily_limit: i32,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl From<UserDBResponse> for UserResponse {
    fn from(db: UserDBResponse) -> Self {
        Self {
            plan: db.plan_name.parse().unwrap_or(PlanName::Free),
            id: db.id,
            email: db.email,
            daily_limit: db.daily_limit,
            is_admin: db.is_admin,
            created_at: db.created_at,
        }
    }
}
