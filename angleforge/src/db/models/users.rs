//! Database models for users.

use crate::types::{PlanId, PlanName, UserId};
use chrono::{DateTime, Utc};

/// Database request for creating a new user
#[derive(Debug, Clone)]
pub struct UserCreateDBRequest {
    pub email: String,
    pub password_hash: Option<String>,
    pub plan: PlanName,
    pub is_admin: bool,
}

/// Database request for updating a user
#[derive(Debug, Clone, Default)]
pub struct UserUpdateDBRequest {
    pub password_hash: Option<String>,
    pub is_admin: Option<bool>,
}

/// Database response for a user, joined with the plan it is on
#[derive(Debug, Clone)]
pub struct UserDBResponse {
    pub id: UserId,
    pub email: String,
    pub password_hash: Option<String>,
    pub plan_id: PlanId,
    pub plan_name: String,
    pub daily_limit: i32,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserDBResponse {
    pub fn is_pro(&self) -> bool {
        self.plan_name == PlanName::Pro.as_str()
    }
}
