//! API models for administrative operations.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::types::{PlanName, UserId};

/// Force a user onto a plan. Identify the user by `email` or `userId`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SwitchPlanRequest {
    pub email: Option<String>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub user_id: Option<UserId>,
    pub plan: PlanName,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SwitchedUser {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub email: String,
    pub previous_plan: String,
    pub new_plan: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SwitchPlanResponse {
    pub message: String,
    pub user: SwitchedUser,
}
