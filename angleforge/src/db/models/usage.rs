//! Database models for daily usage counters.

use crate::types::UserId;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

/// Database response for a usage log row
#[derive(Debug, Clone)]
pub struct UsageLogDBResponse {
    pub id: Uuid,
    pub user_id: UserId,
    pub date: NaiveDate,
    pub count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
