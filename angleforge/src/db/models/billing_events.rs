//! Database models for processed billing events.

use crate::types::UserId;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Database request for recording a processed checkout session
#[derive(Debug, Clone)]
pub struct BillingEventCreateDBRequest {
    pub session_id: String,
    pub user_id: UserId,
    pub event_type: String,
    pub provider: String,
}

/// Database response for a billing event
#[derive(Debug, Clone)]
pub struct BillingEventDBResponse {
    pub id: Uuid,
    pub session_id: String,
    pub user_id: UserId,
    pub event_type: String,
    pub provider: String,
    pub created_at: DateTime<Utc>,
}
