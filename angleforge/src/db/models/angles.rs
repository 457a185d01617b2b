//! Database models for saved angles.

use crate::types::{AngleId, CollectionId, UserId};
use chrono::{DateTime, Utc};

/// Database request for saving an angle
#[derive(Debug, Clone)]
pub struct AngleCreateDBRequest {
    pub user_id: UserId,
    pub collection_id: Option<CollectionId>,
    pub angle_name: String,
    pub hook: String,
    pub headline: String,
    pub explanation: String,
    pub visual_suggestion: Option<String>,
    pub channel: Option<String>,
    pub tone: Option<String>,
    pub goal: Option<String>,
    pub audience: Option<String>,
    pub source_topic: String,
    pub used: bool,
}

/// Database request for updating an angle.
///
/// `collection_id` is doubly optional: `None` leaves it alone, `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct AngleUpdateDBRequest {
    pub used: Option<bool>,
    pub collection_id: Option<Option<CollectionId>>,
}

/// Database response for an angle
#[derive(Debug, Clone)]
pub struct AngleDBResponse {
    pub id: AngleId,
    pub user_id: UserId,
    pub collection_id: Option<CollectionId>,
    pub angle_name: String,
    pub hook: String,
    pub headline: String,
    pub explanation: String,
    pub visual_suggestion: Option<String>,
    pub channel: Option<String>,
    pub tone: Option<String>,
    pub goal: Option<String>,
    pub audience: Option<String>,
    pub source_topic: String,
    pub used: bool,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
