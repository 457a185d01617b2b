//! Database models for collections.

use crate::types::{CollectionId, UserId};
use chrono::{DateTime, Utc};

/// Database request for creating a collection
#[derive(Debug, Clone)]
pub struct CollectionCreateDBRequest {
    pub user_id: UserId,
    pub name: String,
}

/// Database request for renaming a collection
#[derive(Debug, Clone)]
pub struct CollectionUpdateDBRequest {
    pub name: String,
}

/// Database response for a collection
#[derive(Debug, Clone)]
pub struct CollectionDBResponse {
    pub id: CollectionId,
    pub user_id: UserId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Number of angles currently filed in the collection
    pub angle_count: i64,
}
