//! Database models for generated content.

use crate::types::{AngleId, ContentId};
use chrono::{DateTime, Utc};

/// Database request for saving generated content
#[derive(Debug, Clone)]
pub struct GeneratedContentCreateDBRequest {
    pub angle_id: AngleId,
    pub content_type: String,
    pub content: String,
    pub image_path: Option<String>,
    pub length: Option<String>,
    pub custom_cta: Option<String>,
}

/// Database response for generated content
#[derive(Debug, Clone)]
pub struct GeneratedContentDBResponse {
    pub id: ContentId,
    pub angle_id: AngleId,
    pub content_type: String,
    pub content: String,
    pub image_path: Option<String>,
    pub length: Option<String>,
    pub custom_cta: Option<String>,
    pub created_at: DateTime<Utc>,
}
