//! API request/response models for generated content.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    db::models::generated_content::GeneratedContentDBResponse,
    generation::{ContentLength, ContentType},
    types::{AngleId, ContentId},
};

/// Save generated content against one of the caller's angles
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContentSave {
    #[schema(value_type = String, format = "uuid")]
    pub angle_id: AngleId,
    pub content_type: ContentType,
    pub content: String,
    /// Provider image URL; downloaded and stored locally on save
    pub image_url: Option<String>,
    pub length: Option<ContentLength>,
    #[serde(rename = "customCTA")]
    pub custom_cta: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContentResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ContentId,
    #[schema(value_type = String, format = "uuid")]
    pub angle_id: AngleId,
    pub content_type: String,
    pub content: String,
    /// Public path of the stored image
    pub image_path: Option<String>,
    pub length: Option<String>,
    #[serde(rename = "customCTA")]
    pub custom_cta: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<GeneratedContentDBResponse> for ContentResponse {
    fn from(db: GeneratedContentDBResponse) -> Self {
        Self {
            id: db.id,
            angle_id: db.angle_id,
            content_type: db.content_type,
            content: db.content,
            image_path: db.image_path,
            length: db.length,
            custom_cta: db.custom_cta,
            created_at: db.created_at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct DeleteContentQuery {
    /// Content item to delete
    #[param(value_type = Option<String>, format = "uuid")]
    pub content_id: Option<ContentId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
}
