//! API request/response models for saved angles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::rust::double_option;
use utoipa::{IntoParams, ToSchema};

use crate::{
    db::models::angles::AngleDBResponse,
    generation::GeneratedAngle,
    types::{AngleId, CollectionId},
};

/// Save an angle (usually one returned by generation)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AngleCreate {
    pub angle_name: String,
    pub hook: String,
    #[serde(default)]
    pub headline: String,
    #[serde(default)]
    pub explanation: String,
    pub visual_suggestion: Option<String>,
    pub channel: Option<String>,
    pub tone: Option<String>,
    pub goal: Option<String>,
    pub audience: Option<String>,
    pub source_topic: String,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub collection_id: Option<CollectionId>,
    #[serde(default)]
    pub used: bool,
}

/// Partial update of an angle
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AngleUpdate {
    pub used: Option<bool>,
    /// Collection to move into (None = no change, Some(None) = remove from collection)
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    #[schema(value_type = Option<String>, format = "uuid")]
    pub collection_id: Option<Option<CollectionId>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AngleResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: AngleId,
    #[schema(value_type = Option<String>, format = "uuid")]
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

impl From<AngleDBResponse> for AngleResponse {
    fn from(db: AngleDBResponse) -> Self {
        Self {
            id: db.id,
            collection_id: db.collection_id,
            angle_name: db.angle_name,
            hook: db.hook,
            headline: db.headline,
            explanation: db.explanation,
            visual_suggestion: db.visual_suggestion,
            channel: db.channel,
            tone: db.tone,
            goal: db.goal,
            audience: db.audience,
            source_topic: db.source_topic,
            used: db.used,
            used_at: db.used_at,
            created_at: db.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GenerateAnglesResponse {
    pub angles: Vec<GeneratedAngle>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListAnglesQuery {
    /// Only angles in this collection
    #[param(value_type = Option<String>, format = "uuid")]
    pub collection_id: Option<CollectionId>,
    /// Number of items to skip
    #[param(default = 0, minimum = 0)]
    pub skip: Option<i64>,
    /// Maximum number of items to return
    #[param(default = 500, minimum = 1, maximum = 1000)]
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Md,
    Txt,
}

impl ExportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Md => "text/markdown; charset=utf-8",
            ExportFormat::Txt => "text/plain; charset=utf-8",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Md => "md",
            ExportFormat::Txt => "txt",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ExportQuery {
    #[serde(default)]
    pub format: ExportFormat,
    #[param(value_type = Option<String>, format = "uuid")]
    pub collection_id: Option<CollectionId>,
}
