use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{db::models::collections::CollectionDBResponse, types::CollectionId};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CollectionCreate {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CollectionUpdate {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CollectionResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: CollectionId,
    pub name: String,
    pub angle_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CollectionDBResponse> for CollectionResponse {
    fn from(db: CollectionDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            angle_count: db.angle_count,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
