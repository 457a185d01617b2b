//! Database repository for saved angles.

use std::collections::HashMap;

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::angles::{AngleCreateDBRequest, AngleDBResponse, AngleUpdateDBRequest},
};
use crate::types::{AngleId, CollectionId, UserId, abbrev_uuid};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection};
use tracing::instrument;

/// Filter for listing a user's angles
#[derive(Debug, Clone)]
pub struct AngleFilter {
    pub user_id: UserId,
    pub collection_id: Option<CollectionId>,
    pub skip: i64,
    pub limit: i64,
}

impl AngleFilter {
    pub fn new(user_id: UserId, skip: i64, limit: i64) -> Self {
        Self {
            user_id,
            collection_id: None,
            skip,
            limit,
        }
    }

    pub fn with_collection(mut self, collection_id: Option<CollectionId>) -> Self {
        self.collection_id = collection_id;
        self
    }
}

#[derive(Debug, Clone, FromRow)]
struct Angle {
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

impl From<Angle> for AngleDBResponse {
    fn from(a: Angle) -> Self {
        Self {
            id: a.id,
            user_id: a.user_id,
            collection_id: a.collection_id,
            angle_name: a.angle_name,
            hook: a.hook,
            headline: a.headline,
            explanation: a.explanation,
            visual_suggestion: a.visual_suggestion,
            channel: a.channel,
            tone: a.tone,
            goal: a.goal,
            audience: a.audience,
            source_topic: a.source_topic,
            used: a.used,
            used_at: a.used_at,
            created_at: a.created_at,
        }
    }
}

pub struct Angles<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Angles<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Angles<'c> {
    type CreateRequest = AngleCreateDBRequest;
    type UpdateRequest = AngleUpdateDBRequest;
    type Response = AngleDBResponse;
    type Id = AngleId;
    type Filter = AngleFilter;

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id)), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let angle = sqlx::query_as::<_, Angle>(
            r#"
            INSERT INTO angles (
                user_id, collection_id, angle_name, hook, headline, explanation, visual_suggestion,
                channel, tone, goal, audience, source_topic, used, used_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, CASE WHEN $13 THEN NOW() END)
            RETURNING *
            "#,
        )
        .bind(request.user_id)
        .bind(request.collection_id)
        .bind(&request.angle_name)
        .bind(&request.hook)
        .bind(&request.headline)
        .bind(&request.explanation)
        .bind(&request.visual_suggestion)
        .bind(&request.channel)
        .bind(&request.tone)
        .bind(&request.goal)
        .bind(&request.audience)
        .bind(&request.source_topic)
        .bind(request.used)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(AngleDBResponse::from(angle))
    }

    #[instrument(skip(self), fields(angle_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let angle = sqlx::query_as::<_, Angle>("SELECT * FROM angles WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(angle.map(AngleDBResponse::from))
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<AngleId>) -> Result<HashMap<Self::Id, AngleDBResponse>> {
        let angles = sqlx::query_as::<_, Angle>("SELECT * FROM angles WHERE id = ANY($1)")
            .bind(&ids)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(angles.into_iter().map(|a| (a.id, AngleDBResponse::from(a))).collect())
    }

    /// Newest first
    #[instrument(skip(self, filter), fields(user_id = %abbrev_uuid(&filter.user_id)), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let angles = sqlx::query_as::<_, Angle>(
            r#"
            SELECT * FROM angles
            WHERE user_id = $1
              AND ($2::uuid IS NULL OR collection_id = $2)
            ORDER BY created_at DESC, id
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(filter.user_id)
        .bind(filter.collection_id)
        .bind(filter.limit)
        .bind(filter.skip)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(angles.into_iter().map(AngleDBResponse::from).collect())
    }

    #[instrument(skip(self), fields(angle_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM angles WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Marking an angle used stamps `used_at`; unmarking clears it.
    #[instrument(skip(self, request), fields(angle_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let (set_collection, collection_id) = match request.collection_id {
            Some(collection_id) => (true, collection_id),
            None => (false, None),
        };

        let angle = sqlx::query_as::<_, Angle>(
            r#"
            UPDATE angles SET
                used = COALESCE($2, used),
                used_at = CASE
                    WHEN $2::boolean IS NULL THEN used_at
                    WHEN $2::boolean THEN NOW()
                    ELSE NULL
                END,
                collection_id = CASE WHEN $3 THEN $4 ELSE collection_id END
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.used)
        .bind(set_collection)
        .bind(collection_id)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(AngleDBResponse::from(angle))
    }
}
