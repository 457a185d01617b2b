//! Database repository for generated content.

use crate::db::{
    errors::Result,
    models::generated_content::{GeneratedContentCreateDBRequest, GeneratedContentDBResponse},
};
use crate::types::{AngleId, ContentId, abbrev_uuid};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection};
use tracing::instrument;

#[derive(Debug, Clone, FromRow)]
struct GeneratedContent {
    pub id: ContentId,
    pub angle_id: AngleId,
    pub content_type: String,
    pub content: String,
    pub image_path: Option<String>,
    pub length: Option<String>,
    pub custom_cta: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<GeneratedContent> for GeneratedContentDBResponse {
    fn from(c: GeneratedContent) -> Self {
        Self {
            id: c.id,
            angle_id: c.angle_id,
            content_type: c.content_type,
            content: c.content,
            image_path: c.image_path,
            length: c.length,
            custom_cta: c.custom_cta,
            created_at: c.created_at,
        }
    }
}

pub struct GeneratedContents<'c> {
    db: &'c mut PgConnection,
}

impl<'c> GeneratedContents<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(angle_id = %abbrev_uuid(&request.angle_id), content_type = %request.content_type), err)]
    pub async fn create(&mut self, request: &GeneratedContentCreateDBRequest) -> Result<GeneratedContentDBResponse> {
        let content = sqlx::query_as::<_, GeneratedContent>(
            r#"
            INSERT INTO generated_content (angle_id, content_type, content, image_path, length, custom_cta)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(request.angle_id)
        .bind(&request.content_type)
        .bind(&request.content)
        .bind(&request.image_path)
        .bind(&request.length)
        .bind(&request.custom_cta)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(GeneratedContentDBResponse::from(content))
    }

    #[instrument(skip(self), fields(content_id = %abbrev_uuid(&id)), err)]
    pub async fn get_by_id(&mut self, id: ContentId) -> Result<Option<GeneratedContentDBResponse>> {
        let content = sqlx::query_as::<_, GeneratedContent>("SELECT * FROM generated_content WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(content.map(GeneratedContentDBResponse::from))
    }

    /// Content saved for an angle, newest first
    #[instrument(skip(self), fields(angle_id = %abbrev_uuid(&angle_id)), err)]
    pub async fn list_for_angle(&mut self, angle_id: AngleId) -> Result<Vec<GeneratedContentDBResponse>> {
        let contents = sqlx::query_as::<_, GeneratedContent>(
            "SELECT * FROM generated_content WHERE angle_id = $1 ORDER BY created_at DESC, id",
        )
        .bind(angle_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(contents.into_iter().map(GeneratedContentDBResponse::from).collect())
    }

    #[instrument(skip(self), fields(content_id = %abbrev_uuid(&id)), err)]
    pub async fn delete(&mut self, id: ContentId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM generated_content WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_angle, create_test_user};
    use sqlx::PgPool;

    fn request(angle_id: AngleId, body: &str) -> GeneratedContentCreateDBRequest {
        GeneratedContentCreateDBRequest {
            angle_id,
            content_type: "LinkedIn Post".to_string(),
            content: body.to_string(),
            image_path: None,
            length: Some("Short".to_string()),
            custom_cta: None,
        }
    }

    #[sqlx::test]
    async fn test_create_list_delete(pool: PgPool) {
        let user = create_test_user(&pool).await;
        let angle = create_test_angle(&pool, user.id, None).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = GeneratedContents::new(&mut conn);

        let first = repo.create(&request(angle.id, "first draft")).await.unwrap();
        let second = repo.create(&request(angle.id, "second draft")).await.unwrap();

        let listed = repo.list_for_angle(angle.id).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);

        assert!(repo.delete(first.id).await.unwrap());
        assert!(repo.get_by_id(first.id).await.unwrap().is_none());
        assert_eq!(repo.list_for_angle(angle.id).await.unwrap().len(), 1);
    }

    #[sqlx::test]
    async fn test_content_removed_with_angle(pool: PgPool) {
        let user = create_test_user(&pool).await;
        let angle = create_test_angle(&pool, user.id, None).await;
        let mut conn = pool.acquire().await.unwrap();

        let saved = GeneratedContents::new(&mut conn).create(&request(angle.id, "body")).await.unwrap();

        sqlx::query("DELETE FROM angles WHERE id = $1")
            .bind(angle.id)
            .execute(&pool)
            .await
            .unwrap();

        assert!(GeneratedContents::new(&mut conn).get_by_id(saved.id).await.unwrap().is_none());
    }
}
