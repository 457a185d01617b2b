//! Database repository for collections.

use std::collections::HashMap;

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::collections::{CollectionCreateDBRequest, CollectionDBResponse, CollectionUpdateDBRequest},
};
use crate::types::{CollectionId, UserId, abbrev_uuid};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection};
use tracing::instrument;

/// Filter for listing a user's collections
#[derive(Debug, Clone)]
pub struct CollectionFilter {
    pub user_id: UserId,
}

impl CollectionFilter {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }
}

#[derive(Debug, Clone, FromRow)]
struct Collection {
    pub id: CollectionId,
    pub user_id: UserId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub angle_count: i64,
}

impl From<Collection> for CollectionDBResponse {
    fn from(c: Collection) -> Self {
        Self {
            id: c.id,
            user_id: c.user_id,
            name: c.name,
            created_at: c.created_at,
            updated_at: c.updated_at,
            angle_count: c.angle_count,
        }
    }
}

pub struct Collections<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Collections<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Collections<'c> {
    type CreateRequest = CollectionCreateDBRequest;
    type UpdateRequest = CollectionUpdateDBRequest;
    type Response = CollectionDBResponse;
    type Id = CollectionId;
    type Filter = CollectionFilter;

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id)), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let collection = sqlx::query_as::<_, Collection>(
            r#"
            INSERT INTO collections (user_id, name)
            VALUES ($1, $2)
            RETURNING id, user_id, name, created_at, updated_at, 0::bigint AS angle_count
            "#,
        )
        .bind(request.user_id)
        .bind(&request.name)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(CollectionDBResponse::from(collection))
    }

    #[instrument(skip(self), fields(collection_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let collection = sqlx::query_as::<_, Collection>(
            r#"
            SELECT c.id, c.user_id, c.name, c.created_at, c.updated_at,
                   (SELECT COUNT(*) FROM angles a WHERE a.collection_id = c.id) AS angle_count
            FROM collections c
            WHERE c.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(collection.map(CollectionDBResponse::from))
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<CollectionId>) -> Result<HashMap<Self::Id, CollectionDBResponse>> {
        let collections = sqlx::query_as::<_, Collection>(
            r#"
            SELECT c.id, c.user_id, c.name, c.created_at, c.updated_at,
                   (SELECT COUNT(*) FROM angles a WHERE a.collection_id = c.id) AS angle_count
            FROM collections c
            WHERE c.id = ANY($1)
            "#,
        )
        .bind(&ids)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(collections.into_iter().map(|c| (c.id, CollectionDBResponse::from(c))).collect())
    }

    /// Most recently updated first, each with its angle count
    #[instrument(skip(self, filter), fields(user_id = %abbrev_uuid(&filter.user_id)), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let collections = sqlx::query_as::<_, Collection>(
            r#"
            SELECT c.id, c.user_id, c.name, c.created_at, c.updated_at,
                   COUNT(a.id) AS angle_count
            FROM collections c
            LEFT JOIN angles a ON a.collection_id = c.id
            WHERE c.user_id = $1
            GROUP BY c.id
            ORDER BY c.updated_at DESC, c.id
            "#,
        )
        .bind(filter.user_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(collections.into_iter().map(CollectionDBResponse::from).collect())
    }

    /// Member angles survive with their collection reference cleared (`ON DELETE SET NULL`).
    #[instrument(skip(self), fields(collection_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM collections WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(collection_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let collection = sqlx::query_as::<_, Collection>(
            r#"
            UPDATE collections
            SET name = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, user_id, name, created_at, updated_at,
                      (SELECT COUNT(*) FROM angles a WHERE a.collection_id = collections.id) AS angle_count
            "#,
        )
        .bind(id)
        .bind(&request.name)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(CollectionDBResponse::from(collection))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::Angles;
    use crate::db::models::angles::AngleCreateDBRequest;
    use crate::test_utils::create_test_user;
    use sqlx::PgPool;

    async fn save_angle(pool: &PgPool, user_id: UserId, collection_id: Option<CollectionId>) -> crate::db::models::angles::AngleDBResponse {
        let mut conn = pool.acquire().await.unwrap();
        Angles::new(&mut conn)
            .create(&AngleCreateDBRequest {
                user_id,
                collection_id,
                angle_name: "angle".to_string(),
                hook: "hook".to_string(),
                headline: "headline".to_string(),
                explanation: "explanation".to_string(),
                visual_suggestion: None,
                channel: None,
                tone: None,
                goal: None,
                audience: None,
                source_topic: "topic".to_string(),
                used: false,
            })
            .await
            .unwrap()
    }

    #[sqlx::test]
    async fn test_create_rename_and_count(pool: PgPool) {
        let user = create_test_user(&pool).await;
        let mut conn = pool.acquire().await.unwrap();

        let created = Collections::new(&mut conn)
            .create(&CollectionCreateDBRequest {
                user_id: user.id,
                name: "Ideas".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(created.angle_count, 0);

        save_angle(&pool, user.id, Some(created.id)).await;
        save_angle(&pool, user.id, Some(created.id)).await;

        let renamed = Collections::new(&mut conn)
            .update(
                created.id,
                &CollectionUpdateDBRequest {
                    name: "Better ideas".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.name, "Better ideas");
        assert_eq!(renamed.angle_count, 2);
        assert!(renamed.updated_at >= created.updated_at);
    }

    #[sqlx::test]
    async fn test_list_orders_by_updated_at(pool: PgPool) {
        let user = create_test_user(&pool).await;
        let other = create_test_user(&pool).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Collections::new(&mut conn);

        let older = repo
            .create(&CollectionCreateDBRequest {
                user_id: user.id,
                name: "older".to_string(),
            })
            .await
            .unwrap();
        repo.create(&CollectionCreateDBRequest {
            user_id: user.id,
            name: "newer".to_string(),
        })
        .await
        .unwrap();
        repo.create(&CollectionCreateDBRequest {
            user_id: other.id,
            name: "not mine".to_string(),
        })
        .await
        .unwrap();

        // Touching the older one moves it to the front
        repo.update(
            older.id,
            &CollectionUpdateDBRequest {
                name: "older, renamed".to_string(),
            },
        )
        .await
        .unwrap();

        let listed = repo.list(&CollectionFilter::new(user.id)).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].name, "older, renamed");
        assert_eq!(listed[1].name, "newer");
    }

    #[sqlx::test]
    async fn test_delete_clears_angle_references(pool: PgPool) {
        let user = create_test_user(&pool).await;
        let mut conn = pool.acquire().await.unwrap();

        let collection = Collections::new(&mut conn)
            .create(&CollectionCreateDBRequest {
                user_id: user.id,
                name: "Doomed".to_string(),
            })
            .await
            .unwrap();

        let mut angle_ids = Vec::new();
        for _ in 0..3 {
            angle_ids.push(save_angle(&pool, user.id, Some(collection.id)).await.id);
        }

        assert!(Collections::new(&mut conn).delete(collection.id).await.unwrap());

        let survivors = Angles::new(&mut conn).get_bulk(angle_ids.clone()).await.unwrap();
        assert_eq!(survivors.len(), 3);
        assert!(survivors.values().all(|a| a.collection_id.is_none()));
    }
}
