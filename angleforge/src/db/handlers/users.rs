//! Database repository for users.

use std::collections::HashMap;

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::users::{UserCreateDBRequest, UserDBResponse, UserUpdateDBRequest},
};
use crate::types::{PlanName, UserId, abbrev_uuid};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection};
use tracing::instrument;

/// Filter for listing users
#[derive(Debug, Clone)]
pub struct UserFilter {
    pub skip: i64,
    pub limit: i64,
}

impl UserFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit }
    }
}

// Database entity model, a user row joined with its plan
#[derive(Debug, Clone, FromRow)]
struct User {
    pub id: UserId,
    pub email: String,
    pub password_hash: Option<String>,
    pub plan_id: uuid::Uuid,
    pub plan_name: String,
    pub daily_limit: i32,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserDBResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            password_hash: user.password_hash,
            plan_id: user.plan_id,
            plan_name: user.plan_name,
            daily_limit: user.daily_limit,
            is_admin: user.is_admin,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

pub struct Users<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Users<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, email), err)]
    pub async fn get_user_by_email(&mut self, email: &str) -> Result<Option<UserDBResponse>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.email, u.password_hash, u.plan_id, p.name AS plan_name, p.daily_limit,
                   u.is_admin, u.created_at, u.updated_at
            FROM users u
            JOIN plans p ON p.id = u.plan_id
            WHERE lower(u.email) = lower($1)
            "#,
        )
        .bind(email)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(user.map(UserDBResponse::from))
    }

    /// Move a user onto the named plan in a single statement.
    ///
    /// This is the only primitive that changes a user's plan; the billing webhook and the admin
    /// override both go through it. Concurrent callers resolve last-writer-wins.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id), plan = %plan), err)]
    pub async fn set_plan(&mut self, user_id: UserId, plan: PlanName) -> Result<UserDBResponse> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET plan_id = p.id, updated_at = NOW()
            FROM plans p
            WHERE users.id = $1 AND p.name = $2
            RETURNING users.id, users.email, users.password_hash, users.plan_id, p.name AS plan_name,
                      p.daily_limit, users.is_admin, users.created_at, users.updated_at
            "#,
        )
        .bind(user_id)
        .bind(plan.as_str())
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(UserDBResponse::from(user))
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Users<'c> {
    type CreateRequest = UserCreateDBRequest;
    type UpdateRequest = UserUpdateDBRequest;
    type Response = UserDBResponse;
    type Id = UserId;
    type Filter = UserFilter;

    #[instrument(skip(self, request), fields(plan = %request.plan), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let user = sqlx::query_as::<_, User>(
            r#"
            WITH inserted AS (
                INSERT INTO users (email, password_hash, plan_id, is_admin)
                SELECT $1, $2, p.id, $4 FROM plans p WHERE p.name = $3
                RETURNING *
            )
            SELECT i.id, i.email, i.password_hash, i.plan_id, p.name AS plan_name, p.daily_limit,
                   i.is_admin, i.created_at, i.updated_at
            FROM inserted i
            JOIN plans p ON p.id = i.plan_id
            "#,
        )
        .bind(&request.email)
        .bind(&request.password_hash)
        .bind(request.plan.as_str())
        .bind(request.is_admin)
        .fetch_optional(&mut *self.db)
        .await?
        // No row means the plan catalogue is missing the requested plan
        .ok_or_else(|| DbError::Other(anyhow::anyhow!("Plan {} is not seeded", request.plan)))?;

        Ok(UserDBResponse::from(user))
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.email, u.password_hash, u.plan_id, p.name AS plan_name, p.daily_limit,
                   u.is_admin, u.created_at, u.updated_at
            FROM users u
            JOIN plans p ON p.id = u.plan_id
            WHERE u.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(user.map(UserDBResponse::from))
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<UserId>) -> Result<HashMap<Self::Id, UserDBResponse>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.email, u.password_hash, u.plan_id, p.name AS plan_name, p.daily_limit,
                   u.is_admin, u.created_at, u.updated_at
            FROM users u
            JOIN plans p ON p.id = u.plan_id
            WHERE u.id = ANY($1)
            "#,
        )
        .bind(&ids)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(users.into_iter().map(|u| (u.id, UserDBResponse::from(u))).collect())
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.email, u.password_hash, u.plan_id, p.name AS plan_name, p.daily_limit,
                   u.is_admin, u.created_at, u.updated_at
            FROM users u
            JOIN plans p ON p.id = u.plan_id
            ORDER BY u.created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(filter.limit)
        .bind(filter.skip)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(users.into_iter().map(UserDBResponse::from).collect())
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET password_hash = COALESCE($2, users.password_hash),
                is_admin = COALESCE($3, users.is_admin),
                updated_at = NOW()
            FROM plans p
            WHERE users.id = $1 AND p.id = users.plan_id
            RETURNING users.id, users.email, users.password_hash, users.plan_id, p.name AS plan_name,
                      p.daily_limit, users.is_admin, users.created_at, users.updated_at
            "#,
        )
        .bind(id)
        .bind(&request.password_hash)
        .bind(request.is_admin)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(UserDBResponse::from(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::errors::USERS_EMAIL_UNIQUE;
    use sqlx::PgPool;

    fn create_request(email: &str) -> UserCreateDBRequest {
        UserCreateDBRequest {
            email: email.to_string(),
            password_hash: Some("hash".to_string()),
            plan: PlanName::Free,
            is_admin: false,
        }
    }

    #[sqlx::test]
    async fn test_create_user_defaults_to_free_plan(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        let user = repo.create(&create_request("new@example.com")).await.unwrap();

        assert_eq!(user.email, "new@example.com");
        assert_eq!(user.plan_name, "Free");
        assert_eq!(user.daily_limit, 3);
        assert!(!user.is_pro());
        assert!(!user.is_admin);
    }

    #[sqlx::test]
    async fn test_duplicate_email_is_unique_violation(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        repo.create(&create_request("dup@example.com")).await.unwrap();
        let err = repo.create(&create_request("dup@example.com")).await.unwrap_err();
        assert!(err.is_unique_violation_on(USERS_EMAIL_UNIQUE));

        let err = repo.create(&create_request("DUP@example.com")).await.unwrap_err();
        assert!(err.is_unique_violation_on(USERS_EMAIL_UNIQUE));
    }

    #[sqlx::test]
    async fn test_get_user_by_email_is_case_insensitive(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        let created = repo.create(&create_request("Mixed@Example.com")).await.unwrap();
        let found = repo.get_user_by_email("mixed@example.com").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);

        assert!(repo.get_user_by_email("nobody@example.com").await.unwrap().is_none());
    }

    #[sqlx::test]
    async fn test_set_plan(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        let user = repo.create(&create_request("upgrade@example.com")).await.unwrap();
        let upgraded = repo.set_plan(user.id, PlanName::Pro).await.unwrap();
        assert_eq!(upgraded.plan_name, "Pro");
        assert_eq!(upgraded.daily_limit, 20);
        assert!(upgraded.is_pro());

        let reloaded = repo.get_by_id(user.id).await.unwrap().unwrap();
        assert!(reloaded.is_pro());

        let downgraded = repo.set_plan(user.id, PlanName::Free).await.unwrap();
        assert_eq!(downgraded.plan_name, "Free");
    }

    #[sqlx::test]
    async fn test_set_plan_unknown_user(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        let err = repo.set_plan(uuid::Uuid::new_v4(), PlanName::Pro).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound));
    }

    #[sqlx::test]
    async fn test_update_and_delete(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        let user = repo.create(&create_request("admin-to-be@example.com")).await.unwrap();
        let updated = repo
            .update(
                user.id,
                &UserUpdateDBRequest {
                    password_hash: None,
                    is_admin: Some(true),
                },
            )
            .await
            .unwrap();
        assert!(updated.is_admin);
        assert_eq!(updated.password_hash.as_deref(), Some("hash"));

        let bulk = repo.get_bulk(vec![user.id]).await.unwrap();
        assert!(bulk.contains_key(&user.id));

        let listed = repo.list(&UserFilter::new(0, 10)).await.unwrap();
        assert_eq!(listed.len(), 1);

        assert!(repo.delete(user.id).await.unwrap());
        assert!(repo.get_by_id(user.id).await.unwrap().is_none());
        assert!(!repo.delete(user.id).await.unwrap());
    }
}
