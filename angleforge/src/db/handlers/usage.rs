//! Database repository for daily usage counters.

use crate::db::{errors::Result, models::usage::UsageLogDBResponse};
use crate::types::{UserId, abbrev_uuid};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgConnection};
use tracing::instrument;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
struct UsageLog {
    pub id: Uuid,
    pub user_id: UserId,
    pub date: NaiveDate,
    pub count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UsageLog> for UsageLogDBResponse {
    fn from(log: UsageLog) -> Self {
        Self {
            id: log.id,
            user_id: log.user_id,
            date: log.date,
            count: log.count,
            created_at: log.created_at,
            updated_at: log.updated_at,
        }
    }
}

pub struct UsageLogs<'c> {
    db: &'c mut PgConnection,
}

impl<'c> UsageLogs<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// The row for (user, day), if any generation has happened that day
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn get_for_day(&mut self, user_id: UserId, date: NaiveDate) -> Result<Option<UsageLogDBResponse>> {
        let log = sqlx::query_as::<_, UsageLog>(
            "SELECT id, user_id, date, count, created_at, updated_at FROM usage_logs WHERE user_id = $1 AND date = $2",
        )
        .bind(user_id)
        .bind(date)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(log.map(UsageLogDBResponse::from))
    }

    /// Count for (user, day), zero when no row exists yet
    pub async fn count_for_day(&mut self, user_id: UserId, date: NaiveDate) -> Result<i32> {
        Ok(self.get_for_day(user_id, date).await?.map(|log| log.count).unwrap_or(0))
    }

    /// Add one to the (user, day) counter, creating the row on first use.
    ///
    /// A single upsert keyed by the `(user_id, date)` unique constraint, so concurrent callers
    /// neither create duplicate rows nor lose increments. Returns the count after the increment.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn increment(&mut self, user_id: UserId, date: NaiveDate) -> Result<UsageLogDBResponse> {
        let log = sqlx::query_as::<_, UsageLog>(
            r#"
            INSERT INTO usage_logs (user_id, date, count)
            VALUES ($1, $2, 1)
            ON CONFLICT ON CONSTRAINT usage_logs_user_date_unique
            DO UPDATE SET count = usage_logs.count + 1, updated_at = NOW()
            RETURNING id, user_id, date, count, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(date)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(UsageLogDBResponse::from(log))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::errors::DbError;
    use crate::test_utils::create_test_user;
    use sqlx::PgPool;

    #[sqlx::test]
    async fn test_increment_creates_then_updates_single_row(pool: PgPool) {
        let user = create_test_user(&pool).await;
        let day = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = UsageLogs::new(&mut conn);

        assert_eq!(repo.count_for_day(user.id, day).await.unwrap(), 0);

        let first = repo.increment(user.id, day).await.unwrap();
        assert_eq!(first.count, 1);
        let second = repo.increment(user.id, day).await.unwrap();
        assert_eq!(second.count, 2);
        assert_eq!(first.id, second.id);

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM usage_logs WHERE user_id = $1")
            .bind(user.id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[sqlx::test]
    async fn test_days_are_independent(pool: PgPool) {
        let user = create_test_user(&pool).await;
        let monday = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let tuesday = monday.succ_opt().unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = UsageLogs::new(&mut conn);

        repo.increment(user.id, monday).await.unwrap();
        repo.increment(user.id, monday).await.unwrap();
        repo.increment(user.id, tuesday).await.unwrap();

        assert_eq!(repo.count_for_day(user.id, monday).await.unwrap(), 2);
        assert_eq!(repo.count_for_day(user.id, tuesday).await.unwrap(), 1);
    }

    #[sqlx::test]
    async fn test_increment_unknown_user_is_foreign_key_violation(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = UsageLogs::new(&mut conn);

        let err = repo
            .increment(Uuid::new_v4(), NaiveDate::from_ymd_opt(2025, 1, 1).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }
}
