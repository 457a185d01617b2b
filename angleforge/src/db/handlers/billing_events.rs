//! Database repository for processed billing events.

use crate::db::{
    errors::Result,
    models::billing_events::{BillingEventCreateDBRequest, BillingEventDBResponse},
};
use crate::types::UserId;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection};
use tracing::instrument;
use uuid::Uuid;

/// Name of the unique constraint that makes session processing idempotent
pub const SESSION_ID_UNIQUE: &str = "billing_events_session_id_unique";

#[derive(Debug, Clone, FromRow)]
struct BillingEvent {
    pub id: Uuid,
    pub session_id: String,
    pub user_id: UserId,
    pub event_type: String,
    pub provider: String,
    pub created_at: DateTime<Utc>,
}

impl From<BillingEvent> for BillingEventDBResponse {
    fn from(e: BillingEvent) -> Self {
        Self {
            id: e.id,
            session_id: e.session_id,
            user_id: e.user_id,
            event_type: e.event_type,
            provider: e.provider,
            created_at: e.created_at,
        }
    }
}

pub struct BillingEvents<'c> {
    db: &'c mut PgConnection,
}

impl<'c> BillingEvents<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn exists(&mut self, session_id: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM billing_events WHERE session_id = $1)")
            .bind(session_id)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(exists)
    }

    /// Record a processed session. Fails with a unique violation on [`SESSION_ID_UNIQUE`] if the
    /// session was already recorded.
    #[instrument(skip(self, request), fields(session_id = %request.session_id), err)]
    pub async fn create(&mut self, request: &BillingEventCreateDBRequest) -> Result<BillingEventDBResponse> {
        let event = sqlx::query_as::<_, BillingEvent>(
            r#"
            INSERT INTO billing_events (session_id, user_id, event_type, provider)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&request.session_id)
        .bind(request.user_id)
        .bind(&request.event_type)
        .bind(&request.provider)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(BillingEventDBResponse::from(event))
    }

    #[instrument(skip(self), err)]
    pub async fn list_for_user(&mut self, user_id: UserId) -> Result<Vec<BillingEventDBResponse>> {
        let events = sqlx::query_as::<_, BillingEvent>("SELECT * FROM billing_events WHERE user_id = $1 ORDER BY created_at DESC")
            .bind(user_id)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(events.into_iter().map(BillingEventDBResponse::from).collect())
    }
}
