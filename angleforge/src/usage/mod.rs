//! Daily usage metering and plan gating.
//!
//! Every angle generation consumes one unit of the user's daily quota. The quota comes from the
//! user's plan (`plans.daily_limit`) and resets at local midnight: the counter is keyed by the
//! server's local calendar date.
//!
//! [`UsageService::check_limit`] is side-effect free. [`UsageService::record_usage`] is a single
//! atomic upsert-and-increment, so concurrent generations by the same user can never create two
//! rows for one day or lose an increment.

use chrono::{Local, NaiveDate};
use serde::Serialize;
use sqlx::PgPool;
use tracing::{debug, instrument};
use utoipa::ToSchema;

use crate::{
    db::{
        errors::DbError,
        handlers::{Repository, UsageLogs, Users},
    },
    errors::Error,
    types::{UserId, abbrev_uuid},
};

#[derive(Debug, thiserror::Error)]
pub enum UsageError {
    #[error("User {0} not found")]
    UserNotFound(UserId),

    #[error(transparent)]
    Database(#[from] DbError),
}

impl From<sqlx::Error> for UsageError {
    fn from(err: sqlx::Error) -> Self {
        UsageError::Database(err.into())
    }
}

impl From<UsageError> for Error {
    fn from(err: UsageError) -> Self {
        match err {
            UsageError::UserNotFound(id) => Error::NotFound {
                resource: "User".to_string(),
                id: id.to_string(),
            },
            UsageError::Database(e) => Error::Database(e),
        }
    }
}

pub type Result<T> = std::result::Result<T, UsageError>;

/// Outcome of a quota check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LimitCheck {
    /// `current_count < limit`
    pub allowed: bool,
    pub current_count: i32,
    pub limit: i32,
    pub plan_name: String,
}

/// The calendar day usage is currently being counted against
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[derive(Clone, Debug)]
pub struct UsageService {
    db: PgPool,
}

impl UsageService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Can this user generate again today?
    pub async fn check_limit(&self, user_id: UserId) -> Result<LimitCheck> {
        self.check_limit_on(user_id, today()).await
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn check_limit_on(&self, user_id: UserId, day: NaiveDate) -> Result<LimitCheck> {
        let mut conn = self.db.acquire().await?;

        let user = Users::new(&mut conn)
            .get_by_id(user_id)
            .await?
            .ok_or(UsageError::UserNotFound(user_id))?;
        let current_count = UsageLogs::new(&mut conn).count_for_day(user_id, day).await?;

        let check = LimitCheck {
            allowed: current_count < user.daily_limit,
            current_count,
            limit: user.daily_limit,
            plan_name: user.plan_name,
        };
        debug!(?check, "Checked daily limit");
        Ok(check)
    }

    /// Record one generation for today. Returns the new count.
    pub async fn record_usage(&self, user_id: UserId) -> Result<i32> {
        self.record_usage_on(user_id, today()).await
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn record_usage_on(&self, user_id: UserId, day: NaiveDate) -> Result<i32> {
        let mut conn = self.db.acquire().await?;

        match UsageLogs::new(&mut conn).increment(user_id, day).await {
            Ok(log) => Ok(log.count),
            Err(DbError::ForeignKeyViolation { .. }) => Err(UsageError::UserNotFound(user_id)),
            Err(e) => Err(e.into()),
        }
    }
}
