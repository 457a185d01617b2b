//! Payment provider abstraction layer
//!
//! This module defines the `PaymentProvider` trait which abstracts subscription checkout and
//! webhook handling across payment providers. Whatever the provider, a completed checkout ends in
//! [`apply_checkout_completed`], which records the session and moves the user onto the Pro plan.

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;

use crate::{
    api::models::users::CurrentUser,
    config::PaymentConfig,
    db::{
        errors::DbError,
        handlers::{BillingEvents, Users, billing_events::SESSION_ID_UNIQUE},
        models::billing_events::BillingEventCreateDBRequest,
    },
    errors::Error,
    types::{PlanName, UserId, abbrev_uuid},
};

pub mod dummy;
pub mod stripe;

/// Event type emitted when a hosted checkout finishes successfully
pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";

/// Create a payment provider from configuration
///
/// This is the single point where we convert config into provider instances.
/// Adding a new provider requires adding a match arm here.
pub fn create_provider(config: PaymentConfig) -> Arc<dyn PaymentProvider> {
    match config {
        PaymentConfig::Stripe(stripe_config) => Arc::new(stripe::StripeProvider::from(stripe_config)),
        PaymentConfig::Dummy(dummy_config) => Arc::new(dummy::DummyProvider::from(dummy_config)),
    }
}

/// Result type for payment provider operations
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Errors that can occur during payment processing
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("Payment provider API error: {0}")]
    ProviderApi(String),

    #[error("Invalid webhook signature: {0}")]
    InvalidSignature(String),

    #[error("Invalid payment data: {0}")]
    InvalidData(String),

    #[error(transparent)]
    Database(#[from] DbError),
}

impl From<sqlx::Error> for PaymentError {
    fn from(err: sqlx::Error) -> Self {
        PaymentError::Database(DbError::from(err))
    }
}

impl From<PaymentError> for Error {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::ProviderApi(message) => Error::Upstream {
                service: "payment provider",
                message,
            },
            PaymentError::InvalidSignature(reason) => Error::InvalidSignature { reason },
            PaymentError::InvalidData(message) => Error::BadRequest { message },
            PaymentError::Database(e) => Error::Database(e),
        }
    }
}

/// URLs the hosted checkout redirects back to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutUrls {
    pub success_url: String,
    pub cancel_url: String,
}

impl CheckoutUrls {
    /// The account page of the web app, flagged with the checkout outcome.
    pub fn for_app(app_base_url: &str) -> Self {
        Self {
            success_url: format!("{app_base_url}/account?success=true"),
            cancel_url: format!("{app_base_url}/account?canceled=true"),
        }
    }
}

/// Represents a verified webhook event from a payment provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookEvent {
    /// Type of event (e.g., "checkout.session.completed")
    pub event_type: String,
    /// Checkout session the event refers to, if any
    pub session_id: Option<String>,
    /// User id the checkout was tagged with, if any
    pub user_id: Option<String>,
}

/// Abstract payment provider interface
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Short provider name recorded alongside processed sessions
    fn name(&self) -> &'static str;

    /// Start a Pro subscription checkout for `user`.
    ///
    /// Returns the URL the user should be redirected to.
    async fn create_checkout_session(&self, db_pool: &PgPool, user: &CurrentUser, urls: &CheckoutUrls) -> Result<String>;

    /// Verify and parse a webhook delivery.
    ///
    /// Returns `None` if this provider doesn't use webhooks. Returns `Err` if the signature does
    /// not verify, in which case nothing may be processed.
    async fn validate_webhook(&self, headers: &axum::http::HeaderMap, body: &str) -> Result<Option<WebhookEvent>>;

    /// Act on a verified webhook event. Must be safe to call repeatedly with the same event.
    async fn process_webhook_event(&self, db_pool: &PgPool, event: &WebhookEvent) -> Result<()> {
        if event.event_type != CHECKOUT_COMPLETED {
            tracing::debug!("Ignoring webhook event type {}", event.event_type);
            return Ok(());
        }

        let Some(session_id) = event.session_id.as_deref() else {
            return Err(PaymentError::InvalidData("Checkout event without session id".to_string()));
        };

        let Some(user_id) = event.user_id.as_deref() else {
            tracing::warn!("Checkout session {} has no userId metadata, nothing to upgrade", session_id);
            return Ok(());
        };

        let user_id: UserId = user_id
            .parse()
            .map_err(|e| PaymentError::InvalidData(format!("Invalid userId metadata: {e}")))?;

        apply_checkout_completed(db_pool, session_id, user_id, self.name()).await?;
        Ok(())
    }
}

/// Outcome of applying a completed checkout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutOutcome {
    /// The user was moved onto the Pro plan by this call
    Upgraded,
    /// The session had already been processed
    AlreadyProcessed,
    /// The session names a user that no longer exists
    UnknownUser,
}

/// Record a completed checkout session and upgrade its user to Pro, at most once per session.
///
/// The session row and the plan change are written in one transaction, and the unique constraint
/// on the session id turns concurrent or replayed deliveries into no-ops.
#[tracing::instrument(skip(db_pool), fields(user_id = %abbrev_uuid(&user_id)), err)]
pub async fn apply_checkout_completed(db_pool: &PgPool, session_id: &str, user_id: UserId, provider: &str) -> Result<CheckoutOutcome> {
    // Fast path: already processed
    {
        let mut conn = db_pool.acquire().await?;
        if BillingEvents::new(&mut conn).exists(session_id).await? {
            tracing::trace!("Checkout session {} already processed (fast path)", session_id);
            return Ok(CheckoutOutcome::AlreadyProcessed);
        }
    }

    let mut tx = db_pool.begin().await?;

    let request = BillingEventCreateDBRequest {
        session_id: session_id.to_string(),
        user_id,
        event_type: CHECKOUT_COMPLETED.to_string(),
        provider: provider.to_string(),
    };

    match BillingEvents::new(&mut tx).create(&request).await {
        Ok(_) => {}
        Err(e) if e.is_unique_violation_on(SESSION_ID_UNIQUE) => {
            tracing::trace!("Checkout session {} already processed (unique constraint)", session_id);
            return Ok(CheckoutOutcome::AlreadyProcessed);
        }
        Err(DbError::ForeignKeyViolation { .. }) => {
            tracing::warn!("Checkout session {} refers to unknown user {}", session_id, user_id);
            return Ok(CheckoutOutcome::UnknownUser);
        }
        Err(e) => return Err(e.into()),
    }

    match Users::new(&mut tx).set_plan(user_id, PlanName::Pro).await {
        Ok(_) => {}
        Err(DbError::NotFound) => {
            tracing::warn!("Checkout session {} refers to unknown user {}", session_id, user_id);
            return Ok(CheckoutOutcome::UnknownUser);
        }
        Err(e) => return Err(e.into()),
    }

    tx.commit().await?;

    tracing::info!("Upgraded user {} to Pro via {} session {}", user_id, provider, session_id);
    Ok(CheckoutOutcome::Upgraded)
}
