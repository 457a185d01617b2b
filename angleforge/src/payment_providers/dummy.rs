//! Dummy payment provider implementation
//!
//! Upgrades the caller to Pro immediately, without any external payment. Useful for development
//! and demos. Goes through the same idempotent upgrade path as a real provider's webhook.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    api::models::users::CurrentUser,
    config::DummyConfig,
    payment_providers::{CheckoutUrls, PaymentProvider, Result, WebhookEvent, apply_checkout_completed},
};

/// Dummy payment provider that upgrades instantly
#[derive(Debug, Default)]
pub struct DummyProvider;

impl From<DummyConfig> for DummyProvider {
    fn from(_config: DummyConfig) -> Self {
        Self
    }
}

#[async_trait]
impl PaymentProvider for DummyProvider {
    fn name(&self) -> &'static str {
        "dummy"
    }

    async fn create_checkout_session(&self, db_pool: &PgPool, user: &CurrentUser, urls: &CheckoutUrls) -> Result<String> {
        let session_id = format!("dummy_session_{}_{}", user.id, uuid::Uuid::new_v4());

        tracing::info!("Dummy provider completing checkout session {} for user {}", session_id, user.id);
        apply_checkout_completed(db_pool, &session_id, user.id, self.name()).await?;

        // Payment is instantly "complete"; send the user straight to the success page
        Ok(urls.success_url.clone())
    }

    async fn validate_webhook(&self, _headers: &axum::http::HeaderMap, _body: &str) -> Result<Option<WebhookEvent>> {
        // Dummy provider doesn't use webhooks
        Ok(None)
    }
}
