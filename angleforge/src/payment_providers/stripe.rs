//! Stripe payment provider implementation

use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use stripe::{CheckoutSession, CheckoutSessionMode, Client, CreateCheckoutSession, CreateCheckoutSessionLineItems};
use url::Url;

use crate::{
    api::models::users::CurrentUser,
    config::StripeConfig,
    payment_providers::{CheckoutUrls, PaymentError, PaymentProvider, Result, WebhookEvent},
};

/// Header carrying the webhook signature
pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// Metadata key the checkout session is tagged with
const USER_ID_METADATA: &str = "userId";

/// Stripe payment provider
pub struct StripeProvider {
    api_key: String,
    price_id: String,
    webhook_secret: String,
    api_base: Url,
}

impl From<StripeConfig> for StripeProvider {
    fn from(config: StripeConfig) -> Self {
        Self {
            api_key: config.api_key,
            price_id: config.price_id,
            webhook_secret: config.webhook_secret,
            api_base: config.api_base,
        }
    }
}

impl StripeProvider {
    /// Get a Stripe client
    fn client(&self) -> Client {
        crate::ensure_crypto_provider();
        Client::from_url(self.api_base.as_str(), &self.api_key)
    }
}

#[async_trait]
impl PaymentProvider for StripeProvider {
    fn name(&self) -> &'static str {
        "stripe"
    }

    async fn create_checkout_session(&self, _db_pool: &PgPool, user: &CurrentUser, urls: &CheckoutUrls) -> Result<String> {
        let client = self.client();
        let user_id = user.id.to_string();

        let checkout_params = CreateCheckoutSession {
            cancel_url: Some(&urls.cancel_url),
            success_url: Some(&urls.success_url),
            client_reference_id: Some(&user_id),
            customer_email: Some(&user.email),
            line_items: Some(vec![CreateCheckoutSessionLineItems {
                price: Some(self.price_id.clone()),
                quantity: Some(1),
                ..Default::default()
            }]),
            metadata: Some(HashMap::from([(USER_ID_METADATA.to_string(), user_id.clone())])),
            mode: Some(CheckoutSessionMode::Subscription),
            ..Default::default()
        };

        let checkout_session = CheckoutSession::create(&client, checkout_params).await.map_err(|e| {
            tracing::error!("Failed to create Stripe checkout session: {:?}", e);
            PaymentError::ProviderApi(e.to_string())
        })?;

        tracing::info!("Created checkout session {} for user {}", checkout_session.id, user.id);

        checkout_session.url.ok_or_else(|| {
            tracing::error!("Checkout session missing URL");
            PaymentError::ProviderApi("Checkout session missing URL".to_string())
        })
    }

    async fn validate_webhook(&self, headers: &axum::http::HeaderMap, body: &str) -> Result<Option<WebhookEvent>> {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .ok_or_else(|| {
                tracing::warn!("Missing stripe-signature header");
                PaymentError::InvalidSignature("Missing stripe-signature header".to_string())
            })?
            .to_str()
            .map_err(|e| {
                tracing::warn!("Invalid stripe-signature header: {:?}", e);
                PaymentError::InvalidSignature("Invalid stripe-signature header".to_string())
            })?;

        let event = stripe::Webhook::construct_event(body, signature, &self.webhook_secret).map_err(|e| {
            tracing::warn!("Rejected Stripe webhook: {:?}", e);
            PaymentError::InvalidSignature(e.to_string())
        })?;

        tracing::trace!("Validated Stripe webhook event: {:?}", event.type_);

        let (session_id, user_id) = match event.data.object {
            stripe::EventObject::CheckoutSession(session) => {
                let user_id = session
                    .metadata
                    .as_ref()
                    .and_then(|m| m.get(USER_ID_METADATA).cloned())
                    .or(session.client_reference_id);
                (Some(session.id.to_string()), user_id)
            }
            _ => (None, None),
        };

        Ok(Some(WebhookEvent {
            event_type: event.type_.to_string(),
            session_id,
            user_id,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::handlers::{Repository, Users},
        payment_providers::CHECKOUT_COMPLETED,
        test_utils::{create_test_user, stripe_checkout_session_json, stripe_event_json, stripe_signature},
        types::PlanName,
    };
    use axum::http::{HeaderMap, HeaderValue};
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_string_contains, header, method, path},
    };

    const WEBHOOK_SECRET: &str = "whsec_test";

    fn provider(api_base: &str) -> StripeProvider {
        StripeProvider::from(StripeConfig {
            api_key: "sk_test_fake".to_string(),
            webhook_secret: WEBHOOK_SECRET.to_string(),
            price_id: "price_pro".to_string(),
            api_base: Url::parse(api_base).unwrap(),
        })
    }

    fn test_user() -> CurrentUser {
        CurrentUser {
            id: uuid::Uuid::new_v4(),
            email: "buyer@example.com".to_string(),
            is_admin: false,
            plan: PlanName::Free,
            daily_limit: 3,
        }
    }

    fn signed_headers(body: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(SIGNATURE_HEADER, HeaderValue::from_str(&stripe_signature(body, WEBHOOK_SECRET)).unwrap());
        headers
    }

    fn completed_event(session_id: &str, user_id: &str) -> String {
        stripe_event_json(CHECKOUT_COMPLETED, stripe_checkout_session_json(session_id, user_id, None))
    }

    #[sqlx::test]
    async fn test_create_checkout_session(pool: PgPool) {
        let user = test_user();
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/checkout/sessions"))
            .and(header("authorization", "Bearer sk_test_fake"))
            .and(body_string_contains("mode=subscription"))
            .and(body_string_contains("price_pro"))
            .and(body_string_contains(user.id.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(stripe_checkout_session_json(
                "cs_test_123",
                &user.id.to_string(),
                Some("https://checkout.stripe.com/c/pay/cs_test_123"),
            )))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider(&server.uri());
        let url = provider
            .create_checkout_session(&pool, &user, &CheckoutUrls::for_app("https://app.test"))
            .await
            .unwrap();

        assert_eq!(url, "https://checkout.stripe.com/c/pay/cs_test_123");
    }

    #[sqlx::test]
    async fn test_create_checkout_session_provider_error(pool: PgPool) {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/checkout/sessions"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": { "message": "No such price: 'price_pro'", "type": "invalid_request_error" }
            })))
            .mount(&server)
            .await;

        let provider = provider(&server.uri());
        let err = provider
            .create_checkout_session(&pool, &test_user(), &CheckoutUrls::for_app("https://app.test"))
            .await
            .unwrap_err();

        assert!(matches!(err, PaymentError::ProviderApi(_)), "expected provider error, got {err:?}");
    }

    #[tokio::test]
    async fn test_validate_webhook_extracts_metadata() {
        let provider = provider("https://api.stripe.com/");
        let user_id = uuid::Uuid::new_v4().to_string();
        let body = completed_event("cs_test_abc", &user_id);

        let event = provider.validate_webhook(&signed_headers(&body), &body).await.unwrap().unwrap();
        assert_eq!(event.event_type, CHECKOUT_COMPLETED);
        assert_eq!(event.session_id.as_deref(), Some("cs_test_abc"));
        assert_eq!(event.user_id.as_deref(), Some(user_id.as_str()));
    }

    #[tokio::test]
    async fn test_validate_webhook_rejects_bad_signature() {
        let provider = provider("https://api.stripe.com/");
        let body = completed_event("cs_test_abc", "whoever");

        let mut headers = HeaderMap::new();
        headers.insert(SIGNATURE_HEADER, HeaderValue::from_static("t=1,v1=deadbeef"));
        let err = provider.validate_webhook(&headers, &body).await.unwrap_err();
        assert!(matches!(err, PaymentError::InvalidSignature(_)));

        let mut headers = HeaderMap::new();
        headers.insert(SIGNATURE_HEADER, HeaderValue::from_str(&stripe_signature(&body, "whsec_other")).unwrap());
        let err = provider.validate_webhook(&headers, &body).await.unwrap_err();
        assert!(matches!(err, PaymentError::InvalidSignature(_)));

        let err = provider.validate_webhook(&HeaderMap::new(), &body).await.unwrap_err();
        assert!(matches!(err, PaymentError::InvalidSignature(_)));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_webhook_replay_upgrades_once(pool: PgPool) {
        let provider = provider("https://api.stripe.com/");
        let user = create_test_user(&pool).await;
        let body = completed_event("cs_replay", &user.id.to_string());

        for _ in 0..2 {
            let event = provider.validate_webhook(&signed_headers(&body), &body).await.unwrap().unwrap();
            provider.process_webhook_event(&pool, &event).await.unwrap();
        }

        let mut conn = pool.acquire().await.unwrap();
        let user = Users::new(&mut conn).get_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(user.plan_name, "Pro");

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM billing_events WHERE session_id = 'cs_replay'")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[sqlx::test]
    async fn test_other_events_are_ignored(pool: PgPool) {
        let provider = provider("https://api.stripe.com/");
        let user = create_test_user(&pool).await;
        let body = stripe_event_json(
            "checkout.session.expired",
            stripe_checkout_session_json("cs_expired", &user.id.to_string(), None),
        );

        let event = provider.validate_webhook(&signed_headers(&body), &body).await.unwrap().unwrap();
        assert_eq!(event.event_type, "checkout.session.expired");
        provider.process_webhook_event(&pool, &event).await.unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let user = Users::new(&mut conn).get_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(user.plan_name, "Free");
    }
}
