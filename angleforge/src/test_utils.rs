//! Test utilities shared by the unit and handler tests.

use crate::{
    AppState,
    api::models::users::CurrentUser,
    auth::{
        password::{Argon2Params, hash_string_with_params},
        session::create_session_token,
    },
    config::{Config, ImagesConfig},
    db::{
        handlers::{Angles, Collections, Repository, Users},
        models::{
            angles::{AngleCreateDBRequest, AngleDBResponse},
            collections::{CollectionCreateDBRequest, CollectionDBResponse},
            users::{UserCreateDBRequest, UserDBResponse},
        },
    },
    types::{CollectionId, PlanName, UserId},
};
use axum_test::TestServer;
use sqlx::PgPool;
use uuid::Uuid;

pub const TEST_PASSWORD: &str = "test-password-123";

pub fn create_test_config() -> Config {
    let images_dir = std::env::temp_dir().join(format!("angleforge-test-images-{}", std::process::id()));

    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        admin_email: "admin@test.com".to_string(),
        admin_password: None,
        secret_key: Some("test-secret-key-for-testing-only".to_string()),
        auth: crate::config::AuthConfig {
            session: crate::config::SessionConfig {
                cookie_secure: false,
                ..Default::default()
            },
            ..Default::default()
        },
        images: ImagesConfig {
            dir: images_dir,
            ..Default::default()
        },
        ..Default::default()
    }
}

/// State over `pool` with the services `config` describes
pub fn create_test_state(pool: PgPool, config: Config) -> AppState {
    AppState::from_config(pool, config)
}

pub async fn create_test_app(pool: PgPool) -> TestServer {
    crate::Application::new_with_pool(create_test_config(), Some(pool))
        .await
        .expect("Failed to create application")
        .into_test_server()
}

/// App over `config`, with generated images written to a fresh directory that lives as long as
/// the returned guard
pub async fn create_test_app_with_config(pool: PgPool, mut config: Config) -> (TestServer, tempfile::TempDir) {
    let images = tempfile::tempdir().expect("Failed to create image directory");
    config.images.dir = images.path().to_path_buf();

    let server = crate::Application::new_with_pool(config, Some(pool))
        .await
        .expect("Failed to create application")
        .into_test_server();
    (server, images)
}

async fn insert_user(pool: &PgPool, prefix: &str, plan: PlanName, is_admin: bool) -> UserDBResponse {
    let password_hash = hash_string_with_params(TEST_PASSWORD, Some(Argon2Params::fast())).expect("Failed to hash test password");
    let request = UserCreateDBRequest {
        email: format!("{prefix}_{}@example.com", Uuid::new_v4().simple()),
        password_hash: Some(password_hash),
        plan,
        is_admin,
    };

    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    Users::new(&mut conn).create(&request).await.expect("Failed to create test user")
}

pub async fn create_test_user(pool: &PgPool) -> UserDBResponse {
    insert_user(pool, "testuser", PlanName::Free, false).await
}

pub async fn create_test_pro_user(pool: &PgPool) -> UserDBResponse {
    insert_user(pool, "testpro", PlanName::Pro, false).await
}

pub async fn create_test_admin_user(pool: &PgPool) -> UserDBResponse {
    insert_user(pool, "testadmin", PlanName::Free, true).await
}

pub async fn create_test_collection(pool: &PgPool, user_id: UserId, name: &str) -> CollectionDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    Collections::new(&mut conn)
        .create(&CollectionCreateDBRequest {
            user_id,
            name: name.to_string(),
        })
        .await
        .expect("Failed to create test collection")
}

pub async fn create_test_angle(pool: &PgPool, user_id: UserId, collection_id: Option<CollectionId>) -> AngleDBResponse {
    let request = AngleCreateDBRequest {
        user_id,
        collection_id,
        angle_name: "Test Angle".to_string(),
        hook: "Stop losing a day a week to invoicing".to_string(),
        headline: "Invoicing, handled".to_string(),
        explanation: "Speaks to the time cost rather than the money".to_string(),
        visual_suggestion: Some("A calendar with Fridays crossed out".to_string()),
        channel: Some("LinkedIn".to_string()),
        tone: Some("Direct".to_string()),
        goal: Some("Sign-ups".to_string()),
        audience: Some("Freelancers".to_string()),
        source_topic: "invoicing software".to_string(),
        used: false,
    };

    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    Angles::new(&mut conn).create(&request).await.expect("Failed to create test angle")
}

/// `Authorization: Bearer` header for `user`, signed with [`create_test_config`]'s secret
pub fn auth_header(user: &UserDBResponse) -> (String, String) {
    let token = create_session_token(&CurrentUser::from(user.clone()), &create_test_config()).expect("Failed to create session token");
    ("authorization".to_string(), format!("Bearer {token}"))
}

/// `stripe-signature` header value for `body`, timestamped now
pub fn stripe_signature(body: &str, secret: &str) -> String {
    use hmac::{Hmac, Mac};

    let timestamp = chrono::Utc::now().timestamp();
    let mut mac = Hmac::<sha2::Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(format!("{timestamp}.{body}").as_bytes());
    format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes()))
}

/// A Stripe checkout session object for a Pro subscription bought by `user_id`
pub fn stripe_checkout_session_json(session_id: &str, user_id: &str, url: Option<&str>) -> serde_json::Value {
    let now = chrono::Utc::now().timestamp();
    serde_json::json!({
        "id": session_id,
        "object": "checkout.session",
        "amount_subtotal": 999,
        "amount_total": 999,
        "automatic_tax": { "enabled": false, "liability": null, "status": null },
        "billing_address_collection": null,
        "cancel_url": "http://localhost:3001/account?canceled=true",
        "client_reference_id": user_id,
        "created": now,
        "currency": "usd",
        "custom_fields": [],
        "custom_text": {
            "after_submit": null,
            "shipping_address": null,
            "submit": null,
            "terms_of_service_acceptance": null
        },
        "customer": null,
        "customer_creation": null,
        "customer_details": null,
        "customer_email": "buyer@example.com",
        "expires_at": now + 86400,
        "invoice": null,
        "livemode": false,
        "locale": null,
        "metadata": { "userId": user_id },
        "mode": "subscription",
        "payment_intent": null,
        "payment_method_collection": "always",
        "payment_method_types": ["card"],
        "payment_status": "paid",
        "shipping_options": [],
        "status": "complete",
        "submit_type": null,
        "subscription": null,
        "success_url": "http://localhost:3001/account?success=true",
        "total_details": null,
        "ui_mode": "hosted",
        "url": url
    })
}

/// A Stripe webhook event envelope around `object`
pub fn stripe_event_json(event_type: &str, object: serde_json::Value) -> String {
    serde_json::json!({
        "id": format!("evt_{}", Uuid::new_v4().simple()),
        "object": "event",
        "api_version": null,
        "created": chrono::Utc::now().timestamp(),
        "data": { "object": object },
        "livemode": false,
        "pending_webhooks": 1,
        "request": { "id": null, "idempotency_key": null },
        "type": event_type
    })
    .to_string()
}
