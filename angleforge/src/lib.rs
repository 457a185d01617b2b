//! # AngleForge: marketing angle generation with metered plans
//!
//! AngleForge turns a short creative brief (topic, audience, channel, tone, goal and optionally a
//! competitor's copy) into a set of distinct marketing angles using a generative-AI provider.
//! Users save the angles they like, sort them into collections, mark them as used, expand them
//! into long-form content with an optional generated image, and export them.
//!
//! ## Plans and metering
//!
//! Every user is on exactly one plan. The Free plan allows a small number of angle generations
//! per calendar day; Pro raises that limit and unlocks collections, content generation and
//! export. Generation is metered by [`usage::UsageService`]: the limit is checked before the
//! provider is called and usage is recorded only after a successful generation. Upgrades happen
//! through a [`payment_providers::PaymentProvider`] (Stripe, or a dummy provider for development)
//! or through the admin plan override.
//!
//! ## Architecture
//!
//! The HTTP layer is [Axum](https://github.com/tokio-rs/axum) and all persistence is PostgreSQL
//! through SQLx. Handlers in [`api::handlers`] authenticate the caller with the
//! [`CurrentUser`](api::models::users::CurrentUser) extractor, talk to the database through the
//! repositories in [`db::handlers`], and call out to [`generation`] for anything that needs the
//! AI provider.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use angleforge::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = angleforge::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     angleforge::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Database Setup
//!
//! Migrations are embedded and run on startup. The plan catalogue is seeded by the migrations,
//! and an initial admin user is created (or its password reset) from `admin_email` and
//! `admin_password`.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod generation;
pub mod openapi;
pub mod payment_providers;
pub mod telemetry;
pub mod types;
pub mod usage;

#[cfg(test)]
pub mod test_utils;

use crate::{
    api::handlers,
    auth::password,
    config::CorsOrigin,
    db::{
        handlers::{Repository, Users},
        models::users::{UserCreateDBRequest, UserUpdateDBRequest},
    },
    generation::{GenerationService, images::ImageStore},
    openapi::ApiDoc,
    payment_providers::PaymentProvider,
    types::PlanName,
    usage::UsageService,
};
use axum::{
    Json, Router,
    http::{self, HeaderValue},
    routing::{get, patch, post},
};
use bon::Builder;
pub use config::Config;
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use types::{AngleId, CollectionId, ContentId, UserId};

/// Install the process-wide rustls crypto provider. Safe to call more than once.
pub fn ensure_crypto_provider() {
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
}

/// Application state shared across all request handlers.
///
/// Cloned into every request; all fields are cheap handles.
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    pub usage: UsageService,
    pub payment_provider: Option<Arc<dyn PaymentProvider>>,
    pub generation: GenerationService,
    pub images: ImageStore,
}

impl AppState {
    /// Build the state's services from configuration
    pub fn from_config(db: PgPool, config: Config) -> Self {
        Self::builder()
            .usage(UsageService::new(db.clone()))
            .maybe_payment_provider(config.payment.clone().map(payment_providers::create_provider))
            .generation(GenerationService::new(&config.ai))
            .images(ImageStore::new(&config.images))
            .db(db)
            .config(config)
            .build()
    }
}

/// Get the database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create the initial admin user if it doesn't exist, or reset its password if it does.
///
/// Without a configured password the admin can only be promoted, never logged in as, so the
/// call is skipped entirely.
#[instrument(skip_all, err)]
pub async fn create_initial_admin_user(email: &str, password: Option<&str>, db: &PgPool) -> Result<Option<UserId>, errors::Error> {
    let Some(password) = password else {
        debug!("No admin password configured, skipping initial admin user");
        return Ok(None);
    };

    let password = password.to_string();
    let password_hash = tokio::task::spawn_blocking(move || password::hash_string(&password))
        .await
        .map_err(|e| errors::Error::Internal {
            operation: format!("spawn password hashing task: {e}"),
        })??;

    let mut tx = db.begin().await.map_err(|e| errors::Error::Database(e.into()))?;
    let mut users = Users::new(&mut tx);

    let user_id = if let Some(existing) = users.get_user_by_email(email).await? {
        let update = UserUpdateDBRequest {
            password_hash: Some(password_hash),
            is_admin: Some(true),
        };
        users.update(existing.id, &update).await?;
        existing.id
    } else {
        let request = UserCreateDBRequest {
            email: email.to_string(),
            password_hash: Some(password_hash),
            plan: PlanName::Free,
            is_admin: true,
        };
        users.create(&request).await?.id
    };

    tx.commit().await.map_err(|e| errors::Error::Database(e.into()))?;
    info!("Initial admin user {} is ready", email);
    Ok(Some(user_id))
}

/// Connect to the database (unless a pool is supplied), run migrations and create the admin user
async fn setup_database(config: &Config, pool: Option<PgPool>) -> anyhow::Result<PgPool> {
    let pool = match pool {
        Some(pool) => pool,
        None => {
            info!("Connecting to database");
            PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .acquire_timeout(config.database.acquire_timeout)
                .connect(&config.database.url)
                .await?
        }
    };

    migrator().run(&pool).await?;

    create_initial_admin_user(&config.admin_email, config.admin_password.as_deref(), &pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create initial admin user: {}", e))?;

    Ok(pool)
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let cors_config = &config.auth.security.cors;

    // A literal `*` cannot be combined with credentials, so a wildcard echoes the request origin
    let allow_origin = if cors_config.allowed_origins.iter().any(|o| matches!(o, CorsOrigin::Wildcard)) {
        AllowOrigin::mirror_request()
    } else {
        let mut origins = Vec::new();
        for origin in &cors_config.allowed_origins {
            if let CorsOrigin::Url(url) = origin {
                origins.push(url.origin().ascii_serialization().parse::<HeaderValue>()?);
            }
        }
        AllowOrigin::list(origins)
    };

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([http::Method::GET, http::Method::POST, http::Method::PATCH, http::Method::DELETE])
        .allow_headers([http::header::CONTENT_TYPE, http::header::AUTHORIZATION])
        .allow_credentials(cors_config.allow_credentials)
        .expose_headers([http::header::CONTENT_DISPOSITION]);

    if let Some(max_age) = cors_config.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let api_routes = Router::new()
        // Authentication
        .route("/auth/signup", post(handlers::auth::signup))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/auth/me", get(handlers::auth::me))
        // Quota and plans
        .route("/usage", get(handlers::usage::get_usage))
        .route("/plans", get(handlers::usage::list_plans))
        // Angles
        .route("/angles", post(handlers::angles::create_angle).get(handlers::angles::list_angles))
        .route("/angles/generate", post(handlers::angles::generate_angles))
        .route("/angles/export", get(handlers::angles::export_angles))
        .route("/angles/{id}", patch(handlers::angles::update_angle))
        // Collections
        .route(
            "/collections",
            post(handlers::collections::create_collection).get(handlers::collections::list_collections),
        )
        .route(
            "/collections/{id}",
            patch(handlers::collections::update_collection).delete(handlers::collections::delete_collection),
        )
        // Long-form content
        .route("/content/generate", post(handlers::content::generate_content))
        .route("/content/save", post(handlers::content::save_content))
        .route(
            "/content/{angle_id}",
            get(handlers::content::list_content).delete(handlers::content::delete_content),
        )
        // Billing
        .route("/billing/checkout", post(handlers::billing::create_checkout))
        .route("/billing/webhook", post(handlers::billing::webhook))
        // Admin
        .route("/admin/switch-plan", post(handlers::admin::switch_plan))
        .route("/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .with_state(state.clone());

    let mut router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .nest("/api", api_routes)
        .merge(Scalar::with_url("/api/docs", ApiDoc::openapi()));

    if state.config.images.serve {
        let prefix = state.config.images.public_prefix.trim_end_matches('/');
        let images = ServeDir::new(state.images.dir());
        router = if prefix.is_empty() {
            router.fallback_service(images)
        } else {
            router.nest_service(prefix, images)
        };
    }

    let router = router.layer(create_cors_layer(&state.config)?).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// The running service: a router bound to its database pool.
///
/// 1. **Setup**: [`Application::new`] connects to the database, runs migrations and creates the
///    initial admin user
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and handles requests
/// 3. **Shutdown**: when the shutdown future resolves, in-flight requests finish and the pool is
///    closed
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        Self::new_with_pool(config, None).await
    }

    /// Create an application, reusing `pool` if given instead of connecting from configuration
    pub async fn new_with_pool(config: Config, pool: Option<PgPool>) -> anyhow::Result<Self> {
        debug!("Starting AngleForge with configuration: {:#?}", config);

        let pool = setup_database(&config, pool).await?;
        let state = AppState::from_config(pool.clone(), config.clone());
        let router = build_router(state)?;

        Ok(Self { router, config, pool })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router.into_make_service()).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "AngleForge listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
