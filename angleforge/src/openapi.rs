//! OpenAPI documentation for the `/api/*` endpoints.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::{api, generation, types::PlanName};

/// Session cookie and bearer token security schemes.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "SessionCookie".to_string(),
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    "angleforge_session",
                    "Session cookie set by `/api/auth/login` and `/api/auth/signup`.",
                ))),
            );
            components.security_schemes.insert(
                "BearerAuth".to_string(),
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "The `token` returned by `/api/auth/login`:\n\n```\nAuthorization: Bearer YOUR_TOKEN\n```",
                        ))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "AngleForge API",
        description = "Generate marketing angles from a creative brief, organise them into collections, \
expand them into long-form content and manage Free/Pro subscriptions."
    ),
    servers((url = "/api")),
    modifiers(&SecurityAddon),
    security(("SessionCookie" = []), ("BearerAuth" = [])),
    paths(
        api::handlers::auth::signup,
        api::handlers::auth::login,
        api::handlers::auth::logout,
        api::handlers::auth::me,
        api::handlers::usage::get_usage,
        api::handlers::usage::list_plans,
        api::handlers::angles::generate_angles,
        api::handlers::angles::create_angle,
        api::handlers::angles::list_angles,
        api::handlers::angles::update_angle,
        api::handlers::angles::export_angles,
        api::handlers::collections::create_collection,
        api::handlers::collections::list_collections,
        api::handlers::collections::update_collection,
        api::handlers::collections::delete_collection,
        api::handlers::content::generate_content,
        api::handlers::content::save_content,
        api::handlers::content::list_content,
        api::handlers::content::delete_content,
        api::handlers::billing::create_checkout,
        api::handlers::billing::webhook,
        api::handlers::admin::switch_plan,
    ),
    components(
        schemas(
            PlanName,
            api::models::auth::SignupRequest,
            api::models::auth::SignupBody,
            api::models::auth::SignupUser,
            api::models::auth::LoginRequest,
            api::models::auth::LoginBody,
            api::models::auth::SessionUser,
            api::models::auth::LogoutBody,
            api::models::users::UserResponse,
            api::models::usage::UsageResponse,
            api::models::usage::PlanResponse,
            api::models::angles::AngleCreate,
            api::models::angles::AngleUpdate,
            api::models::angles::AngleResponse,
            api::models::angles::GenerateAnglesResponse,
            api::models::angles::ExportFormat,
            api::models::collections::CollectionCreate,
            api::models::collections::CollectionUpdate,
            api::models::collections::CollectionResponse,
            api::models::content::ContentSave,
            api::models::content::ContentResponse,
            api::models::content::SuccessResponse,
            api::models::billing::CheckoutResponse,
            api::models::billing::WebhookAck,
            api::models::admin::SwitchPlanRequest,
            api::models::admin::SwitchPlanResponse,
            api::models::admin::SwitchedUser,
            generation::Brief,
            generation::GeneratedAngle,
            generation::ContentRequest,
            generation::GeneratedContent,
            generation::ContentType,
            generation::ContentLength,
        )
    ),
    tags(
        (name = "authentication", description = "Account signup and session management"),
        (name = "usage", description = "Daily generation quota and the plan catalogue"),
        (name = "angles", description = "Angle generation (metered against the daily limit), saving and export"),
        (name = "collections", description = "Folders for saved angles"),
        (name = "content", description = "Long-form content generated from an angle (Pro)"),
        (name = "billing", description = "Subscription checkout and payment provider webhooks"),
        (name = "admin", description = "Administrative plan overrides"),
    )
)]
pub struct ApiDoc;
