use axum::{
    Json,
    extract::State,
    http::HeaderMap,
};

use crate::{
    AppState,
    api::models::{
        billing::{CheckoutResponse, WebhookAck},
        users::CurrentUser,
    },
    errors::Error,
    payment_providers::CheckoutUrls,
    types::abbrev_uuid,
};

/// Start a Pro subscription checkout
#[utoipa::path(
    post,
    path = "/billing/checkout",
    tag = "billing",
    responses(
        (status = 200, description = "Checkout URL to redirect to", body = CheckoutResponse),
        (status = 401, description = "Not logged in"),
        (status = 501, description = "No payment provider configured"),
        (status = 502, description = "Payment provider failed"),
    )
)]
#[tracing::instrument(skip_all, fields(user_id = %abbrev_uuid(&current_user.id)))]
pub async fn create_checkout(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<CheckoutResponse>, Error> {
    let provider = state.payment_provider.as_ref().ok_or_else(|| Error::NotConfigured {
        feature: "Billing".to_string(),
    })?;

    let urls = CheckoutUrls::for_app(state.config.app_base_url());
    let url = provider.create_checkout_session(&state.db, &current_user, &urls).await?;

    tracing::info!("Created {} checkout for user {}", provider.name(), current_user.id);
    Ok(Json(CheckoutResponse { url }))
}

/// Payment provider webhook. Authenticated by signature, not by session.
#[utoipa::path(
    post,
    path = "/billing/webhook",
    tag = "billing",
    request_body(content = String, description = "Raw provider event payload", content_type = "application/json"),
    responses(
        (status = 200, description = "Event accepted", body = WebhookAck),
        (status = 400, description = "Invalid signature or payload"),
        (status = 404, description = "No payment provider configured"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn webhook(State(state): State<AppState>, headers: HeaderMap, body: String) -> Result<Json<WebhookAck>, Error> {
    let provider = state.payment_provider.as_ref().ok_or_else(|| Error::NotFound {
        resource: "Webhook endpoint".to_string(),
        id: "billing".to_string(),
    })?;

    // Nothing is read or written until the signature has been checked
    let Some(event) = provider.validate_webhook(&headers, &body).await? else {
        return Ok(Json(WebhookAck { received: true }));
    };

    tracing::info!("Received {} webhook event {}", provider.name(), event.event_type);
    provider.process_webhook_event(&state.db, &event).await?;

    Ok(Json(WebhookAck { received: true }))
}
