use axum::{Json, extract::State};

use crate::{
    AppState,
    api::models::{
        admin::{SwitchPlanRequest, SwitchPlanResponse, SwitchedUser},
        users::CurrentUser,
    },
    auth::current_user::require_admin,
    db::{
        errors::DbError,
        handlers::{Repository, Users},
    },
    errors::Error,
};

/// Move a user onto a plan, bypassing billing (admin only)
#[utoipa::path(
    post,
    path = "/admin/switch-plan",
    request_body = SwitchPlanRequest,
    tag = "admin",
    responses(
        (status = 200, description = "Plan switched", body = SwitchPlanResponse),
        (status = 400, description = "Neither email nor userId given"),
        (status = 403, description = "Administrator access required"),
        (status = 404, description = "User not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn switch_plan(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<SwitchPlanRequest>,
) -> Result<Json<SwitchPlanResponse>, Error> {
    require_admin(&current_user)?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let mut users = Users::new(&mut tx);

    let (target, lookup) = match (&request.user_id, request.email.as_deref()) {
        (Some(id), _) => (users.get_by_id(*id).await?, id.to_string()),
        (None, Some(email)) => (users.get_user_by_email(email.trim()).await?, email.to_string()),
        (None, None) => {
            return Err(Error::BadRequest {
                message: "Either email or userId is required".to_string(),
            });
        }
    };
    let target = target.ok_or_else(|| Error::NotFound {
        resource: "User".to_string(),
        id: lookup,
    })?;

    let previous_plan = target.plan_name.clone();
    let updated = users.set_plan(target.id, request.plan).await.map_err(|e| match e {
        DbError::NotFound => Error::NotFound {
            resource: "User".to_string(),
            id: target.id.to_string(),
        },
        other => other.into(),
    })?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    tracing::info!(
        "Admin {} switched user {} from {} to {}",
        current_user.id,
        updated.id,
        previous_plan,
        updated.plan_name
    );

    Ok(Json(SwitchPlanResponse {
        message: format!("Switched {} to the {} plan", updated.email, updated.plan_name),
        user: SwitchedUser {
            id: updated.id,
            email: updated.email,
            previous_plan,
            new_plan: updated.plan_name,
        },
    }))
}
