use axum::{Json, extract::State};

use crate::{
    AppState,
    api::models::{
        usage::{PlanResponse, UsageResponse},
        users::CurrentUser,
    },
    db::handlers::Plans,
    errors::Error,
};

/// Today's generation count against the caller's daily limit
#[utoipa::path(
    get,
    path = "/usage",
    tag = "usage",
    responses(
        (status = 200, description = "Usage for today", body = UsageResponse),
        (status = 401, description = "Not logged in"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_usage(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<UsageResponse>, Error> {
    let check = state.usage.check_limit(current_user.id).await?;
    Ok(Json(UsageResponse::from(check)))
}

/// The plan catalogue
#[utoipa::path(
    get,
    path = "/plans",
    tag = "usage",
    responses(
        (status = 200, description = "Available plans", body = [PlanResponse]),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_plans(State(state): State<AppState>) -> Result<Json<Vec<PlanResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let plans = Plans::new(&mut conn).list().await?;
    Ok(Json(plans.into_iter().map(PlanResponse::from).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{auth_header, create_test_app, create_test_pro_user};
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_usage_reflects_recorded_generations(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let user = create_test_pro_user(&pool).await;

        let usage = crate::usage::UsageService::new(pool.clone());
        usage.record_usage(user.id).await.unwrap();
        usage.record_usage(user.id).await.unwrap();

        let auth = auth_header(&user);
        let response = app.get("/api/usage").add_header(&auth.0, &auth.1).await;
        response.assert_status_ok();
        assert_eq!(
            response.json::<Value>(),
            json!({ "dailyCount": 2, "dailyLimit": 20, "plan": "pro" })
        );
    }

    #[sqlx::test]
    async fn test_usage_requires_session(pool: PgPool) {
        let app = create_test_app(pool).await;
        app.get("/api/usage").await.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    async fn test_list_plans_is_public(pool: PgPool) {
        let app = create_test_app(pool).await;

        let response = app.get("/api/plans").await;
        response.assert_status_ok();
        let plans: Vec<PlanResponse> = response.json();
        let free = plans.iter().find(|p| p.name == "Free").unwrap();
        let pro = plans.iter().find(|p| p.name == "Pro").unwrap();
        assert_eq!((free.daily_limit, free.price_cents, free.angles_per_generation), (3, 0, 10));
        assert_eq!((pro.daily_limit, pro.price_cents, pro.angles_per_generation), (20, 2900, 50));
    }
}
