use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use sqlx::PgConnection;

use crate::{
    AppState,
    api::{
        handlers::collections::owned_collection,
        models::{
            angles::{AngleCreate, AngleResponse, AngleUpdate, ExportFormat, ExportQuery, GenerateAnglesResponse, ListAnglesQuery},
            users::CurrentUser,
        },
    },
    auth::current_user::require_pro,
    db::{
        handlers::{Angles, Plans, Repository, angles::AngleFilter},
        models::angles::{AngleCreateDBRequest, AngleDBResponse, AngleUpdateDBRequest},
    },
    errors::Error,
    generation::Brief,
    types::{AngleId, abbrev_uuid},
};

const DEFAULT_ANGLES_PER_GENERATION: usize = 10;
const EXPORT_LIMIT: i64 = 10_000;

fn not_found(id: AngleId) -> Error {
    Error::NotFound {
        resource: "Angle".to_string(),
        id: id.to_string(),
    }
}

/// Load an angle owned by `user`. Someone else's angle is reported as missing.
pub(crate) async fn owned_angle(conn: &mut PgConnection, user: &CurrentUser, id: AngleId) -> Result<AngleDBResponse, Error> {
    match Angles::new(conn).get_by_id(id).await? {
        Some(angle) if angle.user_id == user.id => Ok(angle),
        _ => Err(not_found(id)),
    }
}

fn require_text(value: &str, field: &str) -> Result<(), Error> {
    if value.trim().is_empty() {
        return Err(Error::BadRequest {
            message: format!("{field} is required"),
        });
    }
    Ok(())
}

/// Generate angles for a brief, consuming one unit of the daily quota
#[utoipa::path(
    post,
    path = "/angles/generate",
    request_body = Brief,
    tag = "angles",
    responses(
        (status = 200, description = "Generated angles", body = GenerateAnglesResponse),
        (status = 400, description = "Invalid brief"),
        (status = 401, description = "Not logged in"),
        (status = 429, description = "Daily limit reached"),
        (status = 502, description = "AI provider failed"),
    )
)]
#[tracing::instrument(skip_all, fields(user_id = %abbrev_uuid(&current_user.id)))]
pub async fn generate_angles(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(brief): Json<Brief>,
) -> Result<Json<GenerateAnglesResponse>, Error> {
    require_text(&brief.topic, "Topic")?;

    let check = state.usage.check_limit(current_user.id).await?;
    if !check.allowed {
        return Err(Error::RateLimited {
            current: check.current_count,
            limit: check.limit,
            plan: check.plan_name,
        });
    }

    let max_angles = {
        let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        Plans::new(&mut conn)
            .get_by_name(current_user.plan)
            .await?
            .and_then(|plan| usize::try_from(plan.angles_per_generation).ok())
            .unwrap_or(DEFAULT_ANGLES_PER_GENERATION)
    };

    let angles = state.generation.generate_angles(&brief, max_angles).await?;

    // Only successful generations count against the quota
    state.usage.record_usage(current_user.id).await?;

    Ok(Json(GenerateAnglesResponse { angles }))
}

/// Save an angle
#[utoipa::path(
    post,
    path = "/angles",
    request_body = AngleCreate,
    tag = "angles",
    responses(
        (status = 201, description = "Angle saved", body = AngleResponse),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Collection not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_angle(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(create): Json<AngleCreate>,
) -> Result<(StatusCode, Json<AngleResponse>), Error> {
    require_text(&create.angle_name, "Angle name")?;
    require_text(&create.hook, "Hook")?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    if let Some(collection_id) = create.collection_id {
        owned_collection(&mut conn, &current_user, collection_id).await?;
    }

    let angle = Angles::new(&mut conn)
        .create(&AngleCreateDBRequest {
            user_id: current_user.id,
            collection_id: create.collection_id,
            angle_name: create.angle_name,
            hook: create.hook,
            headline: create.headline,
            explanation: create.explanation,
            visual_suggestion: create.visual_suggestion,
            channel: create.channel,
            tone: create.tone,
            goal: create.goal,
            audience: create.audience,
            source_topic: create.source_topic,
            used: create.used,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(AngleResponse::from(angle))))
}

/// List the caller's angles, newest first
#[utoipa::path(
    get,
    path = "/angles",
    params(ListAnglesQuery),
    tag = "angles",
    responses(
        (status = 200, description = "Saved angles", body = [AngleResponse]),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_angles(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ListAnglesQuery>,
) -> Result<Json<Vec<AngleResponse>>, Error> {
    let skip = query.skip.unwrap_or(0).max(0);
    let limit = query.limit.unwrap_or(500).clamp(1, 1000);

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let filter = AngleFilter::new(current_user.id, skip, limit).with_collection(query.collection_id);
    let angles = Angles::new(&mut conn).list(&filter).await?;

    Ok(Json(angles.into_iter().map(AngleResponse::from).collect()))
}

/// Toggle used state or move an angle between collections
#[utoipa::path(
    patch,
    path = "/angles/{id}",
    request_body = AngleUpdate,
    tag = "angles",
    params(("id" = uuid::Uuid, Path, description = "Angle ID")),
    responses(
        (status = 200, description = "Updated angle", body = AngleResponse),
        (status = 404, description = "Angle or collection not found"),
    )
)]
#[tracing::instrument(skip_all, fields(angle_id = %abbrev_uuid(&id)))]
pub async fn update_angle(
    State(state): State<AppState>,
    Path(id): Path<AngleId>,
    current_user: CurrentUser,
    Json(update): Json<AngleUpdate>,
) -> Result<Json<AngleResponse>, Error> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    owned_angle(&mut tx, &current_user, id).await?;
    if let Some(Some(collection_id)) = update.collection_id {
        owned_collection(&mut tx, &current_user, collection_id).await?;
    }

    let angle = Angles::new(&mut tx)
        .update(
            id,
            &AngleUpdateDBRequest {
                used: update.used,
                collection_id: update.collection_id,
            },
        )
        .await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;
    Ok(Json(AngleResponse::from(angle)))
}

fn csv_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

pub(crate) fn export_csv(angles: &[AngleDBResponse]) -> String {
    let mut lines = vec!["Name,Hook,Headline,Explanation".to_string()];
    lines.extend(angles.iter().map(|a| {
        [&a.angle_name, &a.hook, &a.headline, &a.explanation]
            .map(|field| csv_field(field))
            .join(",")
    }));
    lines.join("\n")
}

pub(crate) fn export_markdown(angles: &[AngleDBResponse]) -> String {
    angles
        .iter()
        .map(|a| {
            format!(
                "## {}\n**Hook:** {}\n**Headline:** {}\n\n{}\n",
                a.angle_name, a.hook, a.headline, a.explanation
            )
        })
        .collect::<Vec<_>>()
        .join("\n---\n")
}

pub(crate) fn export_text(angles: &[AngleDBResponse]) -> String {
    angles
        .iter()
        .map(|a| {
            format!(
                "Name: {}\nHook: {}\nHeadline: {}\nExplanation: {}\n",
                a.angle_name, a.hook, a.headline, a.explanation
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Download the caller's angles as CSV, Markdown or plain text (Pro only)
#[utoipa::path(
    get,
    path = "/angles/export",
    params(ExportQuery),
    tag = "angles",
    responses(
        (status = 200, description = "Exported angles as an attachment", content_type = "text/plain"),
        (status = 403, description = "Requires the Pro plan"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn export_angles(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ExportQuery>,
) -> Result<Response, Error> {
    require_pro(&current_user, "Export")?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let filter = AngleFilter::new(current_user.id, 0, EXPORT_LIMIT).with_collection(query.collection_id);
    let angles = Angles::new(&mut conn).list(&filter).await?;

    let body = match query.format {
        ExportFormat::Csv => export_csv(&angles),
        ExportFormat::Md => export_markdown(&angles),
        ExportFormat::Txt => export_text(&angles),
    };
    let disposition = format!("attachment; filename=\"angles.{}\"", query.format.extension());

    Ok((
        [
            (header::CONTENT_TYPE, query.format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}
