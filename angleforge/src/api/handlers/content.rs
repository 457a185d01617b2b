use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    AppState,
    api::{
        handlers::angles::owned_angle,
        models::{
            content::{ContentResponse, ContentSave, DeleteContentQuery, SuccessResponse},
            users::CurrentUser,
        },
    },
    auth::current_user::require_pro,
    db::{handlers::GeneratedContents, models::generated_content::GeneratedContentCreateDBRequest},
    errors::Error,
    generation::{ContentRequest, GeneratedContent},
    types::{AngleId, abbrev_uuid},
};

fn is_remote_url(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://")
}

/// Expand an angle into long-form content (Pro only)
#[utoipa::path(
    post,
    path = "/content/generate",
    request_body = ContentRequest,
    tag = "content",
    responses(
        (status = 200, description = "Generated content", body = GeneratedContent),
        (status = 403, description = "Requires the Pro plan"),
        (status = 502, description = "AI provider failed"),
    )
)]
#[tracing::instrument(skip_all, fields(user_id = %abbrev_uuid(&current_user.id)))]
pub async fn generate_content(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<ContentRequest>,
) -> Result<Json<GeneratedContent>, Error> {
    require_pro(&current_user, "Content generation")?;
    if request.angle_name.trim().is_empty() || request.hook.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Angle name and hook are required".to_string(),
        });
    }

    let content = state.generation.generate_content(&request).await?;
    Ok(Json(content))
}

/// Save generated content against an angle (Pro only). A provider image URL is copied to local storage.
#[utoipa::path(
    post,
    path = "/content/save",
    request_body = ContentSave,
    tag = "content",
    responses(
        (status = 201, description = "Content saved", body = ContentResponse),
        (status = 403, description = "Requires the Pro plan"),
        (status = 404, description = "Angle not found"),
    )
)]
#[tracing::instrument(skip_all, fields(angle_id = %abbrev_uuid(&save.angle_id)))]
pub async fn save_content(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(save): Json<ContentSave>,
) -> Result<(StatusCode, Json<ContentResponse>), Error> {
    require_pro(&current_user, "Saving content")?;
    if save.content.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Content is required".to_string(),
        });
    }

    {
        let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        owned_angle(&mut conn, &current_user, save.angle_id).await?;
    }

    // Download outside of any database connection; failure just drops the image
    let image_path = match save.image_url.as_deref() {
        Some(url) if is_remote_url(url) => state.images.download_best_effort(url, save.angle_id).await,
        Some(other) => {
            tracing::warn!("Ignoring non-HTTP image URL {}", other);
            None
        }
        None => None,
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let content = GeneratedContents::new(&mut conn)
        .create(&GeneratedContentCreateDBRequest {
            angle_id: save.angle_id,
            content_type: save.content_type.as_str().to_string(),
            content: save.content,
            image_path,
            length: save.length.map(|l| l.as_str().to_string()),
            custom_cta: save.custom_cta,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(ContentResponse::from(content))))
}

/// List content saved for an angle, newest first
#[utoipa::path(
    get,
    path = "/content/{angle_id}",
    tag = "content",
    params(("angle_id" = uuid::Uuid, Path, description = "Angle ID")),
    responses(
        (status = 200, description = "Saved content", body = [ContentResponse]),
        (status = 404, description = "Angle not found"),
    )
)]
#[tracing::instrument(skip_all, fields(angle_id = %abbrev_uuid(&angle_id)))]
pub async fn list_content(
    State(state): State<AppState>,
    Path(angle_id): Path<AngleId>,
    current_user: CurrentUser,
) -> Result<Json<Vec<ContentResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    owned_angle(&mut conn, &current_user, angle_id).await?;

    let contents = GeneratedContents::new(&mut conn).list_for_angle(angle_id).await?;
    Ok(Json(contents.into_iter().map(ContentResponse::from).collect()))
}

/// Delete one saved content item and its stored image
#[utoipa::path(
    delete,
    path = "/content/{angle_id}",
    tag = "content",
    params(("angle_id" = uuid::Uuid, Path, description = "Angle ID"), DeleteContentQuery),
    responses(
        (status = 200, description = "Content deleted", body = SuccessResponse),
        (status = 400, description = "Missing contentId"),
        (status = 404, description = "Angle or content not found"),
    )
)]
#[tracing::instrument(skip_all, fields(angle_id = %abbrev_uuid(&angle_id)))]
pub async fn delete_content(
    State(state): State<AppState>,
    Path(angle_id): Path<AngleId>,
    Query(query): Query<DeleteContentQuery>,
    current_user: CurrentUser,
) -> Result<Json<SuccessResponse>, Error> {
    let content_id = query.content_id.ok_or_else(|| Error::BadRequest {
        message: "contentId is required".to_string(),
    })?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    owned_angle(&mut conn, &current_user, angle_id).await?;

    let mut contents = GeneratedContents::new(&mut conn);
    let content = contents
        .get_by_id(content_id)
        .await?
        .filter(|c| c.angle_id == angle_id)
        .ok_or_else(|| Error::NotFound {
            resource: "Content".to_string(),
            id: content_id.to_string(),
        })?;

    contents.delete(content_id).await?;
    drop(conn);

    if let Some(image_path) = content.image_path.as_deref() {
        state.images.delete_best_effort(image_path).await;
    }

    Ok(Json(SuccessResponse { success: true }))
}
