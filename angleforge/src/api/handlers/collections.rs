use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use sqlx::PgConnection;

use crate::{
    AppState,
    api::models::{
        collections::{CollectionCreate, CollectionResponse, CollectionUpdate},
        users::CurrentUser,
    },
    auth::current_user::require_pro,
    db::{
        handlers::{Collections, Repository, collections::CollectionFilter},
        models::collections::{CollectionCreateDBRequest, CollectionDBResponse, CollectionUpdateDBRequest},
    },
    errors::Error,
    types::{CollectionId, abbrev_uuid},
};

/// Load a collection owned by `user`. Someone else's collection is reported as missing.
pub(crate) async fn owned_collection(
    conn: &mut PgConnection,
    user: &CurrentUser,
    id: CollectionId,
) -> Result<CollectionDBResponse, Error> {
    match Collections::new(conn).get_by_id(id).await? {
        Some(collection) if collection.user_id == user.id => Ok(collection),
        _ => Err(Error::NotFound {
            resource: "Collection".to_string(),
            id: id.to_string(),
        }),
    }
}

fn validated_name(name: &str) -> Result<String, Error> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::BadRequest {
            message: "Collection name is required".to_string(),
        });
    }
    Ok(name.to_string())
}

/// Create a collection (Pro only)
#[utoipa::path(
    post,
    path = "/collections",
    request_body = CollectionCreate,
    tag = "collections",
    responses(
        (status = 201, description = "Collection created", body = CollectionResponse),
        (status = 400, description = "Invalid name"),
        (status = 403, description = "Requires the Pro plan"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_collection(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(create): Json<CollectionCreate>,
) -> Result<(StatusCode, Json<CollectionResponse>), Error> {
    require_pro(&current_user, "Collections")?;
    let name = validated_name(&create.name)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let collection = Collections::new(&mut conn)
        .create(&CollectionCreateDBRequest {
            user_id: current_user.id,
            name,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(CollectionResponse::from(collection))))
}

/// List the caller's collections, most recently updated first
#[utoipa::path(
    get,
    path = "/collections",
    tag = "collections",
    responses(
        (status = 200, description = "Collections with angle counts", body = [CollectionResponse]),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_collections(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<Vec<CollectionResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let collections = Collections::new(&mut conn).list(&CollectionFilter::new(current_user.id)).await?;
    Ok(Json(collections.into_iter().map(CollectionResponse::from).collect()))
}

/// Rename a collection
#[utoipa::path(
    patch,
    path = "/collections/{id}",
    request_body = CollectionUpdate,
    tag = "collections",
    params(("id" = uuid::Uuid, Path, description = "Collection ID")),
    responses(
        (status = 200, description = "Renamed collection", body = CollectionResponse),
        (status = 404, description = "Collection not found"),
    )
)]
#[tracing::instrument(skip_all, fields(collection_id = %abbrev_uuid(&id)))]
pub async fn update_collection(
    State(state): State<AppState>,
    Path(id): Path<CollectionId>,
    current_user: CurrentUser,
    Json(update): Json<CollectionUpdate>,
) -> Result<Json<CollectionResponse>, Error> {
    let name = validated_name(&update.name)?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    owned_collection(&mut tx, &current_user, id).await?;
    let collection = Collections::new(&mut tx).update(id, &CollectionUpdateDBRequest { name }).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(CollectionResponse::from(collection)))
}

/// Delete a collection. Its angles are kept and leave the collection.
#[utoipa::path(
    delete,
    path = "/collections/{id}",
    tag = "collections",
    params(("id" = uuid::Uuid, Path, description = "Collection ID")),
    responses(
        (status = 204, description = "Collection deleted"),
        (status = 404, description = "Collection not found"),
    )
)]
#[tracing::instrument(skip_all, fields(collection_id = %abbrev_uuid(&id)))]
pub async fn delete_collection(
    State(state): State<AppState>,
    Path(id): Path<CollectionId>,
    current_user: CurrentUser,
) -> Result<StatusCode, Error> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    owned_collection(&mut tx, &current_user, id).await?;
    Collections::new(&mut tx).delete(id).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::handlers::Angles,
        test_utils::{auth_header, create_test_angle, create_test_app, create_test_collection, create_test_pro_user, create_test_user},
    };
    use serde_json::json;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_is_pro_only(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let free = create_test_user(&pool).await;
        let pro = create_test_pro_user(&pool).await;

        let auth = auth_header(&free);
        app.post("/api/collections")
            .add_header(&auth.0, &auth.1)
            .json(&json!({ "name": "Q3 launch" }))
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let auth = auth_header(&pro);
        let response = app
            .post("/api/collections")
            .add_header(&auth.0, &auth.1)
            .json(&json!({ "name": "  Q3 launch  " }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let collection: CollectionResponse = response.json();
        assert_eq!(collection.name, "Q3 launch");
        assert_eq!(collection.angle_count, 0);

        app.post("/api/collections")
            .add_header(&auth.0, &auth.1)
            .json(&json!({ "name": "" }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_rename_and_counts(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool).await;
        let collection = create_test_collection(&pool, user.id, "Ideas").await;
        create_test_angle(&pool, user.id, Some(collection.id)).await;
        create_test_angle(&pool, user.id, Some(collection.id)).await;
        let auth = auth_header(&user);

        let listed: Vec<CollectionResponse> = app.get("/api/collections").add_header(&auth.0, &auth.1).await.json();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].angle_count, 2);

        // Renaming does not require Pro
        let response = app
            .patch(&format!("/api/collections/{}", collection.id))
            .add_header(&auth.0, &auth.1)
            .json(&json!({ "name": "Best ideas" }))
            .await;
        response.assert_status_ok();
        let renamed: CollectionResponse = response.json();
        assert_eq!(renamed.name, "Best ideas");
        assert!(renamed.updated_at >= collection.updated_at);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete_keeps_angles(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool).await;
        let collection = create_test_collection(&pool, user.id, "Doomed").await;
        let mut angle_ids = Vec::new();
        for _ in 0..3 {
            angle_ids.push(create_test_angle(&pool, user.id, Some(collection.id)).await.id);
        }
        let auth = auth_header(&user);

        app.delete(&format!("/api/collections/{}", collection.id))
            .add_header(&auth.0, &auth.1)
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let mut conn = pool.acquire().await.unwrap();
        let angles = Angles::new(&mut conn).get_bulk(angle_ids).await.unwrap();
        assert_eq!(angles.len(), 3);
        assert!(angles.values().all(|a| a.collection_id.is_none()));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_other_users_collections_are_not_found(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let owner = create_test_user(&pool).await;
        let intruder = create_test_pro_user(&pool).await;
        let collection = create_test_collection(&pool, owner.id, "Private").await;
        let auth = auth_header(&intruder);

        app.patch(&format!("/api/collections/{}", collection.id))
            .add_header(&auth.0, &auth.1)
            .json(&json!({ "name": "Mine now" }))
            .await
            .assert_status(StatusCode::NOT_FOUND);
        app.delete(&format!("/api/collections/{}", collection.id))
            .add_header(&auth.0, &auth.1)
            .await
            .assert_status(StatusCode::NOT_FOUND);

        let listed: Vec<CollectionResponse> = app.get("/api/collections").add_header(&auth.0, &auth.1).await.json();
        assert!(listed.is_empty());

        let mut conn = pool.acquire().await.unwrap();
        let kept = Collections::new(&mut conn).get_by_id(collection.id).await.unwrap().unwrap();
        assert_eq!(kept.name, "Private");
    }
}
