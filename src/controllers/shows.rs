use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

use crate::error::{ApiError, ApiResult};
use crate::extract::ValidJson;
use crate::media;
use crate::middleware::{AdminUser, AuthUser};
use crate::models::show::{AstronomyShowOut, AstronomyShowPatch, AstronomyShowWrite};
use crate::pagination::{Page, PageParams};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/astronomy_show/", get(list_shows).post(create_show))
        .route(
            "/astronomy_show/{id}/",
            get(get_show)
                .put(put_show)
                .patch(patch_show)
                .delete(delete_show),
        )
        .route("/astronomy_show/{id}/upload-image/", post(upload_image))
}

async fn list_shows(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Query(page): Query<PageParams>,
) -> ApiResult<Json<Page<AstronomyShowOut>>> {
    Ok(Json(state.catalog.list_shows(page).await?))
}

async fn create_show(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    ValidJson(write): ValidJson<AstronomyShowWrite>,
) -> ApiResult<(StatusCode, Json<AstronomyShowOut>)> {
    let show = state.catalog.create_show(write).await?;
    Ok((StatusCode::CREATED, Json(show)))
}

async fn get_show(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<AstronomyShowOut>> {
    Ok(Json(state.catalog.get_show(id).await?))
}

async fn put_show(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    ValidJson(write): ValidJson<AstronomyShowWrite>,
) -> ApiResult<Json<AstronomyShowOut>> {
    let patch = AstronomyShowPatch {
        title: Some(write.title),
        description: Some(write.description),
        themes: Some(write.themes),
    };
    Ok(Json(state.catalog.update_show(id, patch).await?))
}

async fn patch_show(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    ValidJson(patch): ValidJson<AstronomyShowPatch>,
) -> ApiResult<Json<AstronomyShowOut>> {
    Ok(Json(state.catalog.update_show(id, patch).await?))
}

async fn delete_show(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.catalog.delete_show(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Accepts a multipart form with an `image` file field, stores the file
/// under the media root and records its relative path on the show. Older
/// images stay on disk; only the recorded path moves.
async fn upload_image(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> ApiResult<Json<AstronomyShowOut>> {
    // 404 before touching the filesystem.
    let show = state.catalog.get_show(id).await?;

    let mut stored = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::validation(err.to_string()))?
    {
        if field.name() != Some("image") {
            continue;
        }
        let filename = field.file_name().unwrap_or("upload").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|err| ApiError::validation(err.to_string()))?;
        let relative = media::image_upload_path(&show.title, &filename);
        media::save_image(&state.config.media.root, &relative, &bytes)
            .await
            .map_err(|err| ApiError::internal("failed to store uploaded image", err))?;
        stored = Some(relative);
        break;
    }

    let relative =
        stored.ok_or_else(|| ApiError::validation("multipart field `image` is required"))?;
    Ok(Json(state.catalog.set_show_image(id, relative).await?))
}
