use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use crate::error::ApiResult;
use crate::extract::ValidJson;
use crate::middleware::{AdminUser, AuthUser};
use crate::models::theme::{ShowTheme, ShowThemePatch, ShowThemeWrite};
use crate::pagination::{Page, PageParams};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/show_theme/", get(list_themes).post(create_theme))
        .route(
            "/show_theme/{id}/",
            get(get_theme)
                .put(put_theme)
                .patch(patch_theme)
                .delete(delete_theme),
        )
}

async fn list_themes(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Query(page): Query<PageParams>,
) -> ApiResult<Json<Page<ShowTheme>>> {
    Ok(Json(state.catalog.list_themes(page).await?))
}

async fn create_theme(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    ValidJson(write): ValidJson<ShowThemeWrite>,
) -> ApiResult<(StatusCode, Json<ShowTheme>)> {
    let theme = state.catalog.create_theme(write.name).await?;
    Ok((StatusCode::CREATED, Json(theme)))
}

async fn get_theme(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<ShowTheme>> {
    Ok(Json(state.catalog.get_theme(id).await?))
}

async fn put_theme(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    ValidJson(write): ValidJson<ShowThemeWrite>,
) -> ApiResult<Json<ShowTheme>> {
    Ok(Json(state.catalog.update_theme(id, Some(write.name)).await?))
}

async fn patch_theme(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    ValidJson(patch): ValidJson<ShowThemePatch>,
) -> ApiResult<Json<ShowTheme>> {
    Ok(Json(state.catalog.update_theme(id, patch.name).await?))
}

async fn delete_theme(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.catalog.delete_theme(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
