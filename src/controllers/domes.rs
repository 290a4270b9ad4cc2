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
use crate::models::dome::{PlanetariumDome, PlanetariumDomePatch, PlanetariumDomeWrite};
use crate::pagination::{Page, PageParams};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/planetarium_dome/", get(list_domes).post(create_dome))
        .route(
            "/planetarium_dome/{id}/",
            get(get_dome)
                .put(put_dome)
                .patch(patch_dome)
                .delete(delete_dome),
        )
}

async fn list_domes(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Query(page): Query<PageParams>,
) -> ApiResult<Json<Page<PlanetariumDome>>> {
    Ok(Json(state.catalog.list_domes(page).await?))
}

async fn create_dome(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    ValidJson(write): ValidJson<PlanetariumDomeWrite>,
) -> ApiResult<(StatusCode, Json<PlanetariumDome>)> {
    let dome = state.catalog.create_dome(write).await?;
    Ok((StatusCode::CREATED, Json(dome)))
}

async fn get_dome(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<PlanetariumDome>> {
    Ok(Json(state.catalog.get_dome(id).await?))
}

async fn put_dome(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    ValidJson(write): ValidJson<PlanetariumDomeWrite>,
) -> ApiResult<Json<PlanetariumDome>> {
    let patch = PlanetariumDomePatch {
        name: Some(write.name),
        rows: Some(write.rows),
        seats_in_row: Some(write.seats_in_row),
    };
    Ok(Json(state.catalog.update_dome(id, patch).await?))
}

async fn patch_dome(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    ValidJson(patch): ValidJson<PlanetariumDomePatch>,
) -> ApiResult<Json<PlanetariumDome>> {
    Ok(Json(state.catalog.update_dome(id, patch).await?))
}

async fn delete_dome(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.catalog.delete_dome(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
