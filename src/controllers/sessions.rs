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
use crate::models::session::{
    ShowSession, ShowSessionDetail, ShowSessionPatch, ShowSessionSummary, ShowSessionWrite,
};
use crate::pagination::{Page, PageParams};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/show_session/", get(list_sessions).post(create_session))
        .route(
            "/show_session/{id}/",
            get(get_session)
                .put(put_session)
                .patch(patch_session)
                .delete(delete_session),
        )
}

async fn list_sessions(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Query(page): Query<PageParams>,
) -> ApiResult<Json<Page<ShowSessionSummary>>> {
    Ok(Json(state.sessions.list_sessions(page).await?))
}

async fn create_session(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    ValidJson(write): ValidJson<ShowSessionWrite>,
) -> ApiResult<(StatusCode, Json<ShowSession>)> {
    let session = state.sessions.create_session(write).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

async fn get_session(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<ShowSessionDetail>> {
    Ok(Json(state.sessions.get_session(id).await?))
}

async fn put_session(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    ValidJson(write): ValidJson<ShowSessionWrite>,
) -> ApiResult<Json<ShowSession>> {
    let patch = ShowSessionPatch {
        astronomy_show: Some(write.astronomy_show),
        planetarium_dome: Some(write.planetarium_dome),
        show_time: Some(write.show_time),
    };
    Ok(Json(state.sessions.update_session(id, patch).await?))
}

async fn patch_session(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    ValidJson(patch): ValidJson<ShowSessionPatch>,
) -> ApiResult<Json<ShowSession>> {
    Ok(Json(state.sessions.update_session(id, patch).await?))
}

async fn delete_session(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.sessions.delete_session(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
