use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use crate::error::ApiResult;
use crate::middleware::AuthUser;
use crate::models::reservation::ReservationDetail;
use crate::pagination::{Page, PageParams};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/reservation/",
            get(list_reservations).post(create_reservation),
        )
        .route(
            "/reservation/{id}/",
            get(get_reservation).delete(delete_reservation),
        )
}

async fn list_reservations(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(page): Query<PageParams>,
) -> ApiResult<Json<Page<ReservationDetail>>> {
    Ok(Json(state.ledger.list_reservations(user.scope(), page).await?))
}

/// Takes no body. An empty reservation is a valid cart: tickets hook into
/// it afterwards through the ticket endpoint.
async fn create_reservation(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> ApiResult<(StatusCode, Json<ReservationDetail>)> {
    let reservation = state.ledger.create_reservation(user.id).await?;
    let detail = ReservationDetail {
        id: reservation.id,
        created_at: reservation.created_at,
        user: user.email,
        tickets: Vec::new(),
    };
    Ok((StatusCode::CREATED, Json(detail)))
}

async fn get_reservation(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<ReservationDetail>> {
    Ok(Json(state.ledger.get_reservation(id, user.scope()).await?))
}

async fn delete_reservation(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.ledger.delete_reservation(id, user.scope()).await?;
    Ok(StatusCode::NO_CONTENT)
}
