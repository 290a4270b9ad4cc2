use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use crate::error::ApiResult;
use crate::extract::ValidJson;
use crate::middleware::AuthUser;
use crate::models::ticket::{Ticket, TicketDetail, TicketSummary, TicketWrite};
use crate::pagination::{Page, PageParams};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ticket/", get(list_tickets).post(create_ticket))
        .route("/ticket/{id}/", get(get_ticket).delete(delete_ticket))
}

async fn list_tickets(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(page): Query<PageParams>,
) -> ApiResult<Json<Page<TicketSummary>>> {
    Ok(Json(state.ledger.list_tickets(user.scope(), page).await?))
}

async fn create_ticket(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ValidJson(write): ValidJson<TicketWrite>,
) -> ApiResult<(StatusCode, Json<Ticket>)> {
    // A reservation outside the caller's scope behaves as missing.
    state
        .ledger
        .get_reservation(write.reservation, user.scope())
        .await?;
    let ticket = state
        .allocator
        .reserve_seat(write.show_session, write.row, write.seat, write.reservation)
        .await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

async fn get_ticket(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<TicketDetail>> {
    Ok(Json(state.ledger.get_ticket(id, user.scope()).await?))
}

async fn delete_ticket(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.ledger.delete_ticket(id, user.scope()).await?;
    Ok(StatusCode::NO_CONTENT)
}
