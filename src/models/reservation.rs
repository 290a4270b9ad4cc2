use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use super::ticket::TicketSummary;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Reservation {
    pub id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Short nested form used inside ticket projections; `user` is the owner's
/// email, not an id.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReservationShort {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub user: String,
}

/// Full projection with nested tickets, shared by list and retrieve.
#[derive(Debug, Serialize)]
pub struct ReservationDetail {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub user: String,
    pub tickets: Vec<TicketSummary>,
}

// Reservation creation takes no fields: the owner comes from the bearer
// token and created_at is server-assigned.
