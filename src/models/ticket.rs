use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::reservation::{ReservationDetail, ReservationShort};
use super::session::ShowSessionSummary;

// Serialized as the write-shape echo, so the foreign keys keep their
// wire names (`show_session`, `reservation`) as raw ids.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Ticket {
    pub id: i64,
    pub row: i32,
    pub seat: i32,
    #[serde(rename = "show_session")]
    pub show_session_id: i64,
    #[serde(rename = "reservation")]
    pub reservation_id: i64,
}

/// List projection: nested short session and short reservation.
#[derive(Debug, Clone, Serialize)]
pub struct TicketSummary {
    pub id: i64,
    pub row: i32,
    pub seat: i32,
    pub show_session: ShowSessionSummary,
    pub reservation: ReservationShort,
}

/// Retrieve projection: the reservation comes back in full, including its
/// other tickets.
#[derive(Debug, Serialize)]
pub struct TicketDetail {
    pub id: i64,
    pub row: i32,
    pub seat: i32,
    pub show_session: ShowSessionSummary,
    pub reservation: ReservationDetail,
}

// No range rules here: seat coordinates are judged against the dome grid by
// the allocator, so 0 or 11 both come back as invalid_seat_coordinate
// rather than a generic validation failure.
#[derive(Debug, Deserialize, Validate)]
pub struct TicketWrite {
    pub row: i32,
    pub seat: i32,
    pub show_session: i64,
    pub reservation: i64,
}
