use std::sync::Arc;

use crate::error::{ApiError, ApiResult};
use crate::models::Ticket;
use crate::store::{ReservationLedger, SessionRegistry};

/// Books a seat against a show session. The allocator owns the bounds
/// check; seat uniqueness belongs to the ledger's atomic insert, so two
/// racing calls for the same seat resolve to one ticket and one
/// `SeatAlreadyTaken` without any check-then-act window here.
#[derive(Clone)]
pub struct SeatAllocator {
    registry: Arc<dyn SessionRegistry>,
    ledger: Arc<dyn ReservationLedger>,
}

impl SeatAllocator {
    pub fn new(registry: Arc<dyn SessionRegistry>, ledger: Arc<dyn ReservationLedger>) -> Self {
        Self { registry, ledger }
    }

    pub async fn reserve_seat(
        &self,
        show_session_id: i64,
        row: i32,
        seat: i32,
        reservation_id: i64,
    ) -> ApiResult<Ticket> {
        let (rows, seats_in_row) = self.registry.dome_bounds(show_session_id).await?;
        if row < 1 || row > rows || seat < 1 || seat > seats_in_row {
            return Err(ApiError::InvalidSeatCoordinate { rows, seats_in_row });
        }
        self.ledger
            .insert_ticket(show_session_id, row, seat, reservation_id)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::dome::PlanetariumDomeWrite;
    use crate::models::session::ShowSessionWrite;
    use crate::models::show::AstronomyShowWrite;
    use crate::pagination::PageParams;
    use crate::store::{CatalogStore, MemoryStore, OwnerScope, UserDirectory};

    async fn allocator_fixture() -> (SeatAllocator, Arc<MemoryStore>, i64, i64) {
        let store = Arc::new(MemoryStore::new());
        let user = store
            .create_user("owner@example.com".into(), "hash".into())
            .await
            .unwrap();
        let show = store
            .create_show(AstronomyShowWrite {
                title: "Journey to Mars".into(),
                description: "A trip across the solar system".into(),
                themes: vec![],
            })
            .await
            .unwrap();
        let dome = store
            .create_dome(PlanetariumDomeWrite {
                name: "Main dome".into(),
                rows: 10,
                seats_in_row: 15,
            })
            .await
            .unwrap();
        let session = store
            .create_session(ShowSessionWrite {
                astronomy_show: show.id,
                planetarium_dome: dome.id,
                show_time: "2024-01-01T10:00:00Z".parse().unwrap(),
            })
            .await
            .unwrap();
        let reservation = store.create_reservation(user.id).await.unwrap();
        let allocator = SeatAllocator::new(store.clone(), store.clone());
        (allocator, store, session.id, reservation.id)
    }

    #[tokio::test]
    async fn seat_within_bounds_is_booked() {
        let (allocator, _, session_id, reservation_id) = allocator_fixture().await;
        let ticket = allocator
            .reserve_seat(session_id, 5, 10, reservation_id)
            .await
            .unwrap();
        assert_eq!(ticket.row, 5);
        assert_eq!(ticket.seat, 10);
    }

    #[tokio::test]
    async fn out_of_bounds_seat_persists_nothing() {
        let (allocator, store, session_id, reservation_id) = allocator_fixture().await;
        for (row, seat) in [(11, 1), (0, 1), (1, 16), (1, 0)] {
            let err = allocator
                .reserve_seat(session_id, row, seat, reservation_id)
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                ApiError::InvalidSeatCoordinate {
                    rows: 10,
                    seats_in_row: 15
                }
            ));
        }
        let tickets = store
            .list_tickets(OwnerScope::Any, PageParams::default())
            .await
            .unwrap();
        assert_eq!(tickets.count, 0);
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let (allocator, _, _, reservation_id) = allocator_fixture().await;
        let err = allocator
            .reserve_seat(9999, 1, 1, reservation_id)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound("show session")));
    }
}
