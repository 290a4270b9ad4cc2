//! Booking semantics over the in-memory backend: seat uniqueness under
//! contention, cascades, and owner scoping.

use std::sync::Arc;

use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use tokio::sync::Barrier;

use planetarium_api::allocator::SeatAllocator;
use planetarium_api::error::ApiError;
use planetarium_api::models::dome::PlanetariumDomeWrite;
use planetarium_api::models::session::ShowSessionWrite;
use planetarium_api::models::show::AstronomyShowWrite;
use planetarium_api::pagination::PageParams;
use planetarium_api::store::{
    CatalogStore, MemoryStore, OwnerScope, ReservationLedger, SessionRegistry, UserDirectory,
};

struct Booking {
    store: Arc<MemoryStore>,
    allocator: SeatAllocator,
    user_id: i64,
    session_id: i64,
    reservation_id: i64,
}

async fn booking_fixture(rows: i32, seats_in_row: i32) -> Booking {
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
            rows,
            seats_in_row,
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
    Booking {
        store,
        allocator,
        user_id: user.id,
        session_id: session.id,
        reservation_id: reservation.id,
    }
}

#[tokio::test]
async fn racing_bookings_for_one_seat_produce_one_ticket() {
    let fixture = booking_fixture(10, 15).await;
    let contenders = 8;
    let barrier = Arc::new(Barrier::new(contenders));

    let mut handles = Vec::with_capacity(contenders);
    for _ in 0..contenders {
        let allocator = fixture.allocator.clone();
        let barrier = barrier.clone();
        let (session_id, reservation_id) = (fixture.session_id, fixture.reservation_id);
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            allocator.reserve_seat(session_id, 5, 10, reservation_id).await
        }));
    }

    let mut won = 0;
    let mut lost = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(ticket) => {
                won += 1;
                assert_eq!((ticket.row, ticket.seat), (5, 10));
            }
            Err(ApiError::SeatAlreadyTaken) => lost += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(won, 1);
    assert_eq!(lost, contenders - 1);
    let tickets = fixture
        .store
        .list_tickets(OwnerScope::Any, PageParams::default())
        .await
        .unwrap();
    assert_eq!(tickets.count, 1);
}

#[tokio::test]
async fn deleting_a_reservation_releases_its_seats() {
    let fixture = booking_fixture(10, 15).await;
    fixture
        .allocator
        .reserve_seat(fixture.session_id, 1, 1, fixture.reservation_id)
        .await
        .unwrap();

    let second = fixture.store.create_reservation(fixture.user_id).await.unwrap();
    let err = fixture
        .allocator
        .reserve_seat(fixture.session_id, 1, 1, second.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::SeatAlreadyTaken));

    fixture
        .store
        .delete_reservation(fixture.reservation_id, OwnerScope::Any)
        .await
        .unwrap();

    // The seat is free again for the surviving reservation.
    let ticket = fixture
        .allocator
        .reserve_seat(fixture.session_id, 1, 1, second.id)
        .await
        .unwrap();
    assert_eq!(ticket.reservation_id, second.id);
}

#[tokio::test]
async fn deleting_a_ticket_releases_only_that_seat() {
    let fixture = booking_fixture(10, 15).await;
    let first = fixture
        .allocator
        .reserve_seat(fixture.session_id, 2, 3, fixture.reservation_id)
        .await
        .unwrap();
    fixture
        .allocator
        .reserve_seat(fixture.session_id, 2, 4, fixture.reservation_id)
        .await
        .unwrap();

    fixture
        .store
        .delete_ticket(first.id, OwnerScope::Any)
        .await
        .unwrap();

    // (2, 3) opens up, (2, 4) stays taken.
    fixture
        .allocator
        .reserve_seat(fixture.session_id, 2, 3, fixture.reservation_id)
        .await
        .unwrap();
    let err = fixture
        .allocator
        .reserve_seat(fixture.session_id, 2, 4, fixture.reservation_id)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::SeatAlreadyTaken));
}

#[tokio::test]
async fn owner_scope_hides_other_users_rows() {
    let fixture = booking_fixture(10, 15).await;
    let other_user = fixture
        .store
        .create_user("other@example.com".into(), "hash".into())
        .await
        .unwrap();
    let other_reservation = fixture.store.create_reservation(other_user.id).await.unwrap();

    fixture
        .allocator
        .reserve_seat(fixture.session_id, 1, 1, fixture.reservation_id)
        .await
        .unwrap();
    let other_ticket = fixture
        .allocator
        .reserve_seat(fixture.session_id, 1, 2, other_reservation.id)
        .await
        .unwrap();

    let mine = fixture
        .store
        .list_reservations(OwnerScope::User(fixture.user_id), PageParams::default())
        .await
        .unwrap();
    assert_eq!(mine.count, 1);
    assert_eq!(mine.results[0].user, "owner@example.com");

    let everyone = fixture
        .store
        .list_reservations(OwnerScope::Any, PageParams::default())
        .await
        .unwrap();
    assert_eq!(everyone.count, 2);

    // Foreign rows behave as missing, for reads and deletes alike.
    let err = fixture
        .store
        .get_reservation(other_reservation.id, OwnerScope::User(fixture.user_id))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound("reservation")));
    let err = fixture
        .store
        .delete_ticket(other_ticket.id, OwnerScope::User(fixture.user_id))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound("ticket")));
    let still_there = fixture
        .store
        .get_ticket(other_ticket.id, OwnerScope::Any)
        .await
        .unwrap();
    assert_eq!(still_there.id, other_ticket.id);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    // Any coordinate outside the dome grid is rejected with the dome's
    // bounds; anything inside books on a fresh session.
    #[test]
    fn bounds_gate_matches_dome_geometry(row in -3i32..20, seat in -3i32..25) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let outcome: Result<(), TestCaseError> = rt.block_on(async move {
            let fixture = booking_fixture(10, 15).await;
            let result = fixture
                .allocator
                .reserve_seat(fixture.session_id, row, seat, fixture.reservation_id)
                .await;
            let in_bounds = (1..=10).contains(&row) && (1..=15).contains(&seat);
            if in_bounds {
                prop_assert!(result.is_ok());
            } else {
                prop_assert!(
                    matches!(
                        result,
                        Err(ApiError::InvalidSeatCoordinate { rows: 10, seats_in_row: 15 })
                    ),
                    "expected InvalidSeatCoordinate {{ rows: 10, seats_in_row: 15 }}"
                );
            }
            Ok(())
        });
        outcome?;
    }
}
