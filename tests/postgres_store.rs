//! Exercises the Postgres backend against a live database. Ignored by
//! default; point DATABASE_URL at a throwaway database and run
//! `cargo test --test postgres_store -- --ignored`.

use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use planetarium_api::error::ApiError;
use planetarium_api::models::dome::PlanetariumDomeWrite;
use planetarium_api::models::session::ShowSessionWrite;
use planetarium_api::models::show::AstronomyShowWrite;
use planetarium_api::store::{
    CatalogStore, OwnerScope, PgStore, ReservationLedger, SessionRegistry, UserDirectory,
};

async fn pg_store() -> PgStore {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must point at a test database");
    let pool = PgPoolOptions::new()
        .max_connections(4)
        .connect(&url)
        .await
        .expect("failed to connect to the test database");
    sqlx::migrate!("./src/migrations")
        .run(&pool)
        .await
        .expect("failed to run migrations");
    PgStore::new(pool)
}

// Unique per run so reruns do not trip the email constraint.
fn fresh_email() -> String {
    format!("{}@example.com", Uuid::new_v4())
}

async fn seeded_session(store: &PgStore) -> (i64, i64) {
    let user = store.create_user(fresh_email(), "hash".into()).await.unwrap();
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
    (session.id, reservation.id)
}

#[tokio::test]
#[ignore = "needs a live Postgres, see the module docs"]
async fn seat_uniqueness_is_enforced_by_the_database() {
    let store = pg_store().await;
    let (session_id, reservation_id) = seeded_session(&store).await;

    store
        .insert_ticket(session_id, 5, 10, reservation_id)
        .await
        .unwrap();
    let err = store
        .insert_ticket(session_id, 5, 10, reservation_id)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::SeatAlreadyTaken));

    // A different seat in the same session is untouched by the conflict.
    store
        .insert_ticket(session_id, 5, 11, reservation_id)
        .await
        .unwrap();
}

#[tokio::test]
#[ignore = "needs a live Postgres, see the module docs"]
async fn missing_references_surface_as_not_found() {
    let store = pg_store().await;
    let (session_id, reservation_id) = seeded_session(&store).await;

    let err = store
        .insert_ticket(-1, 1, 1, reservation_id)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound("show session")));

    let err = store.insert_ticket(session_id, 1, 1, -1).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound("reservation")));
}

#[tokio::test]
#[ignore = "needs a live Postgres, see the module docs"]
async fn session_delete_cascades_to_tickets() {
    let store = pg_store().await;
    let (session_id, reservation_id) = seeded_session(&store).await;

    let ticket = store
        .insert_ticket(session_id, 1, 1, reservation_id)
        .await
        .unwrap();
    store.delete_session(session_id).await.unwrap();

    let err = store.get_ticket(ticket.id, OwnerScope::Any).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound("ticket")));
}

#[tokio::test]
#[ignore = "needs a live Postgres, see the module docs"]
async fn show_updates_reconcile_theme_links() {
    let store = pg_store().await;
    let first = store.create_theme(format!("Theme {}", Uuid::new_v4())).await.unwrap();
    let second = store.create_theme(format!("Theme {}", Uuid::new_v4())).await.unwrap();

    let show = store
        .create_show(AstronomyShowWrite {
            title: "Nebula".into(),
            description: "Clouds of gas and dust".into(),
            themes: vec![first.id],
        })
        .await
        .unwrap();
    assert_eq!(show.themes.len(), 1);

    let updated = store
        .update_show(
            show.id,
            planetarium_api::models::show::AstronomyShowPatch {
                title: None,
                description: None,
                themes: Some(vec![second.id]),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.themes.len(), 1);
    assert_eq!(updated.themes[0].id, second.id);
}
