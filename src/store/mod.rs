pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;

use crate::error::ApiResult;
use crate::models::dome::{PlanetariumDomePatch, PlanetariumDomeWrite};
use crate::models::reservation::ReservationDetail;
use crate::models::session::{
    ShowSessionDetail, ShowSessionPatch, ShowSessionSummary, ShowSessionWrite,
};
use crate::models::show::{AstronomyShowOut, AstronomyShowPatch, AstronomyShowWrite};
use crate::models::ticket::{TicketDetail, TicketSummary};
use crate::models::{PlanetariumDome, Reservation, ShowSession, ShowTheme, Ticket, User};
use crate::pagination::{Page, PageParams};

/// Row visibility for reservation and ticket reads: staff see everything,
/// everyone else only rows hanging off their own reservations. A row outside
/// the scope behaves as if it did not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerScope {
    Any,
    User(i64),
}

/// Reference data: themes, astronomy shows and their theme links, domes.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_themes(&self, page: PageParams) -> ApiResult<Page<ShowTheme>>;
    async fn create_theme(&self, name: String) -> ApiResult<ShowTheme>;
    async fn get_theme(&self, id: i64) -> ApiResult<ShowTheme>;
    async fn update_theme(&self, id: i64, name: Option<String>) -> ApiResult<ShowTheme>;
    async fn delete_theme(&self, id: i64) -> ApiResult<()>;

    async fn list_shows(&self, page: PageParams) -> ApiResult<Page<AstronomyShowOut>>;
    async fn create_show(&self, write: AstronomyShowWrite) -> ApiResult<AstronomyShowOut>;
    async fn get_show(&self, id: i64) -> ApiResult<AstronomyShowOut>;
    async fn update_show(&self, id: i64, patch: AstronomyShowPatch) -> ApiResult<AstronomyShowOut>;
    async fn delete_show(&self, id: i64) -> ApiResult<()>;
    /// Record the stored image path on a show. File IO happens elsewhere.
    async fn set_show_image(&self, id: i64, path: String) -> ApiResult<AstronomyShowOut>;
    /// Idempotent: linking an already-linked theme is a no-op.
    async fn attach_theme(&self, show_id: i64, theme_id: i64) -> ApiResult<()>;
    async fn detach_theme(&self, show_id: i64, theme_id: i64) -> ApiResult<()>;

    async fn list_domes(&self, page: PageParams) -> ApiResult<Page<PlanetariumDome>>;
    async fn create_dome(&self, write: PlanetariumDomeWrite) -> ApiResult<PlanetariumDome>;
    async fn get_dome(&self, id: i64) -> ApiResult<PlanetariumDome>;
    async fn update_dome(&self, id: i64, patch: PlanetariumDomePatch) -> ApiResult<PlanetariumDome>;
    async fn delete_dome(&self, id: i64) -> ApiResult<()>;
}

/// Scheduled show sessions binding a show to a dome at a time.
#[async_trait]
pub trait SessionRegistry: Send + Sync {
    async fn list_sessions(&self, page: PageParams) -> ApiResult<Page<ShowSessionSummary>>;
    async fn create_session(&self, write: ShowSessionWrite) -> ApiResult<ShowSession>;
    async fn get_session(&self, id: i64) -> ApiResult<ShowSessionDetail>;
    async fn update_session(&self, id: i64, patch: ShowSessionPatch) -> ApiResult<ShowSession>;
    /// Cascades to the session's tickets.
    async fn delete_session(&self, id: i64) -> ApiResult<()>;
    /// `(rows, seats_in_row)` of the session's dome, for seat bounds checks.
    async fn dome_bounds(&self, session_id: i64) -> ApiResult<(i32, i32)>;
}

/// Reservations and the tickets grouped under them.
#[async_trait]
pub trait ReservationLedger: Send + Sync {
    async fn create_reservation(&self, user_id: i64) -> ApiResult<Reservation>;
    async fn list_reservations(
        &self,
        scope: OwnerScope,
        page: PageParams,
    ) -> ApiResult<Page<ReservationDetail>>;
    async fn get_reservation(&self, id: i64, scope: OwnerScope) -> ApiResult<ReservationDetail>;
    /// Cascades to the reservation's tickets, releasing their seats.
    async fn delete_reservation(&self, id: i64, scope: OwnerScope) -> ApiResult<()>;

    /// The single atomic write of the booking path. The backend must make
    /// the existence check and the insert one indivisible step: a duplicate
    /// (session, row, seat) comes back as `SeatAlreadyTaken`, a missing
    /// session or reservation as `NotFound`, and a failed call persists
    /// nothing.
    async fn insert_ticket(
        &self,
        show_session_id: i64,
        row: i32,
        seat: i32,
        reservation_id: i64,
    ) -> ApiResult<Ticket>;
    async fn list_tickets(
        &self,
        scope: OwnerScope,
        page: PageParams,
    ) -> ApiResult<Page<TicketSummary>>;
    async fn get_ticket(&self, id: i64, scope: OwnerScope) -> ApiResult<TicketDetail>;
    async fn delete_ticket(&self, id: i64, scope: OwnerScope) -> ApiResult<()>;
}

/// User accounts looked up by the auth extractor and the user endpoints.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Duplicate email surfaces as a validation failure.
    async fn create_user(&self, email: String, password_hash: String) -> ApiResult<User>;
    async fn find_user_by_email(&self, email: &str) -> ApiResult<Option<User>>;
    async fn get_user(&self, id: i64) -> ApiResult<Option<User>>;
    async fn update_user(
        &self,
        id: i64,
        email: Option<String>,
        password_hash: Option<String>,
    ) -> ApiResult<User>;
    async fn touch_last_login(&self, id: i64) -> ApiResult<()>;
}
