use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use crate::error::{ApiError, ApiResult};
use crate::models::dome::{PlanetariumDomePatch, PlanetariumDomeWrite};
use crate::models::reservation::{ReservationDetail, ReservationShort};
use crate::models::session::{
    ShowSessionDetail, ShowSessionPatch, ShowSessionSummary, ShowSessionWrite,
};
use crate::models::show::{AstronomyShowOut, AstronomyShowPatch, AstronomyShowWrite};
use crate::models::ticket::{TicketDetail, TicketSummary};
use crate::models::{
    AstronomyShow, PlanetariumDome, Reservation, ShowSession, ShowTheme, Ticket, User,
};
use crate::pagination::{Page, PageParams};

use super::{CatalogStore, OwnerScope, ReservationLedger, SessionRegistry, UserDirectory};

/// In-memory backend for tests and local development. All tables live
/// behind a single mutex, which makes `insert_ticket`'s check-and-insert
/// atomic by construction; the semantics otherwise mirror `PgStore`,
/// including the cascade deletes the schema declares.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grants staff rights to an existing user. There is no route for
    /// this; the first admin of a deployment is minted out of band.
    pub fn promote_to_staff(&self, user_id: i64) -> ApiResult<()> {
        let mut inner = self.lock();
        let user = inner
            .users
            .get_mut(&user_id)
            .ok_or(ApiError::NotFound("user"))?;
        user.is_staff = true;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("store mutex poisoned")
    }
}

#[derive(Default)]
struct Inner {
    next_id: i64,
    themes: BTreeMap<i64, ShowTheme>,
    shows: BTreeMap<i64, AstronomyShow>,
    // (show_id, theme_id) pairs; the set is what makes attach idempotent
    show_theme_links: BTreeSet<(i64, i64)>,
    domes: BTreeMap<i64, PlanetariumDome>,
    sessions: BTreeMap<i64, ShowSession>,
    reservations: BTreeMap<i64, Reservation>,
    tickets: BTreeMap<i64, Ticket>,
    users: BTreeMap<i64, User>,
}

fn paginate<T>(items: Vec<T>, page: &PageParams) -> Page<T> {
    let count = items.len() as i64;
    let results = items
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .collect();
    Page::from_params(count, page, results)
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn show_themes(&self, show_id: i64) -> Vec<ShowTheme> {
        self.show_theme_links
            .range((show_id, i64::MIN)..=(show_id, i64::MAX))
            .filter_map(|&(_, theme_id)| self.themes.get(&theme_id).cloned())
            .collect()
    }

    fn show_out(&self, show: &AstronomyShow) -> AstronomyShowOut {
        AstronomyShowOut::from_parts(show.clone(), self.show_themes(show.id))
    }

    fn session_summary(&self, session: &ShowSession) -> ApiResult<ShowSessionSummary> {
        let show = self
            .shows
            .get(&session.astronomy_show_id)
            .ok_or(ApiError::Internal)?;
        let dome = self
            .domes
            .get(&session.planetarium_dome_id)
            .ok_or(ApiError::Internal)?;
        Ok(ShowSessionSummary {
            id: session.id,
            astronomy_show: show.title.clone(),
            planetarium_dome: dome.name.clone(),
            show_time: session.show_time,
        })
    }

    fn reservation_short(&self, reservation: &Reservation) -> ApiResult<ReservationShort> {
        let user = self
            .users
            .get(&reservation.user_id)
            .ok_or(ApiError::Internal)?;
        Ok(ReservationShort {
            id: reservation.id,
            created_at: reservation.created_at,
            user: user.email.clone(),
        })
    }

    fn ticket_summary(&self, ticket: &Ticket) -> ApiResult<TicketSummary> {
        let session = self
            .sessions
            .get(&ticket.show_session_id)
            .ok_or(ApiError::Internal)?;
        let reservation = self
            .reservations
            .get(&ticket.reservation_id)
            .ok_or(ApiError::Internal)?;
        Ok(TicketSummary {
            id: ticket.id,
            row: ticket.row,
            seat: ticket.seat,
            show_session: self.session_summary(session)?,
            reservation: self.reservation_short(reservation)?,
        })
    }

    fn reservation_detail(&self, reservation: &Reservation) -> ApiResult<ReservationDetail> {
        let short = self.reservation_short(reservation)?;
        let tickets = self
            .tickets
            .values()
            .filter(|t| t.reservation_id == reservation.id)
            .map(|t| self.ticket_summary(t))
            .collect::<ApiResult<Vec<_>>>()?;
        Ok(ReservationDetail {
            id: short.id,
            created_at: short.created_at,
            user: short.user,
            tickets,
        })
    }

    fn link_themes(&mut self, show_id: i64, theme_ids: &[i64]) -> ApiResult<()> {
        for &theme_id in theme_ids {
            if !self.themes.contains_key(&theme_id) {
                return Err(ApiError::validation(format!("unknown theme id {theme_id}")));
            }
            self.show_theme_links.insert((show_id, theme_id));
        }
        Ok(())
    }

    fn remove_session(&mut self, session_id: i64) {
        self.tickets.retain(|_, t| t.show_session_id != session_id);
        self.sessions.remove(&session_id);
    }

    fn remove_show(&mut self, show_id: i64) {
        let session_ids: Vec<i64> = self
            .sessions
            .values()
            .filter(|s| s.astronomy_show_id == show_id)
            .map(|s| s.id)
            .collect();
        for id in session_ids {
            self.remove_session(id);
        }
        self.show_theme_links.retain(|&(sid, _)| sid != show_id);
        self.shows.remove(&show_id);
    }

    fn remove_dome(&mut self, dome_id: i64) {
        let session_ids: Vec<i64> = self
            .sessions
            .values()
            .filter(|s| s.planetarium_dome_id == dome_id)
            .map(|s| s.id)
            .collect();
        for id in session_ids {
            self.remove_session(id);
        }
        self.domes.remove(&dome_id);
    }

    fn owns_reservation(&self, reservation: &Reservation, scope: OwnerScope) -> bool {
        match scope {
            OwnerScope::Any => true,
            OwnerScope::User(user_id) => reservation.user_id == user_id,
        }
    }

    fn owns_ticket(&self, ticket: &Ticket, scope: OwnerScope) -> bool {
        match self.reservations.get(&ticket.reservation_id) {
            Some(reservation) => self.owns_reservation(reservation, scope),
            None => false,
        }
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_themes(&self, page: PageParams) -> ApiResult<Page<ShowTheme>> {
        let inner = self.lock();
        Ok(paginate(inner.themes.values().cloned().collect(), &page))
    }

    async fn create_theme(&self, name: String) -> ApiResult<ShowTheme> {
        let mut inner = self.lock();
        let id = inner.next_id();
        let theme = ShowTheme { id, name };
        inner.themes.insert(id, theme.clone());
        Ok(theme)
    }

    async fn get_theme(&self, id: i64) -> ApiResult<ShowTheme> {
        self.lock()
            .themes
            .get(&id)
            .cloned()
            .ok_or(ApiError::NotFound("show theme"))
    }

    async fn update_theme(&self, id: i64, name: Option<String>) -> ApiResult<ShowTheme> {
        let mut inner = self.lock();
        let theme = inner
            .themes
            .get_mut(&id)
            .ok_or(ApiError::NotFound("show theme"))?;
        if let Some(name) = name {
            theme.name = name;
        }
        Ok(theme.clone())
    }

    async fn delete_theme(&self, id: i64) -> ApiResult<()> {
        let mut inner = self.lock();
        if inner.themes.remove(&id).is_none() {
            return Err(ApiError::NotFound("show theme"));
        }
        inner.show_theme_links.retain(|&(_, tid)| tid != id);
        Ok(())
    }

    async fn list_shows(&self, page: PageParams) -> ApiResult<Page<AstronomyShowOut>> {
        let inner = self.lock();
        let shows = inner
            .shows
            .values()
            .map(|show| inner.show_out(show))
            .collect();
        Ok(paginate(shows, &page))
    }

    async fn create_show(&self, write: AstronomyShowWrite) -> ApiResult<AstronomyShowOut> {
        let mut inner = self.lock();
        // Validate links first so a bad theme id leaves nothing behind.
        for &theme_id in &write.themes {
            if !inner.themes.contains_key(&theme_id) {
                return Err(ApiError::validation(format!("unknown theme id {theme_id}")));
            }
        }
        let id = inner.next_id();
        let show = AstronomyShow {
            id,
            title: write.title,
            description: write.description,
            image: None,
        };
        inner.shows.insert(id, show.clone());
        inner.link_themes(id, &write.themes)?;
        Ok(inner.show_out(&show))
    }

    async fn get_show(&self, id: i64) -> ApiResult<AstronomyShowOut> {
        let inner = self.lock();
        let show = inner
            .shows
            .get(&id)
            .ok_or(ApiError::NotFound("astronomy show"))?;
        Ok(inner.show_out(show))
    }

    async fn update_show(&self, id: i64, patch: AstronomyShowPatch) -> ApiResult<AstronomyShowOut> {
        let mut inner = self.lock();
        if !inner.shows.contains_key(&id) {
            return Err(ApiError::NotFound("astronomy show"));
        }
        if let Some(theme_ids) = &patch.themes {
            for &theme_id in theme_ids {
                if !inner.themes.contains_key(&theme_id) {
                    return Err(ApiError::validation(format!("unknown theme id {theme_id}")));
                }
            }
            inner
                .show_theme_links
                .retain(|&(sid, tid)| sid != id || theme_ids.contains(&tid));
            inner.link_themes(id, theme_ids)?;
        }
        let show = inner.shows.get_mut(&id).ok_or(ApiError::Internal)?;
        if let Some(title) = patch.title {
            show.title = title;
        }
        if let Some(description) = patch.description {
            show.description = description;
        }
        let show = show.clone();
        Ok(inner.show_out(&show))
    }

    async fn delete_show(&self, id: i64) -> ApiResult<()> {
        let mut inner = self.lock();
        if !inner.shows.contains_key(&id) {
            return Err(ApiError::NotFound("astronomy show"));
        }
        inner.remove_show(id);
        Ok(())
    }

    async fn set_show_image(&self, id: i64, path: String) -> ApiResult<AstronomyShowOut> {
        let mut inner = self.lock();
        let show = inner
            .shows
            .get_mut(&id)
            .ok_or(ApiError::NotFound("astronomy show"))?;
        show.image = Some(path);
        let show = show.clone();
        Ok(inner.show_out(&show))
    }

    async fn attach_theme(&self, show_id: i64, theme_id: i64) -> ApiResult<()> {
        let mut inner = self.lock();
        if !inner.shows.contains_key(&show_id) {
            return Err(ApiError::NotFound("astronomy show"));
        }
        if !inner.themes.contains_key(&theme_id) {
            return Err(ApiError::validation(format!("unknown theme id {theme_id}")));
        }
        inner.show_theme_links.insert((show_id, theme_id));
        Ok(())
    }

    async fn detach_theme(&self, show_id: i64, theme_id: i64) -> ApiResult<()> {
        self.lock().show_theme_links.remove(&(show_id, theme_id));
        Ok(())
    }

    async fn list_domes(&self, page: PageParams) -> ApiResult<Page<PlanetariumDome>> {
        let inner = self.lock();
        Ok(paginate(inner.domes.values().cloned().collect(), &page))
    }

    async fn create_dome(&self, write: PlanetariumDomeWrite) -> ApiResult<PlanetariumDome> {
        let mut inner = self.lock();
        let id = inner.next_id();
        let dome = PlanetariumDome {
            id,
            name: write.name,
            rows: write.rows,
            seats_in_row: write.seats_in_row,
        };
        inner.domes.insert(id, dome.clone());
        Ok(dome)
    }

    async fn get_dome(&self, id: i64) -> ApiResult<PlanetariumDome> {
        self.lock()
            .domes
            .get(&id)
            .cloned()
            .ok_or(ApiError::NotFound("planetarium dome"))
    }

    async fn update_dome(
        &self,
        id: i64,
        patch: PlanetariumDomePatch,
    ) -> ApiResult<PlanetariumDome> {
        let mut inner = self.lock();
        let dome = inner
            .domes
            .get_mut(&id)
            .ok_or(ApiError::NotFound("planetarium dome"))?;
        if let Some(name) = patch.name {
            dome.name = name;
        }
        if let Some(rows) = patch.rows {
            dome.rows = rows;
        }
        if let Some(seats_in_row) = patch.seats_in_row {
            dome.seats_in_row = seats_in_row;
        }
        Ok(dome.clone())
    }

    async fn delete_dome(&self, id: i64) -> ApiResult<()> {
        let mut inner = self.lock();
        if !inner.domes.contains_key(&id) {
            return Err(ApiError::NotFound("planetarium dome"));
        }
        inner.remove_dome(id);
        Ok(())
    }
}

#[async_trait]
impl SessionRegistry for MemoryStore {
    async fn list_sessions(&self, page: PageParams) -> ApiResult<Page<ShowSessionSummary>> {
        let inner = self.lock();
        let mut sessions: Vec<&ShowSession> = inner.sessions.values().collect();
        sessions.sort_by_key(|s| (s.show_time, s.id));
        let summaries = sessions
            .into_iter()
            .map(|s| inner.session_summary(s))
            .collect::<ApiResult<Vec<_>>>()?;
        Ok(paginate(summaries, &page))
    }

    async fn create_session(&self, write: ShowSessionWrite) -> ApiResult<ShowSession> {
        let mut inner = self.lock();
        if !inner.shows.contains_key(&write.astronomy_show) {
            return Err(ApiError::NotFound("astronomy show"));
        }
        if !inner.domes.contains_key(&write.planetarium_dome) {
            return Err(ApiError::NotFound("planetarium dome"));
        }
        let id = inner.next_id();
        let session = ShowSession {
            id,
            astronomy_show_id: write.astronomy_show,
            planetarium_dome_id: write.planetarium_dome,
            show_time: write.show_time,
        };
        inner.sessions.insert(id, session.clone());
        Ok(session)
    }

    async fn get_session(&self, id: i64) -> ApiResult<ShowSessionDetail> {
        let inner = self.lock();
        let session = inner
            .sessions
            .get(&id)
            .ok_or(ApiError::NotFound("show session"))?;
        let show = inner
            .shows
            .get(&session.astronomy_show_id)
            .ok_or(ApiError::Internal)?;
        let dome = inner
            .domes
            .get(&session.planetarium_dome_id)
            .ok_or(ApiError::Internal)?;
        Ok(ShowSessionDetail {
            id: session.id,
            astronomy_show: inner.show_out(show),
            planetarium_dome: dome.clone(),
            show_time: session.show_time,
        })
    }

    async fn update_session(&self, id: i64, patch: ShowSessionPatch) -> ApiResult<ShowSession> {
        let mut inner = self.lock();
        if !inner.sessions.contains_key(&id) {
            return Err(ApiError::NotFound("show session"));
        }
        if let Some(show_id) = patch.astronomy_show {
            if !inner.shows.contains_key(&show_id) {
                return Err(ApiError::NotFound("astronomy show"));
            }
        }
        if let Some(dome_id) = patch.planetarium_dome {
            if !inner.domes.contains_key(&dome_id) {
                return Err(ApiError::NotFound("planetarium dome"));
            }
        }
        let session = inner.sessions.get_mut(&id).ok_or(ApiError::Internal)?;
        if let Some(show_id) = patch.astronomy_show {
            session.astronomy_show_id = show_id;
        }
        if let Some(dome_id) = patch.planetarium_dome {
            session.planetarium_dome_id = dome_id;
        }
        if let Some(show_time) = patch.show_time {
            session.show_time = show_time;
        }
        Ok(session.clone())
    }

    async fn delete_session(&self, id: i64) -> ApiResult<()> {
        let mut inner = self.lock();
        if !inner.sessions.contains_key(&id) {
            return Err(ApiError::NotFound("show session"));
        }
        inner.remove_session(id);
        Ok(())
    }

    async fn dome_bounds(&self, session_id: i64) -> ApiResult<(i32, i32)> {
        let inner = self.lock();
        let session = inner
            .sessions
            .get(&session_id)
            .ok_or(ApiError::NotFound("show session"))?;
        let dome = inner
            .domes
            .get(&session.planetarium_dome_id)
            .ok_or(ApiError::Internal)?;
        Ok((dome.rows, dome.seats_in_row))
    }
}

#[async_trait]
impl ReservationLedger for MemoryStore {
    async fn create_reservation(&self, user_id: i64) -> ApiResult<Reservation> {
        let mut inner = self.lock();
        if !inner.users.contains_key(&user_id) {
            return Err(ApiError::NotFound("user"));
        }
        let id = inner.next_id();
        let reservation = Reservation {
            id,
            user_id,
            created_at: Utc::now(),
        };
        inner.reservations.insert(id, reservation.clone());
        Ok(reservation)
    }

    async fn list_reservations(
        &self,
        scope: OwnerScope,
        page: PageParams,
    ) -> ApiResult<Page<ReservationDetail>> {
        let inner = self.lock();
        let details = inner
            .reservations
            .values()
            .filter(|r| inner.owns_reservation(r, scope))
            .map(|r| inner.reservation_detail(r))
            .collect::<ApiResult<Vec<_>>>()?;
        Ok(paginate(details, &page))
    }

    async fn get_reservation(&self, id: i64, scope: OwnerScope) -> ApiResult<ReservationDetail> {
        let inner = self.lock();
        let reservation = inner
            .reservations
            .get(&id)
            .filter(|r| inner.owns_reservation(r, scope))
            .ok_or(ApiError::NotFound("reservation"))?;
        inner.reservation_detail(reservation)
    }

    async fn delete_reservation(&self, id: i64, scope: OwnerScope) -> ApiResult<()> {
        let mut inner = self.lock();
        let owned = inner
            .reservations
            .get(&id)
            .is_some_and(|r| inner.owns_reservation(r, scope));
        if !owned {
            return Err(ApiError::NotFound("reservation"));
        }
        inner.tickets.retain(|_, t| t.reservation_id != id);
        inner.reservations.remove(&id);
        Ok(())
    }

    async fn insert_ticket(
        &self,
        show_session_id: i64,
        row: i32,
        seat: i32,
        reservation_id: i64,
    ) -> ApiResult<Ticket> {
        // Everything below happens under one lock, so the uniqueness check
        // and the insert cannot interleave with a concurrent caller.
        let mut inner = self.lock();
        let taken = inner
            .tickets
            .values()
            .any(|t| t.show_session_id == show_session_id && t.row == row && t.seat == seat);
        if taken {
            return Err(ApiError::SeatAlreadyTaken);
        }
        if !inner.sessions.contains_key(&show_session_id) {
            return Err(ApiError::NotFound("show session"));
        }
        if !inner.reservations.contains_key(&reservation_id) {
            return Err(ApiError::NotFound("reservation"));
        }
        let id = inner.next_id();
        let ticket = Ticket {
            id,
            row,
            seat,
            show_session_id,
            reservation_id,
        };
        inner.tickets.insert(id, ticket.clone());
        Ok(ticket)
    }

    async fn list_tickets(
        &self,
        scope: OwnerScope,
        page: PageParams,
    ) -> ApiResult<Page<TicketSummary>> {
        let inner = self.lock();
        let summaries = inner
            .tickets
            .values()
            .filter(|t| inner.owns_ticket(t, scope))
            .map(|t| inner.ticket_summary(t))
            .collect::<ApiResult<Vec<_>>>()?;
        Ok(paginate(summaries, &page))
    }

    async fn get_ticket(&self, id: i64, scope: OwnerScope) -> ApiResult<TicketDetail> {
        let inner = self.lock();
        let ticket = inner
            .tickets
            .get(&id)
            .filter(|t| inner.owns_ticket(t, scope))
            .ok_or(ApiError::NotFound("ticket"))?;
        let summary = inner.ticket_summary(ticket)?;
        let reservation = inner
            .reservations
            .get(&ticket.reservation_id)
            .ok_or(ApiError::Internal)?;
        Ok(TicketDetail {
            id: summary.id,
            row: summary.row,
            seat: summary.seat,
            show_session: summary.show_session,
            reservation: inner.reservation_detail(reservation)?,
        })
    }

    async fn delete_ticket(&self, id: i64, scope: OwnerScope) -> ApiResult<()> {
        let mut inner = self.lock();
        let owned = inner
            .tickets
            .get(&id)
            .is_some_and(|t| inner.owns_ticket(t, scope));
        if !owned {
            return Err(ApiError::NotFound("ticket"));
        }
        inner.tickets.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn create_user(&self, email: String, password_hash: String) -> ApiResult<User> {
        let mut inner = self.lock();
        if inner.users.values().any(|u| u.email == email) {
            return Err(ApiError::validation("a user with this email already exists"));
        }
        let id = inner.next_id();
        let user = User {
            id,
            email,
            password_hash,
            is_staff: false,
            is_active: true,
            registered_at: Utc::now(),
            last_logged_in: None,
        };
        inner.users.insert(id, user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> ApiResult<Option<User>> {
        Ok(self.lock().users.values().find(|u| u.email == email).cloned())
    }

    async fn get_user(&self, id: i64) -> ApiResult<Option<User>> {
        Ok(self.lock().users.get(&id).cloned())
    }

    async fn update_user(
        &self,
        id: i64,
        email: Option<String>,
        password_hash: Option<String>,
    ) -> ApiResult<User> {
        let mut inner = self.lock();
        if let Some(ref email) = email {
            if inner.users.values().any(|u| u.id != id && &u.email == email) {
                return Err(ApiError::validation("a user with this email already exists"));
            }
        }
        let user = inner.users.get_mut(&id).ok_or(ApiError::NotFound("user"))?;
        if let Some(email) = email {
            user.email = email;
        }
        if let Some(password_hash) = password_hash {
            user.password_hash = password_hash;
        }
        Ok(user.clone())
    }

    async fn touch_last_login(&self, id: i64) -> ApiResult<()> {
        let mut inner = self.lock();
        if let Some(user) = inner.users.get_mut(&id) {
            user.last_logged_in = Some(Utc::now());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store_with_session() -> (MemoryStore, i64, i64) {
        let store = MemoryStore::new();
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
        (store, session.id, reservation.id)
    }

    #[tokio::test]
    async fn duplicate_seat_is_rejected() {
        let (store, session_id, reservation_id) = store_with_session().await;
        store
            .insert_ticket(session_id, 5, 10, reservation_id)
            .await
            .unwrap();
        let err = store
            .insert_ticket(session_id, 5, 10, reservation_id)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::SeatAlreadyTaken));
    }

    #[tokio::test]
    async fn deleting_session_releases_its_seats() {
        let (store, session_id, reservation_id) = store_with_session().await;
        store
            .insert_ticket(session_id, 1, 1, reservation_id)
            .await
            .unwrap();
        store.delete_session(session_id).await.unwrap();
        let tickets = store
            .list_tickets(OwnerScope::Any, PageParams::default())
            .await
            .unwrap();
        assert_eq!(tickets.count, 0);
    }

    #[tokio::test]
    async fn attach_is_idempotent() {
        let store = MemoryStore::new();
        let theme = store.create_theme("Astrophysics".into()).await.unwrap();
        let show = store
            .create_show(AstronomyShowWrite {
                title: "Nebula".into(),
                description: "Clouds of gas".into(),
                themes: vec![],
            })
            .await
            .unwrap();
        store.attach_theme(show.id, theme.id).await.unwrap();
        store.attach_theme(show.id, theme.id).await.unwrap();
        let out = store.get_show(show.id).await.unwrap();
        assert_eq!(out.themes.len(), 1);
    }

    #[tokio::test]
    async fn detach_is_quiet_about_absent_links() {
        let store = MemoryStore::new();
        let theme = store.create_theme("Astrophysics".into()).await.unwrap();
        let show = store
            .create_show(AstronomyShowWrite {
                title: "Nebula".into(),
                description: "Clouds of gas".into(),
                themes: vec![theme.id],
            })
            .await
            .unwrap();
        store.detach_theme(show.id, theme.id).await.unwrap();
        store.detach_theme(show.id, theme.id).await.unwrap();
        let out = store.get_show(show.id).await.unwrap();
        assert!(out.themes.is_empty());
    }

    #[tokio::test]
    async fn duplicate_email_is_a_validation_failure() {
        let store = MemoryStore::new();
        store
            .create_user("dup@example.com".into(), "hash".into())
            .await
            .unwrap();
        let err = store
            .create_user("dup@example.com".into(), "other".into())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
