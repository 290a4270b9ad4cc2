use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

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

/// Production backend. Every method is a handful of bound queries; the
/// ticket unique constraint (`tickets_seat_once_per_session`) arbitrates
/// concurrent seat grabs, so no method does a check-then-insert.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// "row" is a reserved word in Postgres, hence the quoting everywhere.
const TICKET_SELECT: &str = r#"
    SELECT t.id, t."row", t.seat,
           s.id AS session_id, a.title AS astronomy_show,
           d.name AS planetarium_dome, s.show_time,
           r.id AS reservation_id, r.created_at, u.email AS "user"
    FROM tickets t
    JOIN show_sessions s ON s.id = t.show_session_id
    JOIN astronomy_shows a ON a.id = s.astronomy_show_id
    JOIN planetarium_domes d ON d.id = s.planetarium_dome_id
    JOIN reservations r ON r.id = t.reservation_id
    JOIN users u ON u.id = r.user_id
"#;

/// Flat result of `TICKET_SELECT`, regrouped into the nested projections.
#[derive(sqlx::FromRow)]
struct TicketJoinRow {
    id: i64,
    row: i32,
    seat: i32,
    session_id: i64,
    astronomy_show: String,
    planetarium_dome: String,
    show_time: DateTime<Utc>,
    reservation_id: i64,
    created_at: DateTime<Utc>,
    user: String,
}

impl TicketJoinRow {
    fn into_summary(self) -> TicketSummary {
        TicketSummary {
            id: self.id,
            row: self.row,
            seat: self.seat,
            show_session: ShowSessionSummary {
                id: self.session_id,
                astronomy_show: self.astronomy_show,
                planetarium_dome: self.planetarium_dome,
                show_time: self.show_time,
            },
            reservation: ReservationShort {
                id: self.reservation_id,
                created_at: self.created_at,
                user: self.user,
            },
        }
    }
}

fn translate_ticket_error(err: sqlx::Error) -> ApiError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return ApiError::SeatAlreadyTaken;
        }
        if db_err.is_foreign_key_violation() {
            return match db_err.constraint() {
                Some("tickets_show_session_id_fkey") => ApiError::NotFound("show session"),
                _ => ApiError::NotFound("reservation"),
            };
        }
    }
    err.into()
}

fn translate_session_error(err: sqlx::Error) -> ApiError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_foreign_key_violation() {
            return match db_err.constraint() {
                Some("show_sessions_planetarium_dome_id_fkey") => {
                    ApiError::NotFound("planetarium dome")
                }
                _ => ApiError::NotFound("astronomy show"),
            };
        }
    }
    err.into()
}

fn translate_theme_link_error(err: sqlx::Error, theme_id: i64) -> ApiError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_foreign_key_violation() {
            return match db_err.constraint() {
                Some("astronomy_show_themes_show_id_fkey") => ApiError::NotFound("astronomy show"),
                _ => ApiError::validation(format!("unknown theme id {theme_id}")),
            };
        }
    }
    err.into()
}

fn translate_user_error(err: sqlx::Error) -> ApiError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return ApiError::validation("a user with this email already exists");
        }
    }
    err.into()
}

async fn show_theme_rows<'e>(
    ex: impl sqlx::PgExecutor<'e>,
    show_id: i64,
) -> Result<Vec<ShowTheme>, sqlx::Error> {
    sqlx::query_as::<_, ShowTheme>(
        "SELECT t.id, t.name FROM show_themes t
         JOIN astronomy_show_themes st ON st.theme_id = t.id
         WHERE st.show_id = $1
         ORDER BY t.id",
    )
    .bind(show_id)
    .fetch_all(ex)
    .await
}

async fn link_themes(
    tx: &mut Transaction<'_, Postgres>,
    show_id: i64,
    theme_ids: &[i64],
) -> ApiResult<()> {
    for &theme_id in theme_ids {
        sqlx::query(
            "INSERT INTO astronomy_show_themes (show_id, theme_id)
             VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(show_id)
        .bind(theme_id)
        .execute(&mut **tx)
        .await
        .map_err(|err| translate_theme_link_error(err, theme_id))?;
    }
    Ok(())
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn list_themes(&self, page: PageParams) -> ApiResult<Page<ShowTheme>> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM show_themes")
            .fetch_one(&self.pool)
            .await?;
        let results = sqlx::query_as::<_, ShowTheme>(
            "SELECT id, name FROM show_themes ORDER BY id LIMIT $1 OFFSET $2",
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;
        Ok(Page::from_params(count, &page, results))
    }

    async fn create_theme(&self, name: String) -> ApiResult<ShowTheme> {
        let theme = sqlx::query_as::<_, ShowTheme>(
            "INSERT INTO show_themes (name) VALUES ($1) RETURNING id, name",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(theme)
    }

    async fn get_theme(&self, id: i64) -> ApiResult<ShowTheme> {
        sqlx::query_as::<_, ShowTheme>("SELECT id, name FROM show_themes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ApiError::NotFound("show theme"))
    }

    async fn update_theme(&self, id: i64, name: Option<String>) -> ApiResult<ShowTheme> {
        sqlx::query_as::<_, ShowTheme>(
            "UPDATE show_themes SET name = COALESCE($2, name)
             WHERE id = $1
             RETURNING id, name",
        )
        .bind(id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ApiError::NotFound("show theme"))
    }

    async fn delete_theme(&self, id: i64) -> ApiResult<()> {
        let res = sqlx::query("DELETE FROM show_themes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(ApiError::NotFound("show theme"));
        }
        Ok(())
    }

    async fn list_shows(&self, page: PageParams) -> ApiResult<Page<AstronomyShowOut>> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM astronomy_shows")
            .fetch_one(&self.pool)
            .await?;
        let shows = sqlx::query_as::<_, AstronomyShow>(
            "SELECT id, title, description, image
             FROM astronomy_shows ORDER BY id LIMIT $1 OFFSET $2",
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<i64> = shows.iter().map(|s| s.id).collect();
        let theme_rows = sqlx::query_as::<_, (i64, i64, String)>(
            "SELECT st.show_id, t.id, t.name
             FROM astronomy_show_themes st
             JOIN show_themes t ON t.id = st.theme_id
             WHERE st.show_id = ANY($1)
             ORDER BY t.id",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_show: BTreeMap<i64, Vec<ShowTheme>> = BTreeMap::new();
        for (show_id, id, name) in theme_rows {
            by_show.entry(show_id).or_default().push(ShowTheme { id, name });
        }
        let results = shows
            .into_iter()
            .map(|show| {
                let themes = by_show.remove(&show.id).unwrap_or_default();
                AstronomyShowOut::from_parts(show, themes)
            })
            .collect();
        Ok(Page::from_params(count, &page, results))
    }

    async fn create_show(&self, write: AstronomyShowWrite) -> ApiResult<AstronomyShowOut> {
        let mut tx = self.pool.begin().await?;
        let show = sqlx::query_as::<_, AstronomyShow>(
            "INSERT INTO astronomy_shows (title, description)
             VALUES ($1, $2)
             RETURNING id, title, description, image",
        )
        .bind(&write.title)
        .bind(&write.description)
        .fetch_one(&mut *tx)
        .await?;
        link_themes(&mut tx, show.id, &write.themes).await?;
        let themes = show_theme_rows(&mut *tx, show.id).await?;
        tx.commit().await?;
        Ok(AstronomyShowOut::from_parts(show, themes))
    }

    async fn get_show(&self, id: i64) -> ApiResult<AstronomyShowOut> {
        let show = sqlx::query_as::<_, AstronomyShow>(
            "SELECT id, title, description, image FROM astronomy_shows WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ApiError::NotFound("astronomy show"))?;
        let themes = show_theme_rows(&self.pool, id).await?;
        Ok(AstronomyShowOut::from_parts(show, themes))
    }

    async fn update_show(&self, id: i64, patch: AstronomyShowPatch) -> ApiResult<AstronomyShowOut> {
        let mut tx = self.pool.begin().await?;
        let show = sqlx::query_as::<_, AstronomyShow>(
            "UPDATE astronomy_shows
             SET title = COALESCE($2, title), description = COALESCE($3, description)
             WHERE id = $1
             RETURNING id, title, description, image",
        )
        .bind(id)
        .bind(&patch.title)
        .bind(&patch.description)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(ApiError::NotFound("astronomy show"))?;

        if let Some(theme_ids) = &patch.themes {
            sqlx::query(
                "DELETE FROM astronomy_show_themes
                 WHERE show_id = $1 AND theme_id <> ALL($2)",
            )
            .bind(id)
            .bind(theme_ids)
            .execute(&mut *tx)
            .await?;
            link_themes(&mut tx, id, theme_ids).await?;
        }
        let themes = show_theme_rows(&mut *tx, id).await?;
        tx.commit().await?;
        Ok(AstronomyShowOut::from_parts(show, themes))
    }

    async fn delete_show(&self, id: i64) -> ApiResult<()> {
        let res = sqlx::query("DELETE FROM astronomy_shows WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(ApiError::NotFound("astronomy show"));
        }
        Ok(())
    }

    async fn set_show_image(&self, id: i64, path: String) -> ApiResult<AstronomyShowOut> {
        let show = sqlx::query_as::<_, AstronomyShow>(
            "UPDATE astronomy_shows SET image = $2 WHERE id = $1
             RETURNING id, title, description, image",
        )
        .bind(id)
        .bind(path)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ApiError::NotFound("astronomy show"))?;
        let themes = show_theme_rows(&self.pool, id).await?;
        Ok(AstronomyShowOut::from_parts(show, themes))
    }

    async fn attach_theme(&self, show_id: i64, theme_id: i64) -> ApiResult<()> {
        sqlx::query(
            "INSERT INTO astronomy_show_themes (show_id, theme_id)
             VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(show_id)
        .bind(theme_id)
        .execute(&self.pool)
        .await
        .map_err(|err| translate_theme_link_error(err, theme_id))?;
        Ok(())
    }

    async fn detach_theme(&self, show_id: i64, theme_id: i64) -> ApiResult<()> {
        sqlx::query("DELETE FROM astronomy_show_themes WHERE show_id = $1 AND theme_id = $2")
            .bind(show_id)
            .bind(theme_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_domes(&self, page: PageParams) -> ApiResult<Page<PlanetariumDome>> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM planetarium_domes")
            .fetch_one(&self.pool)
            .await?;
        let results = sqlx::query_as::<_, PlanetariumDome>(
            "SELECT id, name, rows, seats_in_row
             FROM planetarium_domes ORDER BY id LIMIT $1 OFFSET $2",
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;
        Ok(Page::from_params(count, &page, results))
    }

    async fn create_dome(&self, write: PlanetariumDomeWrite) -> ApiResult<PlanetariumDome> {
        let dome = sqlx::query_as::<_, PlanetariumDome>(
            "INSERT INTO planetarium_domes (name, rows, seats_in_row)
             VALUES ($1, $2, $3)
             RETURNING id, name, rows, seats_in_row",
        )
        .bind(&write.name)
        .bind(write.rows)
        .bind(write.seats_in_row)
        .fetch_one(&self.pool)
        .await?;
        Ok(dome)
    }

    async fn get_dome(&self, id: i64) -> ApiResult<PlanetariumDome> {
        sqlx::query_as::<_, PlanetariumDome>(
            "SELECT id, name, rows, seats_in_row FROM planetarium_domes WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ApiError::NotFound("planetarium dome"))
    }

    async fn update_dome(
        &self,
        id: i64,
        patch: PlanetariumDomePatch,
    ) -> ApiResult<PlanetariumDome> {
        sqlx::query_as::<_, PlanetariumDome>(
            "UPDATE planetarium_domes
             SET name = COALESCE($2, name),
                 rows = COALESCE($3, rows),
                 seats_in_row = COALESCE($4, seats_in_row)
             WHERE id = $1
             RETURNING id, name, rows, seats_in_row",
        )
        .bind(id)
        .bind(&patch.name)
        .bind(patch.rows)
        .bind(patch.seats_in_row)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ApiError::NotFound("planetarium dome"))
    }

    async fn delete_dome(&self, id: i64) -> ApiResult<()> {
        let res = sqlx::query("DELETE FROM planetarium_domes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(ApiError::NotFound("planetarium dome"));
        }
        Ok(())
    }
}

#[async_trait]
impl SessionRegistry for PgStore {
    async fn list_sessions(&self, page: PageParams) -> ApiResult<Page<ShowSessionSummary>> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM show_sessions")
            .fetch_one(&self.pool)
            .await?;
        let results = sqlx::query_as::<_, ShowSessionSummary>(
            "SELECT s.id, a.title AS astronomy_show, d.name AS planetarium_dome, s.show_time
             FROM show_sessions s
             JOIN astronomy_shows a ON a.id = s.astronomy_show_id
             JOIN planetarium_domes d ON d.id = s.planetarium_dome_id
             ORDER BY s.show_time, s.id
             LIMIT $1 OFFSET $2",
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;
        Ok(Page::from_params(count, &page, results))
    }

    async fn create_session(&self, write: ShowSessionWrite) -> ApiResult<ShowSession> {
        sqlx::query_as::<_, ShowSession>(
            "INSERT INTO show_sessions (astronomy_show_id, planetarium_dome_id, show_time)
             VALUES ($1, $2, $3)
             RETURNING id, astronomy_show_id, planetarium_dome_id, show_time",
        )
        .bind(write.astronomy_show)
        .bind(write.planetarium_dome)
        .bind(write.show_time)
        .fetch_one(&self.pool)
        .await
        .map_err(translate_session_error)
    }

    async fn get_session(&self, id: i64) -> ApiResult<ShowSessionDetail> {
        let session = sqlx::query_as::<_, ShowSession>(
            "SELECT id, astronomy_show_id, planetarium_dome_id, show_time
             FROM show_sessions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ApiError::NotFound("show session"))?;

        let astronomy_show = self.get_show(session.astronomy_show_id).await?;
        let planetarium_dome = self.get_dome(session.planetarium_dome_id).await?;
        Ok(ShowSessionDetail {
            id: session.id,
            astronomy_show,
            planetarium_dome,
            show_time: session.show_time,
        })
    }

    async fn update_session(&self, id: i64, patch: ShowSessionPatch) -> ApiResult<ShowSession> {
        sqlx::query_as::<_, ShowSession>(
            "UPDATE show_sessions
             SET astronomy_show_id = COALESCE($2, astronomy_show_id),
                 planetarium_dome_id = COALESCE($3, planetarium_dome_id),
                 show_time = COALESCE($4, show_time)
             WHERE id = $1
             RETURNING id, astronomy_show_id, planetarium_dome_id, show_time",
        )
        .bind(id)
        .bind(patch.astronomy_show)
        .bind(patch.planetarium_dome)
        .bind(patch.show_time)
        .fetch_optional(&self.pool)
        .await
        .map_err(translate_session_error)?
        .ok_or(ApiError::NotFound("show session"))
    }

    async fn delete_session(&self, id: i64) -> ApiResult<()> {
        let res = sqlx::query("DELETE FROM show_sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(ApiError::NotFound("show session"));
        }
        Ok(())
    }

    async fn dome_bounds(&self, session_id: i64) -> ApiResult<(i32, i32)> {
        sqlx::query_as::<_, (i32, i32)>(
            "SELECT d.rows, d.seats_in_row
             FROM show_sessions s
             JOIN planetarium_domes d ON d.id = s.planetarium_dome_id
             WHERE s.id = $1",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ApiError::NotFound("show session"))
    }
}

#[async_trait]
impl ReservationLedger for PgStore {
    async fn create_reservation(&self, user_id: i64) -> ApiResult<Reservation> {
        let reservation = sqlx::query_as::<_, Reservation>(
            "INSERT INTO reservations (user_id) VALUES ($1)
             RETURNING id, user_id, created_at",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(reservation)
    }

    async fn list_reservations(
        &self,
        scope: OwnerScope,
        page: PageParams,
    ) -> ApiResult<Page<ReservationDetail>> {
        let count = match scope {
            OwnerScope::Any => {
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM reservations")
                    .fetch_one(&self.pool)
                    .await?
            }
            OwnerScope::User(user_id) => {
                sqlx::query_scalar::<_, i64>(
                    "SELECT COUNT(*) FROM reservations WHERE user_id = $1",
                )
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?
            }
        };

        let mut sql = String::from(
            r#"SELECT r.id, r.created_at, u.email AS "user"
               FROM reservations r JOIN users u ON u.id = r.user_id"#,
        );
        if matches!(scope, OwnerScope::User(_)) {
            sql.push_str(" WHERE r.user_id = $3");
        }
        sql.push_str(" ORDER BY r.id LIMIT $1 OFFSET $2");

        let mut query = sqlx::query_as::<_, ReservationShort>(&sql)
            .bind(page.limit())
            .bind(page.offset());
        if let OwnerScope::User(user_id) = scope {
            query = query.bind(user_id);
        }
        let heads = query.fetch_all(&self.pool).await?;

        let ids: Vec<i64> = heads.iter().map(|r| r.id).collect();
        let ticket_rows = sqlx::query_as::<_, TicketJoinRow>(&format!(
            "{TICKET_SELECT} WHERE t.reservation_id = ANY($1) ORDER BY t.id"
        ))
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_reservation: BTreeMap<i64, Vec<TicketSummary>> = BTreeMap::new();
        for row in ticket_rows {
            by_reservation
                .entry(row.reservation_id)
                .or_default()
                .push(row.into_summary());
        }
        let results = heads
            .into_iter()
            .map(|head| ReservationDetail {
                tickets: by_reservation.remove(&head.id).unwrap_or_default(),
                id: head.id,
                created_at: head.created_at,
                user: head.user,
            })
            .collect();
        Ok(Page::from_params(count, &page, results))
    }

    async fn get_reservation(&self, id: i64, scope: OwnerScope) -> ApiResult<ReservationDetail> {
        let mut sql = String::from(
            r#"SELECT r.id, r.created_at, u.email AS "user"
               FROM reservations r JOIN users u ON u.id = r.user_id
               WHERE r.id = $1"#,
        );
        if matches!(scope, OwnerScope::User(_)) {
            sql.push_str(" AND r.user_id = $2");
        }
        let mut query = sqlx::query_as::<_, ReservationShort>(&sql).bind(id);
        if let OwnerScope::User(user_id) = scope {
            query = query.bind(user_id);
        }
        let head = query
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ApiError::NotFound("reservation"))?;

        let ticket_rows = sqlx::query_as::<_, TicketJoinRow>(&format!(
            "{TICKET_SELECT} WHERE t.reservation_id = $1 ORDER BY t.id"
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ReservationDetail {
            id: head.id,
            created_at: head.created_at,
            user: head.user,
            tickets: ticket_rows.into_iter().map(TicketJoinRow::into_summary).collect(),
        })
    }

    async fn delete_reservation(&self, id: i64, scope: OwnerScope) -> ApiResult<()> {
        let res = match scope {
            OwnerScope::Any => {
                sqlx::query("DELETE FROM reservations WHERE id = $1")
                    .bind(id)
                    .execute(&self.pool)
                    .await?
            }
            OwnerScope::User(user_id) => {
                sqlx::query("DELETE FROM reservations WHERE id = $1 AND user_id = $2")
                    .bind(id)
                    .bind(user_id)
                    .execute(&self.pool)
                    .await?
            }
        };
        if res.rows_affected() == 0 {
            return Err(ApiError::NotFound("reservation"));
        }
        Ok(())
    }

    async fn insert_ticket(
        &self,
        show_session_id: i64,
        row: i32,
        seat: i32,
        reservation_id: i64,
    ) -> ApiResult<Ticket> {
        sqlx::query_as::<_, Ticket>(
            r#"INSERT INTO tickets ("row", seat, show_session_id, reservation_id)
               VALUES ($1, $2, $3, $4)
               RETURNING id, "row", seat, show_session_id, reservation_id"#,
        )
        .bind(row)
        .bind(seat)
        .bind(show_session_id)
        .bind(reservation_id)
        .fetch_one(&self.pool)
        .await
        .map_err(translate_ticket_error)
    }

    async fn list_tickets(
        &self,
        scope: OwnerScope,
        page: PageParams,
    ) -> ApiResult<Page<TicketSummary>> {
        let count = match scope {
            OwnerScope::Any => {
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM tickets")
                    .fetch_one(&self.pool)
                    .await?
            }
            OwnerScope::User(user_id) => {
                sqlx::query_scalar::<_, i64>(
                    "SELECT COUNT(*) FROM tickets t
                     JOIN reservations r ON r.id = t.reservation_id
                     WHERE r.user_id = $1",
                )
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?
            }
        };

        let mut sql = String::from(TICKET_SELECT);
        if matches!(scope, OwnerScope::User(_)) {
            sql.push_str(" WHERE r.user_id = $3");
        }
        sql.push_str(" ORDER BY t.id LIMIT $1 OFFSET $2");

        let mut query = sqlx::query_as::<_, TicketJoinRow>(&sql)
            .bind(page.limit())
            .bind(page.offset());
        if let OwnerScope::User(user_id) = scope {
            query = query.bind(user_id);
        }
        let rows = query.fetch_all(&self.pool).await?;
        let results = rows.into_iter().map(TicketJoinRow::into_summary).collect();
        Ok(Page::from_params(count, &page, results))
    }

    async fn get_ticket(&self, id: i64, scope: OwnerScope) -> ApiResult<TicketDetail> {
        let mut sql = format!("{TICKET_SELECT} WHERE t.id = $1");
        if matches!(scope, OwnerScope::User(_)) {
            sql.push_str(" AND r.user_id = $2");
        }
        let mut query = sqlx::query_as::<_, TicketJoinRow>(&sql).bind(id);
        if let OwnerScope::User(user_id) = scope {
            query = query.bind(user_id);
        }
        let row = query
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ApiError::NotFound("ticket"))?;

        let reservation = self.get_reservation(row.reservation_id, scope).await?;
        Ok(TicketDetail {
            id: row.id,
            row: row.row,
            seat: row.seat,
            show_session: ShowSessionSummary {
                id: row.session_id,
                astronomy_show: row.astronomy_show,
                planetarium_dome: row.planetarium_dome,
                show_time: row.show_time,
            },
            reservation,
        })
    }

    async fn delete_ticket(&self, id: i64, scope: OwnerScope) -> ApiResult<()> {
        let res = match scope {
            OwnerScope::Any => {
                sqlx::query("DELETE FROM tickets WHERE id = $1")
                    .bind(id)
                    .execute(&self.pool)
                    .await?
            }
            OwnerScope::User(user_id) => {
                sqlx::query(
                    "DELETE FROM tickets t USING reservations r
                     WHERE t.id = $1 AND r.id = t.reservation_id AND r.user_id = $2",
                )
                .bind(id)
                .bind(user_id)
                .execute(&self.pool)
                .await?
            }
        };
        if res.rows_affected() == 0 {
            return Err(ApiError::NotFound("ticket"));
        }
        Ok(())
    }
}

const USER_COLUMNS: &str =
    "id, email, password_hash, is_staff, is_active, registered_at, last_logged_in";

#[async_trait]
impl UserDirectory for PgStore {
    async fn create_user(&self, email: String, password_hash: String) -> ApiResult<User> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, password_hash) VALUES ($1, $2) RETURNING {USER_COLUMNS}"
        ))
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(translate_user_error)
    }

    async fn find_user_by_email(&self, email: &str) -> ApiResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn get_user(&self, id: i64) -> ApiResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn update_user(
        &self,
        id: i64,
        email: Option<String>,
        password_hash: Option<String>,
    ) -> ApiResult<User> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users
             SET email = COALESCE($2, email), password_hash = COALESCE($3, password_hash)
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(email)
        .bind(password_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(translate_user_error)?
        .ok_or(ApiError::NotFound("user"))
    }

    async fn touch_last_login(&self, id: i64) -> ApiResult<()> {
        sqlx::query("UPDATE users SET last_logged_in = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
