use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::dome::PlanetariumDome;
use super::show::AstronomyShowOut;

// Serialized as the write-shape echo, so the foreign keys keep their
// wire names (`astronomy_show`, `planetarium_dome`) as raw ids.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ShowSession {
    pub id: i64,
    #[serde(rename = "astronomy_show")]
    pub astronomy_show_id: i64,
    #[serde(rename = "planetarium_dome")]
    pub planetarium_dome_id: i64,
    pub show_time: DateTime<Utc>,
}

/// List projection: foreign keys resolved to the show title and dome name.
/// Also nested inside ticket projections.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ShowSessionSummary {
    pub id: i64,
    pub astronomy_show: String,
    pub planetarium_dome: String,
    pub show_time: DateTime<Utc>,
}

/// Retrieve projection: full show (with themes) and full dome nested.
#[derive(Debug, Serialize)]
pub struct ShowSessionDetail {
    pub id: i64,
    pub astronomy_show: AstronomyShowOut,
    pub planetarium_dome: PlanetariumDome,
    pub show_time: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ShowSessionWrite {
    pub astronomy_show: i64,
    pub planetarium_dome: i64,
    pub show_time: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ShowSessionPatch {
    pub astronomy_show: Option<i64>,
    pub planetarium_dome: Option<i64>,
    pub show_time: Option<DateTime<Utc>>,
}
