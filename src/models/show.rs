use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::theme::ShowTheme;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AstronomyShow {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub image: Option<String>,
}

/// Read projection with nested theme objects, shared by list and retrieve.
#[derive(Debug, Serialize)]
pub struct AstronomyShowOut {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub themes: Vec<ShowTheme>,
    pub image: Option<String>,
}

impl AstronomyShowOut {
    pub fn from_parts(show: AstronomyShow, themes: Vec<ShowTheme>) -> Self {
        Self {
            id: show.id,
            title: show.title,
            description: show.description,
            themes,
            image: show.image,
        }
    }
}

/// Write shape: themes arrive as raw theme ids.
#[derive(Debug, Deserialize, Validate)]
pub struct AstronomyShowWrite {
    #[validate(length(min = 1, max = 100, message = "title must be 1..=100 characters"))]
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub themes: Vec<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AstronomyShowPatch {
    #[validate(length(min = 1, max = 100, message = "title must be 1..=100 characters"))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub themes: Option<Vec<i64>>,
}
