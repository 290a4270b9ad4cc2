use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

// The dome row doubles as its read projection: it has no child
// relationships, so list and retrieve return the same shape.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PlanetariumDome {
    pub id: i64,
    pub name: String,
    pub rows: i32,
    pub seats_in_row: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PlanetariumDomeWrite {
    #[validate(length(min = 1, max = 100, message = "name must be 1..=100 characters"))]
    pub name: String,
    #[validate(range(min = 1, message = "rows must be at least 1"))]
    pub rows: i32,
    #[validate(range(min = 1, message = "seats_in_row must be at least 1"))]
    pub seats_in_row: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PlanetariumDomePatch {
    #[validate(length(min = 1, max = 100, message = "name must be 1..=100 characters"))]
    pub name: Option<String>,
    #[validate(range(min = 1, message = "rows must be at least 1"))]
    pub rows: Option<i32>,
    #[validate(range(min = 1, message = "seats_in_row must be at least 1"))]
    pub seats_in_row: Option<i32>,
}
