use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ShowTheme {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ShowThemeWrite {
    #[validate(length(min = 1, max = 100, message = "name must be 1..=100 characters"))]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ShowThemePatch {
    #[validate(length(min = 1, max = 100, message = "name must be 1..=100 characters"))]
    pub name: Option<String>,
}
