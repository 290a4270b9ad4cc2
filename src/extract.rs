use axum::extract::{FromRequest, Request};
use axum::Json;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::ApiError;

/// `Json<T>` that also runs the DTO's `validator` rules. Malformed bodies
/// and failed rules both surface as `validation_error`.
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|err| ApiError::validation(err.body_text()))?;
        value
            .validate()
            .map_err(|err| ApiError::validation(validation_message(&err)))?;
        Ok(ValidJson(value))
    }
}

// Sorted so the message is stable regardless of map iteration order.
fn validation_message(errors: &validator::ValidationErrors) -> String {
    let mut parts: Vec<String> = Vec::new();
    for (field, field_errors) in errors.field_errors() {
        for err in field_errors {
            let msg = err
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("{field} is invalid"));
            parts.push(msg);
        }
    }
    parts.sort();
    parts.join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::dome::PlanetariumDomeWrite;

    #[test]
    fn rule_messages_are_flattened() {
        let bad = PlanetariumDomeWrite {
            name: String::new(),
            rows: 0,
            seats_in_row: -3,
        };
        let errs = bad.validate().unwrap_err();
        let msg = validation_message(&errs);
        assert!(msg.contains("name must be 1..=100 characters"));
        assert!(msg.contains("rows must be at least 1"));
        assert!(msg.contains("seats_in_row must be at least 1"));
    }
}
