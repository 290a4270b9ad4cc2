use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

use crate::error::{ApiError, ApiResult};
use crate::extract::ValidJson;
use crate::middleware::{self, AuthUser};
use crate::models::user::{RegisterRequest, TokenRequest, TokenResponse, UserOut, UserPatch};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/user/register/", post(register))
        .route("/user/token/", post(token))
        .route("/user/me/", get(me).patch(patch_me))
}

async fn register(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<UserOut>)> {
    let hash = middleware::hash_password(&req.password)
        .map_err(|err| ApiError::internal("failed to hash password", err))?;
    let user = state.users.create_user(req.email, hash).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// One `Unauthorized` for every failure mode, so the response does not
/// reveal whether an email is registered.
async fn token(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<TokenRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let user = state
        .users
        .find_user_by_email(&req.email)
        .await?
        .ok_or(ApiError::Unauthorized)?;
    if !user.is_active || !middleware::verify_password(&req.password, &user.password_hash) {
        return Err(ApiError::Unauthorized);
    }

    let token = middleware::issue_token(&user, &state.config.jwt)
        .map_err(|err| ApiError::internal("failed to sign token", err))?;
    state.users.touch_last_login(user.id).await?;
    Ok(Json(TokenResponse { token }))
}

async fn me(user: AuthUser) -> Json<UserOut> {
    Json(UserOut {
        id: user.id,
        email: user.email,
        is_staff: user.is_staff,
    })
}

async fn patch_me(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ValidJson(patch): ValidJson<UserPatch>,
) -> ApiResult<Json<UserOut>> {
    let hash = match patch.password.as_deref() {
        Some(password) => Some(
            middleware::hash_password(password)
                .map_err(|err| ApiError::internal("failed to hash password", err))?,
        ),
        None => None,
    };
    let updated = state.users.update_user(user.id, patch.email, hash).await?;
    Ok(Json(updated.into()))
}
