use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::JwtConfig;
use crate::error::ApiError;
use crate::models::User;
use crate::store::OwnerScope;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub email: String,
    pub is_staff: bool,
    pub exp: usize,
}

pub fn issue_token(user: &User, config: &JwtConfig) -> Result<String, jsonwebtoken::errors::Error> {
    let exp = (Utc::now() + Duration::hours(config.expires_in_hours)).timestamp() as usize;
    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        is_staff: user.is_staff,
        exp,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}

pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

/// Bearer-token extractor. The token alone is not trusted: the user row is
/// re-read so deactivated or deleted accounts stop authenticating even with
/// a live token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
    pub is_staff: bool,
}

impl AuthUser {
    pub fn scope(&self) -> OwnerScope {
        if self.is_staff {
            OwnerScope::Any
        } else {
            OwnerScope::User(self.id)
        }
    }
}

impl FromRequestParts<Arc<crate::AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<crate::AppState>,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthorized)?;

        let claims =
            decode_token(token, &state.config.jwt.secret).map_err(|_| ApiError::Unauthorized)?;

        let user = state
            .users
            .get_user(claims.sub)
            .await?
            .ok_or(ApiError::Unauthorized)?;
        if !user.is_active {
            return Err(ApiError::Unauthorized);
        }

        Ok(AuthUser {
            id: user.id,
            email: user.email,
            is_staff: user.is_staff,
        })
    }
}

/// `AuthUser` plus the staff check; catalog and session writes require it.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

impl FromRequestParts<Arc<crate::AppState>> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<crate::AppState>,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_staff {
            return Err(ApiError::PermissionDenied);
        }
        Ok(AdminUser(user))
    }
}
