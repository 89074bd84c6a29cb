use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

use crate::core::error::ApiError;
use crate::core::state::AppState;
use crate::models::user::User;

/// Extractor that resolves the `Authorization: Bearer` token to the
/// authenticated user. Handlers take this as an argument to require a
/// valid session.
pub struct AuthUser(pub User);

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(ApiError::InvalidToken)?;
        let user_id = state
            .token_issuer
            .verify(token)
            .ok_or(ApiError::InvalidToken)?;

        let user = state
            .store
            .find_user_by_id(user_id)
            .map_err(ApiError::Internal)?
            .ok_or(ApiError::UserNotFound)?;

        if !user.is_active {
            return Err(ApiError::InvalidToken);
        }

        Ok(AuthUser(user))
    }
}
