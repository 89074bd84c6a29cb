use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use crate::auth::session::AuthUser;
use crate::core::error::ApiError;
use crate::core::state::AppState;
use crate::models::profile::{ProfileCreate, ProfileUpdate};
use crate::models::response::Envelope;

#[derive(Debug, Deserialize)]
pub struct GetProfileRequest {
    #[serde(rename = "profileId")]
    pub profile_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub id: i64,
    #[serde(flatten)]
    pub data: ProfileUpdate,
}

/// POST /api/profile/get-all
pub async fn get_all_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Envelope>, ApiError> {
    let profiles = state
        .store
        .list_profiles(user.id)
        .map_err(ApiError::Internal)?;

    Ok(Json(Envelope::ok(
        "Profiles retrieved successfully",
        serde_json::to_value(profiles).map_err(|e| ApiError::Internal(e.into()))?,
    )))
}

/// POST /api/profile/add
pub async fn add_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(input): Json<ProfileCreate>,
) -> Result<Json<Envelope>, ApiError> {
    if input.name.trim().is_empty() {
        return Err(ApiError::InvalidParameter("Profile name is required".to_string()));
    }

    let profile = state
        .store
        .create_profile(user.id, &input)
        .map_err(ApiError::Internal)?;
    info!(user_id = user.id, profile_id = profile.id, "profile created");

    Ok(Json(Envelope::ok(
        "Profile created successfully",
        serde_json::to_value(profile).map_err(|e| ApiError::Internal(e.into()))?,
    )))
}

/// POST /api/get-profile
pub async fn get_one_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(req): Json<GetProfileRequest>,
) -> Result<Json<Envelope>, ApiError> {
    let profile = state
        .store
        .find_profile(user.id, req.profile_id)
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;

    Ok(Json(Envelope::ok(
        "Profile retrieved successfully",
        serde_json::to_value(profile).map_err(|e| ApiError::Internal(e.into()))?,
    )))
}

/// POST /api/update-profile
pub async fn update_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<Envelope>, ApiError> {
    let profile = state
        .store
        .update_profile(user.id, req.id, &req.data)
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;

    Ok(Json(Envelope::ok(
        "Profile updated successfully",
        serde_json::to_value(profile).map_err(|e| ApiError::Internal(e.into()))?,
    )))
}
