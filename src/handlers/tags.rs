use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::auth::session::AuthUser;
use crate::core::error::ApiError;
use crate::core::state::AppState;
use crate::models::response::Envelope;

#[derive(Debug, Deserialize)]
pub struct CreateTagRequest {
    #[serde(rename = "tagName")]
    pub tag_name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    #[serde(rename = "groupName")]
    pub group_name: String,
}

/// POST /api/db/tag/get-all
pub async fn tag_get_all_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(_user): AuthUser,
) -> Result<Json<Envelope>, ApiError> {
    let tags = state.store.list_tags().map_err(ApiError::Internal)?;
    Ok(Json(Envelope::ok(
        "Tags retrieved successfully",
        serde_json::to_value(tags).map_err(|e| ApiError::Internal(e.into()))?,
    )))
}

/// POST /api/db/tag/create
///
/// Creating an existing name is not an error, the existing id comes
/// back instead.
pub async fn tag_create_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(_user): AuthUser,
    Json(req): Json<CreateTagRequest>,
) -> Result<Json<Envelope>, ApiError> {
    if req.tag_name.trim().is_empty() {
        return Err(ApiError::InvalidParameter("Tag name is required".to_string()));
    }

    let tag = state
        .store
        .create_tag(req.tag_name.trim())
        .map_err(ApiError::Internal)?;
    Ok(Json(Envelope::ok("Tag created", json!({"id": tag.id}))))
}

/// POST /api/db/group/get-all
pub async fn group_get_all_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(_user): AuthUser,
) -> Result<Json<Envelope>, ApiError> {
    let groups = state.store.list_groups().map_err(ApiError::Internal)?;
    Ok(Json(Envelope::ok(
        "Groups retrieved successfully",
        serde_json::to_value(groups).map_err(|e| ApiError::Internal(e.into()))?,
    )))
}

/// POST /api/db/group/create
pub async fn group_create_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(_user): AuthUser,
    Json(req): Json<CreateGroupRequest>,
) -> Result<Json<Envelope>, ApiError> {
    if req.group_name.trim().is_empty() {
        return Err(ApiError::InvalidParameter("Group name is required".to_string()));
    }

    let group = state
        .store
        .create_group(req.group_name.trim())
        .map_err(ApiError::Internal)?;
    Ok(Json(Envelope::ok("Group created", json!({"id": group.id}))))
}

/// POST /api/db/stats
pub async fn stats_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Envelope>, ApiError> {
    let stats = state.store.db_stats(user.id).map_err(ApiError::Internal)?;
    Ok(Json(Envelope::ok(
        "Database statistics retrieved successfully",
        serde_json::to_value(stats).map_err(|e| ApiError::Internal(e.into()))?,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::hash_password;
    use crate::core::config::Config;
    use crate::db::Store;
    use crate::models::user::User;

    fn test_state() -> Arc<AppState> {
        let config: Config = toml::from_str(
            r#"
            [server]
            port = 8000

            [database]
            path = ":memory:"

            [auth]
            secret_key = "a-secret-long-enough-for-tests"

            [remote]
            base_url = "http://192.0.2.1:9"

            [logging]
            level = "info"
            format = "json"
            "#,
        )
        .unwrap();
        let store = Store::open_in_memory().unwrap();
        Arc::new(AppState::new(config, store).unwrap())
    }

    fn seed_user(state: &AppState) -> User {
        let hash = hash_password("pw").unwrap();
        state.store.create_user("alice@example.com", &hash).unwrap()
    }

    #[tokio::test]
    async fn test_tag_create_is_idempotent() {
        let state = test_state();
        let user = seed_user(&state);

        let first = tag_create_handler(
            State(Arc::clone(&state)),
            AuthUser(user.clone()),
            Json(CreateTagRequest {
                tag_name: "EU".to_string(),
            }),
        )
        .await
        .unwrap();
        let second = tag_create_handler(
            State(Arc::clone(&state)),
            AuthUser(user.clone()),
            Json(CreateTagRequest {
                tag_name: "EU".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(first.0.data.unwrap()["id"], second.0.data.unwrap()["id"]);

        let listed = tag_get_all_handler(State(state), AuthUser(user)).await.unwrap();
        assert_eq!(listed.0.data.unwrap().as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_blank_names_rejected() {
        let state = test_state();
        let user = seed_user(&state);

        let tag = tag_create_handler(
            State(Arc::clone(&state)),
            AuthUser(user.clone()),
            Json(CreateTagRequest {
                tag_name: "  ".to_string(),
            }),
        )
        .await;
        assert!(matches!(tag, Err(ApiError::InvalidParameter(_))));

        let group = group_create_handler(
            State(state),
            AuthUser(user),
            Json(CreateGroupRequest {
                group_name: String::new(),
            }),
        )
        .await;
        assert!(matches!(group, Err(ApiError::InvalidParameter(_))));
    }

    #[tokio::test]
    async fn test_stats_reflect_counts() {
        let state = test_state();
        let user = seed_user(&state);
        state.store.create_tag("EU").unwrap();
        state.store.create_group("Work").unwrap();

        let stats = stats_handler(State(state), AuthUser(user)).await.unwrap();
        let data = stats.0.data.unwrap();
        assert_eq!(data["tags"], 1);
        assert_eq!(data["groups"], 1);
        assert_eq!(data["proxies"], 0);
        assert_eq!(data["profiles"], 0);
    }
}
