use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::auth::password::{hash_password, verify_password};
use crate::auth::session::AuthUser;
use crate::core::error::{ApiError, AuthError};
use crate::core::state::AppState;
use crate::models::response::{Envelope, LoginSuccess};
use crate::models::user::PublicUser;
use crate::utils::time::current_timestamp;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub hwid: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// POST /login
///
/// Authenticates against the local database. All credential failures
/// come back as HTTP 200 with a `success: false` envelope; only the
/// rate limit responds with an error status.
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(req): Json<LoginRequest>,
) -> Response {
    if !state
        .login_limiter
        .check_and_increment(addr.ip(), current_timestamp())
    {
        warn!(ip = %addr.ip(), "login attempt rate limited");
        return ApiError::RateLimited.into_response();
    }

    match state
        .authenticator
        .login(&req.email, &req.password, req.hwid.as_deref())
    {
        Ok(user) => match state.token_issuer.issue(user.id) {
            Ok(token) => {
                Json(LoginSuccess::new(token, PublicUser::from(&user))).into_response()
            }
            Err(e) => AuthError::Internal(e).into_response(),
        },
        Err(e) => e.into_response(),
    }
}

/// POST /register
///
/// Forwards the registration to the upstream account service and, when
/// it succeeds, mirrors the account locally. The mirrored account has
/// no usable password hash until the upstream sync fills it in, so a
/// local login attempt reports an internal error rather than leaking
/// whether the email exists.
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let reply = state.remote.register(&req.email, &req.password).await;

    if !reply.success {
        let message = reply
            .data
            .get("message")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("Registration failed");
        return Ok(Json(json!({"success": false, "message": message})));
    }

    let upstream_user = reply
        .data
        .get("data")
        .and_then(|d| d.get("user"))
        .cloned()
        .unwrap_or(serde_json::Value::Null);

    let email = req.email.trim().to_lowercase();
    let user = match state.store.find_user_by_email(&email).map_err(ApiError::Internal)? {
        Some(existing) => existing,
        None => state.store.create_user(&email, "").map_err(ApiError::Internal)?,
    };
    info!(user_id = user.id, "mirrored registered account locally");

    Ok(Json(json!({
        "success": true,
        "message": "User registered successfully",
        "data": {
            "user": {
                "id": user.id,
                "email": user.email,
                "created_at": user.created_at,
                "original_user_data": upstream_user,
            }
        }
    })))
}

/// POST /refresh
pub async fn refresh_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let token = state.token_issuer.issue(user.id).map_err(ApiError::Internal)?;

    Ok(Json(json!({
        "success": true,
        "message": "Token refreshed successfully",
        "data": {
            "access_token": token,
            "token_type": "bearer",
        }
    })))
}

/// GET /api/user
pub async fn current_user_handler(AuthUser(user): AuthUser) -> Json<Envelope> {
    Json(Envelope::ok(
        "User data retrieved successfully",
        serde_json::to_value(PublicUser::from(&user)).unwrap_or_default(),
    ))
}

/// POST /api/auth/logout
///
/// Tokens are stateless, so logout is an acknowledgement for the
/// client to discard its copy.
pub async fn logout_handler(AuthUser(user): AuthUser) -> Json<Envelope> {
    info!(user_id = user.id, "user logged out");
    Json(Envelope::ok_empty("Logged out successfully"))
}

/// POST /api/auth/change-password
pub async fn change_password_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<Envelope>, ApiError> {
    if req.new_password.is_empty() {
        return Err(ApiError::InvalidParameter("New password is required".to_string()));
    }

    let current_ok = verify_password(&req.current_password, &user.password_hash)
        .map_err(ApiError::Internal)?;
    if !current_ok {
        return Err(ApiError::InvalidParameter(
            "Current password is incorrect".to_string(),
        ));
    }

    let new_hash = hash_password(&req.new_password).map_err(ApiError::Internal)?;
    state
        .store
        .set_password_hash(user.id, &new_hash)
        .map_err(ApiError::Internal)?;

    info!(user_id = user.id, "password changed");
    Ok(Json(Envelope::ok_empty("Password changed successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use crate::core::error::FailureResponse;
    use crate::db::Store;
    use axum::body::Body;
    use axum::http::StatusCode;
    use http_body_util::BodyExt;
    use std::net::{IpAddr, Ipv4Addr};

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

            [security]
            max_login_attempts_per_minute = 3
            "#,
        )
        .unwrap();
        let store = Store::open_in_memory().unwrap();
        Arc::new(AppState::new(config, store).unwrap())
    }

    fn seed_user(state: &AppState, email: &str, password: &str) -> i64 {
        let hash = hash_password(password).unwrap();
        state.store.create_user(email, &hash).unwrap().id
    }

    fn addr(last: u8) -> ConnectInfo<SocketAddr> {
        ConnectInfo(SocketAddr::new(IpAddr::V4(Ipv4Addr::new(10, 0, 0, last)), 50000))
    }

    fn login_request(email: &str, password: &str, hwid: Option<&str>) -> Json<LoginRequest> {
        Json(LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
            hwid: hwid.map(String::from),
        })
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let (_, body) = response.into_parts();
        let bytes = Body::new(body).collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_login_success_envelope() {
        let state = test_state();
        seed_user(&state, "alice@example.com", "correct horse");

        let response = login_handler(
            State(Arc::clone(&state)),
            addr(1),
            login_request("alice@example.com", "correct horse", None),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["token_type"], "bearer");

        let token = body["data"]["access_token"].as_str().unwrap();
        assert!(state.token_issuer.verify(token).is_some());
    }

    #[tokio::test]
    async fn test_login_failure_is_http_200_with_code() {
        let state = test_state();

        let response = login_handler(
            State(state),
            addr(2),
            login_request("ghost@example.com", "whatever", None),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let failure: FailureResponse = serde_json::from_value(body_json(response).await).unwrap();
        assert!(!failure.success);
        assert_eq!(failure.error_code, "USER_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_login_binds_hwid_then_rejects_other_device() {
        let state = test_state();
        let user_id = seed_user(&state, "alice@example.com", "correct horse");

        let first = login_handler(
            State(Arc::clone(&state)),
            addr(3),
            login_request("alice@example.com", "correct horse", Some("machine-a")),
        )
        .await;
        assert_eq!(body_json(first).await["success"], true);

        let stored = state.store.find_user_by_id(user_id).unwrap().unwrap();
        assert_eq!(stored.hwid.as_deref(), Some("machine-a"));

        let second = login_handler(
            State(state),
            addr(3),
            login_request("alice@example.com", "correct horse", Some("machine-b")),
        )
        .await;
        let body = body_json(second).await;
        assert_eq!(body["error_code"], "HWID_MISMATCH");
    }

    #[tokio::test]
    async fn test_login_rate_limit_returns_429() {
        let state = test_state();
        seed_user(&state, "alice@example.com", "correct horse");

        for _ in 0..3 {
            login_handler(
                State(Arc::clone(&state)),
                addr(4),
                login_request("alice@example.com", "bad", None),
            )
            .await;
        }

        let limited = login_handler(
            State(state),
            addr(4),
            login_request("alice@example.com", "correct horse", None),
        )
        .await;
        assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_change_password_requires_current() {
        let state = test_state();
        let user_id = seed_user(&state, "alice@example.com", "old password");
        let user = state.store.find_user_by_id(user_id).unwrap().unwrap();

        let wrong = change_password_handler(
            State(Arc::clone(&state)),
            AuthUser(user.clone()),
            Json(ChangePasswordRequest {
                current_password: "not it".to_string(),
                new_password: "new password".to_string(),
            }),
        )
        .await;
        assert!(matches!(wrong, Err(ApiError::InvalidParameter(_))));

        change_password_handler(
            State(Arc::clone(&state)),
            AuthUser(user),
            Json(ChangePasswordRequest {
                current_password: "old password".to_string(),
                new_password: "new password".to_string(),
            }),
        )
        .await
        .unwrap();

        let updated = state.store.find_user_by_id(user_id).unwrap().unwrap();
        assert!(verify_password("new password", &updated.password_hash).unwrap());
    }

    #[tokio::test]
    async fn test_refresh_issues_fresh_token() {
        let state = test_state();
        let user_id = seed_user(&state, "alice@example.com", "pw");
        let user = state.store.find_user_by_id(user_id).unwrap().unwrap();

        let response = refresh_handler(State(Arc::clone(&state)), AuthUser(user))
            .await
            .unwrap();
        let token = response.0["data"]["access_token"].as_str().unwrap().to_string();
        assert_eq!(state.token_issuer.verify(&token), Some(user_id));
    }
}
