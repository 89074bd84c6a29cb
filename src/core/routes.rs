// HTTP routes configuration

use crate::core::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Auth endpoints
        .route("/login", post(crate::handlers::auth::login_handler))
        .route("/register", post(crate::handlers::auth::register_handler))
        .route("/refresh", post(crate::handlers::auth::refresh_handler))
        .route("/api/user", get(crate::handlers::auth::current_user_handler))
        .route("/api/auth/logout", post(crate::handlers::auth::logout_handler))
        .route("/api/auth/change-password", post(crate::handlers::auth::change_password_handler))

        // Proxy endpoints
        .route("/api/proxy/get-all", post(crate::handlers::proxies::get_all_handler))
        .route("/api/proxy/add", post(crate::handlers::proxies::add_handler))
        .route("/api/proxy/update", post(crate::handlers::proxies::update_handler))
        .route("/api/proxy/delete-multiple", post(crate::handlers::proxies::delete_multiple_handler))
        .route("/api/proxy/import", post(crate::handlers::proxies::import_handler))
        .route("/api/proxy/test", post(crate::handlers::proxies::test_handler))
        .route("/api/proxy/test-multiple", post(crate::handlers::proxies::test_multiple_handler))
        .route("/api/proxy/copy-selected", post(crate::handlers::proxies::copy_selected_handler))

        // Profile endpoints
        .route("/api/profile/get-all", post(crate::handlers::profiles::get_all_handler))
        .route("/api/profile/add", post(crate::handlers::profiles::add_handler))
        .route("/api/get-profile", post(crate::handlers::profiles::get_one_handler))
        .route("/api/update-profile", post(crate::handlers::profiles::update_handler))

        // Tag, group and stats endpoints
        .route("/api/db/tag/get-all", post(crate::handlers::tags::tag_get_all_handler))
        .route("/api/db/tag/create", post(crate::handlers::tags::tag_create_handler))
        .route("/api/db/group/get-all", post(crate::handlers::tags::group_get_all_handler))
        .route("/api/db/group/create", post(crate::handlers::tags::group_create_handler))
        .route("/api/db/stats", post(crate::handlers::tags::stats_handler))

        // Upstream info endpoints
        .route("/api/info/plans", get(crate::handlers::info::plans_handler))
        .route("/api/info/system", get(crate::handlers::info::system_handler))

        .route("/health", get(crate::handlers::health::health_handler))

        // 404 fallback for all unmatched routes
        .fallback(crate::handlers::fallback::fallback_handler)

        .with_state(state)
}
