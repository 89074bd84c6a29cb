use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};
use tracing::warn;

use crate::core::state::AppState;
use crate::utils::time::now_rfc3339;

fn local_plans() -> Value {
    json!([
        {
            "id": 1,
            "name": "Basic",
            "price": 29.99,
            "duration": "monthly",
            "features": ["100 profiles", "Basic proxy support", "Email support"]
        },
        {
            "id": 2,
            "name": "Pro",
            "price": 59.99,
            "duration": "monthly",
            "features": ["500 profiles", "Advanced proxy support", "Priority support", "API access"]
        },
        {
            "id": 3,
            "name": "Enterprise",
            "price": 199.99,
            "duration": "monthly",
            "features": ["Unlimited profiles", "Premium proxy support", "24/7 support", "Full API access", "Custom integrations"]
        }
    ])
}

/// GET /api/info/plans
///
/// Fetched from the upstream service, with a baked-in fallback when it
/// is unreachable.
pub async fn plans_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let reply = state.remote.get_plans().await;
    if reply.success {
        return Json(reply.data);
    }

    warn!(status_code = reply.status_code, "serving local plan fallback");
    Json(json!({
        "success": true,
        "message": "Plans retrieved successfully (local fallback)",
        "data": local_plans(),
    }))
}

/// GET /api/info/system
pub async fn system_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let reply = state.remote.get_system_info().await;
    if reply.success {
        return Json(reply.data);
    }

    warn!(status_code = reply.status_code, "serving local system info fallback");
    Json(json!({
        "success": true,
        "message": "System info retrieved successfully (local fallback)",
        "data": {
            "server_status": "online",
            "server_time": now_rfc3339(),
            "app_update": {
                "latest_version": env!("CARGO_PKG_VERSION"),
                "current_version": env!("CARGO_PKG_VERSION"),
                "update_available": false,
                "force_update": false,
                "update_url": Value::Null,
                "changelog": Value::Null,
            },
            "maintenance": {
                "scheduled": false,
                "message": Value::Null,
            }
        }
    }))
}
