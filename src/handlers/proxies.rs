use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::auth::session::AuthUser;
use crate::core::error::ApiError;
use crate::core::state::AppState;
use crate::db::proxies::{ProxyQuery, TestOutcome};
use crate::models::proxy::ProxyInput;
use crate::models::response::Envelope;
use crate::proxy_tools::parser::parse_proxy_line;
use crate::proxy_tools::tester::TestReport;

#[derive(Debug, Deserialize)]
pub struct ProxyUpdateRequest {
    pub id: i64,
    pub data: ProxyInput,
}

#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    #[serde(default)]
    pub ids: Vec<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    #[serde(rename = "proxyText", default)]
    pub proxy_text: String,
    #[serde(default = "default_import_tags")]
    pub tags: Vec<String>,
}

fn default_import_tags() -> Vec<String> {
    vec!["Default".to_string()]
}

#[derive(Debug, Deserialize)]
pub struct SelectionRequest {
    #[serde(rename = "proxyIds", default)]
    pub proxy_ids: Vec<i64>,
}

/// POST /api/proxy/get-all
pub async fn get_all_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    query: Option<Json<ProxyQuery>>,
) -> Result<Json<Envelope>, ApiError> {
    let query = query.map(|Json(q)| q).unwrap_or_default();
    let page = state
        .store
        .list_proxies(user.id, &query)
        .map_err(ApiError::Internal)?;

    Ok(Json(Envelope::ok(
        "Proxies retrieved successfully",
        serde_json::to_value(page).map_err(|e| ApiError::Internal(e.into()))?,
    )))
}

/// POST /api/proxy/add
pub async fn add_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(input): Json<ProxyInput>,
) -> Result<Json<Envelope>, ApiError> {
    input.validate().map_err(ApiError::InvalidParameter)?;

    let proxy = state
        .store
        .add_proxy(user.id, &input)
        .map_err(ApiError::Internal)?;
    info!(user_id = user.id, proxy_id = proxy.id, "proxy added");

    Ok(Json(Envelope::ok(
        "Proxy added successfully",
        serde_json::to_value(proxy).map_err(|e| ApiError::Internal(e.into()))?,
    )))
}

/// POST /api/proxy/update
pub async fn update_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(req): Json<ProxyUpdateRequest>,
) -> Result<Json<Envelope>, ApiError> {
    req.data.validate().map_err(ApiError::InvalidParameter)?;

    let proxy = state
        .store
        .update_proxy(user.id, req.id, &req.data)
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::NotFound("Proxy not found".to_string()))?;

    Ok(Json(Envelope::ok(
        "Proxy updated successfully",
        serde_json::to_value(proxy).map_err(|e| ApiError::Internal(e.into()))?,
    )))
}

/// POST /api/proxy/delete-multiple
pub async fn delete_multiple_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(req): Json<DeleteRequest>,
) -> Result<Json<Envelope>, ApiError> {
    let deleted = state
        .store
        .delete_proxies(user.id, &req.ids)
        .map_err(ApiError::Internal)?;
    info!(user_id = user.id, deleted, "proxies deleted");

    Ok(Json(Envelope::ok(
        "Proxies deleted successfully",
        json!({"deleted": deleted}),
    )))
}

/// POST /api/proxy/import
///
/// Parses one proxy per line. Unparseable lines are collected and
/// reported without aborting the rest of the batch.
pub async fn import_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(req): Json<ImportRequest>,
) -> Result<Json<Envelope>, ApiError> {
    let mut imported = Vec::new();
    let mut errors = Vec::new();

    for line in req.proxy_text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let Some(mut input) = parse_proxy_line(line) else {
            errors.push(format!("{line}: Invalid format"));
            continue;
        };
        input.tags = Some(req.tags.clone());

        if let Err(message) = input.validate() {
            errors.push(format!("{line}: {message}"));
            continue;
        }
        match state.store.add_proxy(user.id, &input) {
            Ok(proxy) => imported.push(proxy),
            Err(e) => errors.push(format!("{line}: {e}")),
        }
    }

    info!(
        user_id = user.id,
        imported = imported.len(),
        failed = errors.len(),
        "proxy import finished"
    );

    Ok(Json(Envelope::ok(
        "Import completed",
        json!({
            "imported": imported.len(),
            "errors": errors.len(),
            "error_details": errors,
            "proxies": imported,
        }),
    )))
}

/// POST /api/proxy/test
///
/// Probes an ad-hoc proxy without touching stored records.
pub async fn test_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(_user): AuthUser,
    Json(target): Json<ProxyInput>,
) -> Result<Json<TestReport>, ApiError> {
    target.validate().map_err(ApiError::InvalidParameter)?;
    Ok(Json(state.proxy_tester.probe(&target).await))
}

/// POST /api/proxy/test-multiple
///
/// Probes stored proxies concurrently and persists each outcome.
pub async fn test_multiple_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(req): Json<SelectionRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let proxies = state
        .store
        .get_proxies_by_ids(user.id, &req.proxy_ids)
        .map_err(ApiError::Internal)?;
    if proxies.is_empty() {
        return Ok(Json(json!({"success": false, "message": "No proxies found"})));
    }

    let targets: Vec<(i64, ProxyInput)> = proxies
        .iter()
        .map(|p| {
            (
                p.id,
                ProxyInput {
                    host: p.host.clone(),
                    port: p.port,
                    username: p.username.clone(),
                    password: p.password.clone(),
                    scheme: p.scheme.clone(),
                    name: None,
                    tags: None,
                },
            )
        })
        .collect();

    let reports = Arc::clone(&state.proxy_tester).probe_many(targets).await;

    let mut results = Vec::with_capacity(reports.len());
    let mut live = 0usize;
    for (proxy_id, report) in &reports {
        state
            .store
            .record_test_result(
                *proxy_id,
                &TestOutcome {
                    live: report.success,
                    response_time_ms: report.response_time.map(|ms| ms as f64),
                    public_ip: report.public_ip.clone(),
                },
            )
            .map_err(ApiError::Internal)?;

        if report.success {
            live += 1;
        }
        let proxy = proxies.iter().find(|p| p.id == *proxy_id);
        let mut entry = serde_json::to_value(report).map_err(|e| ApiError::Internal(e.into()))?;
        if let (Some(proxy), Some(obj)) = (proxy, entry.as_object_mut()) {
            obj.insert("id".to_string(), json!(proxy.id));
            obj.insert("host".to_string(), json!(proxy.host));
            obj.insert("port".to_string(), json!(proxy.port));
        }
        results.push(entry);
    }

    let total = results.len();
    Ok(Json(json!({
        "success": true,
        "data": {
            "results": results,
            "summary": {
                "total": total,
                "live": live,
                "dead": total - live,
            }
        }
    })))
}

/// POST /api/proxy/copy-selected
///
/// Renders the selected proxies as one URL per line for the clipboard.
pub async fn copy_selected_handler(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(req): Json<SelectionRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let proxies = state
        .store
        .get_proxies_by_ids(user.id, &req.proxy_ids)
        .map_err(ApiError::Internal)?;

    let lines: Vec<String> = proxies.iter().map(|p| p.as_url_line()).collect();
    Ok(Json(json!({"success": true, "data": lines.join("\n")})))
}
