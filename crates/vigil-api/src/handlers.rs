use std::collections::HashMap;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;
use vigil_domain::{CheckId, ExitCode, Host, HostId, Pair, Status};

use crate::error::ApiError;
use crate::state::AppState;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

// ── Hosts ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct HostSummary {
    #[serde(flatten)]
    pub host: Host,
    pub aggregated_state: ExitCode,
}

/// Worst-severity-wins ordering for rolling several check results up into one
/// host-level state: CRITICAL outranks WARNING, which outranks UNKNOWN,
/// which outranks OK.
fn severity_rank(code: ExitCode) -> u8 {
    match code {
        ExitCode::CRITICAL => 3,
        ExitCode::WARNING => 2,
        ExitCode::UNKNOWN => 1,
        _ => 0,
    }
}

pub async fn list_hosts(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let hosts = state.store.list_hosts().await?;
    let statuses = state.store.list_statuses().await?;

    let mut worst: HashMap<HostId, ExitCode> = HashMap::new();
    for status in &statuses {
        let entry = worst.entry(status.host_id.clone()).or_insert(ExitCode::OK);
        if severity_rank(status.exit_code) > severity_rank(*entry) {
            *entry = status.exit_code;
        }
    }

    let summaries: Vec<HostSummary> = hosts
        .into_iter()
        .map(|host| {
            let aggregated_state = worst.get(&host.id).copied().unwrap_or(ExitCode::OK);
            HostSummary { host, aggregated_state }
        })
        .collect();

    Ok(Json(json!(summaries)))
}

// ── Status ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub host_id: Option<String>,
    pub check_id: Option<String>,
}

pub async fn list_status(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Value>, ApiError> {
    let statuses: Vec<Status> = state
        .store
        .list_statuses()
        .await?
        .into_iter()
        .filter(|s| query.host_id.as_deref().map_or(true, |id| s.host_id.as_str() == id))
        .filter(|s| query.check_id.as_deref().map_or(true, |id| s.check_id.as_str() == id))
        .collect();
    Ok(Json(json!(statuses)))
}

// ── History ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub host_id: String,
    pub check_id: String,
    pub since: Option<DateTime<Utc>>,
    #[serde(default = "default_history_limit")]
    pub limit: u32,
}

fn default_history_limit() -> u32 {
    100
}

pub async fn list_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Value>, ApiError> {
    let pair = Pair::new(HostId::new(query.host_id), CheckId::new(query.check_id));
    let entries = state.store.list_history(&pair, query.since, query.limit).await?;
    Ok(Json(json!(entries)))
}

// ── Alerts ────────────────────────────────────────────────────────────────────

pub async fn list_alerts(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let hosts = state.store.list_hosts().await?;
    let checks = state.store.list_checks().await?;

    let mut alerts = Vec::new();
    for host in &hosts {
        for check in &checks {
            if !check.hosts.contains(&host.id) {
                continue;
            }
            let pair = Pair::new(host.id.clone(), check.id.clone());
            if let Some(record) = state.alert_book.get(&pair) {
                if !record.resolved {
                    alerts.push(json!({
                        "host_id": host.id,
                        "check_id": check.id,
                        "record": record,
                    }));
                }
            }
        }
    }
    Ok(Json(json!(alerts)))
}

// ── Reload ────────────────────────────────────────────────────────────────────

pub async fn post_reload(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let path = state.config_path.as_path();
    let new_config = vigil_config::load(path)?;
    let purge = new_config.monitoring.purge_on_reload;

    let report = vigil_reconciler::reconcile(
        &new_config,
        &*state.store,
        &state.tracker,
        &state.scheduler,
        purge,
        Utc::now(),
    )
    .await?;

    state.notification_engine.reload(new_config.notification.clone());
    *state.config.write().expect("config lock poisoned") = new_config;
    Ok(Json(json!({ "changes": report.changes.len() })))
}

// ── Purge ─────────────────────────────────────────────────────────────────────

/// Forces an orphan purge against the currently-loaded configuration,
/// regardless of `purge_on_reload` — an explicit operator action always
/// purges.
pub async fn delete_purge(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let config = state.config.read().expect("config lock poisoned").clone();
    let report = vigil_reconciler::reconcile(
        &config,
        &*state.store,
        &state.tracker,
        &state.scheduler,
        true,
        Utc::now(),
    )
    .await?;
    Ok(Json(json!({ "purged": report.orphaned_pairs().count() })))
}

// ── WebSocket ─────────────────────────────────────────────────────────────────

pub async fn ws_status(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state))
}

async fn handle_ws(mut socket: WebSocket, state: AppState) {
    let mut rx = state.status_tx.subscribe();
    loop {
        match rx.recv().await {
            Ok(change) => {
                let event = json!({ "event": "status_update", "data": change });
                if socket.send(Message::Text(event.to_string())).await.is_err() {
                    return;
                }
            }
            Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "websocket client lagged behind status updates");
            }
            Err(tokio::sync::broadcast::error::RecvError::Closed) => return,
        }
    }
}
