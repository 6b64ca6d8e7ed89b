use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;

use crate::error::ApiError;
use crate::state::AppState;

/// Renders a handful of gauges in the Prometheus text exposition format.
///
/// No counter instrumentation is threaded through the worker pool or
/// notification engine yet — this reports point-in-time state computed from
/// what the API already has on hand (store contents, scheduler queue,
/// open alerts), which is enough to watch the daemon from the outside
/// without pulling in a full `prometheus` crate dependency.
pub async fn metrics(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let hosts = state.store.list_hosts().await?;
    let checks = state.store.list_checks().await?;
    let scheduled_pairs = state.scheduler.len();

    let mut open_alerts = 0u64;
    for host in &hosts {
        for check in &checks {
            if !check.hosts.contains(&host.id) {
                continue;
            }
            let pair = vigil_domain::Pair::new(host.id.clone(), check.id.clone());
            if let Some(record) = state.alert_book.get(&pair) {
                if !record.resolved {
                    open_alerts += 1;
                }
            }
        }
    }

    let body = format!(
        "# HELP vigil_hosts Number of configured hosts.\n\
         # TYPE vigil_hosts gauge\n\
         vigil_hosts {hosts_len}\n\
         # HELP vigil_checks Number of configured checks.\n\
         # TYPE vigil_checks gauge\n\
         vigil_checks {checks_len}\n\
         # HELP vigil_scheduled_pairs Number of (host, check) pairs currently scheduled.\n\
         # TYPE vigil_scheduled_pairs gauge\n\
         vigil_scheduled_pairs {scheduled_pairs}\n\
         # HELP vigil_open_alerts Number of unresolved alerts.\n\
         # TYPE vigil_open_alerts gauge\n\
         vigil_open_alerts {open_alerts}\n",
        hosts_len = hosts.len(),
        checks_len = checks.len(),
    );

    Ok(([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body))
}
