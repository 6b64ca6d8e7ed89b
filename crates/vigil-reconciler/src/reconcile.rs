use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use vigil_domain::{Check, CheckId, Configuration, Host, HostId, Pair};
use vigil_graph::validate;
use vigil_scheduler::Scheduler;
use vigil_state::Tracker;
use vigil_store::Store;

use crate::error::ReconcileError;
use crate::report::{Change, ReconcileReport};

/// Loads the desired host/check set from `config`, diffs it against the
/// store's actual records, and applies the difference: upserts new/changed
/// hosts and checks, schedules newly-valid pairs, and disables pairs that no
/// longer resolve.
///
/// `purge_orphans` gates whether an orphaned pair's persisted status and
/// history are deleted outright (per `monitoring.purge_on_startup` /
/// `purge_on_reload`) — scheduling for an orphan is always stopped
/// regardless, since there is no longer a host/check to run it against.
pub async fn reconcile(
    config: &Configuration,
    store: &dyn Store,
    tracker: &Tracker,
    scheduler: &Scheduler,
    purge_orphans: bool,
    now: DateTime<Utc>,
) -> Result<ReconcileReport, ReconcileError> {
    let resolved = validate(&config.hosts, &config.checks)?;
    let mut report = ReconcileReport::new();

    sync_hosts(config, store, &mut report).await?;
    sync_checks(config, store, &mut report).await?;

    let desired_host_ids: HashSet<&HostId> = config.hosts.iter().map(|h| &h.id).collect();
    let desired_check_ids: HashSet<&CheckId> = config.checks.iter().map(|c| &c.id).collect();
    let checks_by_id: HashMap<&CheckId, &Check> = config.checks.iter().map(|c| (&c.id, c)).collect();

    let actual_statuses = store.list_statuses().await?;
    let mut known_pairs: HashSet<Pair> = actual_statuses
        .iter()
        .map(|s| Pair::new(s.host_id.clone(), s.check_id.clone()))
        .collect();
    known_pairs.extend(resolved.valid_pairs.iter().cloned());

    for pair in &known_pairs {
        let still_valid = resolved.valid_pairs.contains(pair)
            && desired_host_ids.contains(&pair.host_id)
            && desired_check_ids.contains(&pair.check_id);

        if still_valid {
            if !scheduler.contains(pair) {
                let interval = checks_by_id
                    .get(&pair.check_id)
                    .map(|c| c.intervals.ok)
                    .unwrap_or(std::time::Duration::from_secs(300));
                scheduler.enable(pair.clone(), now, interval);
                report.push(Change::PairScheduled(pair.clone()));
            }
        } else {
            scheduler.disable(pair);
            report.push(Change::PairOrphaned(pair.clone()));

            if purge_orphans {
                store.delete_status(pair).await?;
                store.delete_history(pair).await?;
                debug!(%pair, "purged orphaned status and history");
            } else {
                warn!(%pair, "pair orphaned but history retained (purge disabled)");
            }
        }
    }

    tracker.retain(|pair| resolved.valid_pairs.contains(pair));

    info!(changes = report.changes.len(), "reconcile complete");
    Ok(report)
}

async fn sync_hosts(
    config: &Configuration,
    store: &dyn Store,
    report: &mut ReconcileReport,
) -> Result<(), ReconcileError> {
    let actual: HashMap<HostId, Host> =
        store.list_hosts().await?.into_iter().map(|h| (h.id.clone(), h)).collect();
    let desired_ids: HashSet<&HostId> = config.hosts.iter().map(|h| &h.id).collect();

    for host in &config.hosts {
        let needs_upsert = match actual.get(&host.id) {
            Some(existing) => host_content_differs(host, existing),
            None => true,
        };
        if needs_upsert {
            store.upsert_host(host).await?;
            report.push(Change::HostUpserted(host.id.clone()));
        }
    }

    for host_id in actual.keys() {
        if !desired_ids.contains(host_id) {
            store.delete_host(host_id).await?;
            report.push(Change::HostDeleted(host_id.clone()));
        }
    }

    Ok(())
}

async fn sync_checks(
    config: &Configuration,
    store: &dyn Store,
    report: &mut ReconcileReport,
) -> Result<(), ReconcileError> {
    let actual: HashMap<CheckId, Check> =
        store.list_checks().await?.into_iter().map(|c| (c.id.clone(), c)).collect();
    let desired_ids: HashSet<&CheckId> = config.checks.iter().map(|c| &c.id).collect();

    for check in &config.checks {
        let needs_upsert = match actual.get(&check.id) {
            Some(existing) => existing != check,
            None => true,
        };
        if needs_upsert {
            store.upsert_check(check).await?;
            report.push(Change::CheckUpserted(check.id.clone()));
        }
    }

    for check_id in actual.keys() {
        if !desired_ids.contains(check_id) {
            store.delete_check(check_id).await?;
            report.push(Change::CheckDeleted(check_id.clone()));
        }
    }

    Ok(())
}

/// Compares everything but the store-assigned timestamps — a freshly loaded
/// config entry always has `created_at`/`updated_at` set to `None`.
fn host_content_differs(desired: &Host, actual: &Host) -> bool {
    desired.name != actual.name
        || desired.display_name != actual.display_name
        || desired.ipv4 != actual.ipv4
        || desired.hostname != actual.hostname
        || desired.group != actual.group
        || desired.enabled != actual.enabled
        || desired.tags != actual.tags
}
