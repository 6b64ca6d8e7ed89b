use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use vigil_domain::StateChange;
use vigil_notify::{AlertBook, HttpPushTransport, NotificationEngine};
use vigil_reconciler::Maintenance;
use vigil_scheduler::{Scheduler, WorkerContext};
use vigil_state::Tracker;
use vigil_store::{RedbStore, Store};

use crate::args::Args;
use crate::commands::load_config;
use crate::error::CliError;
use crate::token;

const STATE_CHANGE_BUFFER: usize = 1024;
const JOB_BUFFER: usize = 256;

/// Brings up every long-running piece — scheduler, worker pool, maintenance,
/// notification engine, and the HTTP API — wires them together, and blocks
/// until Ctrl-C, then tears them down in order.
pub async fn run(args: &Args) -> Result<(), CliError> {
    let config = load_config(args)?;
    let resolved = vigil_graph::validate(&config.hosts, &config.checks)?;

    let store: Arc<dyn Store> = Arc::new(RedbStore::open(&config.database.path)?);
    let tracker = Arc::new(Tracker::new());
    let scheduler = Scheduler::new();

    let now = Utc::now();
    let report =
        vigil_reconciler::reconcile(&config, &*store, &tracker, &scheduler, config.monitoring.purge_on_startup, now)
            .await?;
    info!(changes = report.changes.len(), pairs = resolved.valid_pairs.len(), "startup reconcile complete");

    let monitoring = Arc::new(RwLock::new(config.monitoring.clone()));
    let probes = Arc::new(vigil_probe::default_registry());

    let (job_tx, job_rx) = mpsc::channel(JOB_BUFFER);
    let (state_tx, state_rx) = mpsc::channel(STATE_CHANGE_BUFFER);
    let (broadcast_tx, _) = broadcast::channel(STATE_CHANGE_BUFFER);

    let worker_ctx = Arc::new(WorkerContext {
        store: store.clone(),
        probes,
        tracker: tracker.clone(),
        scheduler: scheduler.clone(),
        monitoring,
        state_changes: state_tx,
    });

    let cancel = CancellationToken::new();

    let alert_book = Arc::new(AlertBook::new());
    let transport: Arc<dyn vigil_notify::PushTransport> =
        Arc::new(HttpPushTransport::new(config.notification.transport.clone()));
    let engine = Arc::new(NotificationEngine::new(
        config.notification.clone(),
        alert_book.clone(),
        transport,
    ));

    let dispatcher_handle = tokio::spawn(vigil_scheduler::dispatcher::run(scheduler.clone(), job_tx, cancel.clone()));
    let worker_handles = vigil_scheduler::worker::spawn(config.monitoring.workers, job_rx, worker_ctx);

    let fanout_handle = tokio::spawn(fan_out(store.clone(), engine.clone(), state_rx, broadcast_tx.clone()));
    let realert_handle = tokio::spawn(realert_loop(store.clone(), engine.clone(), alert_book.clone(), cancel.clone()));

    let maintenance = Maintenance::new(
        store.clone(),
        config.monitoring.cleanup_interval,
        config.monitoring.compact_interval,
        config.monitoring.retention_horizon,
    );
    let maintenance_handle = tokio::spawn(maintenance.run(cancel.clone()));

    let auth_token = token::resolve(args.auth_token.clone(), &config.database.path, args.rotate_token)?;
    let addr = format!("{}:{}", config.server.bind, config.server.port);
    let app = vigil_api::build_app(
        store.clone(),
        tracker.clone(),
        scheduler.clone(),
        alert_book.clone(),
        engine.clone(),
        config.clone(),
        args.config.clone(),
        auth_token,
        broadcast_tx,
    );

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| CliError::Other(anyhow::anyhow!("failed to bind {addr}: {e}")))?;
    info!(%addr, "vigil API server listening");

    let server_cancel = cancel.clone();
    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { server_cancel.cancelled().await })
            .await
    });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("shutdown signal received"),
        _ = cancel.cancelled() => {},
    }
    cancel.cancel();

    match server_handle.await {
        Ok(Err(e)) => error!(error = %e, "API server stopped with an error"),
        Err(e) => error!(error = %e, "API server task panicked"),
        Ok(Ok(())) => {}
    }
    dispatcher_handle.abort();
    for handle in worker_handles {
        handle.abort();
    }
    fanout_handle.abort();
    realert_handle.abort();
    if let Err(e) = maintenance_handle.await {
        if !e.is_cancelled() {
            error!(error = %e, "maintenance task panicked");
        }
    }

    Ok(())
}

/// Forwards every reported-state transition to the notification engine and
/// to any `/ws` subscribers, loading the host/check rows it needs along the
/// way. A missing host or check (deleted between the job running and this
/// task draining its result) just drops the event — there's nothing left to
/// notify about.
async fn fan_out(
    store: Arc<dyn Store>,
    engine: Arc<NotificationEngine>,
    mut state_rx: mpsc::Receiver<StateChange>,
    broadcast_tx: broadcast::Sender<StateChange>,
) {
    while let Some(change) = state_rx.recv().await {
        let _ = broadcast_tx.send(change.clone());

        let host = match store.get_host(&change.pair.host_id).await {
            Ok(Some(host)) => host,
            Ok(None) => continue,
            Err(e) => {
                error!(pair = %change.pair, error = %e, "failed to load host for notification");
                continue;
            }
        };
        let check = match store.get_check(&change.pair.check_id).await {
            Ok(Some(check)) => check,
            Ok(None) => continue,
            Err(e) => {
                error!(pair = %change.pair, error = %e, "failed to load check for notification");
                continue;
            }
        };

        if let Err(e) = engine.on_state_change(&change, &host, &check).await {
            warn!(pair = %change.pair, error = %e, "notification dispatch failed");
        }
    }
}

/// Polls every still-open alert once a second for a due realert, independent
/// of probe scheduling — an alert that never recovers keeps getting
/// realerted even if its check's interval is much longer.
const REALERT_POLL: Duration = Duration::from_secs(1);

async fn realert_loop(
    store: Arc<dyn Store>,
    engine: Arc<NotificationEngine>,
    alert_book: Arc<AlertBook>,
    cancel: CancellationToken,
) {
    let mut tick = tokio::time::interval(REALERT_POLL);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tick.tick() => {}
        }

        let now = Utc::now();
        for pair in alert_book.unresolved_pairs() {
            let host = match store.get_host(&pair.host_id).await {
                Ok(Some(host)) => host,
                _ => continue,
            };
            let check = match store.get_check(&pair.check_id).await {
                Ok(Some(check)) => check,
                _ => continue,
            };
            if let Err(e) = engine.realert_tick(&pair, &host, &check, now).await {
                warn!(pair = %pair, error = %e, "realert dispatch failed");
            }
        }
    }
}
