use std::sync::Arc;

use chrono::Utc;
use vigil_domain::Configuration;
use vigil_state::Tracker;
use vigil_store::{RedbStore, Store};

use crate::args::Args;
use crate::error::CliError;

pub fn load_config(args: &Args) -> Result<Configuration, CliError> {
    Ok(vigil_config::load(&args.config)?)
}

/// `--validate`: load the configuration and resolve the host/check graph,
/// then exit without touching the store or starting anything.
pub async fn validate(args: &Args) -> Result<(), CliError> {
    let config = load_config(args)?;
    let resolved = vigil_graph::validate(&config.hosts, &config.checks)?;
    println!(
        "configuration valid: {} host(s), {} check(s), {} monitored pair(s)",
        resolved.known_hosts.len(),
        resolved.known_checks.len(),
        resolved.valid_pairs.len(),
    );
    Ok(())
}

/// `--migrate`: ensure the store's tables exist at the configured path.
pub async fn migrate(args: &Args) -> Result<(), CliError> {
    let config = load_config(args)?;
    vigil_store::migrate(&config.database.path)?;
    println!("store schema at {} is up to date", config.database.path.display());
    Ok(())
}

/// `--purge-alerts`: reconcile the store against the current configuration
/// with orphan purging forced on, regardless of `monitoring.purge_on_reload`.
pub async fn purge_alerts(args: &Args) -> Result<(), CliError> {
    let config = load_config(args)?;
    let store = RedbStore::open(&config.database.path)?;
    let tracker = Tracker::new();
    let scheduler = vigil_scheduler::Scheduler::new();

    let report = vigil_reconciler::reconcile(&config, &store, &tracker, &scheduler, true, Utc::now()).await?;
    let purged = report.orphaned_pairs().count();
    println!("purged {purged} orphaned pair(s)");
    Ok(())
}

/// `--maintenance`: run one history-retention sweep and one compaction pass.
pub async fn maintenance(args: &Args) -> Result<(), CliError> {
    let config = load_config(args)?;
    let store: Arc<dyn Store> = Arc::new(RedbStore::open(&config.database.path)?);

    let cutoff = Utc::now()
        - chrono::Duration::from_std(config.monitoring.retention_horizon).unwrap_or(chrono::Duration::zero());
    let removed = store.delete_history_older_than(cutoff).await?;
    store.compact().await?;
    println!("removed {removed} history entr(ies) older than {cutoff}, store compacted");
    Ok(())
}
