use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use tokio::sync::broadcast;
use vigil_domain::{Configuration, StateChange};
use vigil_notify::{AlertBook, NotificationEngine};
use vigil_scheduler::Scheduler;
use vigil_state::Tracker;
use vigil_store::Store;

/// Shared handles every handler needs. Cloning is cheap — every field is an
/// `Arc` (or, for `broadcast::Sender`, itself a cheap-to-clone handle).
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub tracker: Arc<Tracker>,
    pub scheduler: Arc<Scheduler>,
    pub alert_book: Arc<AlertBook>,
    pub notification_engine: Arc<NotificationEngine>,
    pub config: Arc<RwLock<Configuration>>,
    pub config_path: Arc<PathBuf>,
    pub auth_token: Arc<String>,
    pub status_tx: broadcast::Sender<StateChange>,
}
