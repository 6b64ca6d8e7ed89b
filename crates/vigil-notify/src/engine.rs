use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use vigil_domain::{Check, Host, NotificationConfig, Pair, StateChange};

use crate::alert::{AlertBook, Notification};
use crate::effective;
use crate::error::NotifyError;
use crate::quiet_hours::is_quiet;
use crate::template::{render, DEFAULT_BODY_TEMPLATE, DEFAULT_TITLE_TEMPLATE};
use crate::throttle::Throttle;
use crate::transport::{PushMessage, PushTransport};

/// Ties the effective-settings overlay, sent-alert bookkeeping, quiet hours,
/// throttling, and the push transport into one entry point for the worker
/// pool's `StateChange` stream and the maintenance loop's realert ticks.
///
/// `config` is a plain `RwLock`, not a live-mutable map — a reload swaps the
/// whole value in one assignment, never mutates a field in place.
pub struct NotificationEngine {
    config: RwLock<NotificationConfig>,
    book: Arc<AlertBook>,
    throttle: Throttle,
    transport: Arc<dyn PushTransport>,
}

impl NotificationEngine {
    /// `book` is shared with the API layer so `/alerts` observes the same
    /// sent-alert bookkeeping this engine updates — the engine never owns
    /// a private copy of it.
    pub fn new(config: NotificationConfig, book: Arc<AlertBook>, transport: Arc<dyn PushTransport>) -> Self {
        Self { config: RwLock::new(config), book, throttle: Throttle::new(), transport }
    }

    pub fn reload(&self, config: NotificationConfig) {
        *self.config.write().expect("notification config lock poisoned") = config;
    }

    pub fn book(&self) -> &Arc<AlertBook> {
        &self.book
    }

    /// Folds one reported-state transition into the realert/recovery
    /// decision, then applies quiet hours and throttling as outer filters
    /// before actually sending.
    pub async fn on_state_change(
        &self,
        change: &StateChange,
        host: &Host,
        check: &Check,
    ) -> Result<(), NotifyError> {
        let config = self.config.read().expect("notification config lock poisoned").clone();
        let settings = effective::resolve(&config, host, check)?;

        let Some(notification) = self.book.on_transition(&change.pair, change.current, &settings, change.at)
        else {
            return Ok(());
        };

        self.dispatch(notification, change, host, check, &config, &settings).await
    }

    /// Polled by the maintenance loop for pairs that remain unresolved
    /// between transitions; fires a realert once `realert_interval` has
    /// elapsed, up to `max_realerts` total sends.
    pub async fn realert_tick(
        &self,
        pair: &Pair,
        host: &Host,
        check: &Check,
        now: DateTime<Utc>,
    ) -> Result<(), NotifyError> {
        let config = self.config.read().expect("notification config lock poisoned").clone();
        let settings = effective::resolve(&config, host, check)?;

        let Some(notification) = self.book.maybe_realert(pair, &settings, now) else {
            return Ok(());
        };

        let record = self.book.get(pair).expect("record must exist after a fired realert");
        let change = StateChange {
            pair: pair.clone(),
            previous: record.severity,
            current: record.severity,
            output: String::new(),
            soft_fail: false,
            is_realert: true,
            at: now,
        };
        self.dispatch(notification, &change, host, check, &config, &settings).await
    }

    async fn dispatch(
        &self,
        notification: Notification,
        change: &StateChange,
        host: &Host,
        check: &Check,
        config: &NotificationConfig,
        settings: &effective::ResolvedSettings,
    ) -> Result<(), NotifyError> {
        if let Some(quiet_hours) = &settings.quiet_hours {
            if is_quiet(quiet_hours, change.at) {
                tracing::debug!(pair = %change.pair, "notification suppressed by quiet hours");
                return Ok(());
            }
        }

        // Recoveries bypass throttling — a resolve should never be dropped
        // for arriving in a busy window, and shouldn't consume a slot a
        // pending problem notification may need.
        if notification != Notification::Recovery
            && !self.throttle.allow(config.throttle.as_ref(), &change.pair.host_id, change.at)
        {
            tracing::debug!(pair = %change.pair, "notification suppressed by throttle");
            return Ok(());
        }

        let state_label = |code: vigil_domain::ExitCode| match notification {
            Notification::Recovery => "OK".to_string(),
            _ => code.state_name().to_uppercase(),
        };

        let mut vars = HashMap::new();
        vars.insert("host", host.name.clone());
        vars.insert("check", check.name.clone());
        vars.insert("state", state_label(change.current));
        vars.insert("previous_state", change.previous.state_name().to_uppercase());
        vars.insert("output", change.output.clone());
        vars.insert("kind", format!("{notification:?}"));

        let title_template = config.title_template.as_deref().unwrap_or(DEFAULT_TITLE_TEMPLATE);
        let body_template = config.body_template.as_deref().unwrap_or(DEFAULT_BODY_TEMPLATE);
        let title = render(title_template, &vars);
        let body = render(body_template, &vars);

        self.transport.send(&PushMessage { title: &title, body: &body }).await
    }
}
