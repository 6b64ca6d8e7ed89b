use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use axum::middleware;
use axum::routing::{delete, get, post};
use axum::Router;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;
use vigil_domain::{Configuration, StateChange};
use vigil_notify::{AlertBook, NotificationEngine};
use vigil_scheduler::Scheduler;
use vigil_state::Tracker;
use vigil_store::Store;

use crate::auth::require_bearer_token;
use crate::handlers;
use crate::metrics;
use crate::state::AppState;

pub fn build_app(
    store: Arc<dyn Store>,
    tracker: Arc<Tracker>,
    scheduler: Arc<Scheduler>,
    alert_book: Arc<AlertBook>,
    notification_engine: Arc<NotificationEngine>,
    config: Configuration,
    config_path: PathBuf,
    auth_token: String,
    status_tx: broadcast::Sender<StateChange>,
) -> Router {
    let state = AppState {
        store,
        tracker,
        scheduler,
        alert_book,
        notification_engine,
        config: Arc::new(RwLock::new(config)),
        config_path: Arc::new(config_path),
        auth_token: Arc::new(auth_token),
        status_tx,
    };

    Router::new()
        .route("/health", get(handlers::health))
        .route("/metrics", get(metrics::metrics))
        .route("/hosts", get(handlers::list_hosts))
        .route("/status", get(handlers::list_status))
        .route("/history", get(handlers::list_history))
        .route("/alerts", get(handlers::list_alerts))
        .route("/reload", post(handlers::post_reload))
        .route("/purge", delete(handlers::delete_purge))
        .route("/ws", get(handlers::ws_status))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer_token))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::util::ServiceExt;
    use vigil_domain::{
        DatabaseConfig, IncludeConfig, LoggingConfig, MonitoringConfig, NotificationConfig,
        PrometheusConfig, PushTransportConfig, ServerConfig, WebConfig,
    };
    use vigil_notify::HttpPushTransport;
    use vigil_store::InMemoryStore;

    const TEST_TOKEN: &str = "test-token";

    fn empty_config() -> Configuration {
        Configuration {
            server: ServerConfig::default(),
            web: WebConfig::default(),
            database: DatabaseConfig::default(),
            prometheus: PrometheusConfig::default(),
            monitoring: MonitoringConfig::default(),
            notification: NotificationConfig::default(),
            logging: LoggingConfig::default(),
            include: IncludeConfig::default(),
            hosts: vec![],
            checks: vec![],
        }
    }

    fn test_app() -> Router {
        let (tx, _rx) = broadcast::channel(16);
        let alert_book = Arc::new(AlertBook::new());
        let transport = Arc::new(HttpPushTransport::new(PushTransportConfig::default()));
        let engine = Arc::new(NotificationEngine::new(
            NotificationConfig::default(),
            alert_book.clone(),
            transport,
        ));
        build_app(
            Arc::new(InMemoryStore::new()),
            Arc::new(Tracker::new()),
            Scheduler::new(),
            alert_book,
            engine,
            empty_config(),
            PathBuf::from("vigil.yaml"),
            TEST_TOKEN.to_string(),
            tx,
        )
    }

    fn authed(req: axum::http::request::Builder) -> axum::http::request::Builder {
        req.header("Authorization", format!("Bearer {TEST_TOKEN}"))
    }

    #[tokio::test]
    async fn unauthenticated_request_returns_401() {
        let app = test_app();
        let resp = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn health_returns_200_when_authenticated() {
        let app = test_app();
        let resp = app
            .oneshot(authed(Request::builder().uri("/health")).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn hosts_empty_list_returns_200() {
        let app = test_app();
        let resp = app
            .oneshot(authed(Request::builder().uri("/hosts")).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn alerts_empty_list_returns_200() {
        let app = test_app();
        let resp = app
            .oneshot(authed(Request::builder().uri("/alerts")).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn history_requires_host_and_check_id() {
        let app = test_app();
        let resp = app
            .oneshot(authed(Request::builder().uri("/history")).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
