use std::future::Future;
use std::net::TcpListener;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tokio::sync::watch;

use crate::api::auth::require_token;
use crate::api::handlers::{
    handle_get_task, handle_health, handle_list_tasks, handle_parse, handle_parse_async,
    handle_parse_url, handle_root, handle_version, AppState,
};
use crate::gateway::Gateway;
use crate::task::BackgroundScheduler;

/// Slack for multipart framing and form fields on top of the file limit.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

pub struct GatewayServer {
    gateway: Arc<Gateway>,
    scheduler: BackgroundScheduler,
}

impl GatewayServer {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        let scheduler = BackgroundScheduler::new(gateway.clone());
        Self { gateway, scheduler }
    }

    pub fn router(&self) -> Router {
        let state = AppState {
            gateway: self.gateway.clone(),
            scheduler: self.scheduler.clone(),
        };
        let body_limit = self
            .gateway
            .config()
            .max_file_size_bytes()
            .saturating_add(FORM_OVERHEAD_BYTES);

        let protected = Router::new()
            .route("/parse", post(handle_parse))
            .route("/parse_url", post(handle_parse_url))
            .route("/parse_async", post(handle_parse_async))
            .route("/tasks", get(handle_list_tasks))
            .route("/tasks/:task_id", get(handle_get_task))
            .route_layer(middleware::from_fn_with_state(state.clone(), require_token));

        Router::new()
            .route("/", get(handle_root))
            .route("/health", get(handle_health))
            .route("/version", get(handle_version))
            .merge(protected)
            .layer(DefaultBodyLimit::max(body_limit))
            .with_state(state)
    }

    pub fn bind(addr: &str) -> Result<TcpListener, String> {
        let listener = TcpListener::bind(addr).map_err(|err| format!("bind {}: {}", addr, err))?;
        listener.set_nonblocking(true).map_err(|err| err.to_string())?;
        Ok(listener)
    }

    /// Serves until `shutdown` resolves, then drains in-flight requests and
    /// stops the task sweeper.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), String>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let config = self.gateway.config();
        let addr = listener.local_addr().map_err(|err| err.to_string())?;
        let (stop_sweeper, sweeper_stopped) = watch::channel(false);
        let sweeper =
            self.scheduler
                .spawn_sweeper(config.sweep_interval, config.task_ttl(), sweeper_stopped);

        tracing::info!(
            "docgate listening on {} (capacity={}, mode={}, auth={})",
            addr,
            config.max_concurrent_requests,
            config.execution_mode,
            if config.auth_enabled() { "bearer" } else { "open" }
        );
        let app = self.router();
        let served = match axum::Server::from_tcp(listener) {
            Ok(builder) => builder
                .serve(app.into_make_service())
                .with_graceful_shutdown(shutdown)
                .await
                .map_err(|err| err.to_string()),
            Err(err) => Err(err.to_string()),
        };

        if stop_sweeper.send(true).is_err() {
            tracing::debug!("task sweeper already gone");
        }
        if let Err(err) = sweeper.await {
            tracing::error!("task sweeper ended abnormally: {}", err);
        }
        tracing::info!("docgate stopped");
        served
    }
}
