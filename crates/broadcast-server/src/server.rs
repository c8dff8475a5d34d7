//! `BroadcastServer`: Axum HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use broadcast_core::RecipientOutcome;
use broadcast_dispatch::Dispatcher;
use metrics::counter;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::ServerConfig;
use crate::errors::ApiError;
use crate::form::SendForm;
use crate::health::{self, HealthResponse};
use crate::metrics::REQUESTS_REJECTED_TOTAL;
use crate::shutdown::ShutdownCoordinator;
use crate::upload::UploadStore;

/// Body of a successful cancel.
pub const CANCELLED_MESSAGE: &str = "Message sending has been canceled.";

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Campaign orchestrator.
    pub dispatcher: Dispatcher,
    /// Attachment storage.
    pub uploads: Arc<UploadStore>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// When the server started.
    pub start_time: Instant,
    /// Prometheus handle, when a recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

/// `200` body of `POST /send-message`.
#[derive(Debug, Serialize)]
pub struct SendResponse {
    /// Always `"success"`.
    pub status: &'static str,
    /// One outcome per recipient, in request order.
    pub results: Vec<RecipientOutcome>,
}

/// `200` body of `POST /cancel-send`.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Always `"success"`.
    pub status: &'static str,
    /// Human-readable confirmation.
    pub message: &'static str,
}

/// The broadcast HTTP server.
pub struct BroadcastServer {
    config: Arc<ServerConfig>,
    dispatcher: Dispatcher,
    uploads: Arc<UploadStore>,
    shutdown: Arc<ShutdownCoordinator>,
    metrics: Option<PrometheusHandle>,
    start_time: Instant,
}

impl BroadcastServer {
    /// Create a new server.
    pub fn new(config: ServerConfig, dispatcher: Dispatcher) -> Self {
        let uploads = UploadStore::new(config.upload_dir.clone(), config.upload_stem.clone());
        Self {
            config: Arc::new(config),
            dispatcher,
            uploads: Arc::new(uploads),
            shutdown: Arc::new(ShutdownCoordinator::new()),
            metrics: None,
            start_time: Instant::now(),
        }
    }

    /// Serve `/metrics` from `handle`.
    #[must_use]
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Build the Axum router with all routes.
    pub fn router(&self) -> Router {
        let state = AppState {
            dispatcher: self.dispatcher.clone(),
            uploads: Arc::clone(&self.uploads),
            config: Arc::clone(&self.config),
            start_time: self.start_time,
            metrics: self.metrics.clone(),
        };

        Router::new()
            .route("/send-message", post(send_message_handler))
            .route("/cancel-send", post(cancel_send_handler))
            .route("/qr", get(qr_handler))
            .route("/health", get(health_handler))
            .route("/metrics", get(metrics_handler))
            .with_state(state)
            .layer(DefaultBodyLimit::max(self.config.max_body_bytes))
            .layer(cors_layer(&self.config.allowed_origins))
            .layer(TraceLayer::new_for_http())
    }

    /// Bind and serve until the shutdown token is cancelled.
    ///
    /// Returns the bound address (useful with port `0`) and the serve task.
    pub async fn listen(&self) -> std::io::Result<(SocketAddr, JoinHandle<()>)> {
        let listener = TcpListener::bind(self.config.bind_addr()).await?;
        let addr = listener.local_addr()?;
        let router = self.router();
        let token = self.shutdown.token();

        let handle = tokio::spawn(async move {
            let serve = axum::serve(listener, router)
                .with_graceful_shutdown(async move { token.cancelled().await });
            if let Err(e) = serve.await {
                error!(error = %e, "http server failed");
            }
            info!("http server stopped");
        });

        info!(%addr, "broadcast server listening");
        Ok((addr, handle))
    }

    /// Campaign orchestrator.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Get the shutdown coordinator.
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.shutdown
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.is_empty() {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
}

// ── Handlers ────────────────────────────────────────────────────────

/// POST /send-message
async fn send_message_handler(
    State(state): State<AppState>,
    form: SendForm,
) -> Result<Json<SendResponse>, ApiError> {
    let (message, numbers, file) = form.into_campaign_input().inspect_err(|_| {
        counter!(REQUESTS_REJECTED_TOTAL, "reason" => "invalid_input").increment(1);
    })?;

    // Fast path only: the authoritative check is the slot claim below.
    if state.dispatcher.is_sending() {
        counter!(REQUESTS_REJECTED_TOTAL, "reason" => "busy").increment(1);
        return Err(ApiError::Busy);
    }

    let media = match file {
        Some(file) => Some(state.uploads.store(file).await?),
        None => None,
    };

    // Claims the active slot. Two requests racing past the check above have
    // both written the upload slot by now; the loser gets `Busy` here and the
    // winner may send the loser's attachment.
    let results = state
        .dispatcher
        .start_campaign(message, media, numbers)
        .await?;
    Ok(Json(SendResponse {
        status: "success",
        results,
    }))
}

/// POST /cancel-send
async fn cancel_send_handler(
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, ApiError> {
    if state.dispatcher.cancel_campaign() {
        Ok(Json(MessageResponse {
            status: "success",
            message: CANCELLED_MESSAGE,
        }))
    } else {
        Err(ApiError::NothingToCancel)
    }
}

/// GET /qr
async fn qr_handler(State(state): State<AppState>) -> Result<Response, ApiError> {
    match tokio::fs::read(&state.config.qr_path).await {
        Ok(bytes) => Ok(([(CONTENT_TYPE, "image/png")], bytes).into_response()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ApiError::NotFound("QR code not available".into()))
        }
        Err(e) => {
            error!(path = %state.config.qr_path.display(), error = %e, "cannot read QR image");
            Err(ApiError::Internal("Error reading QR code".into()))
        }
    }
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(health::health_check(
        state.start_time,
        state.dispatcher.is_sending(),
    ))
}

/// GET /metrics
async fn metrics_handler(State(state): State<AppState>) -> Result<Response, ApiError> {
    let handle = state
        .metrics
        .as_ref()
        .ok_or_else(|| ApiError::NotFound("Metrics are not enabled".into()))?;
    Ok((
        [(CONTENT_TYPE, "text/plain; version=0.0.4")],
        crate::metrics::render(handle),
    )
        .into_response())
}
