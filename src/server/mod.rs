//! HTTP transport for the viewer registry
//!
//! Thin axum layer: handlers translate JSON requests into
//! [`SessionRegistry`] calls and format the responses. One registry
//! instance is shared by every route and by the janitor.

pub mod cors;
pub mod error;
pub mod handlers;

pub use cors::OriginPolicy;
pub use error::ApiError;

use crate::config::Config;
use crate::error::{ViewerError, ViewerResult};
use crate::session::{Janitor, RegistryLimits, SessionRegistry};
use axum::extract::{DefaultBodyLimit, Request};
use axum::http::{header, HeaderValue};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// State shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SessionRegistry>,
    pub config: Arc<Config>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(registry: Arc<SessionRegistry>, config: Config) -> Self {
        Self {
            registry,
            config: Arc::new(config),
            started_at: Instant::now(),
        }
    }

    /// State with a fresh registry built from `config`
    pub fn from_config(config: Config) -> Self {
        let registry = Arc::new(SessionRegistry::new(RegistryLimits::from(&config.sessions)));
        Self::new(registry, config)
    }
}

/// Build the router with all routes and middleware
///
/// The debug endpoint is only routed when production mode is off.
pub fn router(state: AppState) -> Router {
    let mut api = Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/viewers", post(handlers::heartbeat).get(handlers::count))
        .route("/api/viewers/leave", post(handlers::leave))
        .route("/api/viewers/count", get(handlers::count));

    if !state.config.general.production {
        api = api.route("/api/debug/sessions", get(handlers::debug_sessions));
    }

    let config = state.config.clone();
    let app = api
        .fallback(handlers::not_found)
        .method_not_allowed_fallback(handlers::method_not_allowed)
        .with_state(state);

    with_middleware(app, &config)
}

/// Wrap routes in the middleware stack shared by every endpoint
fn with_middleware(app: Router, config: &Config) -> Router {
    let cors = OriginPolicy::new(&config.server.cors_origins).into_layer();

    app.layer(DefaultBodyLimit::max(config.server.body_limit_bytes))
        .layer(CatchPanicLayer::custom(error::panic_response))
        .layer(middleware::from_fn(security_headers))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Baseline hardening headers on every response
async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("no-referrer"),
    );

    response
}

/// Bind, start the janitor and serve until SIGINT/SIGTERM
pub async fn serve(config: Config) -> ViewerResult<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);

    let state = AppState::from_config(config);
    let config = state.config.clone();

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| ViewerError::Bind { addr, source })?;

    let janitor = Janitor::new(
        state.registry.clone(),
        Duration::from_millis(config.sessions.cleanup_interval_ms),
    )
    .start();

    let debug_mode = !config.general.production;
    info!("Live viewer API running on port {}", config.server.port);
    info!(
        "Debug mode: {}",
        if debug_mode { "ENABLED" } else { "DISABLED" }
    );
    info!("Session timeout: {}s", config.sessions.timeout_ms / 1000);
    info!("Cleanup interval: {}s", config.sessions.cleanup_interval_ms / 1000);
    if debug_mode {
        info!(
            "Debug endpoint: http://localhost:{}/api/debug/sessions",
            config.server.port
        );
    }

    let result = axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ViewerError::io("serving HTTP", e));

    janitor.abort();
    info!("Server stopped");
    result
}

/// Resolves on ctrl-c, or SIGTERM on unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("SIGINT received, shutting down gracefully"),
        _ = terminate => info!("SIGTERM received, shutting down gracefully"),
    }
}
