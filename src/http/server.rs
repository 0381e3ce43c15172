//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with all handlers
//! - Wire up middleware (request ID, tracing, timeout, metrics)
//! - Run the background health monitor alongside the server
//! - Close backends once the server has drained

use axum::{
    body::Body,
    extract::MatchedPath,
    http::Request,
    middleware::{self, Next},
    response::Response,
    routing::get,
    Router,
};
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::health::HealthMonitor;
use crate::http::handlers;
use crate::http::request::{make_request_span, MakeRequestUuidV4};
use crate::lifecycle::shutdown::wait_for;
use crate::lifecycle::AppContext;
use crate::observability::metrics;

/// HTTP server for the visit counter.
pub struct HttpServer {
    router: Router,
    context: AppContext,
}

impl HttpServer {
    pub fn new(context: AppContext) -> Self {
        let router = Self::build_router(context.clone());
        Self { router, context }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(context: AppContext) -> Router {
        let request_timeout = Duration::from_secs(context.config.timeouts.request_secs);

        Router::new()
            .route("/", get(handlers::home))
            .route("/api/count", get(handlers::count))
            .route("/api/stats", get(handlers::stats))
            .route("/api/config", get(handlers::app_config))
            .route("/api/secrets", get(handlers::secrets))
            .route("/health", get(handlers::health))
            .route_layer(middleware::from_fn(track_metrics))
            .with_state(context)
            .layer(TimeoutLayer::new(request_timeout))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    /// Serve until `shutdown` fires, then close the backends.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let monitor = HealthMonitor::new(
            self.context.health.clone(),
            self.context.config.health.clone(),
        );
        let monitor_task = tokio::spawn(monitor.run(shutdown.resubscribe()));

        axum::serve(listener, self.router)
            .with_graceful_shutdown(wait_for(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        if let Err(e) = monitor_task.await {
            tracing::warn!(error = %e, "Health monitor task failed");
        }
        self.context.close().await;
        Ok(())
    }
}

async fn track_metrics(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let response = next.run(request).await;
    metrics::record_request(&method, &route, response.status().as_u16(), start);
    response
}
