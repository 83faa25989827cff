//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router: adapter endpoint + origin fallback
//! - Apply the bot rewrite rules before routing
//! - Wire up middleware (tracing, timeout, request ID)
//! - Bind server to listener and shut down on signal

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware,
    response::Response,
    routing::any,
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::adapter::{AdapterSetupError, PrerenderAdapter};
use crate::config::validation::ValidationError;
use crate::config::GatewayConfig;
use crate::http::origin::{OriginError, OriginForwarder};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::render::{PrerenderServiceClient, RenderError, RenderingClient};
use crate::routing::{bot_rewrite, RewriteRules};

/// Errors while assembling the server from configuration.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("rendering client: {0}")]
    Render(#[from] RenderError),

    #[error("adapter: {0}")]
    Adapter(#[from] AdapterSetupError),

    #[error("config: {0}")]
    Config(#[from] ValidationError),

    #[error("origin: {0}")]
    Origin(#[from] OriginError),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub adapter: Arc<PrerenderAdapter>,
    pub origin: Arc<OriginForwarder>,
}

/// HTTP server for the prerender gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
}

impl HttpServer {
    /// Create a new HTTP server using the configured prerender service.
    pub fn new(config: GatewayConfig) -> Result<Self, ServerError> {
        let router = app(&config)?;
        Ok(Self { router, config })
    }

    /// Create a server around a caller-supplied rendering client.
    pub fn with_client(
        config: GatewayConfig,
        client: Arc<dyn RenderingClient>,
    ) -> Result<Self, ServerError> {
        let router = app_with_client(&config, client)?;
        Ok(Self { router, config })
    }

    /// Run the server until the shutdown channel fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            mount_path = %self.config.adapter.mount_path,
            origin = %self.config.origin.url,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

/// Build the router with the configured prerender service client.
pub fn app(config: &GatewayConfig) -> Result<Router, ServerError> {
    let client = PrerenderServiceClient::new(config.prerender.clone())?;
    app_with_client(config, Arc::new(client))
}

/// Build the router around any rendering client.
///
/// The rewrite middleware wraps an inner router, so a rewritten URI is
/// routed to the adapter rather than the route the request arrived on.
#[allow(deprecated)]
pub fn app_with_client(
    config: &GatewayConfig,
    client: Arc<dyn RenderingClient>,
) -> Result<Router, ServerError> {
    // Rejects mount paths the router cannot register.
    let rules = Arc::new(RewriteRules::from_config(
        &config.bots,
        &config.adapter,
        &config.fallback,
    )?);
    let adapter = PrerenderAdapter::new(config.adapter.clone(), &config.fallback, client)?;
    let origin = OriginForwarder::new(&config.origin)?;

    let state = AppState {
        adapter: Arc::new(adapter),
        origin: Arc::new(origin),
    };

    let routes = Router::new()
        .route(&config.adapter.mount_path, any(adapter_handler))
        .fallback(origin_handler)
        .with_state(state);

    Ok(Router::new()
        .fallback_service(routes)
        .layer(middleware::from_fn_with_state(rules, bot_rewrite))
        .layer(
            ServiceBuilder::new()
                .layer(set_request_id_layer())
                .layer(TraceLayer::new_for_http())
                .layer(propagate_request_id_layer())
                .layer(TimeoutLayer::new(Duration::from_secs(
                    config.timeouts.request_secs,
                ))),
        ))
}

async fn adapter_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    state.adapter.handle(request).await
}

async fn origin_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    state.origin.forward(request).await
}
