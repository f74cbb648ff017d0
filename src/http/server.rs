//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (CORS, tracing, limits, request ID, timeout)
//! - Keep limit and timeout rejections in the JSON error envelope
//! - Bind server to listener
//! - Stop gracefully when the shutdown signal fires

use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::blockchain::Ledger;
use crate::config::GatewayConfig;
use crate::functions::{CertificateService, DonationService, FunctionContext};
use crate::http::handlers;
use crate::http::middleware::{cors_middleware, error_envelope, CorsHeaders};
use crate::observability::RequestSpan;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub donations: DonationService,
    pub certificates: CertificateService,
    pub ledger: Arc<dyn Ledger>,
}

/// HTTP server for the gateway functions.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server around the given collaborators.
    pub fn new(ctx: FunctionContext) -> Self {
        let config = ctx.config.clone();
        let state = AppState {
            ledger: ctx.ledger.clone(),
            donations: DonationService::new(ctx.clone()),
            certificates: CertificateService::new(ctx),
        };

        let router = Self::build_router(&config, state);
        Self { router }
    }

    /// Function routes, mounted both at the root and under `/functions/v1`.
    fn function_routes() -> Router<AppState> {
        Router::new()
            .route(
                "/sendDonation",
                post(handlers::send_donation)
                    .options(handlers::preflight)
                    .fallback(handlers::method_not_allowed),
            )
            .route(
                "/mintCertificate",
                post(handlers::mint_certificate)
                    .options(handlers::preflight)
                    .fallback(handlers::method_not_allowed),
            )
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let cors = CorsHeaders::new(&config.security.allowed_origin);

        let layers = ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http().make_span_with(RequestSpan))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(middleware::from_fn_with_state(cors, cors_middleware))
            .layer(middleware::from_fn(error_envelope))
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)));

        Router::new()
            .merge(Self::function_routes())
            .nest("/functions/v1", Self::function_routes())
            .route("/health", get(handlers::health))
            .fallback(handlers::not_found)
            .with_state(state)
            .layer(layers)
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
