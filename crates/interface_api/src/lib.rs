//! HTTP API Layer
//!
//! REST surface of the member import wizard, built on Axum.
//!
//! # Architecture
//!
//! - **Registry**: running wizards, one mutex per session
//! - **Handlers**: one per wizard operation, plus health checks
//! - **Middleware**: request tracing and audit logging
//! - **DTOs**: request/response bodies not covered by the session snapshot
//! - **Error Handling**: `ImportError` mapped to HTTP status codes
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::create_router;
//!
//! let app = create_router(ports, import_config, api_config);
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod handlers;
pub mod dto;
pub mod registry;

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use domain_import::{ImportConfig, ImportPorts};

use crate::config::ApiConfig;
use crate::handlers::{health, imports};
use crate::middleware::audit_middleware;
use crate::registry::SessionRegistry;

/// Headroom on top of the file limit for multipart framing
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionRegistry,
    pub ports: ImportPorts,
    pub import_config: ImportConfig,
    pub config: ApiConfig,
}

/// Creates the main API router
pub fn create_router(ports: ImportPorts, import_config: ImportConfig, config: ApiConfig) -> Router {
    let body_limit = import_config.max_file_bytes + MULTIPART_OVERHEAD;
    let state = AppState {
        sessions: SessionRegistry::new(),
        ports,
        import_config,
        config,
    };

    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let import_routes = Router::new()
        .route("/", post(imports::create_session))
        .route("/:id", get(imports::get_session).delete(imports::delete_session))
        .route(
            "/:id/slots/:role",
            put(imports::upload_file).delete(imports::remove_file),
        )
        .route("/:id/advance", post(imports::advance))
        .route("/:id/back", post(imports::go_back))
        .route("/:id/iban", put(imports::set_bank_details))
        .route("/:id/calendar", get(imports::calendar))
        .route("/:id/memberships", get(imports::membership_options))
        .route("/:id/membership", post(imports::select_membership))
        .route("/:id/payment-groups", get(imports::payment_groups))
        .route("/:id/payment-group", post(imports::select_payment_group))
        .route("/:id/commit", post(imports::commit))
        .layer(DefaultBodyLimit::max(body_limit));

    let api_routes = Router::new()
        .nest("/imports", import_routes)
        .layer(axum_middleware::from_fn(audit_middleware));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
