//! Member Import - API Server Binary
//!
//! Starts the HTTP API for the member import wizard.
//!
//! # Usage
//!
//! ```bash
//! # Run with default configuration
//! cargo run --bin member-import-api
//!
//! # Run with environment variables
//! API_PORT=8080 API_DATABASE_URL=postgres://... API_EXTRACTION_URL=http://extractor:8000 \
//!     cargo run --bin member-import-api
//! ```
//!
//! # Environment Variables
//!
//! * `API_HOST` - Server host (default: 0.0.0.0)
//! * `API_PORT` - Server port (default: 8080)
//! * `API_DATABASE_URL` - PostgreSQL connection string (`DATABASE_URL` is also read)
//! * `API_DB_MAX_CONNECTIONS`, `API_DB_ACQUIRE_TIMEOUT_SECS` - pool sizing (default: 10, 30)
//! * `API_EXTRACTION_URL` - Base URL of the extraction service
//! * `API_LOG_LEVEL` - Log level: trace, debug, info, warn, error (default: info)
//! * `IMPORT_EXTRACTION_TIMEOUT_SECS`, `IMPORT_MAX_FILE_BYTES`,
//!   `IMPORT_PROJECTION_MONTHS`, `IMPORT_CURRENCY` - wizard settings

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use domain_import::adapters::{HttpExtractionAdapter, HttpExtractionConfig};
use domain_import::{ImportConfig, ImportPorts};
use infra_db::{
    create_pool, run_migrations, PgImportSink, PgMembershipCatalog,
    PgPaymentGroupRegistry,
};
use interface_api::{config::ApiConfig, create_router};

/// Initializes logging, loads configuration, connects the adapters and
/// serves until Ctrl+C or SIGTERM.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let mut config = ApiConfig::from_env().context("invalid API_* configuration")?;
    if let Ok(url) = std::env::var("DATABASE_URL") {
        config.database_url = url;
    }
    let import_config = ImportConfig::from_env().context("invalid IMPORT_* configuration")?;

    init_tracing(&config.log_level);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        extraction_url = %config.extraction_url,
        "Starting member import API server"
    );

    let pool = create_pool(config.database_config())
        .await
        .context("cannot connect to database")?;
    run_migrations(&pool).await.context("cannot migrate database")?;

    let extraction = HttpExtractionAdapter::new(HttpExtractionConfig {
        base_url: config.extraction_url.clone(),
        timeout_secs: import_config.extraction_timeout_secs,
        ..Default::default()
    })
    .context("cannot build extraction client")?;

    let ports = ImportPorts {
        extraction: Arc::new(extraction),
        memberships: Arc::new(PgMembershipCatalog::new(pool.clone())),
        payment_groups: Arc::new(PgPaymentGroupRegistry::new(pool.clone())),
        sink: Arc::new(PgImportSink::new(pool)),
    };

    let app = create_router(ports, import_config, config.clone());

    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .context("invalid server address")?;

    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Installs the fmt subscriber; `RUST_LOG` wins over the configured level
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Waits for Ctrl+C or SIGTERM so in-flight requests can complete
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
