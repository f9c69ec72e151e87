//! Udhaar Ledger server
//!
//! HTTP API for recording informal loans between shopkeepers and their
//! partners, settling them through a ledger contract and minting a repayment
//! achievement NFT.

use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

use udhaar_ledger::config::{Config, StoreBackend};
use udhaar_ledger::middleware::RateLimiter;
use udhaar_ledger::routes;
use udhaar_ledger::state::{AppState, ChainContracts};
use udhaar_ledger::store::{LedgerStore, MemoryLedgerStore, PgLedgerStore};
use udhaar_ledger::db;

/// Buckets untouched for this long are dropped
const RATE_LIMIT_IDLE: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!(environment = config.environment.as_str(), "Starting Udhaar Ledger");

    let store: Arc<dyn LedgerStore> = match config.store_backend {
        StoreBackend::Postgres => {
            let pool = db::create_pool(&config).await?;
            db::run_migrations(&pool).await?;
            Arc::new(PgLedgerStore::new(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Arc::new(MemoryLedgerStore::new())
        }
    };

    let contracts = ChainContracts::from_config(&config);
    if contracts.achievements.is_none() {
        tracing::warn!("NFT contract not configured; repayments will not mint achievements");
    }
    if contracts.ledger.is_none() {
        tracing::warn!("Loan ledger contract not configured; on-chain reads are disabled");
    }

    let app_state = AppState::new(&config, store, contracts);

    let rate_limiter = RateLimiter::new(config.rate_limit_rps);
    let evictor = rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(RATE_LIMIT_IDLE);
        loop {
            interval.tick().await;
            evictor.evict_idle(RATE_LIMIT_IDLE).await;
        }
    });

    let app = routes::build_router(app_state, &config, rate_limiter);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check at http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
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
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
