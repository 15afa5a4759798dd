use anyhow::Context;
use coursemart_api::app::create_app;
use coursemart_api::config::Config;
use coursemart_api::jobs::{JobScheduler, OtpCleanupJob, PoolMetricsJob, TransactionCleanupJob};
use coursemart_api::middleware::{init_logging, init_metrics};
use persistence::db::create_pool;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Arc::new(Config::load().context("failed to load configuration")?);
    init_logging(&config.logging);
    init_metrics();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting CourseMart API"
    );

    let pool = create_pool(&config.database_config())
        .await
        .context("failed to connect to database")?;

    sqlx::migrate!("../persistence/src/migrations")
        .run(&pool)
        .await
        .context("failed to run migrations")?;

    let mut scheduler = JobScheduler::new();
    scheduler.register(Arc::new(OtpCleanupJob::new(pool.clone())));
    scheduler.register(Arc::new(TransactionCleanupJob::new(
        pool.clone(),
        config.cleanup.transaction_retention_days,
    )));
    scheduler.register(Arc::new(PoolMetricsJob::new(pool.clone())));
    scheduler.start();

    let addr = config.socket_addr().context("invalid server address")?;
    let app = create_app(pool, config);

    tracing::info!(%addr, "Listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind listener")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    scheduler.shutdown();
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
