use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use domain::services::MatchSimulator;
use prono_api::app;
use prono_api::config::Config;
use prono_api::jobs::{JobScheduler, MatchPollerJob, MatchSimulationJob, PoolMetricsJob};
use prono_api::middleware::{init_metrics, logging::init_logging};
use prono_api::services::MatchFeedClient;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load()?;
    init_logging(&config.logging)?;
    init_metrics()?;

    info!("Starting League of Prono API v{}", env!("CARGO_PKG_VERSION"));

    let pool = persistence::db::create_pool(&config.database.pool_config()).await?;

    info!("Running database migrations...");
    persistence::db::run_migrations(&pool).await?;
    info!("Migrations completed");

    let match_feed = if config.match_feed.enabled {
        Some(Arc::new(MatchFeedClient::new(config.match_feed.clone())?))
    } else {
        None
    };

    let (state, router) = app::create_app(config.clone(), pool.clone(), match_feed);

    let mut scheduler = JobScheduler::new();
    scheduler.register(PoolMetricsJob::new(pool));
    scheduler.register(MatchPollerJob::new(
        state.matches.clone(),
        state.scoring.clone(),
        state.match_feed.clone(),
        config.jobs.match_poll_interval_secs,
    ));
    if config.jobs.simulation_enabled {
        let simulator = MatchSimulator::with_winning_score(config.jobs.simulation_winning_score)
            .context("invalid simulation settings")?;
        scheduler.register(MatchSimulationJob::new(
            state.matches.clone(),
            state.scoring.clone(),
            simulator,
            config.jobs.simulation_interval_secs,
            StdRng::from_entropy(),
        ));
    }
    scheduler.start();

    let addr = config.socket_addr()?;
    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown();
    scheduler
        .wait_for_shutdown(Duration::from_secs(config.jobs.shutdown_timeout_secs))
        .await;
    info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
