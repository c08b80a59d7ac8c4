//! # scenariod — scenario engine daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Initialize logging
//! - Initialize the `SQLite` connection pool, run migrations and warm the
//!   scenario cache
//! - Construct the outbound HTTP collaborators and the metrics registry
//! - Start the action dispatcher and the evaluator
//! - Build the axum router, bind to a TCP port and serve
//! - Handle graceful shutdown (SIGTERM/SIGINT), then drain the dispatcher
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use scenario_adapter_http_axum::state::AppState;
use scenario_adapter_metrics_prometheus::PrometheusMetrics;
use scenario_adapter_storage_sqlite_sqlx::SqliteScenarioListRepository;
use scenario_app::dispatcher::Dispatcher;
use scenario_app::evaluator::Evaluator;
use scenario_app::services::scenario_store::ScenarioStore;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    // Database
    let db = scenario_adapter_storage_sqlite_sqlx::Config {
        database_url: config.database_url().to_string(),
    }
    .build()
    .await
    .context("failed to open database")?;
    let repo = SqliteScenarioListRepository::new(db.pool().clone());

    // Scenario cache
    let store = Arc::new(ScenarioStore::new(repo));
    let loaded = store.load().await.context("failed to load scenarios")?;
    tracing::info!(scenarios = loaded, "scenario cache warmed");

    // Collaborators & metrics
    let collaborators = Arc::new(
        config
            .http_clients()
            .build()
            .context("failed to build http clients")?,
    );
    let metrics = Arc::new(PrometheusMetrics::new().context("failed to register metrics")?);

    // Dispatch & evaluation
    let dispatcher = Arc::new(Dispatcher::start(
        Arc::clone(&collaborators),
        Arc::clone(&metrics),
        config.dispatch(),
    ));
    let evaluator = Evaluator::new(
        Arc::clone(&store),
        collaborators,
        Arc::clone(&dispatcher),
        Arc::clone(&metrics),
    )
    .with_dedup_window(config.dedup_window());

    // HTTP
    let state = AppState::new(store, Arc::new(evaluator), metrics);
    let app = scenario_adapter_http_axum::router::build(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!(%bind_addr, "scenariod listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if !dispatcher.shutdown(config.shutdown_grace()).await {
        tracing::warn!("some dispatches were abandoned");
    }
    tracing::info!("scenariod stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
