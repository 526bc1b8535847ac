use std::sync::Arc;

use sea_orm::Database;
use thermo_sentinel::alerting::{AlertEngine, EngineSettings, SeaStore};
use thermo_sentinel::config::WorkerConfig;
use thermo_sentinel::notifications::SendGridNotifier;

#[tokio::main]
async fn main() {
    // Load .env if present (dotenvy)
    dotenvy::dotenv().ok();

    thermo_sentinel::telemetry::init_telemetry("thermo-alert-worker")
        .expect("failed to initialize telemetry");

    let config = WorkerConfig::from_env().expect("Invalid worker configuration");

    let (prometheus_layer, metric_handle) = axum_prometheus::PrometheusMetricLayer::pair();

    // Spawn metrics server
    let metrics_port = config.metrics_port;
    tokio::spawn(async move {
        let app = axum::Router::new()
            .route(
                "/metrics",
                axum::routing::get(|| async move { metric_handle.render() }),
            )
            .layer(prometheus_layer);
        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], metrics_port));
        let listener = match tokio::net::TcpListener::bind(addr).await {
            Ok(listener) => listener,
            Err(e) => {
                tracing::error!("Metrics server failed to bind {}: {}", addr, e);
                return;
            }
        };
        tracing::info!("Metrics server listening on {}", addr);
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("Metrics server stopped: {}", e);
        }
    });

    // Without the store no zone can ever be checked, so this is fatal
    let db = Database::connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    let store = Arc::new(SeaStore::new(db));
    let notifier = Arc::new(SendGridNotifier::from_env());

    let engine = AlertEngine::new(
        store.clone(),
        store.clone(),
        store,
        notifier,
        EngineSettings::from(&config),
    )
    .expect("Failed to load notification templates");

    tracing::info!("Starting zone alert worker...");

    let handle = engine.spawn(async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Shutting down worker process"),
            Err(err) => {
                tracing::error!("Unable to listen for shutdown signal: {}", err);
                std::future::pending::<()>().await
            }
        }
    });

    if let Err(e) = handle.await {
        tracing::error!("Alert engine task failed: {}", e);
    }
}
