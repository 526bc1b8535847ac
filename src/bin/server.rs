use axum::{routing::get, Router};
use sea_orm::Database;
use std::net::SocketAddr;
use thermo_sentinel::config::ServerConfig;
use thermo_sentinel::{api, migrator};

#[tokio::main]
async fn main() {
    // Load .env if present (dotenvy)
    dotenvy::dotenv().ok();

    thermo_sentinel::telemetry::init_telemetry("thermo-api-server")
        .expect("failed to initialize telemetry");

    let config = ServerConfig::from_env().expect("Invalid server configuration");

    let (prometheus_layer, metric_handle) = axum_prometheus::PrometheusMetricLayer::pair();

    // Database Connection
    let db = Database::connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    // Run migrations
    use sea_orm_migration::MigratorTrait;
    migrator::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    thermo_sentinel::metrics::init_metrics(&db).await;

    let app = app(&config, db, prometheus_layer, metric_handle);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind HTTP listener");
    axum::serve(listener, app).await.expect("HTTP server failed");
}

fn app(
    config: &ServerConfig,
    db: sea_orm::DatabaseConnection,
    prometheus_layer: axum_prometheus::PrometheusMetricLayer<'static>,
    metric_handle: metrics_exporter_prometheus::PrometheusHandle,
) -> Router {
    let mut origins = vec![axum::http::HeaderValue::from_static("http://localhost:5173")];
    match config.frontend_url.as_deref().map(axum::http::HeaderValue::from_str) {
        Some(Ok(origin)) => {
            tracing::info!("FRONTEND_URL allowed for CORS: {:?}", origin);
            origins.push(origin);
        }
        Some(Err(e)) => tracing::warn!("Ignoring invalid FRONTEND_URL: {}", e),
        None => tracing::warn!("FRONTEND_URL not set, only localhost is allowed for CORS"),
    }

    api::routes(db, config.envelope)
        .layer(prometheus_layer)
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<axum::body::Body>| {
                    let matched_path = request
                        .extensions()
                        .get::<axum::extract::MatchedPath>()
                        .map(|matched| matched.as_str());

                    // "METHOD /path", e.g. "POST /api/zone-alerts"
                    let span_name = match matched_path {
                        Some(path) => format!("{} {}", request.method(), path),
                        None => format!("{} {}", request.method(), request.uri().path()),
                    };

                    tracing::info_span!(
                        "request",
                        "otel.name" = span_name,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        status = tracing::field::Empty,
                        latency = tracing::field::Empty,
                    )
                })
                .on_request(|_request: &axum::http::Request<axum::body::Body>, _span: &tracing::Span| {})
                .on_response(
                    |response: &axum::http::Response<_>, latency: std::time::Duration, span: &tracing::Span| {
                        span.record("status", tracing::field::display(response.status()));
                        span.record("latency", tracing::field::debug(latency));
                        tracing::info!("request completed");
                    },
                ),
        )
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::PUT,
                    axum::http::Method::PATCH,
                    axum::http::Method::DELETE,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers([
                    axum::http::header::ORIGIN,
                    axum::http::header::AUTHORIZATION,
                    axum::http::header::CONTENT_TYPE,
                ])
                .expose_headers([axum::http::header::CONTENT_LENGTH])
                .allow_credentials(true),
        )
        .route("/metrics", get(|| async move { metric_handle.render() }))
}
