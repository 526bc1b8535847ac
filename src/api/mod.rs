pub mod alert_events;
pub mod cameras;
pub mod readings;
pub mod zone_alerts;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
    Extension, Json, Router,
};
use sea_orm::DatabaseConnection;
use serde_json::json;

use crate::alerting::SanityEnvelope;

/// Readings returned by a single listing query.
pub const READINGS_PAGE_LIMIT: u64 = 10_000;

pub fn routes(db: DatabaseConnection, envelope: SanityEnvelope) -> Router {
    let api = Router::new()
        .route("/health", get(health_check))
        .route(
            "/zone-alerts",
            get(zone_alerts::list_zone_alerts).post(zone_alerts::create_zone_alert),
        )
        .route(
            "/zone-alerts/:id",
            put(zone_alerts::update_zone_alert).delete(zone_alerts::delete_zone_alert),
        )
        .route(
            "/zones/:zone_id/alert-events",
            get(alert_events::list_zone_alert_events),
        )
        .route("/cameras", get(cameras::list_cameras))
        .route("/cameras/:camera_id/zonas", get(cameras::list_camera_zones))
        .route("/cameras/:camera_id/status", get(cameras::camera_status))
        .route(
            "/camera-readings",
            get(readings::list_camera_readings).post(readings::create_camera_reading),
        );

    Router::new()
        .nest("/api", api)
        .layer(Extension(db))
        .layer(Extension(envelope))
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({"status": "ok"}))
}

pub(crate) fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({"error": message.into()}))).into_response()
}
