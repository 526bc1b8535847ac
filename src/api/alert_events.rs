use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use tracing::error;

use super::json_error;
use crate::alerting::AlertEvent;
use crate::entities::{zone_alert_event, ZoneAlertEvent};
use crate::zone::ZoneId;

// GET /api/zones/:zone_id/alert-events
pub async fn list_zone_alert_events(
    Extension(db): Extension<DatabaseConnection>,
    Path(zone_id): Path<String>,
) -> Response {
    let zone = match ZoneId::parse(&zone_id) {
        Ok(zone) => zone,
        Err(e) => return json_error(StatusCode::BAD_REQUEST, e.to_string()),
    };

    let rows = match ZoneAlertEvent::find()
        .filter(zone_alert_event::Column::ZoneId.eq(zone.as_uuid()))
        .order_by_desc(zone_alert_event::Column::Timestamp)
        .order_by_desc(zone_alert_event::Column::CreatedAt)
        .all(&db)
        .await
    {
        Ok(rows) => rows,
        Err(e) => {
            error!(%zone, "Failed to fetch alert events: {}", e);
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch alert events");
        }
    };

    match rows
        .into_iter()
        .map(AlertEvent::try_from)
        .collect::<Result<Vec<_>, _>>()
    {
        Ok(events) => (StatusCode::OK, Json(events)).into_response(),
        Err(e) => {
            error!(%zone, "Unreadable alert event row: {}", e);
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch alert events")
        }
    }
}
