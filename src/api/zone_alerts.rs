use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryOrder, Set};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use super::json_error;
use crate::alerting::ThresholdConfig;
use crate::entities::{zone_alert, ZoneAlert};
use crate::zone::ZoneId;

/// Body for creating or replacing a zone alert. `zone_id` may be a UUID or a
/// legacy zone number; omitted thresholds leave that side unbounded.
#[derive(Debug, Deserialize)]
pub struct ZoneAlertInput {
    pub zone_id: ZoneId,
    pub upper_thresh: Option<f64>,
    pub lower_thresh: Option<f64>,
    pub recipient: String,
}

impl ZoneAlertInput {
    fn validate(&self) -> Result<(), String> {
        if !looks_like_email(&self.recipient) {
            return Err(format!("recipient {:?} is not a valid email address", self.recipient));
        }
        for (name, value) in [("upper_thresh", self.upper_thresh), ("lower_thresh", self.lower_thresh)] {
            if value.map_or(false, |v| !v.is_finite()) {
                return Err(format!("{} must be a finite number", name));
            }
        }
        if let (Some(upper), Some(lower)) = (self.upper_thresh, self.lower_thresh) {
            if upper < lower {
                return Err("upper_thresh must not be below lower_thresh".to_string());
            }
        }
        Ok(())
    }
}

fn looks_like_email(raw: &str) -> bool {
    match raw.trim().split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !raw.contains(char::is_whitespace)
        }
        None => false,
    }
}

// GET /api/zone-alerts
pub async fn list_zone_alerts(Extension(db): Extension<DatabaseConnection>) -> Response {
    match ZoneAlert::find()
        .order_by_asc(zone_alert::Column::CreatedAt)
        .all(&db)
        .await
    {
        Ok(rows) => {
            let configs: Vec<ThresholdConfig> = rows.into_iter().map(Into::into).collect();
            (StatusCode::OK, Json(configs)).into_response()
        }
        Err(e) => {
            error!("Failed to fetch zone alerts: {}", e);
            json_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

// POST /api/zone-alerts
pub async fn create_zone_alert(
    Extension(db): Extension<DatabaseConnection>,
    Json(payload): Json<ZoneAlertInput>,
) -> Response {
    if let Err(msg) = payload.validate() {
        return json_error(StatusCode::BAD_REQUEST, msg);
    }

    let now = chrono::Utc::now().naive_utc();
    let alert = zone_alert::ActiveModel {
        id: Set(Uuid::new_v4()),
        zone_id: Set(payload.zone_id.as_uuid()),
        upper_thresh: Set(payload.upper_thresh),
        lower_thresh: Set(payload.lower_thresh),
        recipient: Set(payload.recipient.trim().to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    };

    match alert.insert(&db).await {
        Ok(model) => {
            info!(alert_id = %model.id, zone_id = %model.zone_id, "Created zone alert");
            crate::metrics::adjust_zone_alerts(1.0);
            (StatusCode::CREATED, Json(ThresholdConfig::from(model))).into_response()
        }
        Err(e) => {
            error!("Failed to create zone alert: {}", e);
            json_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

// PUT /api/zone-alerts/:id
pub async fn update_zone_alert(
    Extension(db): Extension<DatabaseConnection>,
    Path(alert_id): Path<Uuid>,
    Json(payload): Json<ZoneAlertInput>,
) -> Response {
    if let Err(msg) = payload.validate() {
        return json_error(StatusCode::BAD_REQUEST, msg);
    }

    let existing = match ZoneAlert::find_by_id(alert_id).one(&db).await {
        Ok(Some(model)) => model,
        Ok(None) => return json_error(StatusCode::NOT_FOUND, "Zone alert not found"),
        Err(e) => {
            error!("Failed to fetch zone alert: {}", e);
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
        }
    };

    let mut alert = existing.into_active_model();
    alert.zone_id = Set(payload.zone_id.as_uuid());
    alert.upper_thresh = Set(payload.upper_thresh);
    alert.lower_thresh = Set(payload.lower_thresh);
    alert.recipient = Set(payload.recipient.trim().to_string());
    alert.updated_at = Set(chrono::Utc::now().naive_utc());

    match alert.update(&db).await {
        Ok(model) => {
            info!(alert_id = %model.id, "Updated zone alert");
            (StatusCode::OK, Json(ThresholdConfig::from(model))).into_response()
        }
        Err(e) => {
            error!("Failed to update zone alert: {}", e);
            json_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

// DELETE /api/zone-alerts/:id
pub async fn delete_zone_alert(
    Extension(db): Extension<DatabaseConnection>,
    Path(alert_id): Path<Uuid>,
) -> Response {
    match ZoneAlert::delete_by_id(alert_id).exec(&db).await {
        Ok(res) if res.rows_affected == 0 => json_error(StatusCode::NOT_FOUND, "Zone alert not found"),
        Ok(_) => {
            info!(%alert_id, "Deleted zone alert");
            crate::metrics::adjust_zone_alerts(-1.0);
            (StatusCode::OK, Json(json!({"message": "Zone alert deleted"}))).into_response()
        }
        Err(e) => {
            error!("Failed to delete zone alert: {}", e);
            json_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{call, json_request};

    fn input(upper: Option<f64>, lower: Option<f64>, recipient: &str) -> ZoneAlertInput {
        ZoneAlertInput {
            zone_id: ZoneId::from_legacy(1),
            upper_thresh: upper,
            lower_thresh: lower,
            recipient: recipient.to_string(),
        }
    }

    #[test]
    fn validates_band_and_recipient() {
        assert!(input(Some(30.0), Some(10.0), "ops@example.com").validate().is_ok());
        assert!(input(None, Some(0.0), "ops@example.com").validate().is_ok());
        assert!(input(Some(10.0), Some(30.0), "ops@example.com").validate().is_err());
        assert!(input(Some(f64::INFINITY), None, "ops@example.com").validate().is_err());
        assert!(input(Some(30.0), None, "not-an-email").validate().is_err());
        assert!(input(Some(30.0), None, "a@b@c.com").validate().is_err());
        assert!(input(Some(30.0), None, "ops@localhost").validate().is_err());
    }

    #[test]
    fn numeric_zone_ids_are_canonicalized() {
        let parsed: ZoneAlertInput = serde_json::from_value(json!({
            "zone_id": "5",
            "upper_thresh": 30.0,
            "recipient": "ops@example.com"
        }))
        .unwrap();
        assert_eq!(parsed.zone_id, ZoneId::from_legacy(5));
        assert_eq!(parsed.lower_thresh, None);
    }

    #[tokio::test]
    async fn create_rejects_invalid_input_before_touching_the_store() {
        let (status, body) = call(json_request(
            "POST",
            "/api/zone-alerts",
            json!({"zone_id": 1, "upper_thresh": 5.0, "lower_thresh": 20.0, "recipient": "ops@example.com"}),
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("upper_thresh"));
    }

    #[tokio::test]
    async fn create_rejects_unparseable_zone() {
        let (status, _) = call(json_request(
            "POST",
            "/api/zone-alerts",
            json!({"zone_id": "north wall", "recipient": "ops@example.com"}),
        ))
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
