use axum::{
    extract::{Extension, Json, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, NotSet, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::Deserialize;
use tracing::{error, info};

use super::{json_error, READINGS_PAGE_LIMIT};
use crate::alerting::SanityEnvelope;
use crate::entities::{camera_reading, CameraReading};
use crate::zone::{ZoneId, ZoneIdError};

/// Zone reference as sent by cameras: a bare number, a numeric string or a
/// canonical UUID string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawZoneId {
    Number(i64),
    Text(String),
}

impl RawZoneId {
    /// Canonical id plus the legacy number, when there was one that fits.
    pub fn resolve(&self) -> Result<(ZoneId, Option<i32>), ZoneIdError> {
        let legacy = |n: i64| (ZoneId::from_legacy(n), i32::try_from(n).ok());
        match self {
            RawZoneId::Number(n) => Ok(legacy(*n)),
            RawZoneId::Text(s) => match s.trim().parse::<i64>() {
                Ok(n) => Ok(legacy(n)),
                Err(_) => ZoneId::parse(s).map(|zone| (zone, None)),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateReadingRequest {
    pub camera_id: i32,
    pub zone_id: RawZoneId,
    pub temperature: f64,
    pub timestamp: Option<DateTime<Utc>>,
}

// POST /api/camera-readings
pub async fn create_camera_reading(
    Extension(db): Extension<DatabaseConnection>,
    Json(payload): Json<CreateReadingRequest>,
) -> Response {
    let (zone, zone_number) = match payload.zone_id.resolve() {
        Ok(resolved) => resolved,
        Err(e) => return json_error(StatusCode::BAD_REQUEST, e.to_string()),
    };
    if !payload.temperature.is_finite() {
        return json_error(StatusCode::BAD_REQUEST, "temperature must be a finite number");
    }

    // Out-of-envelope values are stored as reported and filtered on read
    let reading = camera_reading::ActiveModel {
        id: NotSet,
        camera_id: Set(payload.camera_id),
        zone_id: Set(zone.as_uuid()),
        zone_number: Set(zone_number),
        temperature: Set(payload.temperature),
        timestamp: Set(payload
            .timestamp
            .map(|ts| ts.naive_utc())
            .unwrap_or_else(|| Utc::now().naive_utc())),
    };

    match reading.insert(&db).await {
        Ok(model) => {
            info!(
                camera_id = model.camera_id,
                zone_id = %model.zone_id,
                temperature = model.temperature,
                "Stored camera reading"
            );
            (StatusCode::CREATED, Json(model)).into_response()
        }
        Err(e) => {
            error!("Failed to store camera reading: {}", e);
            json_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ReadingsQuery {
    pub camera_id: Option<i32>,
    pub zone_id: Option<String>,
    pub desde: Option<String>,
    pub hasta: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Bound {
    From,
    To,
}

/// RFC 3339 timestamps are used as-is; a bare `YYYY-MM-DD` covers the whole
/// day, so as a lower bound it is midnight and as an upper bound the last
/// instant of that day.
pub(crate) fn parse_date_flexible(raw: &str, bound: Bound) -> Option<NaiveDateTime> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.naive_utc());
    }
    let day = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    match bound {
        Bound::From => day.and_hms_opt(0, 0, 0),
        Bound::To => day.and_hms_milli_opt(23, 59, 59, 999),
    }
}

// GET /api/camera-readings
pub async fn list_camera_readings(
    Extension(db): Extension<DatabaseConnection>,
    Extension(envelope): Extension<SanityEnvelope>,
    Query(params): Query<ReadingsQuery>,
) -> Response {
    let mut query = CameraReading::find()
        .filter(camera_reading::Column::Temperature.between(envelope.min, envelope.max));

    if let Some(camera_id) = params.camera_id {
        query = query.filter(camera_reading::Column::CameraId.eq(camera_id));
    }
    if let Some(raw) = params.zone_id.as_deref() {
        match ZoneId::parse(raw) {
            Ok(zone) => query = query.filter(camera_reading::Column::ZoneId.eq(zone.as_uuid())),
            Err(e) => return json_error(StatusCode::BAD_REQUEST, e.to_string()),
        }
    }
    if let Some(raw) = params.desde.as_deref() {
        match parse_date_flexible(raw, Bound::From) {
            Some(from) => query = query.filter(camera_reading::Column::Timestamp.gte(from)),
            None => return json_error(StatusCode::BAD_REQUEST, format!("invalid desde {:?}", raw)),
        }
    }
    if let Some(raw) = params.hasta.as_deref() {
        match parse_date_flexible(raw, Bound::To) {
            Some(to) => query = query.filter(camera_reading::Column::Timestamp.lte(to)),
            None => return json_error(StatusCode::BAD_REQUEST, format!("invalid hasta {:?}", raw)),
        }
    }

    match query
        .order_by_desc(camera_reading::Column::Timestamp)
        .limit(READINGS_PAGE_LIMIT)
        .all(&db)
        .await
    {
        Ok(rows) => (StatusCode::OK, Json(rows)).into_response(),
        Err(e) => {
            error!("Failed to fetch camera readings: {}", e);
            json_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}
