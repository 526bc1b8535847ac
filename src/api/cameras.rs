use axum::{
    extract::{Extension, Json, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{NaiveDateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, FromQueryResult, Order, QueryFilter,
    QueryOrder, QuerySelect,
};
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

use super::json_error;
use super::readings::{parse_date_flexible, Bound};
use crate::alerting::SanityEnvelope;
use crate::entities::{camera_reading, CameraReading};
use crate::zone::ZoneId;

/// A zone counts as active while its last valid reading is this recent.
pub const ACTIVE_WINDOW_MINUTES: i64 = 10;

/// Default look-back of the status history when `desde` is omitted.
pub const STATUS_HISTORY_HOURS: i64 = 24;

#[derive(Debug, FromQueryResult)]
struct CameraZoneRow {
    camera_id: i32,
    zone_id: Uuid,
    zone_number: Option<i32>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ZoneRef {
    pub zone_id: ZoneId,
    pub zone_number: Option<i32>,
    pub name: String,
}

impl From<&CameraZoneRow> for ZoneRef {
    fn from(row: &CameraZoneRow) -> Self {
        let zone_id = ZoneId::from_uuid(row.zone_id);
        let name = match row.zone_number {
            Some(n) => format!("Zona {}", n),
            None => format!("Zona {}", zone_id),
        };
        Self {
            zone_id,
            zone_number: row.zone_number,
            name,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CameraWithZones {
    pub camera_id: i32,
    pub zones: Vec<ZoneRef>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ZoneState {
    #[serde(rename = "Activo")]
    Active,
    #[serde(rename = "Inactivo")]
    Inactive,
}

pub fn zone_state(last_time: Option<NaiveDateTime>, now: NaiveDateTime) -> ZoneState {
    match last_time {
        Some(at) if at > now - chrono::Duration::minutes(ACTIVE_WINDOW_MINUTES) => ZoneState::Active,
        _ => ZoneState::Inactive,
    }
}

#[derive(Debug, Serialize)]
pub struct TempPoint {
    pub timestamp: NaiveDateTime,
    pub temperature: f64,
}

#[derive(Debug, Serialize)]
pub struct ZoneStatus {
    #[serde(flatten)]
    pub zone: ZoneRef,
    pub last_temp: Option<f64>,
    pub last_time: Option<NaiveDateTime>,
    pub state: ZoneState,
    pub readings: Vec<TempPoint>,
}

#[derive(Debug, Serialize)]
pub struct CameraStatus {
    pub camera_id: i32,
    pub zonas: Vec<ZoneStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatusQuery {
    pub desde: Option<String>,
    pub hasta: Option<String>,
}

/// Distinct (camera, zone) pairs seen in readings. A zone keeps the legacy
/// number it was last reported with, if any.
async fn camera_zones(
    db: &DatabaseConnection,
    camera_id: Option<i32>,
) -> Result<Vec<CameraZoneRow>, DbErr> {
    let mut query = CameraReading::find()
        .select_only()
        .column(camera_reading::Column::CameraId)
        .column(camera_reading::Column::ZoneId)
        .column_as(Expr::col(camera_reading::Column::ZoneNumber).max(), "zone_number")
        .group_by(camera_reading::Column::CameraId)
        .group_by(camera_reading::Column::ZoneId);

    if let Some(camera_id) = camera_id {
        query = query.filter(camera_reading::Column::CameraId.eq(camera_id));
    }

    query
        .order_by_asc(camera_reading::Column::CameraId)
        .order_by(Expr::col(camera_reading::Column::ZoneNumber).max(), Order::Asc)
        .order_by_asc(camera_reading::Column::ZoneId)
        .into_model::<CameraZoneRow>()
        .all(db)
        .await
}

fn parse_camera_id(raw: &str) -> Result<i32, Response> {
    raw.trim()
        .parse()
        .map_err(|_| json_error(StatusCode::BAD_REQUEST, format!("invalid camera_id {:?}", raw)))
}

// GET /api/cameras
pub async fn list_cameras(Extension(db): Extension<DatabaseConnection>) -> Response {
    let rows = match camera_zones(&db, None).await {
        Ok(rows) => rows,
        Err(e) => {
            error!("Failed to list cameras: {}", e);
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to list cameras");
        }
    };

    let mut cameras: Vec<CameraWithZones> = Vec::new();
    for row in &rows {
        match cameras.last_mut() {
            Some(camera) if camera.camera_id == row.camera_id => camera.zones.push(row.into()),
            _ => cameras.push(CameraWithZones {
                camera_id: row.camera_id,
                zones: vec![row.into()],
            }),
        }
    }

    (StatusCode::OK, Json(cameras)).into_response()
}

// GET /api/cameras/:camera_id/zonas
pub async fn list_camera_zones(
    Extension(db): Extension<DatabaseConnection>,
    Path(camera_id): Path<String>,
) -> Response {
    let camera_id = match parse_camera_id(&camera_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match camera_zones(&db, Some(camera_id)).await {
        Ok(rows) => {
            let zonas: Vec<ZoneRef> = rows.iter().map(ZoneRef::from).collect();
            (StatusCode::OK, Json(serde_json::json!({ "zonas": zonas }))).into_response()
        }
        Err(e) => {
            error!(camera_id, "Failed to list camera zones: {}", e);
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to list camera zones")
        }
    }
}

// GET /api/cameras/:camera_id/status
pub async fn camera_status(
    Extension(db): Extension<DatabaseConnection>,
    Extension(envelope): Extension<SanityEnvelope>,
    Path(camera_id): Path<String>,
    Query(params): Query<StatusQuery>,
) -> Response {
    let camera_id = match parse_camera_id(&camera_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let now = Utc::now().naive_utc();
    let from = match params.desde.as_deref() {
        None => now - chrono::Duration::hours(STATUS_HISTORY_HOURS),
        Some(raw) => match parse_date_flexible(raw, Bound::From) {
            Some(from) => from,
            None => return json_error(StatusCode::BAD_REQUEST, format!("invalid desde {:?}", raw)),
        },
    };
    let to = match params.hasta.as_deref() {
        None => now,
        Some(raw) => match parse_date_flexible(raw, Bound::To) {
            Some(to) => to,
            None => return json_error(StatusCode::BAD_REQUEST, format!("invalid hasta {:?}", raw)),
        },
    };
    if to < from {
        return json_error(StatusCode::BAD_REQUEST, "hasta is before desde");
    }

    let zones = match camera_zones(&db, Some(camera_id)).await {
        Ok(zones) => zones,
        Err(e) => {
            error!(camera_id, "Failed to list camera zones: {}", e);
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load camera status");
        }
    };

    let mut zonas = Vec::with_capacity(zones.len());
    for row in &zones {
        match zone_status(&db, envelope, camera_id, row, (from, to), now).await {
            Ok(status) => zonas.push(status),
            Err(e) => {
                error!(camera_id, zone_id = %row.zone_id, "Failed to load zone status: {}", e);
                return json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load camera status");
            }
        }
    }

    (StatusCode::OK, Json(CameraStatus { camera_id, zonas })).into_response()
}

async fn zone_status(
    db: &DatabaseConnection,
    envelope: SanityEnvelope,
    camera_id: i32,
    row: &CameraZoneRow,
    (from, to): (NaiveDateTime, NaiveDateTime),
    now: NaiveDateTime,
) -> Result<ZoneStatus, DbErr> {
    // Latest reading of any value; noise leaves the zone without a last value
    let last = CameraReading::find()
        .filter(camera_reading::Column::CameraId.eq(camera_id))
        .filter(camera_reading::Column::ZoneId.eq(row.zone_id))
        .order_by_desc(camera_reading::Column::Timestamp)
        .one(db)
        .await?
        .filter(|reading| envelope.contains(reading.temperature));

    let readings = CameraReading::find()
        .filter(camera_reading::Column::CameraId.eq(camera_id))
        .filter(camera_reading::Column::ZoneId.eq(row.zone_id))
        .filter(camera_reading::Column::Timestamp.between(from, to))
        .filter(camera_reading::Column::Temperature.between(envelope.min, envelope.max))
        .order_by_asc(camera_reading::Column::Timestamp)
        .all(db)
        .await?
        .into_iter()
        .map(|reading| TempPoint {
            timestamp: reading.timestamp,
            temperature: reading.temperature,
        })
        .collect();

    let last_time = last.as_ref().map(|reading| reading.timestamp);
    Ok(ZoneStatus {
        zone: row.into(),
        last_temp: last.as_ref().map(|reading| reading.temperature),
        last_time,
        state: zone_state(last_time, now),
        readings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{call, call_with, get};
    use sea_orm::{DbBackend, MockDatabase, Value};
    use std::collections::BTreeMap;

    fn zone_row(camera_id: i32, number: i64) -> BTreeMap<&'static str, Value> {
        BTreeMap::from([
            ("camera_id", Value::from(camera_id)),
            ("zone_id", Value::from(ZoneId::from_legacy(number).as_uuid())),
            ("zone_number", Value::from(Some(number as i32))),
        ])
    }

    fn reading(id: i64, number: i64, temperature: f64, at: NaiveDateTime) -> camera_reading::Model {
        camera_reading::Model {
            id,
            camera_id: 7,
            zone_id: ZoneId::from_legacy(number).as_uuid(),
            zone_number: Some(number as i32),
            temperature,
            timestamp: at,
        }
    }

    #[test]
    fn zone_is_active_for_ten_minutes() {
        let now = Utc::now().naive_utc();
        assert_eq!(zone_state(Some(now - chrono::Duration::minutes(9)), now), ZoneState::Active);
        assert_eq!(zone_state(Some(now - chrono::Duration::minutes(11)), now), ZoneState::Inactive);
        assert_eq!(zone_state(None, now), ZoneState::Inactive);
    }

    #[tokio::test]
    async fn lists_cameras_with_their_zones() {
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_query_results([vec![zone_row(1, 1), zone_row(1, 2), zone_row(2, 1)]])
            .into_connection();

        let (status, body) = call_with(db, get("/api/cameras")).await;
        assert_eq!(status, StatusCode::OK);
        let cameras = body.as_array().unwrap();
        assert_eq!(cameras.len(), 2);
        assert_eq!(cameras[0]["camera_id"], 1);
        assert_eq!(cameras[0]["zones"].as_array().unwrap().len(), 2);
        assert_eq!(cameras[0]["zones"][1]["name"], "Zona 2");
        assert_eq!(cameras[1]["zones"][0]["zone_id"], ZoneId::from_legacy(1).to_string());
    }

    #[tokio::test]
    async fn camera_zones_rejects_bad_camera_id() {
        let (status, body) = call(get("/api/cameras/front-door/zonas")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("front-door"));
    }

    #[tokio::test]
    async fn status_rejects_inverted_range() {
        let (status, _) = call(get("/api/cameras/7/status?desde=2025-02-02&hasta=2025-02-01")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(get("/api/cameras/7/status?desde=yesterday")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn status_reports_last_valid_value_and_activity() {
        let now = Utc::now().naive_utc();
        let recent = now - chrono::Duration::minutes(2);
        let earlier = now - chrono::Duration::hours(1);

        let db = MockDatabase::new(DbBackend::Postgres)
            .append_query_results([vec![zone_row(7, 1), zone_row(7, 2)]])
            // zone 1: fresh in-envelope reading plus history
            .append_query_results([vec![reading(3, 1, 21.5, recent)]])
            .append_query_results([vec![reading(1, 1, 20.0, earlier), reading(3, 1, 21.5, recent)]])
            // zone 2: latest reading is sensor noise
            .append_query_results([vec![reading(4, 2, 900.0, recent)]])
            .append_query_results([vec![reading(2, 2, 18.0, earlier)]])
            .into_connection();

        let (status, body) = call_with(db, get("/api/cameras/7/status")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["camera_id"], 7);

        let zonas = body["zonas"].as_array().unwrap();
        assert_eq!(zonas.len(), 2);

        assert_eq!(zonas[0]["zone_number"], 1);
        assert_eq!(zonas[0]["last_temp"], 21.5);
        assert_eq!(zonas[0]["state"], "Activo");
        assert_eq!(zonas[0]["readings"].as_array().unwrap().len(), 2);

        assert!(zonas[1]["last_temp"].is_null());
        assert!(zonas[1]["last_time"].is_null());
        assert_eq!(zonas[1]["state"], "Inactivo");
        assert_eq!(zonas[1]["readings"][0]["temperature"], 18.0);
    }
}
