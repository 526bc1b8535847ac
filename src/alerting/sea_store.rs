use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use super::store::{EventLog, ReadingStore, StoreError, ThresholdStore};
use super::{AlertEvent, BreachDirection, Reading, ThresholdConfig};
use crate::entities::{camera_reading, zone_alert, zone_alert_event, CameraReading, ZoneAlert};
use crate::zone::ZoneId;

/// Postgres-backed implementation of the alerting stores.
///
/// Every call is a single statement, so each runs in its own implicit
/// transaction.
#[derive(Clone)]
pub struct SeaStore {
    db: DatabaseConnection,
}

impl SeaStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl From<zone_alert::Model> for ThresholdConfig {
    fn from(model: zone_alert::Model) -> Self {
        Self {
            id: model.id,
            zone_id: ZoneId::from_uuid(model.zone_id),
            upper_thresh: model.upper_thresh,
            lower_thresh: model.lower_thresh,
            recipient: model.recipient,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl From<camera_reading::Model> for Reading {
    fn from(model: camera_reading::Model) -> Self {
        Self {
            camera_id: model.camera_id,
            zone_id: ZoneId::from_uuid(model.zone_id),
            temperature: model.temperature,
            timestamp: model.timestamp,
        }
    }
}

impl TryFrom<zone_alert_event::Model> for AlertEvent {
    type Error = StoreError;

    fn try_from(model: zone_alert_event::Model) -> Result<Self, Self::Error> {
        let direction = BreachDirection::parse(&model.alert_type).ok_or_else(|| {
            StoreError::Corrupt(format!(
                "zone_alert_events {}: unknown alert_type {:?}",
                model.id, model.alert_type
            ))
        })?;
        Ok(Self {
            id: model.id,
            zone_id: ZoneId::from_uuid(model.zone_id),
            camera_id: model.camera_id,
            temperature: model.temperature,
            threshold: model.threshold,
            direction,
            timestamp: model.timestamp,
            recipient: model.recipient,
            sent: model.sent,
            error: model.error,
            created_at: model.created_at,
        })
    }
}

impl From<&AlertEvent> for zone_alert_event::ActiveModel {
    fn from(event: &AlertEvent) -> Self {
        Self {
            id: Set(event.id),
            zone_id: Set(event.zone_id.as_uuid()),
            camera_id: Set(event.camera_id),
            temperature: Set(event.temperature),
            threshold: Set(event.threshold),
            alert_type: Set(event.direction.as_str().to_string()),
            timestamp: Set(event.timestamp),
            recipient: Set(event.recipient.clone()),
            sent: Set(event.sent),
            error: Set(event.error.clone()),
            created_at: Set(event.created_at),
        }
    }
}

#[async_trait]
impl ThresholdStore for SeaStore {
    async fn list_threshold_configs(&self) -> Result<Vec<ThresholdConfig>, StoreError> {
        let rows = ZoneAlert::find().all(&self.db).await?;
        Ok(rows.into_iter().map(ThresholdConfig::from).collect())
    }
}

#[async_trait]
impl ReadingStore for SeaStore {
    async fn latest_reading(&self, zone: ZoneId) -> Result<Option<Reading>, StoreError> {
        let row = CameraReading::find()
            .filter(camera_reading::Column::ZoneId.eq(zone.as_uuid()))
            .order_by_desc(camera_reading::Column::Timestamp)
            .one(&self.db)
            .await?;
        Ok(row.map(Reading::from))
    }
}

#[async_trait]
impl EventLog for SeaStore {
    async fn append_event(&self, event: &AlertEvent) -> Result<(), StoreError> {
        zone_alert_event::ActiveModel::from(event)
            .insert(&self.db)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use sea_orm::{DbBackend, DbErr, MockDatabase, Value};
    use uuid::Uuid;

    fn ts(hour: u32) -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn event(direction: BreachDirection, sent: bool) -> AlertEvent {
        AlertEvent {
            id: Uuid::new_v4(),
            zone_id: ZoneId::from_legacy(3),
            camera_id: 7,
            temperature: 41.5,
            threshold: 40.0,
            direction,
            timestamp: ts(12),
            recipient: "ops@example.com".into(),
            sent,
            error: if sent { String::new() } else { "smtp unreachable".into() },
            created_at: ts(13),
        }
    }

    fn row_for(event: &AlertEvent) -> zone_alert_event::Model {
        zone_alert_event::Model {
            id: event.id,
            zone_id: event.zone_id.as_uuid(),
            camera_id: event.camera_id,
            temperature: event.temperature,
            threshold: event.threshold,
            alert_type: event.direction.as_str().to_string(),
            timestamp: event.timestamp,
            recipient: event.recipient.clone(),
            sent: event.sent,
            error: event.error.clone(),
            created_at: event.created_at,
        }
    }

    fn bound_values(db: DatabaseConnection) -> Vec<(String, Vec<Value>)> {
        db.into_transaction_log()
            .iter()
            .flat_map(|txn| txn.statements().to_vec())
            .map(|stmt| (stmt.sql, stmt.values.map(|v| v.0).unwrap_or_default()))
            .collect()
    }

    #[tokio::test]
    async fn latest_reading_takes_newest_row_for_zone() {
        let zone = ZoneId::from_legacy(3);
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_query_results([vec![camera_reading::Model {
                id: 11,
                camera_id: 7,
                zone_id: zone.as_uuid(),
                zone_number: Some(3),
                temperature: 22.5,
                timestamp: ts(12),
            }]])
            .into_connection();
        let store = SeaStore::new(db.clone());

        let reading = store.latest_reading(zone).await.unwrap().unwrap();
        assert_eq!(reading.zone_id, zone);
        assert_eq!(reading.camera_id, 7);
        assert_eq!(reading.temperature, 22.5);

        let log = bound_values(db);
        assert_eq!(log.len(), 1);
        let (sql, values) = &log[0];
        assert!(sql.contains(r#""camera_readings"."zone_id" = $1"#), "{}", sql);
        assert!(sql.contains(r#""timestamp" DESC LIMIT"#), "{}", sql);
        assert_eq!(values[0], Value::from(zone.as_uuid()));
    }

    #[tokio::test]
    async fn latest_reading_for_empty_zone_is_none() {
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_query_results([Vec::<camera_reading::Model>::new()])
            .into_connection();
        let store = SeaStore::new(db);
        assert!(store
            .latest_reading(ZoneId::from_legacy(9))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn append_event_writes_alert_type_and_outcome() {
        let recorded = event(BreachDirection::Lower, false);
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_query_results([vec![row_for(&recorded)]])
            .into_connection();
        let store = SeaStore::new(db.clone());

        store.append_event(&recorded).await.unwrap();

        let log = bound_values(db);
        assert_eq!(log.len(), 1);
        let (sql, values) = &log[0];
        assert!(sql.starts_with(r#"INSERT INTO "zone_alert_events""#), "{}", sql);
        assert!(sql.contains(r#""alert_type""#), "{}", sql);
        assert!(values.contains(&Value::from("lower".to_string())));
        assert!(values.contains(&Value::from("smtp unreachable".to_string())));
        assert!(values.contains(&Value::from(false)));
    }

    #[tokio::test]
    async fn store_errors_propagate() {
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_query_errors([DbErr::Custom("connection reset".into())])
            .into_connection();
        let store = SeaStore::new(db);
        let err = store.list_threshold_configs().await.unwrap_err();
        assert!(matches!(err, StoreError::Database(_)));
    }

    #[test]
    fn event_rows_convert_back() {
        let original = event(BreachDirection::Upper, true);
        let back = AlertEvent::try_from(row_for(&original)).unwrap();
        assert_eq!(back, original);

        let mut bad = row_for(&original);
        bad.alert_type = "sideways".into();
        assert!(matches!(
            AlertEvent::try_from(bad),
            Err(StoreError::Corrupt(_))
        ));
    }
}
