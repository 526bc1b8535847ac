use async_trait::async_trait;

use super::{AlertEvent, Reading, ThresholdConfig};
use crate::zone::ZoneId;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),
    #[error("corrupt row: {0}")]
    Corrupt(String),
    #[error("store call timed out")]
    Timeout,
}

/// Source of per-zone alert configurations.
#[async_trait]
pub trait ThresholdStore: Send + Sync {
    async fn list_threshold_configs(&self) -> Result<Vec<ThresholdConfig>, StoreError>;
}

/// Source of temperature readings.
#[async_trait]
pub trait ReadingStore: Send + Sync {
    /// The most recent reading for `zone` by capture time, if any.
    async fn latest_reading(&self, zone: ZoneId) -> Result<Option<Reading>, StoreError>;
}

/// Append-only audit log of fired alerts.
#[async_trait]
pub trait EventLog: Send + Sync {
    async fn append_event(&self, event: &AlertEvent) -> Result<(), StoreError>;
}
