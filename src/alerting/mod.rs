//! Zone temperature alerting.
//!
//! The worker compares the latest reading of every configured zone against its
//! threshold band, notifies the configured recipient when the band is breached
//! and appends an [`AlertEvent`] for every breach, whether or not the
//! notification went out.

pub mod engine;
pub mod sea_store;
pub mod store;

pub use engine::{AlertEngine, CycleReport, EngineSettings};
pub use sea_store::SeaStore;
pub use store::{EventLog, ReadingStore, StoreError, ThresholdStore};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::zone::ZoneId;

/// Absolute range of physically plausible readings, bounds inclusive.
/// Anything outside is treated as a sensor artifact.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SanityEnvelope {
    pub min: f64,
    pub max: f64,
}

impl SanityEnvelope {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, temperature: f64) -> bool {
        temperature >= self.min && temperature <= self.max
    }
}

impl Default for SanityEnvelope {
    fn default() -> Self {
        Self::new(-40.0, 150.0)
    }
}

/// A per-zone alert configuration.
///
/// A missing threshold means that side of the band is unbounded; `Some(0.0)` is
/// a literal 0 °C bound.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    pub id: Uuid,
    pub zone_id: ZoneId,
    pub upper_thresh: Option<f64>,
    pub lower_thresh: Option<f64>,
    pub recipient: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub camera_id: i32,
    pub zone_id: ZoneId,
    pub temperature: f64,
    pub timestamp: NaiveDateTime,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreachDirection {
    Upper,
    Lower,
}

impl BreachDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            BreachDirection::Upper => "upper",
            BreachDirection::Lower => "lower",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "upper" => Some(BreachDirection::Upper),
            "lower" => Some(BreachDirection::Lower),
            _ => None,
        }
    }
}

impl fmt::Display for BreachDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Breach {
    pub direction: BreachDirection,
    pub threshold: f64,
}

impl Breach {
    pub fn reason(&self, temperature: f64) -> String {
        match self.direction {
            BreachDirection::Upper => format!(
                "{:.2}°C is above the upper threshold of {:.2}°C",
                temperature, self.threshold
            ),
            BreachDirection::Lower => format!(
                "{:.2}°C is below the lower threshold of {:.2}°C",
                temperature, self.threshold
            ),
        }
    }
}

/// Decides whether `temperature` falls outside the configured band.
///
/// The upper bound is checked first, so a degenerate band where both sides
/// match reports an upper breach.
pub fn evaluate_breach(config: &ThresholdConfig, temperature: f64) -> Option<Breach> {
    if let Some(upper) = config.upper_thresh.filter(|upper| temperature > *upper) {
        return Some(Breach {
            direction: BreachDirection::Upper,
            threshold: upper,
        });
    }
    config
        .lower_thresh
        .filter(|lower| temperature < *lower)
        .map(|lower| Breach {
            direction: BreachDirection::Lower,
            threshold: lower,
        })
}

/// Audit record of one breach, appended once per config per cycle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub id: Uuid,
    pub zone_id: ZoneId,
    pub camera_id: i32,
    pub temperature: f64,
    pub threshold: f64,
    #[serde(rename = "type")]
    pub direction: BreachDirection,
    /// When the breaching reading was captured.
    pub timestamp: NaiveDateTime,
    pub recipient: String,
    pub sent: bool,
    /// Empty when the notification was delivered.
    pub error: String,
    pub created_at: NaiveDateTime,
}

impl AlertEvent {
    pub fn record(
        config: &ThresholdConfig,
        reading: &Reading,
        breach: Breach,
        delivery: Result<(), String>,
    ) -> Self {
        let (sent, error) = match delivery {
            Ok(()) => (true, String::new()),
            Err(e) => (false, e),
        };
        Self {
            id: Uuid::new_v4(),
            zone_id: config.zone_id,
            camera_id: reading.camera_id,
            temperature: reading.temperature,
            threshold: breach.threshold,
            direction: breach.direction,
            timestamp: reading.timestamp,
            recipient: config.recipient.clone(),
            sent,
            error,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}
