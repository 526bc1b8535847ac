pub mod alerting;
pub mod api;
pub mod config;
pub mod entities;
pub mod metrics;
pub mod migrator;
pub mod notifications;
pub mod telemetry;
pub mod zone;

pub use sea_orm;
