use sea_orm_migration::prelude::*;

mod m20250601_000001_create_camera_readings;
mod m20250601_000002_create_zone_alerts;
mod m20250615_000001_create_zone_alert_events;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000001_create_camera_readings::Migration),
            Box::new(m20250601_000002_create_zone_alerts::Migration),
            Box::new(m20250615_000001_create_zone_alert_events::Migration),
        ]
    }
}
