use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait};
use crate::entities::ZoneAlert;

pub async fn init_metrics(db: &DatabaseConnection) {
    let config_count = ZoneAlert::find().count(db).await.unwrap_or(0);
    metrics::gauge!("thermo_zone_alerts_total").set(config_count as f64);

    tracing::info!("Initialized metrics: ZoneAlerts={}", config_count);
}

pub fn adjust_zone_alerts(delta: f64) {
    metrics::gauge!("thermo_zone_alerts_total").increment(delta);
}

pub fn increment_cycles(outcome: &'static str) {
    metrics::counter!("thermo_alert_cycles_total", "outcome" => outcome).increment(1);
}

pub fn record_cycle_duration(seconds: f64) {
    metrics::histogram!("thermo_alert_cycle_duration_seconds").record(seconds);
}

pub fn increment_alerts_fired(direction: &'static str) {
    metrics::counter!("thermo_alerts_fired_total", "direction" => direction).increment(1);
}

pub fn increment_notifications_sent(channel: &str) {
    metrics::counter!("thermo_notifications_sent_total", "channel" => channel.to_string()).increment(1);
}

pub fn increment_notifications_failed(channel: &str) {
    metrics::counter!("thermo_notifications_failed_total", "channel" => channel.to_string()).increment(1);
}

pub fn increment_events_recorded(sent: bool) {
    let sent = if sent { "true" } else { "false" };
    metrics::counter!("thermo_alert_events_recorded_total", "sent" => sent).increment(1);
}

pub fn increment_event_write_failures() {
    metrics::counter!("thermo_alert_event_write_failures_total").increment(1);
}
