use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::store::{EventLog, ReadingStore, StoreError, ThresholdStore};
use super::{evaluate_breach, AlertEvent, Breach, BreachDirection, Reading, SanityEnvelope, ThresholdConfig};
use crate::config::WorkerConfig;
use crate::notifications::{NotificationTemplates, Notifier, NotifierError};

#[derive(Clone, Debug)]
pub struct EngineSettings {
    pub poll_interval: Duration,
    pub envelope: SanityEnvelope,
    pub call_timeout: Option<Duration>,
    /// When set, a config that fired in one direction stays quiet in that
    /// direction until the window has passed. Unset re-fires every cycle.
    pub cooldown: Option<Duration>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            envelope: SanityEnvelope::default(),
            call_timeout: None,
            cooldown: None,
        }
    }
}

impl From<&WorkerConfig> for EngineSettings {
    fn from(cfg: &WorkerConfig) -> Self {
        Self {
            poll_interval: cfg.poll_interval,
            envelope: cfg.envelope,
            call_timeout: cfg.call_timeout,
            cooldown: cfg.cooldown,
        }
    }
}

/// Tally of one evaluation pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Listing the configs failed; nothing else was attempted.
    pub aborted: bool,
    pub evaluated: usize,
    pub fired: usize,
    pub notified: usize,
    pub notify_failures: usize,
    pub event_write_failures: usize,
    pub no_reading: usize,
    pub out_of_envelope: usize,
    pub lookup_errors: usize,
    pub suppressed: usize,
}

/// Periodically checks every zone alert configuration against the latest
/// reading of its zone.
pub struct AlertEngine {
    thresholds: Arc<dyn ThresholdStore>,
    readings: Arc<dyn ReadingStore>,
    events: Arc<dyn EventLog>,
    notifier: Arc<dyn Notifier>,
    templates: NotificationTemplates,
    settings: EngineSettings,
    last_fired: HashMap<(Uuid, BreachDirection), Instant>,
}

impl AlertEngine {
    pub fn new(
        thresholds: Arc<dyn ThresholdStore>,
        readings: Arc<dyn ReadingStore>,
        events: Arc<dyn EventLog>,
        notifier: Arc<dyn Notifier>,
        settings: EngineSettings,
    ) -> Result<Self, NotifierError> {
        Ok(Self {
            thresholds,
            readings,
            events,
            notifier,
            templates: NotificationTemplates::new()?,
            settings,
            last_fired: HashMap::new(),
        })
    }

    /// Runs cycles back to back, pausing `poll_interval` after each one, until
    /// `shutdown` resolves. An in-flight cycle always runs to completion.
    pub async fn run<S>(mut self, shutdown: S)
    where
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        info!(
            interval_secs = self.settings.poll_interval.as_secs_f64(),
            cooldown_secs = self.settings.cooldown.map(|c| c.as_secs_f64()),
            "Alert engine started"
        );

        loop {
            self.run_cycle().await;

            tokio::select! {
                _ = &mut shutdown => {
                    info!("Alert engine stopping");
                    break;
                }
                _ = tokio::time::sleep(self.settings.poll_interval) => {}
            }
        }
    }

    pub fn spawn<S>(self, shutdown: S) -> JoinHandle<()>
    where
        S: Future<Output = ()> + Send + 'static,
    {
        tokio::spawn(self.run(shutdown))
    }

    /// One pass over every configured zone alert.
    pub async fn run_cycle(&mut self) -> CycleReport {
        let span = info_span!("alert_cycle", cycle_id = %Uuid::new_v4());
        let started = Instant::now();
        let report = self.cycle().instrument(span).await;

        crate::metrics::record_cycle_duration(started.elapsed().as_secs_f64());
        crate::metrics::increment_cycles(if report.aborted { "aborted" } else { "completed" });
        report
    }

    async fn cycle(&mut self) -> CycleReport {
        let mut report = CycleReport::default();

        let configs = match bounded(
            self.settings.call_timeout,
            self.thresholds.list_threshold_configs(),
            StoreError::Timeout,
        )
        .await
        {
            Ok(configs) => configs,
            Err(e) => {
                error!(error = %e, "Failed to list zone alerts, skipping cycle");
                report.aborted = true;
                return report;
            }
        };

        if !self.last_fired.is_empty() {
            let live: HashSet<Uuid> = configs.iter().map(|c| c.id).collect();
            self.last_fired.retain(|(id, _), _| live.contains(id));
        }

        for config in &configs {
            let span = info_span!("evaluate_zone", alert_id = %config.id, zone_id = %config.zone_id);
            self.evaluate(config, &mut report).instrument(span).await;
        }

        if report.fired > 0 || report.lookup_errors > 0 || report.event_write_failures > 0 {
            info!(
                evaluated = report.evaluated,
                fired = report.fired,
                notified = report.notified,
                notify_failures = report.notify_failures,
                event_write_failures = report.event_write_failures,
                lookup_errors = report.lookup_errors,
                "Alert cycle finished"
            );
        } else {
            debug!(evaluated = report.evaluated, "Alert cycle finished");
        }
        report
    }

    async fn evaluate(&mut self, config: &ThresholdConfig, report: &mut CycleReport) {
        report.evaluated += 1;

        let latest = bounded(
            self.settings.call_timeout,
            self.readings.latest_reading(config.zone_id),
            StoreError::Timeout,
        )
        .await;
        let reading = match latest {
            Ok(Some(reading)) => reading,
            Ok(None) => {
                debug!("No readings for zone yet");
                report.no_reading += 1;
                return;
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch latest reading");
                report.lookup_errors += 1;
                return;
            }
        };

        if !self.settings.envelope.contains(reading.temperature) {
            debug!(temperature = reading.temperature, "Reading outside sanity envelope, ignoring");
            report.out_of_envelope += 1;
            return;
        }

        let Some(breach) = evaluate_breach(config, reading.temperature) else {
            return;
        };

        let key = (config.id, breach.direction);
        let now = Instant::now();
        if self.in_cooldown(&key, now) {
            debug!(direction = %breach.direction, "Breach within cooldown window, suppressed");
            report.suppressed += 1;
            return;
        }

        report.fired += 1;
        crate::metrics::increment_alerts_fired(breach.direction.as_str());

        let delivery = self.notify(config, &reading, &breach).await;
        let delivered = delivery.is_ok();
        match &delivery {
            Ok(()) => report.notified += 1,
            Err(_) => report.notify_failures += 1,
        }

        let event = AlertEvent::record(config, &reading, breach, delivery);
        let recorded = match bounded(
            self.settings.call_timeout,
            self.events.append_event(&event),
            StoreError::Timeout,
        )
        .await
        {
            Ok(()) => {
                crate::metrics::increment_events_recorded(event.sent);
                info!(
                    event_id = %event.id,
                    camera_id = event.camera_id,
                    temperature = event.temperature,
                    threshold = event.threshold,
                    direction = %event.direction,
                    sent = event.sent,
                    "Alert event recorded"
                );
                true
            }
            Err(e) => {
                crate::metrics::increment_event_write_failures();
                error!(event_id = %event.id, error = %e, "Failed to record alert event");
                report.event_write_failures += 1;
                false
            }
        };

        // Only a delivered and audited alert opens the suppression window
        if self.settings.cooldown.is_some() && delivered && recorded {
            self.last_fired.insert(key, now);
        }
    }

    /// Attempts delivery and flattens the outcome into the text stored on the
    /// event. Never propagates.
    async fn notify(
        &self,
        config: &ThresholdConfig,
        reading: &Reading,
        breach: &Breach,
    ) -> Result<(), String> {
        let message = self
            .templates
            .zone_alert_email(config, reading, breach)
            .map_err(|e| e.to_string())?;

        match bounded(
            self.settings.call_timeout,
            self.notifier
                .send(&config.recipient, &message.subject, &message.body),
            NotifierError::Timeout,
        )
        .await
        {
            Ok(()) => {
                info!(recipient = %config.recipient, "Alert notification sent");
                Ok(())
            }
            Err(e) => {
                warn!(recipient = %config.recipient, error = %e, "Alert notification failed");
                Err(e.to_string())
            }
        }
    }

    fn in_cooldown(&self, key: &(Uuid, BreachDirection), now: Instant) -> bool {
        match (self.settings.cooldown, self.last_fired.get(key)) {
            (Some(window), Some(at)) => now.duration_since(*at) < window,
            _ => false,
        }
    }
}

async fn bounded<F, T, E>(limit: Option<Duration>, fut: F, on_timeout: E) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
{
    match limit {
        Some(limit) => match tokio::time::timeout(limit, fut).await {
            Ok(result) => result,
            Err(_) => Err(on_timeout),
        },
        None => fut.await,
    }
}
