use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::alerting::SanityEnvelope;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("invalid value {value:?} for {name}")]
    Invalid { name: &'static str, value: String },
}

/// Settings for the alert worker process.
#[derive(Clone, Debug)]
pub struct WorkerConfig {
    pub database_url: String,
    pub poll_interval: Duration,
    pub envelope: SanityEnvelope,
    /// Upper bound on each store or notifier call. `None` waits indefinitely.
    pub call_timeout: Option<Duration>,
    /// Suppression window for repeated breaches. `None` re-alerts every cycle.
    pub cooldown: Option<Duration>,
    pub metrics_port: u16,
}

impl WorkerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let poll_secs: u64 = parse_or(&lookup, "ALERT_POLL_INTERVAL_SECS", 10)?;
        if poll_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "ALERT_POLL_INTERVAL_SECS",
                value: "0".into(),
            });
        }

        Ok(Self {
            database_url,
            poll_interval: Duration::from_secs(poll_secs),
            envelope: envelope(&lookup)?,
            call_timeout: parse_secs(&lookup, "ALERT_CALL_TIMEOUT_SECS")?,
            cooldown: parse_secs(&lookup, "ALERT_COOLDOWN_SECS")?,
            metrics_port: parse_or(&lookup, "METRICS_PORT", 9091)?,
        })
    }
}

/// Settings for the HTTP API process.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub database_url: String,
    pub port: u16,
    pub frontend_url: Option<String>,
    pub envelope: SanityEnvelope,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        Ok(Self {
            database_url,
            port: parse_or(&lookup, "PORT", 5000)?,
            frontend_url: lookup("FRONTEND_URL").filter(|url| !url.is_empty()),
            envelope: envelope(&lookup)?,
        })
    }
}

fn envelope<F>(lookup: &F) -> Result<SanityEnvelope, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let min: f64 = parse_or(lookup, "SENSOR_MIN_TEMP_C", SanityEnvelope::default().min)?;
    let max: f64 = parse_or(lookup, "SENSOR_MAX_TEMP_C", SanityEnvelope::default().max)?;
    if !(min <= max) {
        return Err(ConfigError::Invalid {
            name: "SENSOR_MIN_TEMP_C",
            value: format!("{} (greater than SENSOR_MAX_TEMP_C {})", min, max),
        });
    }
    Ok(SanityEnvelope::new(min, max))
}

/// Optional duration in whole seconds; unset, empty and `0` all mean disabled.
fn parse_secs<F>(lookup: &F, name: &'static str) -> Result<Option<Duration>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    Ok(parse_opt::<u64, _>(lookup, name)?
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs))
}

fn parse_opt<T, F>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name).map(|raw| raw.trim().to_string()) {
        None => Ok(None),
        Some(raw) if raw.is_empty() => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
    }
}

fn parse_or<T, F>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    Ok(parse_opt(lookup, name)?.unwrap_or(default))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn worker_defaults() {
        let cfg = WorkerConfig::from_lookup(lookup(&[("DATABASE_URL", "postgres://x")])).unwrap();
        assert_eq!(cfg.poll_interval, Duration::from_secs(10));
        assert_eq!(cfg.envelope, SanityEnvelope::new(-40.0, 150.0));
        assert!(cfg.call_timeout.is_none());
        assert!(cfg.cooldown.is_none());
        assert_eq!(cfg.metrics_port, 9091);
    }

    #[test]
    fn worker_overrides() {
        let cfg = WorkerConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x"),
            ("ALERT_POLL_INTERVAL_SECS", "30"),
            ("SENSOR_MIN_TEMP_C", "-20"),
            ("SENSOR_MAX_TEMP_C", "90.5"),
            ("ALERT_CALL_TIMEOUT_SECS", "5"),
            ("ALERT_COOLDOWN_SECS", "0"),
        ]))
        .unwrap();
        assert_eq!(cfg.poll_interval, Duration::from_secs(30));
        assert_eq!(cfg.envelope, SanityEnvelope::new(-20.0, 90.5));
        assert_eq!(cfg.call_timeout, Some(Duration::from_secs(5)));
        assert!(cfg.cooldown.is_none());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            WorkerConfig::from_lookup(lookup(&[])),
            Err(ConfigError::Missing("DATABASE_URL"))
        ));
        assert!(matches!(
            WorkerConfig::from_lookup(lookup(&[
                ("DATABASE_URL", "postgres://x"),
                ("ALERT_POLL_INTERVAL_SECS", "ten"),
            ])),
            Err(ConfigError::Invalid { name: "ALERT_POLL_INTERVAL_SECS", .. })
        ));
        assert!(WorkerConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x"),
            ("SENSOR_MIN_TEMP_C", "100"),
            ("SENSOR_MAX_TEMP_C", "50"),
        ]))
        .is_err());
    }

    #[test]
    fn zero_durations() {
        let cfg = WorkerConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x"),
            ("ALERT_CALL_TIMEOUT_SECS", "0"),
        ]))
        .unwrap();
        assert!(cfg.call_timeout.is_none());

        assert!(matches!(
            WorkerConfig::from_lookup(lookup(&[
                ("DATABASE_URL", "postgres://x"),
                ("ALERT_POLL_INTERVAL_SECS", "0"),
            ])),
            Err(ConfigError::Invalid { name: "ALERT_POLL_INTERVAL_SECS", .. })
        ));
    }

    #[test]
    fn server_rejects_inverted_envelope() {
        assert!(matches!(
            ServerConfig::from_lookup(lookup(&[
                ("DATABASE_URL", "postgres://x"),
                ("SENSOR_MIN_TEMP_C", "100"),
                ("SENSOR_MAX_TEMP_C", "50"),
            ])),
            Err(ConfigError::Invalid { name: "SENSOR_MIN_TEMP_C", .. })
        ));
    }

    #[test]
    fn server_defaults() {
        let cfg = ServerConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x"),
            ("FRONTEND_URL", ""),
        ]))
        .unwrap();
        assert_eq!(cfg.port, 5000);
        assert!(cfg.frontend_url.is_none());
    }
}
