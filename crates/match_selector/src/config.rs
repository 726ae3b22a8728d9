use anyhow::{anyhow, bail, Result};
use chrono::Duration;
use std::env;
use std::str::FromStr;
use tracing::warn;

/// Horní mez pro TIME_BUCKET i MAX_TIME_PER_MATCH (1 den)
pub const MAX_WINDOW_SECS: i64 = 86_400;

/// Laditelné konstanty selektoru
#[derive(Debug, Clone)]
pub struct SelectorConfig {
    /// Okno od nejbližšího zápasu, do kterého padají kandidáti (TIME_BUCKET)
    pub time_bucket: Duration,
    /// Max doba na jednom zápasu, pak blacklist (MAX_TIME_PER_MATCH)
    pub max_time_per_match: Duration,
    /// Kolik nejbližších neodehraných zápasů bereme z každého eventu
    pub matches_per_event: usize,
    pub state_key: String,
    pub virtual_event_id: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            time_bucket: Duration::minutes(1),
            max_time_per_match: Duration::minutes(5),
            matches_per_event: 1,
            state_key: "bluezone".to_string(),
            virtual_event_id: "bluezone".to_string(),
        }
    }
}

impl SelectorConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let cfg = Self {
            time_bucket: env_duration("BLUEZONE_TIME_BUCKET_SECS", defaults.time_bucket)?,
            max_time_per_match: env_duration(
                "BLUEZONE_MAX_TIME_PER_MATCH_SECS",
                defaults.max_time_per_match,
            )?,
            matches_per_event: env_parse("BLUEZONE_MATCHES_PER_EVENT", defaults.matches_per_event),
            state_key: env::var("BLUEZONE_STATE_KEY").unwrap_or(defaults.state_key),
            virtual_event_id: env::var("BLUEZONE_VIRTUAL_EVENT_ID")
                .unwrap_or(defaults.virtual_event_id),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.time_bucket <= Duration::zero() {
            bail!("time bucket must be positive, got {}s", self.time_bucket.num_seconds());
        }
        if self.max_time_per_match < Duration::zero() {
            bail!(
                "max time per match must not be negative, got {}s",
                self.max_time_per_match.num_seconds()
            );
        }
        for (name, window) in [
            ("time bucket", self.time_bucket),
            ("max time per match", self.max_time_per_match),
        ] {
            if window > Duration::seconds(MAX_WINDOW_SECS) {
                bail!(
                    "{name} must be at most {MAX_WINDOW_SECS}s, got {}s",
                    window.num_seconds()
                );
            }
        }
        if self.matches_per_event == 0 {
            bail!("matches per event must be at least 1");
        }
        if self.state_key.is_empty() || self.virtual_event_id.is_empty() {
            bail!("state key and virtual event id must not be empty");
        }
        Ok(())
    }

    /// Perioda ticku: 0 je chyba, `Ok(true)` = delší než TIME_BUCKET
    /// (anti-flicker pak nedrží, stačí warn)
    pub fn tick_exceeds_bucket(&self, tick_secs: u64) -> Result<bool> {
        if tick_secs == 0 {
            bail!("tick interval must be at least 1s");
        }
        Ok(i64::try_from(tick_secs).map_or(true, |t| t > self.time_bucket.num_seconds()))
    }
}

/// Délka v sekundách z env; hodnota mimo rozsah `Duration` je chyba
fn env_duration(name: &str, default: Duration) -> Result<Duration> {
    let secs: i64 = env_parse(name, default.num_seconds());
    Duration::try_seconds(secs).ok_or_else(|| anyhow!("{name}={secs} is out of range"))
}

/// Env proměnná s fallbackem na default (nečitelná hodnota = warn + default)
pub fn env_parse<T>(name: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{name}={raw:?} is not valid, using default {default}");
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_constants() {
        let cfg = SelectorConfig::default();
        assert_eq!(cfg.time_bucket.num_seconds(), 60);
        assert_eq!(cfg.max_time_per_match.num_seconds(), 300);
        assert_eq!(cfg.matches_per_event, 1);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_degenerate_settings() {
        let cfg = SelectorConfig {
            time_bucket: Duration::zero(),
            ..SelectorConfig::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = SelectorConfig {
            matches_per_event: 0,
            ..SelectorConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_oversized_windows() {
        let cfg = SelectorConfig {
            max_time_per_match: Duration::seconds(10_000_000_000_000),
            ..SelectorConfig::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = SelectorConfig {
            time_bucket: Duration::seconds(MAX_WINDOW_SECS + 1),
            ..SelectorConfig::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = SelectorConfig {
            time_bucket: Duration::seconds(MAX_WINDOW_SECS),
            max_time_per_match: Duration::seconds(MAX_WINDOW_SECS),
            ..SelectorConfig::default()
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn tick_interval_checks() {
        let cfg = SelectorConfig::default();
        assert!(cfg.tick_exceeds_bucket(0).is_err());
        assert!(!cfg.tick_exceeds_bucket(30).unwrap());
        assert!(!cfg.tick_exceeds_bucket(60).unwrap());
        assert!(cfg.tick_exceeds_bucket(61).unwrap());
        assert!(cfg.tick_exceeds_bucket(u64::MAX).unwrap());
    }

    #[test]
    fn env_duration_rejects_out_of_range_seconds() {
        env::set_var("BLUEZONE_TEST_ENV_DURATION_HUGE", "9223372036854775807");
        assert!(env_duration("BLUEZONE_TEST_ENV_DURATION_HUGE", Duration::minutes(1)).is_err());
        env::set_var("BLUEZONE_TEST_ENV_DURATION_OK", "90");
        assert_eq!(
            env_duration("BLUEZONE_TEST_ENV_DURATION_OK", Duration::minutes(1)).unwrap(),
            Duration::seconds(90)
        );
    }

    #[test]
    fn env_parse_falls_back_on_garbage() {
        env::set_var("BLUEZONE_TEST_ENV_PARSE_GARBAGE", "five");
        assert_eq!(env_parse("BLUEZONE_TEST_ENV_PARSE_GARBAGE", 7u64), 7);
        env::set_var("BLUEZONE_TEST_ENV_PARSE_OK", " 42 ");
        assert_eq!(env_parse("BLUEZONE_TEST_ENV_PARSE_OK", 7u64), 42);
        assert_eq!(env_parse("BLUEZONE_TEST_ENV_PARSE_UNSET", 3usize), 3);
    }
}
