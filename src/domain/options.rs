//! Validated gate options and their configuration-file counterparts.
//!
//! Options are expressed with [`Duration`], so they cannot be negative by
//! construction. Configuration files usually carry plain signed millisecond
//! integers instead; [`DebounceConfig`] and [`ThrottleConfig`] accept those and
//! are checked on conversion, so a bad value fails when the gate is built and
//! never on its first call.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Error returned when gate configuration is invalid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A millisecond value was negative.
    #[error("{field} must not be negative (got {value})")]
    Negative {
        /// Name of the offending configuration key
        field: &'static str,
        /// The rejected value
        value: i64,
    },
    /// Throttle interval must be greater than zero
    #[error("throttle interval must be greater than 0")]
    ZeroInterval,
    /// A throttle with neither edge enabled would never invoke anything
    #[error("throttle must enable at least one of the leading or trailing edges")]
    NoEdgeEnabled,
    /// No scheduler was supplied and none could be derived from the environment
    #[error("no scheduler configured and no tokio runtime is available")]
    NoScheduler,
}

fn non_negative_ms(field: &'static str, value: i64) -> Result<Duration, ConfigError> {
    u64::try_from(value)
        .map(Duration::from_millis)
        .map_err(|_| ConfigError::Negative { field, value })
}

/// Options for a debounce gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceOptions {
    /// Quiet period that must elapse with no new calls before the trailing invocation.
    pub delay: Duration,
    /// Invoke immediately on the first call of a burst.
    pub leading: bool,
    /// Upper bound on how long a continuous burst may hold back an invocation.
    pub max_wait: Option<Duration>,
}

impl DebounceOptions {
    /// Trailing-only debounce with the given quiet period.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            leading: false,
            max_wait: None,
        }
    }

    /// Enable or disable the leading edge.
    pub fn with_leading(mut self, leading: bool) -> Self {
        self.leading = leading;
        self
    }

    /// Bound the latency of a continuous burst.
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }
}

/// Options for a throttle gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleOptions {
    /// Minimum spacing between two invocations.
    pub interval: Duration,
    /// Invoke immediately when a call opens a new window.
    pub leading: bool,
    /// Honour the last suppressed call once the window closes.
    pub trailing: bool,
}

impl ThrottleOptions {
    /// Leading and trailing throttle with the given interval.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            leading: true,
            trailing: true,
        }
    }

    /// Enable or disable the leading edge.
    pub fn with_leading(mut self, leading: bool) -> Self {
        self.leading = leading;
        self
    }

    /// Enable or disable the trailing edge.
    pub fn with_trailing(mut self, trailing: bool) -> Self {
        self.trailing = trailing;
        self
    }

    /// Check the options.
    ///
    /// # Errors
    /// Returns [`ConfigError::ZeroInterval`] for a zero interval and
    /// [`ConfigError::NoEdgeEnabled`] if both edges are disabled.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        if !self.leading && !self.trailing {
            return Err(ConfigError::NoEdgeEnabled);
        }
        Ok(())
    }
}

/// Debounce settings as they appear in a configuration file.
///
/// ```
/// use callgate::{DebounceConfig, DebounceOptions};
/// use std::time::Duration;
///
/// let config: DebounceConfig =
///     serde_json::from_str(r#"{ "delay_ms": 250, "max_wait_ms": 1000 }"#).unwrap();
/// let options = DebounceOptions::try_from(config).unwrap();
/// assert_eq!(options.delay, Duration::from_millis(250));
/// assert_eq!(options.max_wait, Some(Duration::from_secs(1)));
/// assert!(!options.leading);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebounceConfig {
    /// Quiet period in milliseconds
    pub delay_ms: i64,
    /// Fire on the first call of a burst
    #[serde(default)]
    pub leading: bool,
    /// Maximum burst latency in milliseconds, absent for unbounded
    #[serde(default)]
    pub max_wait_ms: Option<i64>,
}

impl TryFrom<DebounceConfig> for DebounceOptions {
    type Error = ConfigError;

    fn try_from(config: DebounceConfig) -> Result<Self, Self::Error> {
        let mut options = DebounceOptions::new(non_negative_ms("delay_ms", config.delay_ms)?)
            .with_leading(config.leading);
        if let Some(max_wait_ms) = config.max_wait_ms {
            options = options.with_max_wait(non_negative_ms("max_wait_ms", max_wait_ms)?);
        }
        Ok(options)
    }
}

/// Throttle settings as they appear in a configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrottleConfig {
    /// Minimum spacing in milliseconds
    pub interval_ms: i64,
    /// Fire when a call opens a new window
    #[serde(default = "default_true")]
    pub leading: bool,
    /// Honour the last call of a burst
    #[serde(default = "default_true")]
    pub trailing: bool,
}

fn default_true() -> bool {
    true
}

impl TryFrom<ThrottleConfig> for ThrottleOptions {
    type Error = ConfigError;

    fn try_from(config: ThrottleConfig) -> Result<Self, Self::Error> {
        let options = ThrottleOptions::new(non_negative_ms("interval_ms", config.interval_ms)?)
            .with_leading(config.leading)
            .with_trailing(config.trailing);
        options.validate()?;
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debounce_defaults() {
        let options = DebounceOptions::new(Duration::from_millis(100));
        assert!(!options.leading);
        assert_eq!(options.max_wait, None);
    }

    #[test]
    fn test_throttle_defaults() {
        let options = ThrottleOptions::new(Duration::from_millis(100));
        assert!(options.leading);
        assert!(options.trailing);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_throttle_zero_interval() {
        let options = ThrottleOptions::new(Duration::ZERO);
        assert_eq!(options.validate(), Err(ConfigError::ZeroInterval));
    }

    #[test]
    fn test_throttle_no_edge() {
        let options = ThrottleOptions::new(Duration::from_millis(10))
            .with_leading(false)
            .with_trailing(false);
        assert_eq!(options.validate(), Err(ConfigError::NoEdgeEnabled));
    }

    #[test]
    fn test_negative_delay_rejected() {
        let config = DebounceConfig {
            delay_ms: -5,
            leading: false,
            max_wait_ms: None,
        };
        assert_eq!(
            DebounceOptions::try_from(config),
            Err(ConfigError::Negative {
                field: "delay_ms",
                value: -5
            })
        );
    }

    #[test]
    fn test_negative_max_wait_rejected() {
        let config = DebounceConfig {
            delay_ms: 10,
            leading: true,
            max_wait_ms: Some(-1),
        };
        assert!(matches!(
            DebounceOptions::try_from(config),
            Err(ConfigError::Negative {
                field: "max_wait_ms",
                ..
            })
        ));
    }

    #[test]
    fn test_zero_delay_accepted() {
        let config = DebounceConfig {
            delay_ms: 0,
            leading: false,
            max_wait_ms: None,
        };
        let options = DebounceOptions::try_from(config).unwrap();
        assert_eq!(options.delay, Duration::ZERO);
    }

    #[test]
    fn test_throttle_config_defaults_from_json() {
        let config: ThrottleConfig = serde_json::from_str(r#"{ "interval_ms": 200 }"#).unwrap();
        assert!(config.leading);
        assert!(config.trailing);

        let options = ThrottleOptions::try_from(config).unwrap();
        assert_eq!(options.interval, Duration::from_millis(200));
    }

    #[test]
    fn test_throttle_config_negative_interval() {
        let config: ThrottleConfig =
            serde_json::from_str(r#"{ "interval_ms": -1, "trailing": false }"#).unwrap();
        assert_eq!(
            ThrottleOptions::try_from(config),
            Err(ConfigError::Negative {
                field: "interval_ms",
                value: -1
            })
        );
    }

    #[test]
    fn test_throttle_config_zero_interval() {
        let config: ThrottleConfig = serde_json::from_str(r#"{ "interval_ms": 0 }"#).unwrap();
        assert_eq!(
            ThrottleOptions::try_from(config),
            Err(ConfigError::ZeroInterval)
        );
    }

    #[test]
    fn test_error_display() {
        let err = ConfigError::Negative {
            field: "delay_ms",
            value: -3,
        };
        assert_eq!(err.to_string(), "delay_ms must not be negative (got -3)");
        assert_eq!(
            ConfigError::ZeroInterval.to_string(),
            "throttle interval must be greater than 0"
        );
    }
}
