use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Accuracy/power tradeoff requested from the location provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Priority {
    /// Most precise fixes available (GPS).
    #[default]
    HighAccuracy,
    /// Block-level accuracy.
    Balanced,
    /// City-level accuracy.
    LowPower,
    /// Only fixes other apps already requested.
    Passive,
}

impl Priority {
    /// Minimum platform accuracy level that satisfies this priority, on the
    /// GeoClue2 scale (1 country, 4 city, 6 street, 8 exact).
    #[must_use]
    pub const fn min_accuracy_level(self) -> u32 {
        match self {
            Self::HighAccuracy => 8,
            Self::Balanced => 6,
            Self::LowPower => 4,
            Self::Passive => 1,
        }
    }
}

/// What the flow asks of the location provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationRequestConfig {
    /// Requested accuracy.
    pub priority: Priority,
    /// Update interval in milliseconds.
    pub interval_ms: u64,
}

impl LocationRequestConfig {
    /// Interval used when none is configured.
    pub const DEFAULT_INTERVAL_MS: u64 = 3000;

    /// High accuracy, one fix every three seconds.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            priority: Priority::HighAccuracy,
            interval_ms: Self::DEFAULT_INTERVAL_MS,
        }
    }

    /// Sets the update interval.
    #[must_use]
    pub const fn with_interval_ms(mut self, interval_ms: u64) -> Self {
        self.interval_ms = interval_ms;
        self
    }

    /// Sets the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// The update interval as a [`Duration`].
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Parses a configuration from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if `json` is malformed or names an unknown priority.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl Default for LocationRequestConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_high_accuracy_every_three_seconds() {
        let config = LocationRequestConfig::default();
        assert_eq!(config.priority, Priority::HighAccuracy);
        assert_eq!(config.interval(), Duration::from_secs(3));
    }

    #[test]
    fn json_fills_missing_fields() {
        let config = LocationRequestConfig::from_json(r#"{"interval_ms": 500}"#).unwrap();
        assert_eq!(config, LocationRequestConfig::new().with_interval_ms(500));

        let config = LocationRequestConfig::from_json(r#"{"priority": "low-power"}"#).unwrap();
        assert_eq!(config.priority, Priority::LowPower);
        assert_eq!(config.interval_ms, LocationRequestConfig::DEFAULT_INTERVAL_MS);
    }

    #[test]
    fn unknown_priority_is_rejected() {
        assert!(LocationRequestConfig::from_json(r#"{"priority": "fastest"}"#).is_err());
    }
}
