//! Configuration loading and validation.
//!
//! The watchdog is configured by a single JSON file (`monitor_config.json` by
//! default), layered under `TRUNKWATCH__`-prefixed environment variables so
//! individual settings can be overridden without editing the file.

mod app_config;

pub use app_config::{ConfigError, MonitorConfig, TelegramConfig};

use serde::{Deserialize, Deserializer, Serializer};
use std::time::Duration;

/// Custom deserializer for Duration from seconds
pub fn deserialize_duration_from_seconds<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = u64::deserialize(deserializer)?;
    Ok(Duration::from_secs(secs))
}

/// Custom deserializer for Duration from hours
pub fn deserialize_duration_from_hours<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let hours = u64::deserialize(deserializer)?;
    Ok(Duration::from_secs(hours * 3600))
}

/// Custom serializer for Duration to seconds
pub fn serialize_duration_to_seconds<S>(
    duration: &Duration,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u64(duration.as_secs())
}

/// Custom serializer for Duration to hours
pub fn serialize_duration_to_hours<S>(
    duration: &Duration,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u64(duration.as_secs() / 3600)
}
