use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use super::{
    deserialize_duration_from_hours, deserialize_duration_from_seconds,
    serialize_duration_to_hours, serialize_duration_to_seconds,
};

/// Provides the default value for check_interval_seconds.
fn default_check_interval() -> Duration {
    Duration::from_secs(60)
}

/// Provides the default value for max_audio_age_hours.
fn default_max_audio_age() -> Duration {
    Duration::from_secs(4 * 3600)
}

/// Provides the default value for audio_quality_threshold_seconds.
fn default_quality_threshold() -> f64 {
    5.0
}

/// Provides the default value for monitor_audio.
fn default_monitor_audio() -> bool {
    true
}

/// Provides the default value for error_keywords.
fn default_error_keywords() -> Vec<String> {
    [
        "ERROR",
        "FATAL",
        "FAILED",
        "EXCEPTION",
        "TIMEOUT",
        "Connection refused",
        "No Tuner Available",
        "Audio error",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Provides the default value for process_name.
fn default_process_name() -> String {
    "trunk-recorder".to_string()
}

/// Provides the default heartbeat endpoint written into a materialized
/// default config. It must be replaced before the heartbeat is useful, but it
/// parses and passes scheme validation so a fresh install starts cleanly.
fn default_heartbeat_url() -> Url {
    Url::parse("https://example.invalid/heartbeat").expect("static URL is valid")
}

/// Resolves the monitored application's base directory for the current user.
fn default_base_dir() -> PathBuf {
    let home = env::var_os("HOME")
        .or_else(|| env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    home.join("TrunkRecorder")
}

/// Provides the default value for log_file.
fn default_log_file() -> PathBuf {
    default_base_dir().join("logs").join("trunk-recorder.log")
}

/// Provides the default value for recordings_dir.
fn default_recordings_dir() -> PathBuf {
    default_base_dir().join("recordings")
}

/// Provides the default value for telegram.computer_name.
fn default_computer_name() -> String {
    "TrunkWatch".to_string()
}

/// Errors that can occur while loading or validating the configuration.
///
/// Any of these is fatal: configuration problems abort startup and never
/// occur mid-run, since the loaded config is immutable afterwards.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read or written.
    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file exists but could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] config::ConfigError),

    /// The heartbeat URL uses a scheme other than http or https.
    #[error("Unsupported heartbeat URL scheme: {0}")]
    UnsupportedUrlScheme(String),

    /// Telegram alerting is enabled but the bot token or channel id is blank.
    #[error("Telegram is enabled but bot_token or channel_id is not set")]
    IncompleteTelegramConfig,

    /// The check interval is zero, which would spin the monitoring loop.
    #[error("check_interval_seconds must be greater than zero")]
    ZeroCheckInterval,
}

/// Telegram alert channel settings.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TelegramConfig {
    /// Whether alerts are delivered to Telegram at all. When false the
    /// deduplicator still tracks condition state but no network call is made.
    #[serde(default)]
    pub enabled: bool,

    /// Bot API token used to build the sendMessage endpoint.
    #[serde(default)]
    pub bot_token: String,

    /// Chat or channel id the alerts are posted to.
    #[serde(default)]
    pub channel_id: String,

    /// Name prefixed to every alert so multiple installations share a channel.
    #[serde(default = "default_computer_name")]
    pub computer_name: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bot_token: String::new(),
            channel_id: String::new(),
            computer_name: default_computer_name(),
        }
    }
}

/// Application configuration for TrunkWatch.
///
/// Loaded once at startup and treated as immutable input by every component.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct MonitorConfig {
    /// Endpoint that receives the periodic health heartbeat.
    #[serde(default = "default_heartbeat_url")]
    pub heartbeat_url: Url,

    /// Substrings that mark a log line as an error. Matching is
    /// case-sensitive containment.
    #[serde(default = "default_error_keywords")]
    pub error_keywords: Vec<String>,

    /// Substrings that exempt a log line from error matching. Takes
    /// precedence over `error_keywords`.
    #[serde(default)]
    pub ignore_keywords: Vec<String>,

    /// Whether the recordings directory is swept at all.
    #[serde(default = "default_monitor_audio")]
    pub monitor_audio: bool,

    /// Interval between monitoring cycles, measured start to start.
    #[serde(
        default = "default_check_interval",
        deserialize_with = "deserialize_duration_from_seconds",
        serialize_with = "serialize_duration_to_seconds"
    )]
    pub check_interval_seconds: Duration,

    /// Minimum recording duration considered acceptable quality.
    #[serde(default = "default_quality_threshold")]
    pub audio_quality_threshold_seconds: f64,

    /// Maximum time without processed recordings before audio is stale.
    #[serde(
        default = "default_max_audio_age",
        deserialize_with = "deserialize_duration_from_hours",
        serialize_with = "serialize_duration_to_hours"
    )]
    pub max_audio_age_hours: Duration,

    /// Substring looked for in running process names and command lines.
    #[serde(default = "default_process_name")]
    pub process_name: String,

    /// Path to the monitored application's log file.
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,

    /// Path to the monitored application's recordings directory.
    #[serde(default = "default_recordings_dir")]
    pub recordings_dir: PathBuf,

    /// Telegram alert channel settings.
    #[serde(default)]
    pub telegram: TelegramConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            heartbeat_url: default_heartbeat_url(),
            error_keywords: default_error_keywords(),
            ignore_keywords: Vec::new(),
            monitor_audio: default_monitor_audio(),
            check_interval_seconds: default_check_interval(),
            audio_quality_threshold_seconds: default_quality_threshold(),
            max_audio_age_hours: default_max_audio_age(),
            process_name: default_process_name(),
            log_file: default_log_file(),
            recordings_dir: default_recordings_dir(),
            telegram: TelegramConfig::default(),
        }
    }
}

impl MonitorConfig {
    /// Loads the configuration from `path`, layered under
    /// `TRUNKWATCH__`-prefixed environment variables.
    ///
    /// A missing file is not an error: a documented default config is written
    /// to `path` and used, so a fresh install produces a file the operator can
    /// edit. A present-but-unparseable file aborts startup.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::warn!(path = %path.display(), "Config file not found, materializing defaults");
            Self::default().write_to(path)?;
        }

        let raw = fs::read_to_string(path)?;
        let s = Config::builder()
            .add_source(File::from_str(&raw, FileFormat::Json))
            .add_source(Environment::with_prefix("TRUNKWATCH").separator("__"))
            .build()?;
        let config: Self = s.try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Writes this configuration to `path` as pretty-printed JSON.
    pub fn write_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let body = serde_json::to_string_pretty(self)
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        fs::write(path, body)?;
        Ok(())
    }

    /// Validates cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.heartbeat_url.scheme() {
            "http" | "https" => {}
            other => return Err(ConfigError::UnsupportedUrlScheme(other.to_string())),
        }

        if self.check_interval_seconds.is_zero() {
            return Err(ConfigError::ZeroCheckInterval);
        }

        if self.telegram.enabled
            && (self.telegram.bot_token.trim().is_empty()
                || self.telegram.channel_id.trim().is_empty())
        {
            return Err(ConfigError::IncompleteTelegramConfig);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("monitor_config.json");
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_load_full_config() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"{
                "heartbeat_url": "https://hb.example.com/ping",
                "error_keywords": ["ERROR", "FATAL"],
                "ignore_keywords": ["DEBUG"],
                "monitor_audio": false,
                "check_interval_seconds": 30,
                "audio_quality_threshold_seconds": 2.5,
                "max_audio_age_hours": 6,
                "process_name": "decoder",
                "telegram": {
                    "enabled": true,
                    "bot_token": "123:abc",
                    "channel_id": "-100",
                    "computer_name": "rack-1"
                }
            }"#,
        );

        let config = MonitorConfig::load(&path).unwrap();
        assert_eq!(config.heartbeat_url.as_str(), "https://hb.example.com/ping");
        assert_eq!(config.error_keywords, vec!["ERROR", "FATAL"]);
        assert_eq!(config.ignore_keywords, vec!["DEBUG"]);
        assert!(!config.monitor_audio);
        assert_eq!(config.check_interval_seconds, Duration::from_secs(30));
        assert_eq!(config.audio_quality_threshold_seconds, 2.5);
        assert_eq!(config.max_audio_age_hours, Duration::from_secs(6 * 3600));
        assert_eq!(config.process_name, "decoder");
        assert!(config.telegram.enabled);
        assert_eq!(config.telegram.computer_name, "rack-1");
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, r#"{"heartbeat_url": "http://localhost:9000/hb"}"#);

        let config = MonitorConfig::load(&path).unwrap();
        assert!(config.monitor_audio);
        assert_eq!(config.check_interval_seconds, Duration::from_secs(60));
        assert_eq!(config.max_audio_age_hours, Duration::from_secs(4 * 3600));
        assert!(!config.telegram.enabled);
    }

    #[test]
    fn test_missing_file_materializes_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("monitor_config.json");

        let config = MonitorConfig::load(&path).unwrap();
        assert!(path.exists(), "default config should be written");
        assert_eq!(config, MonitorConfig::default());

        let on_disk: MonitorConfig =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk, config);
    }

    #[test]
    fn test_unparseable_file_is_fatal() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "not json at all {");

        let result = MonitorConfig::load(&path);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        let mut config = MonitorConfig::default();
        config.heartbeat_url = Url::parse("ftp://example.com/hb").unwrap();

        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::UnsupportedUrlScheme(_))));
    }

    #[test]
    fn test_rejects_incomplete_telegram() {
        let mut config = MonitorConfig::default();
        config.telegram.enabled = true;
        config.telegram.bot_token = "123:abc".to_string();

        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::IncompleteTelegramConfig)));
    }

    #[test]
    fn test_rejects_zero_interval() {
        let mut config = MonitorConfig::default();
        config.check_interval_seconds = Duration::ZERO;

        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::ZeroCheckInterval)));
    }
}
