//! Shared builders and fakes for unit and integration tests.

use std::{
    path::{Path, PathBuf},
    sync::Mutex,
    time::Duration,
};

use async_trait::async_trait;
use url::Url;

use crate::{
    actions::{ActionDispatcher, ActionError, HeartbeatPayload},
    config::{MonitorConfig, TelegramConfig},
    models::Condition,
    probes::{DurationEstimator, ProbeError, ProcessProbe},
};

/// Builder for `MonitorConfig` values in tests.
#[derive(Debug)]
pub struct MonitorConfigBuilder {
    config: MonitorConfig,
}

impl Default for MonitorConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MonitorConfigBuilder {
    /// Starts from the crate defaults with a localhost heartbeat endpoint.
    pub fn new() -> Self {
        let mut config = MonitorConfig::default();
        config.heartbeat_url = Url::parse("http://127.0.0.1:9/heartbeat").expect("static URL");
        Self { config }
    }

    /// Sets the heartbeat endpoint.
    pub fn heartbeat_url(mut self, url: &str) -> Self {
        self.config.heartbeat_url = Url::parse(url).expect("test URL must parse");
        self
    }

    /// Sets the error keyword list.
    pub fn error_keywords(mut self, keywords: &[&str]) -> Self {
        self.config.error_keywords = keywords.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Sets the ignore keyword list.
    pub fn ignore_keywords(mut self, keywords: &[&str]) -> Self {
        self.config.ignore_keywords = keywords.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Enables or disables the recordings sweep.
    pub fn monitor_audio(mut self, enabled: bool) -> Self {
        self.config.monitor_audio = enabled;
        self
    }

    /// Sets the quality threshold in seconds.
    pub fn quality_threshold(mut self, seconds: f64) -> Self {
        self.config.audio_quality_threshold_seconds = seconds;
        self
    }

    /// Sets the maximum audio age.
    pub fn max_audio_age(mut self, age: Duration) -> Self {
        self.config.max_audio_age_hours = age;
        self
    }

    /// Sets the log file path.
    pub fn log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.log_file = path.into();
        self
    }

    /// Sets the recordings directory.
    pub fn recordings_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.recordings_dir = path.into();
        self
    }

    /// Sets the Telegram section.
    pub fn telegram(mut self, telegram: TelegramConfig) -> Self {
        self.config.telegram = telegram;
        self
    }

    /// Finishes the build.
    pub fn build(self) -> MonitorConfig {
        self.config
    }
}

/// Process probe returning a fixed answer.
#[derive(Debug)]
pub struct StaticProcessProbe {
    running: Mutex<bool>,
}

impl StaticProcessProbe {
    /// Creates a probe that always answers `running`.
    pub fn new(running: bool) -> Self {
        Self {
            running: Mutex::new(running),
        }
    }

    /// Changes the answer for subsequent cycles.
    pub fn set_running(&self, running: bool) {
        *self.running.lock().expect("probe lock") = running;
    }
}

impl ProcessProbe for StaticProcessProbe {
    fn is_running(&self, _name_fragment: &str) -> Result<bool, ProbeError> {
        Ok(*self.running.lock().expect("probe lock"))
    }
}

// Tests keep a handle to flip the answer while the engine owns the probe.
impl ProcessProbe for std::sync::Arc<StaticProcessProbe> {
    fn is_running(&self, name_fragment: &str) -> Result<bool, ProbeError> {
        self.as_ref().is_running(name_fragment)
    }
}

/// Process probe whose queries always fail.
#[derive(Debug, Default)]
pub struct FailingProcessProbe;

impl ProcessProbe for FailingProcessProbe {
    fn is_running(&self, _name_fragment: &str) -> Result<bool, ProbeError> {
        Err(ProbeError::Query("simulated probe failure".to_string()))
    }
}

/// Duration estimator returning the same value for every file.
#[derive(Debug)]
pub struct FixedDurationEstimator(
    /// The duration reported for every file.
    pub Option<f64>,
);

impl DurationEstimator for FixedDurationEstimator {
    fn estimate(&self, _path: &Path) -> Option<f64> {
        self.0
    }
}

/// Dispatcher that records every send instead of performing network calls.
#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    heartbeats: Mutex<Vec<HeartbeatPayload>>,
    alerts: Mutex<Vec<Condition>>,
    fail_sends: Mutex<bool>,
}

impl RecordingDispatcher {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent sends return an error, to exercise the
    /// failure-is-logged-not-fatal paths.
    pub fn set_fail_sends(&self, fail: bool) {
        *self.fail_sends.lock().expect("dispatcher lock") = fail;
    }

    /// Heartbeats recorded so far.
    pub fn heartbeats(&self) -> Vec<HeartbeatPayload> {
        self.heartbeats.lock().expect("dispatcher lock").clone()
    }

    /// Alerts recorded so far.
    pub fn alerts(&self) -> Vec<Condition> {
        self.alerts.lock().expect("dispatcher lock").clone()
    }

    fn failing(&self) -> bool {
        *self.fail_sends.lock().expect("dispatcher lock")
    }

    fn rejected() -> ActionError {
        ActionError::HeartbeatRejected(reqwest::StatusCode::INTERNAL_SERVER_ERROR)
    }
}

#[async_trait]
impl ActionDispatcher for RecordingDispatcher {
    async fn send_heartbeat(&self, payload: &HeartbeatPayload) -> Result<(), ActionError> {
        if self.failing() {
            return Err(Self::rejected());
        }
        self.heartbeats
            .lock()
            .expect("dispatcher lock")
            .push(payload.clone());
        Ok(())
    }

    async fn send_alert(&self, condition: &Condition) -> Result<(), ActionError> {
        if self.failing() {
            return Err(Self::rejected());
        }
        self.alerts
            .lock()
            .expect("dispatcher lock")
            .push(condition.clone());
        Ok(())
    }
}
