//! The monitoring cycle engine: stateful decision logic that combines
//! process liveness, log tail analysis and recording freshness into a single
//! heartbeat-or-alert outcome per tick.

pub mod audio_ledger;
pub mod dedup;
pub mod heartbeat_gate;
pub mod keyword_filter;
pub mod log_tail;

use std::{collections::BTreeMap, sync::Arc};

use chrono::{DateTime, Utc};

use crate::{
    actions::{ActionDispatcher, HeartbeatPayload, current_username},
    config::MonitorConfig,
    engine::{
        audio_ledger::{AudioLedger, is_stale},
        dedup::NotificationDeduplicator,
        keyword_filter::{LineClass, classify_line},
        log_tail::{LogTailTracker, TailError},
    },
    models::{Condition, ConditionId, HeartbeatDecision},
    probes::{DurationEstimator, ProcessProbe},
};

/// How many offending lines an alert body quotes before truncating.
const MAX_QUOTED_ERROR_LINES: usize = 3;

/// Maximum quoted length of a single offending line.
const MAX_QUOTED_LINE_CHARS: usize = 100;

/// Mutable state threaded across cycles.
///
/// Owned exclusively by the engine and held in memory only: a restart begins
/// a fresh ignore-window by design.
#[derive(Debug, Clone)]
pub struct CycleState {
    /// Set once at startup, never mutated. Log content from before this
    /// instant is permanently excluded from error analysis.
    pub monitor_start_time: DateTime<Utc>,
    /// Last time at least one recording was processed, `None` until the
    /// first one.
    pub last_audio_activity_time: Option<DateTime<Utc>>,
    /// Lifetime count of processed recordings, reported in the heartbeat.
    pub audio_files_processed: u64,
}

/// What one cycle observed and did.
#[derive(Debug)]
pub struct CycleReport {
    /// The gate's verdict for this cycle.
    pub decision: HeartbeatDecision,
    /// Every condition detected this cycle, before deduplication.
    pub conditions: Vec<Condition>,
    /// Conditions that newly activated and were dispatched as alerts.
    pub alerts_sent: Vec<ConditionId>,
    /// Whether the heartbeat went out.
    pub heartbeat_sent: bool,
    /// New log lines examined this cycle.
    pub log_lines_seen: usize,
    /// Recordings processed this cycle.
    pub audio_processed: u64,
}

/// Drives one monitoring tick at a time.
///
/// Single-threaded by construction: one cycle runs to completion before the
/// next is scheduled, and `CycleState` has no internal locking. Every
/// collaborator failure is caught at this boundary and downgraded to a log
/// line; a cycle never terminates the process.
pub struct MonitorEngine {
    config: Arc<MonitorConfig>,
    state: CycleState,
    log_tail: LogTailTracker,
    audio_ledger: Option<AudioLedger>,
    dedup: NotificationDeduplicator,
    process_probe: Box<dyn ProcessProbe>,
    dispatcher: Arc<dyn ActionDispatcher>,
    username: String,
}

impl MonitorEngine {
    /// Wires an engine from its collaborators and records monitor start.
    ///
    /// The log baseline is established here: everything already in the log
    /// file at this instant is excluded regardless of keyword content.
    pub fn new(
        config: Arc<MonitorConfig>,
        process_probe: Box<dyn ProcessProbe>,
        duration_estimator: Box<dyn DurationEstimator>,
        dispatcher: Arc<dyn ActionDispatcher>,
        started_at: DateTime<Utc>,
    ) -> Self {
        let log_tail = LogTailTracker::new(&config.log_file);
        let audio_ledger = config.monitor_audio.then(|| {
            AudioLedger::new(
                &config.recordings_dir,
                config.audio_quality_threshold_seconds,
                config.max_audio_age_hours,
                duration_estimator,
            )
        });

        Self {
            config,
            state: CycleState {
                monitor_start_time: started_at,
                last_audio_activity_time: None,
                audio_files_processed: 0,
            },
            log_tail,
            audio_ledger,
            dedup: NotificationDeduplicator::new(),
            process_probe,
            dispatcher,
            username: current_username(),
        }
    }

    /// The engine's threaded state, for reporting and tests.
    pub fn state(&self) -> &CycleState {
        &self.state
    }

    /// Runs one complete monitoring cycle at time `now`.
    ///
    /// Order: process probe, log tail read, recordings sweep, gate
    /// evaluation, deduplicated alert dispatch, heartbeat dispatch. A
    /// failure in any step is logged and the remaining steps still run.
    pub async fn run_cycle(&mut self, now: DateTime<Utc>) -> CycleReport {
        tracing::debug!("Starting monitoring cycle");
        let mut conditions = Vec::new();

        let process_running = self.probe_process(&mut conditions);
        let (log_lines_seen, log_error_count) = self.scan_log(&mut conditions);
        let (audio_processed, audio_stale, audio_quality_issues) =
            self.sweep_recordings(now, &mut conditions);

        let decision = heartbeat_gate::evaluate(
            process_running,
            log_error_count,
            self.audio_ledger.is_some(),
            audio_stale,
            audio_quality_issues,
        );

        let to_send = self.dedup.filter(conditions.clone());
        let mut alerts_sent = Vec::with_capacity(to_send.len());
        for condition in &to_send {
            alerts_sent.push(condition.id.clone());
            if let Err(e) = self.dispatcher.send_alert(condition).await {
                tracing::error!(condition = %condition.id, error = %e, "Alert delivery failed");
            }
        }

        let heartbeat_sent = if decision.allowed {
            self.send_heartbeat(now, process_running).await
        } else {
            tracing::warn!(reasons = ?decision.blocking_reasons, "Conditions not met for heartbeat, skipping");
            false
        };

        tracing::info!(
            heartbeat = heartbeat_sent,
            conditions = conditions.len(),
            alerts = alerts_sent.len(),
            "Monitoring cycle completed"
        );

        CycleReport {
            decision,
            conditions,
            alerts_sent,
            heartbeat_sent,
            log_lines_seen,
            audio_processed,
        }
    }

    /// Queries process liveness, failing closed on probe errors.
    fn probe_process(&self, conditions: &mut Vec<Condition>) -> bool {
        match self.process_probe.is_running(&self.config.process_name) {
            Ok(true) => true,
            Ok(false) => {
                conditions.push(Condition::new(
                    ConditionId::ProcessDown,
                    format!(
                        "No running process matches \"{}\". The application appears to be down.",
                        self.config.process_name
                    ),
                ));
                false
            }
            Err(e) => {
                tracing::error!(error = %e, "Process probe failed");
                conditions.push(Condition::new(
                    ConditionId::ProcessProbeFailed,
                    format!("Could not query the process list: {e}"),
                ));
                // Not confirmed running, so the gate blocks the heartbeat.
                false
            }
        }
    }

    /// Reads appended log lines and raises one condition per error keyword.
    fn scan_log(&mut self, conditions: &mut Vec<Condition>) -> (usize, usize) {
        let lines = match self.log_tail.read_new() {
            Ok(lines) => lines,
            Err(TailError::Missing(path)) => {
                conditions.push(Condition::new(
                    ConditionId::LogFileMissing,
                    format!("Log file not found: {}", path.display()),
                ));
                return (0, 0);
            }
            Err(e) => {
                tracing::error!(error = %e, "Log read failed, skipping log analysis this cycle");
                return (0, 0);
            }
        };

        let mut by_keyword: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for line in &lines {
            match classify_line(
                &line.text,
                &self.config.ignore_keywords,
                &self.config.error_keywords,
            ) {
                LineClass::Error(keyword) => {
                    tracing::info!(keyword = %keyword, offset = line.offset, "Error keyword in log line");
                    by_keyword.entry(keyword).or_default().push(line.text.clone());
                }
                LineClass::Ignored | LineClass::Benign => {}
            }
        }

        let error_count = by_keyword.values().map(Vec::len).sum();
        for (keyword, matched) in by_keyword {
            let description = summarize_log_errors(&keyword, &matched);
            conditions.push(Condition::new(ConditionId::LogError(keyword), description));
        }

        (lines.len(), error_count)
    }

    /// Sweeps the recordings directory and evaluates staleness.
    ///
    /// Returns `(processed, stale, quality_issues)`. All three are false/zero
    /// when audio monitoring is disabled: the gate then ignores audio
    /// entirely and no staleness condition exists.
    fn sweep_recordings(
        &mut self,
        now: DateTime<Utc>,
        conditions: &mut Vec<Condition>,
    ) -> (u64, bool, bool) {
        let Some(ledger) = &self.audio_ledger else {
            return (0, false, false);
        };

        let mut processed = 0;
        let mut quality_issues = false;
        match ledger.sweep(now) {
            Ok(outcome) => {
                if outcome.processed > 0 {
                    self.state.last_audio_activity_time = Some(now);
                    self.state.audio_files_processed += outcome.processed;
                    processed = outcome.processed;
                }
                if !outcome.quality_failures.is_empty() {
                    quality_issues = true;
                    conditions.push(Condition::new(
                        ConditionId::AudioQuality,
                        format!(
                            "{} recording(s) below the {}s quality threshold: {}",
                            outcome.quality_failures.len(),
                            self.config.audio_quality_threshold_seconds,
                            outcome.quality_failures.join(", ")
                        ),
                    ));
                }
            }
            Err(e) => {
                // Staleness is still evaluated below from existing state.
                tracing::error!(error = %e, "Recordings sweep failed");
            }
        }

        let last_activity = self
            .state
            .last_audio_activity_time
            .unwrap_or(self.state.monitor_start_time);
        let stale = is_stale(last_activity, now, self.config.max_audio_age_hours);
        if stale {
            let hours = self.config.max_audio_age_hours.as_secs() / 3600;
            conditions.push(Condition::new(
                ConditionId::AudioStale,
                format!("No recordings processed for more than {hours} hours."),
            ));
        }

        (processed, stale, quality_issues)
    }

    /// Builds and posts the heartbeat. Send failures are logged only; no
    /// alert is raised, since the receiving end observes missing heartbeats.
    async fn send_heartbeat(&self, now: DateTime<Utc>, process_running: bool) -> bool {
        let payload = HeartbeatPayload {
            timestamp: now,
            status: "healthy",
            process_running,
            audio_files_processed: self.state.audio_files_processed,
            username: self.username.clone(),
        };

        match self.dispatcher.send_heartbeat(&payload).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(error = %e, "Heartbeat delivery failed");
                false
            }
        }
    }
}

/// Builds the alert body for log errors under one keyword: at most the first
/// three offending lines, each truncated, plus a count of the rest.
fn summarize_log_errors(keyword: &str, lines: &[String]) -> String {
    let mut summary = format!(
        "Found {} log line(s) containing \"{}\":\n",
        lines.len(),
        keyword
    );
    for (i, line) in lines.iter().take(MAX_QUOTED_ERROR_LINES).enumerate() {
        let mut quoted: String = line.chars().take(MAX_QUOTED_LINE_CHARS).collect();
        if quoted.len() < line.len() {
            quoted.push_str("...");
        }
        summary.push_str(&format!("{}. {}\n", i + 1, quoted));
    }
    if lines.len() > MAX_QUOTED_ERROR_LINES {
        summary.push_str(&format!(
            "... and {} more",
            lines.len() - MAX_QUOTED_ERROR_LINES
        ));
    }
    summary.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use mockall::predicate::eq;
    use tempfile::TempDir;

    use super::*;
    use crate::{
        actions::MockActionDispatcher,
        probes::{MockDurationEstimator, MockProcessProbe},
        test_helpers::MonitorConfigBuilder,
    };

    fn workspace() -> (TempDir, std::path::PathBuf, std::path::PathBuf) {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("app.log");
        let recordings = dir.path().join("recordings");
        fs::write(&log, "").unwrap();
        fs::create_dir(&recordings).unwrap();
        (dir, log, recordings)
    }

    #[tokio::test]
    async fn test_probe_queried_with_configured_process_name() {
        let (_dir, log, recordings) = workspace();
        let config = MonitorConfigBuilder::new()
            .log_file(&log)
            .recordings_dir(&recordings)
            .monitor_audio(false)
            .build();

        let mut probe = MockProcessProbe::new();
        probe
            .expect_is_running()
            .with(eq("trunk-recorder"))
            .times(1)
            .returning(|_| Ok(true));

        let mut dispatcher = MockActionDispatcher::new();
        dispatcher
            .expect_send_heartbeat()
            .times(1)
            .returning(|_| Ok(()));

        let mut engine = MonitorEngine::new(
            Arc::new(config),
            Box::new(probe),
            Box::new(MockDurationEstimator::new()),
            Arc::new(dispatcher),
            Utc::now(),
        );

        let report = engine.run_cycle(Utc::now()).await;
        assert!(report.heartbeat_sent);
    }

    #[tokio::test]
    async fn test_persistent_down_alerts_once_and_blocks_every_cycle() {
        let (_dir, log, recordings) = workspace();
        let config = MonitorConfigBuilder::new()
            .log_file(&log)
            .recordings_dir(&recordings)
            .monitor_audio(false)
            .build();

        let mut probe = MockProcessProbe::new();
        probe.expect_is_running().times(3).returning(|_| Ok(false));

        let mut dispatcher = MockActionDispatcher::new();
        dispatcher
            .expect_send_alert()
            .withf(|c| c.id == ConditionId::ProcessDown)
            .times(1)
            .returning(|_| Ok(()));
        dispatcher.expect_send_heartbeat().times(0);

        let mut engine = MonitorEngine::new(
            Arc::new(config),
            Box::new(probe),
            Box::new(MockDurationEstimator::new()),
            Arc::new(dispatcher),
            Utc::now(),
        );

        for _ in 0..3 {
            let report = engine.run_cycle(Utc::now()).await;
            assert!(!report.decision.allowed);
        }
    }

    #[tokio::test]
    async fn test_sweep_consults_duration_estimator_per_file() {
        let (_dir, log, recordings) = workspace();
        fs::write(recordings.join("one.wav"), b"riff").unwrap();
        let config = MonitorConfigBuilder::new()
            .log_file(&log)
            .recordings_dir(&recordings)
            .monitor_audio(true)
            .quality_threshold(5.0)
            .build();

        let mut probe = MockProcessProbe::new();
        probe.expect_is_running().returning(|_| Ok(true));

        let mut estimator = MockDurationEstimator::new();
        estimator.expect_estimate().times(1).returning(|_| Some(8.0));

        let mut dispatcher = MockActionDispatcher::new();
        dispatcher
            .expect_send_heartbeat()
            .withf(|p| p.audio_files_processed == 1)
            .times(1)
            .returning(|_| Ok(()));

        let mut engine = MonitorEngine::new(
            Arc::new(config),
            Box::new(probe),
            Box::new(estimator),
            Arc::new(dispatcher),
            Utc::now(),
        );

        let report = engine.run_cycle(Utc::now()).await;
        assert_eq!(report.audio_processed, 1);
    }

    #[test]
    fn test_summary_quotes_up_to_three_lines() {
        let lines: Vec<String> = (1..=5).map(|i| format!("ERROR number {i}")).collect();
        let summary = summarize_log_errors("ERROR", &lines);

        assert!(summary.contains("Found 5 log line(s)"));
        assert!(summary.contains("1. ERROR number 1"));
        assert!(summary.contains("3. ERROR number 3"));
        assert!(!summary.contains("ERROR number 4"));
        assert!(summary.contains("... and 2 more"));
    }

    #[test]
    fn test_summary_truncates_long_lines() {
        let long = "x".repeat(300);
        let summary = summarize_log_errors("ERROR", &[long]);
        assert!(summary.contains(&format!("{}...", "x".repeat(100))));
        assert!(!summary.contains(&"x".repeat(101)));
    }
}
