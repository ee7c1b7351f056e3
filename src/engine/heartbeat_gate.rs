//! The pure decision combining every probe into send-or-withhold.

use std::collections::BTreeSet;

use crate::models::{HeartbeatDecision, ReasonCode};

/// Evaluates whether a heartbeat may be sent this cycle.
///
/// All rules must hold for `allowed = true`:
/// 1. the monitored process is confirmed running,
/// 2. no unignored error lines were appended since monitor start,
/// 3. if audio monitoring is enabled, activity is not stale.
///
/// Quality issues alone never block the heartbeat; they are alert-worthy but
/// only true staleness withholds it. The reason set is fully populated
/// rather than short-circuited so simultaneous problems are all visible.
pub fn evaluate(
    process_running: bool,
    log_error_count: usize,
    audio_enabled: bool,
    audio_stale: bool,
    _audio_quality_issues: bool,
) -> HeartbeatDecision {
    let mut blocking_reasons = BTreeSet::new();

    if !process_running {
        blocking_reasons.insert(ReasonCode::ProcessDown);
    }
    if log_error_count > 0 {
        blocking_reasons.insert(ReasonCode::LogErrors);
    }
    if audio_enabled && audio_stale {
        blocking_reasons.insert(ReasonCode::AudioStale);
    }

    HeartbeatDecision {
        allowed: blocking_reasons.is_empty(),
        blocking_reasons,
    }
}
