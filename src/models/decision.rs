//! The per-cycle heartbeat decision.

use std::collections::BTreeSet;

/// Reason a heartbeat was withheld.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReasonCode {
    /// The monitored process is not confirmed running.
    ProcessDown,
    /// Unignored error lines were appended to the log since monitor start.
    LogErrors,
    /// Audio monitoring is enabled and no recent recording activity exists.
    AudioStale,
}

/// Outcome of the heartbeat gate for one cycle.
///
/// `blocking_reasons` is always fully populated rather than short-circuited,
/// so every simultaneous problem is visible to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeartbeatDecision {
    /// Whether the heartbeat may be sent this cycle.
    pub allowed: bool,
    /// Every rule that failed, empty when `allowed` is true.
    pub blocking_reasons: BTreeSet<ReasonCode>,
}
