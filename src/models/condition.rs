//! Monitored-state conditions routed through deduplicated alerting.

use std::fmt;

/// Identifies a monitored condition independently of its message text.
///
/// Deduplication is keyed on this identifier, so alert wording may vary
/// between cycles without defeating suppression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConditionId {
    /// The monitored process was not found in the process table.
    ProcessDown,
    /// The process table itself could not be queried.
    ProcessProbeFailed,
    /// A post-start log line matched the given error keyword.
    LogError(String),
    /// The application log file does not exist.
    LogFileMissing,
    /// No recording has been processed within the allowed age.
    AudioStale,
    /// At least one recording failed the quality threshold this cycle.
    AudioQuality,
}

impl fmt::Display for ConditionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionId::ProcessDown => write!(f, "process_down"),
            ConditionId::ProcessProbeFailed => write!(f, "process_probe_failed"),
            ConditionId::LogError(keyword) => write!(f, "log_error:{keyword}"),
            ConditionId::LogFileMissing => write!(f, "log_file_missing"),
            ConditionId::AudioStale => write!(f, "audio_stale"),
            ConditionId::AudioQuality => write!(f, "audio_quality"),
        }
    }
}

/// A named monitored state together with its human-readable description.
///
/// Conditions are signals, not errors: they are produced by probes each cycle
/// and routed through the deduplicator, never raised through `Result`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    /// Stable identifier used for deduplication.
    pub id: ConditionId,
    /// Alert body shown to the operator.
    pub description: String,
}

impl Condition {
    /// Creates a condition with the given identifier and description.
    pub fn new(id: ConditionId, description: impl Into<String>) -> Self {
        Self {
            id,
            description: description.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_rendering() {
        assert_eq!(ConditionId::ProcessDown.to_string(), "process_down");
        assert_eq!(
            ConditionId::LogError("TIMEOUT".to_string()).to_string(),
            "log_error:TIMEOUT"
        );
        assert_eq!(ConditionId::AudioStale.to_string(), "audio_stale");
    }

    #[test]
    fn test_dedup_key_ignores_description() {
        let a = Condition::new(ConditionId::ProcessDown, "down at 10:00");
        let b = Condition::new(ConditionId::ProcessDown, "down at 10:05");
        assert_eq!(a.id, b.id);
        assert_ne!(a, b);
    }
}
