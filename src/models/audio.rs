//! Per-file audio observations produced by the recordings sweep.

use std::path::PathBuf;

use chrono::{DateTime, Utc};

/// What happened to a recording after it was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioDisposition {
    /// Evaluated and removed from disk.
    Deleted,
    /// Removal failed; the file stays on disk and is retried next cycle.
    DeletionFailed,
    /// Older than the configured maximum age; removed without evaluation.
    Expired,
}

/// A single recording observed during one sweep of the recordings directory.
///
/// Observations are ephemeral: they exist for the cycle that produced them
/// and are discarded once the cycle report has been logged.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFileObservation {
    /// Full path of the recording.
    pub path: PathBuf,
    /// Estimated duration in seconds, `None` when the file was unreadable
    /// or expired before evaluation.
    pub duration_secs: Option<f64>,
    /// Filesystem modification time.
    pub modified_at: DateTime<Utc>,
    /// Whether the duration met the quality threshold. `None` for files
    /// that were never evaluated.
    pub quality_ok: Option<bool>,
    /// Outcome of the post-evaluation removal.
    pub disposition: AudioDisposition,
}

impl AudioFileObservation {
    /// The file name portion of the path, for log and alert text.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}
