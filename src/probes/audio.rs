//! Recording duration estimation.

use std::path::Path;

#[cfg(test)]
use mockall::automock;

/// Estimates the playable duration of a recording.
#[cfg_attr(test, automock)]
pub trait DurationEstimator: Send + Sync {
    /// Returns the duration in seconds, or `None` when the file cannot be
    /// decoded. An unknown duration is treated as a quality failure by the
    /// ledger, never as an error.
    fn estimate(&self, path: &Path) -> Option<f64>;
}

/// Duration estimator for WAV recordings, reading only the header.
#[derive(Debug, Default)]
pub struct WavDurationEstimator;

impl WavDurationEstimator {
    /// Creates a new estimator.
    pub fn new() -> Self {
        Self
    }
}

impl DurationEstimator for WavDurationEstimator {
    fn estimate(&self, path: &Path) -> Option<f64> {
        let reader = match hound::WavReader::open(path) {
            Ok(reader) => reader,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Unreadable WAV header");
                return None;
            }
        };

        let spec = reader.spec();
        if spec.sample_rate == 0 {
            return None;
        }

        Some(f64::from(reader.duration()) / f64::from(spec.sample_rate))
    }
}
