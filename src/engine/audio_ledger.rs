//! Per-cycle sweep of the recordings directory.

use std::{fs, path::PathBuf, time::Duration};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
    models::{AudioDisposition, AudioFileObservation},
    probes::DurationEstimator,
};

/// Errors that abort a whole sweep. Per-file failures never do; they are
/// recorded on the observation and retried next cycle.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The recordings directory could not be listed.
    #[error("Failed to read recordings directory {path}: {source}")]
    DirUnreadable {
        /// The directory that failed to list.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Aggregate result of one sweep.
#[derive(Debug, Default)]
pub struct SweepOutcome {
    /// Every recording observed, with its disposition.
    pub observations: Vec<AudioFileObservation>,
    /// Recordings evaluated and removed this cycle. Any processed file
    /// counts as activity, independent of its quality outcome.
    pub processed: u64,
    /// File names that failed the quality threshold.
    pub quality_failures: Vec<String>,
}

/// Inspects the recordings directory once per cycle and decides each file's
/// disposition.
///
/// Recordings exist to signal activity, not for archival: every evaluated
/// file is removed, quality pass or fail. A file older than the maximum
/// audio age is reclaimed without evaluation and does not count as activity.
pub struct AudioLedger {
    recordings_dir: PathBuf,
    quality_threshold_secs: f64,
    max_age: Duration,
    estimator: Box<dyn DurationEstimator>,
}

impl AudioLedger {
    /// Creates a ledger over `recordings_dir`.
    pub fn new(
        recordings_dir: impl Into<PathBuf>,
        quality_threshold_secs: f64,
        max_age: Duration,
        estimator: Box<dyn DurationEstimator>,
    ) -> Self {
        Self {
            recordings_dir: recordings_dir.into(),
            quality_threshold_secs,
            max_age,
            estimator,
        }
    }

    /// Sweeps the recordings directory, evaluating and removing recordings.
    pub fn sweep(&self, now: DateTime<Utc>) -> Result<SweepOutcome, LedgerError> {
        let entries = fs::read_dir(&self.recordings_dir).map_err(|source| {
            LedgerError::DirUnreadable {
                path: self.recordings_dir.clone(),
                source,
            }
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"))
            })
            .collect();
        paths.sort();

        let mut outcome = SweepOutcome::default();

        for path in paths {
            let modified_at = match fs::metadata(&path).and_then(|m| m.modified()) {
                Ok(mtime) => DateTime::<Utc>::from(mtime),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable recording");
                    continue;
                }
            };

            let age_exceeded = now
                .signed_duration_since(modified_at)
                .to_std()
                .map(|age| age > self.max_age)
                .unwrap_or(false);

            if age_exceeded {
                let disposition = self.remove(&path, AudioDisposition::Expired);
                tracing::warn!(path = %path.display(), "Recording exceeded max age, reclaiming");
                outcome.observations.push(AudioFileObservation {
                    path,
                    duration_secs: None,
                    modified_at,
                    quality_ok: None,
                    disposition,
                });
                continue;
            }

            let duration_secs = self.estimator.estimate(&path);
            let quality_ok = duration_secs
                .map(|d| d >= self.quality_threshold_secs)
                .unwrap_or(false);

            let disposition = self.remove(&path, AudioDisposition::Deleted);

            let observation = AudioFileObservation {
                path,
                duration_secs,
                modified_at,
                quality_ok: Some(quality_ok),
                disposition,
            };

            // A file that could not be removed is not marked processed; it
            // stays on disk and is retried next cycle.
            if disposition == AudioDisposition::Deleted {
                outcome.processed += 1;
                if quality_ok {
                    tracing::info!(
                        file = %observation.file_name(),
                        duration = ?duration_secs,
                        "Recording processed"
                    );
                } else {
                    tracing::warn!(
                        file = %observation.file_name(),
                        duration = ?duration_secs,
                        threshold = self.quality_threshold_secs,
                        "Recording below quality threshold"
                    );
                    outcome.quality_failures.push(observation.file_name());
                }
            }

            outcome.observations.push(observation);
        }

        Ok(outcome)
    }

    fn remove(&self, path: &std::path::Path, on_success: AudioDisposition) -> AudioDisposition {
        match fs::remove_file(path) {
            Ok(()) => on_success,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to delete recording, will retry next cycle");
                AudioDisposition::DeletionFailed
            }
        }
    }
}

/// Whether the time since the last qualifying activity exceeds `max_age`.
///
/// Before any recording has ever been processed, the caller passes monitor
/// start time as `last_activity`, so a cold start only goes stale after the
/// same threshold.
pub fn is_stale(last_activity: DateTime<Utc>, now: DateTime<Utc>, max_age: Duration) -> bool {
    now.signed_duration_since(last_activity)
        .to_std()
        .map(|elapsed| elapsed > max_age)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use tempfile::TempDir;

    use super::*;

    /// Estimator returning the same duration for every file.
    struct FixedEstimator(Option<f64>);

    impl DurationEstimator for FixedEstimator {
        fn estimate(&self, _path: &Path) -> Option<f64> {
            self.0
        }
    }

    fn ledger(dir: &TempDir, duration: Option<f64>) -> AudioLedger {
        AudioLedger::new(
            dir.path(),
            5.0,
            Duration::from_secs(4 * 3600),
            Box::new(FixedEstimator(duration)),
        )
    }

    fn touch(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, b"riff").unwrap();
        path
    }

    #[test]
    fn test_quality_pass_is_processed_and_deleted() {
        let dir = TempDir::new().unwrap();
        let path = touch(&dir, "call.wav");

        let outcome = ledger(&dir, Some(6.5)).sweep(Utc::now()).unwrap();

        assert_eq!(outcome.processed, 1);
        assert!(outcome.quality_failures.is_empty());
        assert!(!path.exists(), "file must be removed after evaluation");
        assert_eq!(outcome.observations[0].quality_ok, Some(true));
        assert_eq!(outcome.observations[0].disposition, AudioDisposition::Deleted);
    }

    #[test]
    fn test_short_recording_still_deleted_but_flagged() {
        let dir = TempDir::new().unwrap();
        let path = touch(&dir, "short.wav");

        let outcome = ledger(&dir, Some(3.0)).sweep(Utc::now()).unwrap();

        assert_eq!(outcome.processed, 1);
        assert_eq!(outcome.quality_failures, vec!["short.wav".to_string()]);
        assert!(!path.exists(), "quality failures are removed too");
        assert_eq!(outcome.observations[0].quality_ok, Some(false));
    }

    #[test]
    fn test_unknown_duration_is_a_quality_failure() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "undecodable.wav");

        let outcome = ledger(&dir, None).sweep(Utc::now()).unwrap();

        assert_eq!(outcome.processed, 1);
        assert_eq!(outcome.quality_failures, vec!["undecodable.wav".to_string()]);
    }

    #[test]
    fn test_expired_recording_reclaimed_without_evaluation() {
        let dir = TempDir::new().unwrap();
        let path = touch(&dir, "ancient.wav");

        // Pretend the sweep happens five hours after the file was written.
        let now = Utc::now() + chrono::Duration::hours(5);
        let outcome = ledger(&dir, Some(10.0)).sweep(now).unwrap();

        assert_eq!(outcome.processed, 0, "expired files are not activity");
        assert!(outcome.quality_failures.is_empty());
        assert!(!path.exists());
        assert_eq!(outcome.observations[0].disposition, AudioDisposition::Expired);
        assert_eq!(outcome.observations[0].quality_ok, None);
    }

    #[test]
    fn test_non_wav_files_are_ignored() {
        let dir = TempDir::new().unwrap();
        let other = dir.path().join("notes.txt");
        fs::write(&other, b"keep me").unwrap();

        let outcome = ledger(&dir, Some(9.0)).sweep(Utc::now()).unwrap();

        assert!(outcome.observations.is_empty());
        assert!(other.exists());
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        let gone = dir.path().join("nope");
        let ledger = AudioLedger::new(
            &gone,
            5.0,
            Duration::from_secs(3600),
            Box::new(FixedEstimator(Some(1.0))),
        );

        let result = ledger.sweep(Utc::now());
        assert!(matches!(result, Err(LedgerError::DirUnreadable { .. })));
    }

    #[test]
    fn test_staleness_threshold() {
        let start = Utc::now();
        let max_age = Duration::from_secs(4 * 3600);

        assert!(!is_stale(start, start + chrono::Duration::hours(3), max_age));
        assert!(is_stale(start, start + chrono::Duration::hours(5), max_age));
        // Future activity timestamps never read as stale.
        assert!(!is_stale(start + chrono::Duration::hours(1), start, max_age));
    }
}
