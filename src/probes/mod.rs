//! Probes are the engine's only window onto the host: the OS process table
//! and the duration of recordings on disk. Both sit behind traits so the
//! cycle logic is testable without a live system.

pub mod audio;
pub mod process;

pub use audio::{DurationEstimator, WavDurationEstimator};
pub use process::{ProbeError, ProcessProbe, SysinfoProcessProbe};

#[cfg(test)]
pub use audio::MockDurationEstimator;
#[cfg(test)]
pub use process::MockProcessProbe;
