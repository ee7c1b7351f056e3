//! The timer-driven outer loop.
//!
//! The supervisor owns the engine and schedules one cycle per interval,
//! measured start to start. Cycles never overlap: a tick only fires after
//! the previous cycle has run to completion, so a long cycle compresses the
//! effective gap rather than stacking invocations. Shutdown is cooperative
//! via Ctrl-C; there is no in-flight work to cancel beyond the current cycle.

use std::time::Duration;

use chrono::Utc;
use tokio::signal;

use crate::engine::MonitorEngine;

/// Runs the monitoring engine on a fixed interval until interrupted.
pub struct Supervisor {
    engine: MonitorEngine,
    interval: Duration,
}

impl Supervisor {
    /// Creates a supervisor driving `engine` every `interval`.
    pub fn new(engine: MonitorEngine, interval: Duration) -> Self {
        Self { engine, interval }
    }

    /// Runs cycles until Ctrl-C. The first cycle fires immediately.
    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = self.engine.run_cycle(Utc::now()).await;
                    tracing::debug!(
                        allowed = report.decision.allowed,
                        alerts = report.alerts_sent.len(),
                        log_lines = report.log_lines_seen,
                        audio = report.audio_processed,
                        "Cycle report"
                    );
                }
                result = signal::ctrl_c() => {
                    if let Err(e) = result {
                        tracing::error!(error = %e, "Failed to listen for shutdown signal");
                    }
                    break;
                }
            }
        }

        tracing::info!("Monitoring stopped");
    }
}
