//! Process liveness probe over the OS process table.

#[cfg(test)]
use mockall::automock;
use sysinfo::System;
use thiserror::Error;

/// Errors that can occur while querying the process table.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The process table could not be queried.
    ///
    /// The orchestrator treats this as "process not confirmed running":
    /// the probe fails closed rather than letting a broken query suppress
    /// a process-down alert.
    #[error("Failed to query process list: {0}")]
    Query(String),
}

/// A probe answering whether the monitored application is running.
#[cfg_attr(test, automock)]
pub trait ProcessProbe: Send + Sync {
    /// Returns whether any process name or command line contains
    /// `name_fragment`. Queried fresh every cycle; no state is kept.
    fn is_running(&self, name_fragment: &str) -> Result<bool, ProbeError>;
}

/// Process probe backed by the `sysinfo` process table.
#[derive(Debug, Default)]
pub struct SysinfoProcessProbe;

impl SysinfoProcessProbe {
    /// Creates a new probe.
    pub fn new() -> Self {
        Self
    }
}

impl ProcessProbe for SysinfoProcessProbe {
    fn is_running(&self, name_fragment: &str) -> Result<bool, ProbeError> {
        let own_pid = sysinfo::get_current_pid().map_err(|e| ProbeError::Query(e.to_string()))?;

        let mut sys = System::new();
        sys.refresh_processes();

        let fragment = name_fragment.to_lowercase();
        for (pid, process) in sys.processes() {
            // The watchdog's own command line mentions the target name.
            if *pid == own_pid {
                continue;
            }

            if process.name().to_lowercase().contains(&fragment) {
                tracing::debug!(pid = %pid, name = process.name(), "Found monitored process by name");
                return Ok(true);
            }

            let cmdline = process.cmd().join(" ").to_lowercase();
            if cmdline.contains(&fragment) {
                tracing::debug!(pid = %pid, "Found monitored process by command line");
                return Ok(true);
            }
        }

        Ok(false)
    }
}
