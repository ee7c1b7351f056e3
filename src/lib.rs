#![warn(missing_docs)]
//! TrunkWatch observes a trunked-radio decoder application and reports a
//! consolidated health signal: process liveness, log errors and recording
//! activity roll up into a heartbeat-or-alert decision every cycle.

pub mod actions;
pub mod config;
pub mod engine;
pub mod http_client;
pub mod models;
pub mod probes;
pub mod supervisor;
pub mod test_helpers;
