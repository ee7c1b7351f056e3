//! Data model for the monitoring engine.

pub mod audio;
pub mod condition;
pub mod decision;
pub mod log;

pub use audio::{AudioDisposition, AudioFileObservation};
pub use condition::{Condition, ConditionId};
pub use decision::{HeartbeatDecision, ReasonCode};
pub use log::LogLine;
