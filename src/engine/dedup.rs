//! Suppression of repeat alerts for unchanged conditions.

use std::collections::HashSet;

use crate::models::{Condition, ConditionId};

/// Per-identifier alert state machine.
///
/// An identifier transitioning inactive to active triggers exactly one
/// outbound alert. Remaining active across cycles sends nothing further.
/// Clearing is silent but re-arms the identifier, so the next activation
/// alerts again. This keeps a failure that persists for hours from storming
/// the alert channel while still reporting recovery-then-recurrence.
#[derive(Debug, Default)]
pub struct NotificationDeduplicator {
    active: HashSet<ConditionId>,
}

impl NotificationDeduplicator {
    /// Creates a deduplicator with no suppressed identifiers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes this cycle's detected conditions and returns the subset that
    /// should actually be dispatched. Identifiers absent from `current` are
    /// re-armed.
    pub fn filter(&mut self, current: Vec<Condition>) -> Vec<Condition> {
        let now_active: HashSet<ConditionId> =
            current.iter().map(|c| c.id.clone()).collect();

        let to_send: Vec<Condition> = current
            .into_iter()
            .filter(|c| !self.active.contains(&c.id))
            .collect();

        for cleared in self.active.difference(&now_active) {
            tracing::info!(condition = %cleared, "Condition cleared, re-arming alerts");
        }

        self.active = now_active;
        to_send
    }

    /// Identifiers currently suppressed, for reporting and tests.
    pub fn active(&self) -> &HashSet<ConditionId> {
        &self.active
    }
}
