use serde::{Deserialize, Serialize};

use crate::models::Fact;

/// Classification of one check against the stored history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ChangeOutcome {
    FirstObservation { current: Fact },
    Unchanged { previous: Fact, current: Fact },
    ChangedNoAlert { previous: Fact, current: Fact },
    AlertTriggered { previous: Fact, current: Fact },
}

impl ChangeOutcome {
    pub fn current(&self) -> &Fact {
        match self {
            ChangeOutcome::FirstObservation { current }
            | ChangeOutcome::Unchanged { current, .. }
            | ChangeOutcome::ChangedNoAlert { current, .. }
            | ChangeOutcome::AlertTriggered { current, .. } => current,
        }
    }

    pub fn previous(&self) -> Option<&Fact> {
        match self {
            ChangeOutcome::FirstObservation { .. } => None,
            ChangeOutcome::Unchanged { previous, .. }
            | ChangeOutcome::ChangedNoAlert { previous, .. }
            | ChangeOutcome::AlertTriggered { previous, .. } => Some(previous),
        }
    }

    pub fn is_alert(&self) -> bool {
        matches!(self, ChangeOutcome::AlertTriggered { .. })
    }

    pub fn is_change(&self) -> bool {
        matches!(
            self,
            ChangeOutcome::ChangedNoAlert { .. } | ChangeOutcome::AlertTriggered { .. }
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            ChangeOutcome::FirstObservation { .. } => "first observation",
            ChangeOutcome::Unchanged { .. } => "unchanged",
            ChangeOutcome::ChangedNoAlert { .. } => "changed",
            ChangeOutcome::AlertTriggered { .. } => "ALERT",
        }
    }
}

/// Overall result of a run, handed to the caller to map onto an exit convention.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    AlertTriggered,
    Error,
}
