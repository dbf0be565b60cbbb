use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::TrackerKind;

/// Tri-state availability. `Unknown` means the check could not tell, never "no".
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    Available,
    Unavailable,
    Unknown,
}

impl Availability {
    pub fn is_known(&self) -> bool {
        !matches!(self, Availability::Unknown)
    }
}

impl std::fmt::Display for Availability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Availability::Available => "available",
            Availability::Unavailable => "unavailable",
            Availability::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FactValue {
    Price { amount: Decimal },
    Availability { state: Availability },
    /// The check failed before a value could be read.
    Error,
}

impl FactValue {
    pub fn kind(&self) -> Option<TrackerKind> {
        match self {
            FactValue::Price { .. } => Some(TrackerKind::Price),
            FactValue::Availability { .. } => Some(TrackerKind::Availability),
            FactValue::Error => None,
        }
    }

    pub fn price(&self) -> Option<Decimal> {
        match self {
            FactValue::Price { amount } => Some(*amount),
            _ => None,
        }
    }

    pub fn availability(&self) -> Option<Availability> {
        match self {
            FactValue::Availability { state } => Some(*state),
            _ => None,
        }
    }

    /// Whether the value says something about the item (a price, or a known availability).
    pub fn is_determinate(&self) -> bool {
        match self {
            FactValue::Price { .. } => true,
            FactValue::Availability { state } => state.is_known(),
            FactValue::Error => false,
        }
    }

    pub fn format(&self) -> String {
        match self {
            FactValue::Price { amount } => format!("${:.2}", amount.round_dp(2)),
            FactValue::Availability { state } => state.to_string(),
            FactValue::Error => "error".to_string(),
        }
    }
}

/// One observation of a tracked item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Fact {
    pub value: FactValue,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Fact {
    pub fn new(value: FactValue) -> Self {
        Self {
            value,
            timestamp: Utc::now(),
            status_code: None,
            message: None,
        }
    }

    pub fn price(amount: Decimal) -> Self {
        Self::new(FactValue::Price { amount })
    }

    pub fn availability(state: Availability) -> Self {
        Self::new(FactValue::Availability { state })
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(FactValue::Error).with_message(message)
    }

    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}
