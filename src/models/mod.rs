use serde::{Deserialize, Serialize};

pub mod fact;
pub mod outcome;
pub mod tracked_item;

// Re-exports for convenience
pub use fact::*;
pub use outcome::*;
pub use tracked_item::*;

// Common enums used across models
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum TrackerKind {
    #[default]
    Price,
    Availability,
}

impl TrackerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackerKind::Price => "price",
            TrackerKind::Availability => "availability",
        }
    }
}

impl std::fmt::Display for TrackerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which price movements produce a change notification in addition to threshold alerts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum NotifyOn {
    #[default]
    Never,
    Decrease,
    Increase,
    AnyChange,
}
