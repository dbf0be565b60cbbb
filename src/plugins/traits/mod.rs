pub mod tracker;
pub mod notifier;

pub use tracker::{TrackerPlugin, Extraction};
pub use notifier::{NotifierPlugin, AlertMessage, AlertKind, SavingsInfo, NotificationResult};

#[cfg(test)]
pub use notifier::MockNotifierPlugin;
