use async_trait::async_trait;
use tracing::info;

use crate::plugins::traits::{AlertMessage, NotificationResult, NotifierPlugin};
use crate::utils::error::Result;

pub const CONSOLE_NOTIFIER_TYPE: &str = "console";

/// Writes alerts to the log. Always registered, so a run without
/// credentials still leaves a trace of what would have been sent.
/// Logging an alert does not count as delivering it.
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    pub fn new() -> Self {
        ConsoleNotifier
    }
}

#[async_trait]
impl NotifierPlugin for ConsoleNotifier {
    fn name(&self) -> &str {
        "Console Notifier"
    }

    fn plugin_type(&self) -> &str {
        CONSOLE_NOTIFIER_TYPE
    }

    async fn notify(&self, message: &AlertMessage) -> Result<NotificationResult> {
        info!("{}\n{}", message.title, message.body);
        Ok(NotificationResult::delivered(None))
    }
}
