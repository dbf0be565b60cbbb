use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::utils::error::Result;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// Price at or below the configured threshold.
    ThresholdMet,
    /// Unavailable -> available.
    BackInStock,
    /// Price moved, without meeting a threshold.
    PriceChange,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SavingsInfo {
    pub amount: Decimal,
    pub percentage: Decimal,
}

/// Everything a notifier needs to tell a human what happened to one item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AlertMessage {
    pub kind: AlertKind,
    pub item_id: String,
    pub item_name: String,
    pub url: String,
    pub formatted_current: String,
    pub formatted_previous: Option<String>,
    pub threshold: Option<Decimal>,
    pub savings: Option<SavingsInfo>,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationResult {
    pub success: bool,
    pub message_id: Option<String>,
    pub error: Option<String>,
}

impl NotificationResult {
    pub fn delivered(message_id: Option<String>) -> Self {
        Self {
            success: true,
            message_id,
            error: None,
        }
    }
}

/// Trait for implementing notification methods (issue tracker, console)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotifierPlugin: Send + Sync {
    /// Plugin metadata
    fn name(&self) -> &str;
    fn plugin_type(&self) -> &str;

    async fn notify(&self, message: &AlertMessage) -> Result<NotificationResult>;
}
