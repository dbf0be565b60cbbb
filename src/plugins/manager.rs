use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::notifiers::{ConsoleNotifier, GitHubNotifier};
use super::traits::{AlertMessage, Extraction, NotificationResult, NotifierPlugin, TrackerPlugin};
use super::trackers::{AvailabilityTracker, PriceTracker};
use crate::config::{AppConfig, ItemConfig};
use crate::models::TrackerKind;
use crate::scraper::FetchedPage;
use crate::utils::error::{AppError, Result};

pub type TrackerPluginBox = Box<dyn TrackerPlugin>;
pub type NotifierPluginBox = Box<dyn NotifierPlugin>;

#[derive(Clone)]
pub struct PluginManager {
    trackers: Arc<RwLock<HashMap<TrackerKind, TrackerPluginBox>>>,
    notifiers: Arc<RwLock<HashMap<String, NotifierPluginBox>>>,
}

impl PluginManager {
    pub fn new() -> Self {
        Self {
            trackers: Arc::new(RwLock::new(HashMap::new())),
            notifiers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a tracker plugin, replacing any previous one of the same kind
    pub async fn register_tracker(&self, plugin: TrackerPluginBox) {
        let mut trackers = self.trackers.write().await;
        trackers.insert(plugin.kind(), plugin);
    }

    /// Register a notifier plugin
    pub async fn register_notifier(&self, plugin: NotifierPluginBox) {
        let plugin_type = plugin.plugin_type().to_string();

        let mut notifiers = self.notifiers.write().await;
        notifiers.insert(plugin_type, plugin);
    }

    /// List all registered notifier types, sorted
    pub async fn list_notifier_types(&self) -> Vec<String> {
        let notifiers = self.notifiers.read().await;
        let mut types: Vec<String> = notifiers.keys().cloned().collect();
        types.sort();
        types
    }

    /// Price and availability trackers, the console notifier, and the GitHub
    /// notifier when notifications are enabled
    pub async fn initialize_default_plugins(&self, config: &AppConfig) -> Result<()> {
        self.register_tracker(Box::new(PriceTracker::new()?)).await;
        self.register_tracker(Box::new(AvailabilityTracker::new()?)).await;

        self.register_notifier(Box::new(ConsoleNotifier::new())).await;
        if config.notifications.enabled {
            self.register_notifier(Box::new(GitHubNotifier::new(
                config.notifications.github.clone(),
            )))
            .await;
        }

        Ok(())
    }

    /// Extract the item's fact with the tracker registered for its kind
    pub async fn extract(&self, page: &FetchedPage, item: &ItemConfig) -> Result<Extraction> {
        let trackers = self.trackers.read().await;
        match trackers.get(&item.kind) {
            Some(tracker) => {
                debug!("{}: extracting with {}", item.id, tracker.name());
                tracker.extract(page, item)
            }
            None => Err(AppError::Internal(format!(
                "no tracker registered for '{}' items",
                item.kind
            ))),
        }
    }

    /// Send `message` through every notifier. One failing notifier does not stop
    /// the others; failures are returned alongside successes.
    pub async fn send_notification(
        &self,
        message: &AlertMessage,
    ) -> Vec<(String, Result<NotificationResult>)> {
        let notifiers = self.notifiers.read().await;
        let mut types: Vec<&String> = notifiers.keys().collect();
        types.sort();

        let mut results = Vec::with_capacity(types.len());
        for plugin_type in types {
            let notifier = &notifiers[plugin_type];
            let result = notifier.notify(message).await;
            if let Err(e) = &result {
                warn!("Notifier {} failed for {}: {}", notifier.name(), message.item_id, e);
            }
            results.push((plugin_type.clone(), result));
        }
        results
    }
}

impl Default for PluginManager {
    fn default() -> Self {
        Self::new()
    }
}
