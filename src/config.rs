use config::{Config, Environment, File};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::env;
use std::path::{Path, PathBuf};
use validator::Validate;

use crate::models::{NotifyOn, TrackerKind};
use crate::utils::error::{AppError, Result};

pub const DEFAULT_UNAVAILABLE_MESSAGE: &str =
    "Apologies - Due to an inventory limitation, we are unable to engrave this product at this time.";

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_history_path")]
    pub history_path: PathBuf,
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub items: Vec<ItemConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub user_agent: String,
    /// Seconds allowed for an HTML page.
    pub request_timeout: u64,
    /// Seconds allowed for a structured API call.
    pub api_timeout: u64,
    /// Pause between two items, in milliseconds.
    pub request_delay_ms: u64,
    /// Statuses that mean "bot detection", not "the page said no".
    pub blocked_statuses: Vec<u16>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: 30,
            api_timeout: 10,
            request_delay_ms: 2000,
            blocked_statuses: vec![403],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    pub enabled: bool,
    pub notify_on_change: NotifyOn,
    pub github: GitHubConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    pub token: Option<String>,
    /// `owner/name`
    pub repository: Option<String>,
    pub api_url: String,
    pub labels: Vec<String>,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            repository: None,
            api_url: "https://api.github.com".to_string(),
            labels: vec!["price-alert".to_string(), "automated".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ItemConfig {
    #[validate(length(min = 1, message = "item id must not be empty"))]
    pub id: String,
    #[validate(length(min = 1, message = "item name must not be empty"))]
    pub name: String,
    #[validate(url(message = "item url must be a valid URL"))]
    pub url: String,
    #[serde(default)]
    pub kind: TrackerKind,
    #[serde(default)]
    pub threshold: Option<Decimal>,
    #[serde(default)]
    pub unavailable_message: Option<String>,
}

impl ItemConfig {
    pub fn unavailable_message(&self) -> &str {
        self.unavailable_message
            .as_deref()
            .unwrap_or(DEFAULT_UNAVAILABLE_MESSAGE)
    }
}

fn default_history_path() -> PathBuf {
    PathBuf::from("price_history.json")
}

impl AppConfig {
    /// Load from `path` (or `config/default.*`), then `DEAL_WATCHER__*` overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path),
            None => File::with_name("config/default"),
        };

        let s = Config::builder()
            .add_source(file)
            // Add local config (ignored by git)
            .add_source(File::with_name("config/local").required(false))
            .add_source(Environment::with_prefix("DEAL_WATCHER").separator("__"))
            .build()?;

        let mut config: AppConfig = s.try_deserialize()?;

        // CI runners expose these under their own names
        if config.notifications.github.token.is_none() {
            config.notifications.github.token = env::var("GITHUB_TOKEN").ok();
        }
        if config.notifications.github.repository.is_none() {
            config.notifications.github.repository = env::var("GITHUB_REPOSITORY").ok();
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.items.is_empty() {
            return Err(AppError::InvalidConfig("at least one item must be configured".into()));
        }

        let mut seen = HashSet::new();
        for item in &self.items {
            item.validate()?;

            if !seen.insert(item.id.as_str()) {
                return Err(AppError::InvalidConfig(format!("duplicate item id '{}'", item.id)));
            }

            if let Some(threshold) = item.threshold {
                if item.kind != TrackerKind::Price {
                    return Err(AppError::InvalidConfig(format!(
                        "item '{}': threshold is only meaningful for price items",
                        item.id
                    )));
                }
                if threshold <= Decimal::ZERO {
                    return Err(AppError::InvalidConfig(format!(
                        "item '{}': threshold must be greater than 0",
                        item.id
                    )));
                }
            }

            if item.kind == TrackerKind::Availability && item.unavailable_message().trim().is_empty() {
                return Err(AppError::InvalidConfig(format!(
                    "item '{}': unavailable_message must not be empty",
                    item.id
                )));
            }
        }

        if self.scraper.request_timeout == 0 || self.scraper.api_timeout == 0 {
            return Err(AppError::InvalidConfig("scraper timeouts must be greater than 0".into()));
        }

        if url::Url::parse(&self.notifications.github.api_url).is_err() {
            return Err(AppError::InvalidConfig("Invalid GitHub API URL format".into()));
        }

        Ok(())
    }

    pub fn item(&self, id: &str) -> Option<&ItemConfig> {
        self.items.iter().find(|item| item.id == id)
    }
}
