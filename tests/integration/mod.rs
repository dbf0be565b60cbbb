// Integration tests for deal-watcher
// These tests run full check cycles against a local HTTP server

pub mod blocked_tests;
pub mod end_to_end_tests;

use deal_watcher::{
    AppConfig,
    config::{GitHubConfig, ItemConfig, NotificationsConfig, ScraperConfig},
    history::{HistoryFile, HistoryStore},
    models::{Fact, NotifyOn, TrackerKind},
    plugins::manager::PluginManager,
    product_manager::ProductManager,
    scraper::HttpFetcher,
};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use wiremock::MockServer;

pub const IPAD_PATH: &str = "/ipad-128gb-wi-fi-a16-chip.product.4000285678.html";
pub const AIRPODS_PATH: &str = "/airpods-4-with-active-noise-cancellation.product.4000308504.html";
pub const WATCH_PATH: &str = "/en-us/products/colleen-three-hand-two-tone-stainless-steel-watch/BQ3908.html";

pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

pub fn ipad(server: &MockServer) -> ItemConfig {
    ItemConfig {
        id: "4000285678".to_string(),
        name: "iPad, 128GB Wi-Fi (A16 chip)".to_string(),
        url: format!("{}{}", server.uri(), IPAD_PATH),
        kind: TrackerKind::Price,
        threshold: Some(dec("300.00")),
        unavailable_message: None,
    }
}

pub fn airpods(server: &MockServer) -> ItemConfig {
    ItemConfig {
        id: "4000308504".to_string(),
        name: "AirPods 4 with Active Noise Cancellation".to_string(),
        url: format!("{}{}", server.uri(), AIRPODS_PATH),
        kind: TrackerKind::Price,
        threshold: Some(dec("149.00")),
        unavailable_message: None,
    }
}

pub fn watch(server: &MockServer) -> ItemConfig {
    ItemConfig {
        id: "BQ3908".to_string(),
        name: "Colleen Three-Hand Two-Tone Stainless Steel Watch".to_string(),
        url: format!("{}{}", server.uri(), WATCH_PATH),
        kind: TrackerKind::Availability,
        threshold: None,
        unavailable_message: None,
    }
}

/// Test configuration for integration tests
pub fn get_test_config(history: &Path, items: Vec<ItemConfig>) -> AppConfig {
    AppConfig {
        history_path: history.to_path_buf(),
        scraper: ScraperConfig {
            user_agent: "DealWatcher-Test/1.0".to_string(),
            request_timeout: 5,
            api_timeout: 5,
            request_delay_ms: 0,
            blocked_statuses: vec![403],
        },
        notifications: NotificationsConfig {
            enabled: false,
            notify_on_change: NotifyOn::Never,
            github: GitHubConfig::default(),
        },
        items,
    }
}

/// Point the GitHub notifier at `server` with working credentials
pub fn with_github(mut config: AppConfig, server: &MockServer) -> AppConfig {
    config.notifications.enabled = true;
    config.notifications.github = GitHubConfig {
        token: Some("ghp_integration".to_string()),
        repository: Some("someone/deals".to_string()),
        api_url: server.uri(),
        ..GitHubConfig::default()
    };
    config
}

/// Create a manager with the real HTTP fetcher and default plugins
pub async fn create_test_manager(config: AppConfig) -> anyhow::Result<ProductManager> {
    let plugins = PluginManager::new();
    plugins.initialize_default_plugins(&config).await?;
    let fetcher = Arc::new(HttpFetcher::new(config.scraper.clone())?);
    Ok(ProductManager::new(config, fetcher, plugins))
}

/// Write a history file holding one fact per (item, fact) pair
pub fn seed_history(path: &Path, facts: Vec<(&ItemConfig, Fact)>) -> anyhow::Result<()> {
    let mut store = HistoryStore::new();
    for (item, fact) in facts {
        store.upsert(item, fact);
    }
    HistoryFile::new(path).save(&store)?;
    Ok(())
}

pub fn price_page(price: &str) -> String {
    format!(
        r#"<html><body>
            <div class="product-price">
                <span data-testid="Text_single-price-whole-value">{}</span>
            </div>
        </body></html>"#,
        price
    )
}
