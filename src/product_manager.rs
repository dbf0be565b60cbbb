use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::alerts::{AlertDispatcher, alert_kind_for};
use crate::change_detector::{detect, should_report_change};
use crate::config::{AppConfig, ItemConfig};
use crate::history::HistoryFile;
use crate::models::{Availability, ChangeOutcome, Fact, PriceStats, RunStatus, TrackerKind};
use crate::plugins::manager::PluginManager;
use crate::plugins::traits::{AlertKind, AlertMessage};
use crate::scraper::PageFetcher;
use crate::utils::error::{AppError, Result};

#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// Fetch and classify, but leave history untouched and send nothing.
    pub dry_run: bool,
    /// Check only the item with this id.
    pub only_item: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemStatus {
    Checked { strategy: String },
    /// The site answered with a bot-detection status.
    Blocked { status: u16 },
    Failed { error: String },
}

#[derive(Debug, Clone)]
pub struct ItemReport {
    pub id: String,
    pub name: String,
    pub status: ItemStatus,
    pub outcome: ChangeOutcome,
    pub notified: bool,
    pub response_time_ms: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub dry_run: bool,
    pub items: Vec<ItemReport>,
}

impl RunSummary {
    /// Alerts win over per-item errors.
    pub fn status(&self) -> RunStatus {
        if self.alerts() > 0 {
            RunStatus::AlertTriggered
        } else if self.errors() > 0 {
            RunStatus::Error
        } else {
            RunStatus::Success
        }
    }

    pub fn alerts(&self) -> usize {
        self.items.iter().filter(|r| r.outcome.is_alert()).count()
    }

    /// Items read successfully whose value moved without alerting.
    pub fn changes(&self) -> usize {
        self.items
            .iter()
            .filter(|r| r.is_checked() && matches!(r.outcome, ChangeOutcome::ChangedNoAlert { .. }))
            .count()
    }

    pub fn errors(&self) -> usize {
        self.items
            .iter()
            .filter(|r| !r.is_checked())
            .count()
    }
}

impl ItemReport {
    pub fn is_checked(&self) -> bool {
        matches!(self.status, ItemStatus::Checked { .. })
    }

    fn label(&self) -> &'static str {
        match self.status {
            ItemStatus::Checked { .. } => self.outcome.label(),
            ItemStatus::Blocked { .. } => "blocked",
            ItemStatus::Failed { .. } => "error",
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Check run {}{}",
            self.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
            if self.dry_run { " (dry run)" } else { "" }
        )?;
        for report in &self.items {
            let current = report.outcome.current().value.format();
            let detail = match &report.status {
                ItemStatus::Checked { .. } => match report.outcome.previous() {
                    Some(previous) if report.outcome.is_change() => {
                        format!("{} -> {}", previous.value.format(), current)
                    }
                    _ => current,
                },
                ItemStatus::Blocked { status } => format!("blocked (HTTP {})", status),
                ItemStatus::Failed { error } => format!("error: {}", error),
            };
            let delivery = if report.notified {
                " [notified]"
            } else if report.outcome.is_alert() && !self.dry_run {
                " [not delivered]"
            } else {
                ""
            };
            writeln!(
                f,
                "  [{}] {} ({}): {}{}",
                report.label(),
                report.name,
                report.id,
                detail,
                delivery
            )?;
        }
        write!(
            f,
            "{} checked, {} changed, {} alerted, {} errored",
            self.items.len(),
            self.changes(),
            self.alerts(),
            self.errors()
        )
    }
}

/// What the history file says about one item.
#[derive(Debug, Clone)]
pub struct ItemStats {
    pub id: String,
    pub name: String,
    pub kind: TrackerKind,
    pub last_checked: DateTime<Utc>,
    pub alert_triggered: bool,
    pub total_checks: usize,
    pub failed_checks: usize,
    pub price: Option<PriceStats>,
    pub availability: Option<Availability>,
}

impl fmt::Display for ItemStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({}) [{}]", self.name, self.id, self.kind)?;
        writeln!(
            f,
            "  checks: {} ({} failed), last {}",
            self.total_checks,
            self.failed_checks,
            self.last_checked.format("%Y-%m-%d %H:%M:%S UTC")
        )?;
        if let Some(price) = &self.price {
            writeln!(
                f,
                "  price: current ${:.2}, low ${:.2}, high ${:.2}, avg ${:.2} over {} readings",
                price.current_price.round_dp(2),
                price.lowest_price.round_dp(2),
                price.highest_price.round_dp(2),
                price.average_price,
                price.total_checks
            )?;
        }
        if let Some(state) = self.availability {
            writeln!(f, "  availability: {}", state)?;
        }
        write!(f, "  alert triggered: {}", self.alert_triggered)
    }
}

pub struct ProductManager {
    config: AppConfig,
    fetcher: Arc<dyn PageFetcher>,
    plugin_manager: PluginManager,
    dispatcher: AlertDispatcher,
    history: HistoryFile,
}

impl ProductManager {
    pub fn new(config: AppConfig, fetcher: Arc<dyn PageFetcher>, plugin_manager: PluginManager) -> Self {
        let history = HistoryFile::new(config.history_path.clone());
        let dispatcher = AlertDispatcher::new(plugin_manager.clone());
        Self {
            config,
            fetcher,
            plugin_manager,
            dispatcher,
            history,
        }
    }

    /// Check every configured item in order, one at a time.
    ///
    /// Fetch and extraction failures are recorded against the item and the run
    /// moves on. History that cannot be read or written ends the run.
    pub async fn check_all(&self, options: &CheckOptions) -> Result<RunSummary> {
        let items: Vec<&ItemConfig> = match &options.only_item {
            Some(id) => vec![
                self.config
                    .item(id)
                    .ok_or_else(|| AppError::InvalidConfig(format!("unknown item '{}'", id)))?,
            ],
            None => self.config.items.iter().collect(),
        };

        let mut summary = RunSummary {
            started_at: Utc::now(),
            dry_run: options.dry_run,
            items: Vec::with_capacity(items.len()),
        };
        let delay = Duration::from_millis(self.config.scraper.request_delay_ms);

        for (index, item) in items.iter().enumerate() {
            if index > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let report = self.check_item(item, options.dry_run).await?;
            summary.items.push(report);
        }

        Ok(summary)
    }

    /// One read-merge-write cycle for `item`.
    pub async fn check_item(&self, item: &ItemConfig, dry_run: bool) -> Result<ItemReport> {
        info!("Checking {} ({})", item.name, item.id);

        let (fact, status, response_time_ms) = self.observe(item).await?;

        let mut store = self.history.load()?;
        let previous = store.get(&item.id).and_then(|tracked| tracked.last_known()).cloned();
        let outcome = detect(previous.as_ref(), &fact, item.threshold);

        match &status {
            ItemStatus::Checked { strategy } => info!(
                "{}: {} via {} [{}]",
                item.id,
                fact.value.format(),
                strategy,
                outcome.label()
            ),
            ItemStatus::Blocked { status } => {
                warn!("{}: blocked with HTTP {}, result unknown", item.id, status)
            }
            ItemStatus::Failed { error: reason } => error!("{}: check failed: {}", item.id, reason),
        }

        let mut notified = false;
        if !dry_run {
            store.upsert(item, fact);
            store.set_alert_triggered(&item.id, outcome.is_alert());
            self.history.save(&store)?;

            if let Some(kind) = self.notification_kind(&outcome) {
                notified = self.notify(kind, item, &outcome).await;
            }
        }

        Ok(ItemReport {
            id: item.id.clone(),
            name: item.name.clone(),
            status,
            outcome,
            notified,
            response_time_ms,
        })
    }

    /// Fetch and extract, folding item-scoped failures into an error or unknown fact.
    async fn observe(&self, item: &ItemConfig) -> Result<(Fact, ItemStatus, Option<u64>)> {
        let page = match self.fetcher.fetch(&item.url).await {
            Ok(page) => page,
            Err(AppError::Blocked { status }) => {
                let message = format!("blocked with HTTP {}", status);
                let fact = match item.kind {
                    TrackerKind::Availability => Fact::availability(Availability::Unknown),
                    TrackerKind::Price => Fact::error(message.clone()),
                };
                return Ok((
                    fact.with_status(status).with_message(message),
                    ItemStatus::Blocked { status },
                    None,
                ));
            }
            Err(e) if e.is_item_scoped() => {
                return Ok((
                    Fact::error(e.to_string()),
                    ItemStatus::Failed { error: e.to_string() },
                    None,
                ));
            }
            Err(e) => return Err(e),
        };

        match self.plugin_manager.extract(&page, item).await {
            Ok(extraction) => Ok((
                Fact::new(extraction.value).with_status(page.status),
                ItemStatus::Checked { strategy: extraction.strategy },
                Some(page.response_time_ms),
            )),
            Err(e) if e.is_item_scoped() => Ok((
                Fact::error(e.to_string()).with_status(page.status),
                ItemStatus::Failed { error: e.to_string() },
                Some(page.response_time_ms),
            )),
            Err(e) => Err(e),
        }
    }

    fn notification_kind(&self, outcome: &ChangeOutcome) -> Option<AlertKind> {
        alert_kind_for(outcome).or_else(|| {
            should_report_change(self.config.notifications.notify_on_change, outcome)
                .then_some(AlertKind::PriceChange)
        })
    }

    async fn notify(&self, kind: AlertKind, item: &ItemConfig, outcome: &ChangeOutcome) -> bool {
        match AlertMessage::compose(kind, item, outcome) {
            Ok(message) => self.dispatcher.dispatch(&message).await,
            Err(e) => {
                warn!("{}: could not format alert: {}", item.id, e);
                false
            }
        }
    }

    /// Per-item statistics from the history file, in configuration order.
    /// Items that were never checked are left out.
    pub fn stats(&self) -> Result<Vec<ItemStats>> {
        let store = self.history.load()?;

        Ok(self
            .config
            .items
            .iter()
            .filter_map(|item| {
                let tracked = store.get(&item.id)?;
                Some(ItemStats {
                    id: item.id.clone(),
                    name: tracked.name.clone(),
                    kind: tracked.kind,
                    last_checked: tracked.last_checked,
                    alert_triggered: tracked.alert_triggered,
                    total_checks: tracked.checks.len(),
                    failed_checks: tracked
                        .checks
                        .iter()
                        .filter(|fact| !fact.value.is_determinate())
                        .count(),
                    price: tracked.price_stats(),
                    availability: tracked
                        .latest()
                        .and_then(|fact| fact.value.availability()),
                })
            })
            .collect())
    }
}
