use tracing::{info, warn};

use crate::change_detector::Savings;
use crate::config::ItemConfig;
use crate::models::{ChangeOutcome, FactValue};
use crate::plugins::PluginManager;
use crate::plugins::notifiers::CONSOLE_NOTIFIER_TYPE;
use crate::plugins::traits::{AlertKind, AlertMessage, SavingsInfo};
use crate::utils::error::Result;

const FOOTER: &str = "---\n*This issue was automatically created by deal-watcher.*\n";

impl AlertMessage {
    /// Format the notification for `outcome`. `kind` decides the wording;
    /// savings are filled in for threshold alerts.
    pub fn compose(kind: AlertKind, item: &ItemConfig, outcome: &ChangeOutcome) -> Result<Self> {
        let current = outcome.current();
        let previous = outcome.previous();
        let formatted_current = current.value.format();
        let formatted_previous = previous.map(|p| p.value.format());

        let savings = match (kind, item.threshold, current.value.price()) {
            (AlertKind::ThresholdMet, Some(threshold), Some(now)) => {
                let savings = Savings::compute(threshold, now)?;
                Some(SavingsInfo {
                    amount: savings.delta,
                    percentage: savings.percent,
                })
            }
            _ => None,
        };

        let mut lines = vec![
            format!("**Item:** {}", item.name),
            format!("**Item ID:** {}", item.id),
        ];

        let (title, heading) = match kind {
            AlertKind::ThresholdMet => {
                if let Some(previous) = &formatted_previous {
                    lines.push(format!("**Previous Price:** {}", previous));
                }
                lines.push(format!("**Current Price:** {}", formatted_current));
                if let Some(threshold) = item.threshold {
                    lines.push(format!("**Threshold:** {}", FactValue::Price { amount: threshold }.format()));
                }
                if let Some(savings) = &savings {
                    lines.push(format!(
                        "**Below threshold by:** ${:.2} ({:.4}%)",
                        savings.amount.round_dp(2),
                        savings.percentage.round_dp(4)
                    ));
                }
                (
                    format!("Price Alert: {}", item.name),
                    "## Price at or below threshold!",
                )
            }
            AlertKind::BackInStock => {
                lines.push(format!(
                    "**Status:** {} -> {}",
                    formatted_previous.as_deref().unwrap_or("unknown"),
                    formatted_current
                ));
                (
                    format!("Now Available: {}", item.name),
                    "## The item is available again!",
                )
            }
            AlertKind::PriceChange => {
                if let Some(previous) = &formatted_previous {
                    lines.push(format!("**Previous Price:** {}", previous));
                }
                lines.push(format!("**Current Price:** {}", formatted_current));
                if let (Some(before), Some(now)) = (
                    previous.and_then(|p| p.value.price()),
                    current.value.price(),
                ) {
                    let change = now - before;
                    let percent = change
                        .checked_div(before)
                        .map(|ratio| ratio * rust_decimal::Decimal::ONE_HUNDRED);
                    lines.push(match percent {
                        Some(percent) => format!(
                            "**Change:** ${:.2} ({:.2}%)",
                            change.round_dp(2),
                            percent.round_dp(2)
                        ),
                        None => format!("**Change:** ${:.2}", change.round_dp(2)),
                    });
                }
                (
                    format!("Price Change: {}", item.name),
                    "## Price change detected",
                )
            }
        };

        lines.push(format!("**Link:** {}", item.url));
        lines.push(format!(
            "**Checked:** {}",
            current.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
        ));

        let body = format!("{}\n\n{}\n\n{}", heading, lines.join("  \n"), FOOTER);

        Ok(Self {
            kind,
            item_id: item.id.clone(),
            item_name: item.name.clone(),
            url: item.url.clone(),
            formatted_current,
            formatted_previous,
            threshold: item.threshold,
            savings,
            title,
            body,
        })
    }
}

/// Which alert, if any, an outcome warrants on its own.
pub fn alert_kind_for(outcome: &ChangeOutcome) -> Option<AlertKind> {
    if !outcome.is_alert() {
        return None;
    }
    match outcome.current().value {
        FactValue::Price { .. } => Some(AlertKind::ThresholdMet),
        FactValue::Availability { .. } => Some(AlertKind::BackInStock),
        FactValue::Error => None,
    }
}

/// Hands alerts to the registered notifiers. Delivery failures are logged and
/// swallowed; they never fail the check cycle.
#[derive(Clone)]
pub struct AlertDispatcher {
    plugins: PluginManager,
}

impl AlertDispatcher {
    pub fn new(plugins: PluginManager) -> Self {
        Self { plugins }
    }

    /// True when at least one outbound notifier accepted the message. The
    /// console log sink never counts.
    pub async fn dispatch(&self, message: &AlertMessage) -> bool {
        let results = self.plugins.send_notification(message).await;
        let outbound: Vec<_> = results
            .iter()
            .filter(|(plugin_type, _)| plugin_type != CONSOLE_NOTIFIER_TYPE)
            .collect();
        if outbound.is_empty() {
            warn!("No outbound notifiers registered; alert for {} only logged", message.item_id);
            return false;
        }

        let delivered = outbound
            .iter()
            .filter(|(_, result)| matches!(result, Ok(r) if r.success))
            .count();
        if delivered == 0 {
            warn!("Alert for {} was not delivered by any notifier", message.item_id);
        } else {
            info!(
                "Alert for {} delivered by {}/{} notifiers",
                message.item_id,
                delivered,
                outbound.len()
            );
        }
        delivered > 0
    }
}
