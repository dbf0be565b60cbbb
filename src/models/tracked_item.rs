use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{Fact, TrackerKind};

/// Upper bound on retained checks per item; older entries are evicted first.
pub const MAX_RETAINED_CHECKS: usize = 50;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackedItem {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub kind: TrackerKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<Decimal>,
    pub last_checked: DateTime<Utc>,
    #[serde(default)]
    pub alert_triggered: bool,
    /// Oldest first.
    #[serde(default)]
    pub checks: Vec<Fact>,
}

impl TrackedItem {
    pub fn new(name: String, url: String, kind: TrackerKind, threshold: Option<Decimal>) -> Self {
        Self {
            name,
            url,
            kind,
            threshold,
            last_checked: Utc::now(),
            alert_triggered: false,
            checks: Vec::new(),
        }
    }

    /// Append a fact and evict from the front past [`MAX_RETAINED_CHECKS`].
    pub fn record(&mut self, fact: Fact) {
        self.last_checked = fact.timestamp;
        self.checks.push(fact);
        if self.checks.len() > MAX_RETAINED_CHECKS {
            let excess = self.checks.len() - MAX_RETAINED_CHECKS;
            self.checks.drain(..excess);
        }
    }

    pub fn latest(&self) -> Option<&Fact> {
        self.checks.last()
    }

    /// Most recent fact of this item's kind that carries a real value.
    ///
    /// Errors and unknown availability are skipped so a blocked check in between
    /// does not hide an unavailable -> available transition.
    pub fn last_known(&self) -> Option<&Fact> {
        self.checks
            .iter()
            .rev()
            .find(|fact| fact.value.kind() == Some(self.kind) && fact.value.is_determinate())
    }

    pub fn price_stats(&self) -> Option<PriceStats> {
        PriceStats::from_checks(&self.checks)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriceStats {
    pub total_checks: usize,
    pub current_price: Decimal,
    pub lowest_price: Decimal,
    pub highest_price: Decimal,
    pub average_price: Decimal,
    pub first_check: DateTime<Utc>,
    pub last_check: DateTime<Utc>,
}

impl PriceStats {
    /// Statistics over the price facts in `checks`; `None` when there are none.
    pub fn from_checks(checks: &[Fact]) -> Option<Self> {
        let prices: Vec<(Decimal, DateTime<Utc>)> = checks
            .iter()
            .filter_map(|fact| fact.value.price().map(|price| (price, fact.timestamp)))
            .collect();

        let (first_price, first_check) = *prices.first()?;
        let (current_price, last_check) = *prices.last()?;

        let mut lowest_price = first_price;
        let mut highest_price = first_price;
        let mut total = Decimal::ZERO;
        for (price, _) in &prices {
            lowest_price = lowest_price.min(*price);
            highest_price = highest_price.max(*price);
            total += *price;
        }

        Some(Self {
            total_checks: prices.len(),
            current_price,
            lowest_price,
            highest_price,
            average_price: (total / Decimal::from(prices.len())).round_dp(2),
            first_check,
            last_check,
        })
    }
}
