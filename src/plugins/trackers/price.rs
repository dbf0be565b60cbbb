use tracing::debug;

use crate::config::ItemConfig;
use crate::element_finder::{DEFAULT_PRICE_TEST_ID, Document, PriceStrategy, default_price_strategies};
use crate::models::{FactValue, TrackerKind};
use crate::normalizer::normalize_positive;
use crate::plugins::traits::{Extraction, TrackerPlugin};
use crate::scraper::FetchedPage;
use crate::utils::error::{ExtractionError, Result};

/// Runs price strategies in order and keeps the first plausible positive amount.
pub struct PriceTracker {
    strategies: Vec<Box<dyn PriceStrategy>>,
}

impl PriceTracker {
    pub fn new() -> Result<Self> {
        Self::with_test_id(DEFAULT_PRICE_TEST_ID)
    }

    pub fn with_test_id(test_id: &str) -> Result<Self> {
        Ok(Self::with_strategies(default_price_strategies(test_id)?))
    }

    pub fn with_strategies(strategies: Vec<Box<dyn PriceStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }
}

impl TrackerPlugin for PriceTracker {
    fn name(&self) -> &str {
        "Price Tracker"
    }

    fn kind(&self) -> TrackerKind {
        TrackerKind::Price
    }

    fn extract(&self, page: &FetchedPage, item: &ItemConfig) -> Result<Extraction> {
        let document = Document::parse(page);

        for strategy in &self.strategies {
            for candidate in strategy.candidates(&document) {
                match normalize_positive(&candidate) {
                    Ok(amount) => {
                        debug!("{}: {} matched {:?} -> {}", item.id, strategy.name(), candidate, amount);
                        return Ok(Extraction {
                            value: FactValue::Price { amount },
                            strategy: strategy.name().to_string(),
                        });
                    }
                    Err(e) => {
                        debug!("{}: {} rejected candidate: {}", item.id, strategy.name(), e);
                    }
                }
            }
        }

        Err(ExtractionError::NotFound.into())
    }
}
