use scraper::{Html, Selector};
use tracing::debug;

use crate::config::ItemConfig;
use crate::models::{Availability, FactValue, TrackerKind};
use crate::plugins::traits::{Extraction, TrackerPlugin};
use crate::scraper::FetchedPage;
use crate::utils::error::{AppError, Result};

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Decides availability from the presence of a known "unavailable" message.
///
/// A button carrying the message is checked first, then the whole page text.
/// Neither present means available. Blocked responses never reach this tracker;
/// they become [`Availability::Unknown`] at the check-cycle level.
pub struct AvailabilityTracker {
    button_selector: Selector,
}

impl AvailabilityTracker {
    pub fn new() -> Result<Self> {
        let button_selector = Selector::parse("button")
            .map_err(|e| AppError::Internal(format!("button selector: {:?}", e)))?;
        Ok(Self { button_selector })
    }

    fn button_says(&self, document: &Html, message: &str) -> bool {
        document
            .select(&self.button_selector)
            .any(|button| collapse_whitespace(&button.text().collect::<String>()).contains(message))
    }

    /// Rendered text only; attributes and script or style contents do not count.
    fn page_says(document: &Html, message: &str) -> bool {
        let text = document
            .root_element()
            .descendants()
            .filter(|node| {
                let parent = node.parent().and_then(|p| p.value().as_element().map(|e| e.name()));
                !matches!(parent, Some("script" | "style" | "noscript" | "template"))
            })
            .filter_map(|node| node.value().as_text().map(|text| &**text))
            .collect::<Vec<_>>()
            .join(" ");
        collapse_whitespace(&text).contains(message)
    }
}

impl TrackerPlugin for AvailabilityTracker {
    fn name(&self) -> &str {
        "Availability Tracker"
    }

    fn kind(&self) -> TrackerKind {
        TrackerKind::Availability
    }

    fn extract(&self, page: &FetchedPage, item: &ItemConfig) -> Result<Extraction> {
        let message = collapse_whitespace(item.unavailable_message());
        let document = Html::parse_document(&page.body);

        let (state, strategy) = if self.button_says(&document, &message) {
            (Availability::Unavailable, "button text")
        } else if Self::page_says(&document, &message) {
            (Availability::Unavailable, "page text")
        } else {
            (Availability::Available, "message absent")
        };

        debug!("{}: availability {} via {}", item.id, state, strategy);

        Ok(Extraction {
            value: FactValue::Availability { state },
            strategy: strategy.to_string(),
        })
    }
}
