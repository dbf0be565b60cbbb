use serde::{Deserialize, Serialize};

use crate::config::ItemConfig;
use crate::models::{FactValue, TrackerKind};
use crate::scraper::FetchedPage;
use crate::utils::error::Result;

/// A value read out of a document, plus the strategy that found it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Extraction {
    pub value: FactValue,
    pub strategy: String,
}

/// Trait for implementing fact extractors (price, availability)
pub trait TrackerPlugin: Send + Sync {
    /// Plugin metadata
    fn name(&self) -> &str;
    fn kind(&self) -> TrackerKind;

    /// Read this tracker's fact out of `page` for `item`.
    fn extract(&self, page: &FetchedPage, item: &ItemConfig) -> Result<Extraction>;
}
