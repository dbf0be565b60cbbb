pub mod alerts;
pub mod change_detector;
pub mod config;
pub mod element_finder;
pub mod history;
pub mod models;
pub mod normalizer;
pub mod plugins;
pub mod product_manager;
pub mod scraper;
pub mod utils;

// Re-export commonly used types
pub use crate::config::AppConfig;
pub use models::{ChangeOutcome, Fact, RunStatus};
pub use product_manager::{CheckOptions, ProductManager, RunSummary};
pub use utils::error::{AppError, Result};
