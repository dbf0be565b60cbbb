pub mod error;

pub use error::{AppError, ExtractionError, Result};
