// Tracker plugin implementations
pub mod price;
pub mod availability;

pub use price::PriceTracker;
pub use availability::AvailabilityTracker;
