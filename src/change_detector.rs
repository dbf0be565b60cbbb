use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{Availability, ChangeOutcome, Fact, FactValue, NotifyOn};
use crate::utils::error::{AppError, Result};

/// Classify `current` against the last known fact for the same item.
///
/// Price items alert on every check at or below the threshold, whether or not
/// the price moved. Availability items alert only on unavailable -> available.
/// A fact of a different kind than `previous` starts the history over.
pub fn detect(previous: Option<&Fact>, current: &Fact, threshold: Option<Decimal>) -> ChangeOutcome {
    let current = current.clone();
    let Some(previous) = previous.cloned() else {
        return ChangeOutcome::FirstObservation { current };
    };

    match (&previous.value, &current.value) {
        (_, FactValue::Error) => ChangeOutcome::ChangedNoAlert { previous, current },

        (FactValue::Price { amount: before }, FactValue::Price { amount: now }) => {
            let (before, now) = (*before, *now);
            match threshold {
                Some(limit) if now <= limit => ChangeOutcome::AlertTriggered { previous, current },
                _ if now != before => ChangeOutcome::ChangedNoAlert { previous, current },
                _ => ChangeOutcome::Unchanged { previous, current },
            }
        }

        (FactValue::Availability { state: before }, FactValue::Availability { state: now }) => {
            match (*before, *now) {
                (before, now) if before == now => ChangeOutcome::Unchanged { previous, current },
                (Availability::Unavailable, Availability::Available) => {
                    ChangeOutcome::AlertTriggered { previous, current }
                }
                _ => ChangeOutcome::ChangedNoAlert { previous, current },
            }
        }

        _ => ChangeOutcome::FirstObservation { current },
    }
}

/// How far a price sits below its threshold.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Savings {
    pub delta: Decimal,
    pub percent: Decimal,
}

impl Savings {
    /// `delta = threshold - current`, `percent = delta / threshold * 100`.
    pub fn compute(threshold: Decimal, current: Decimal) -> Result<Self> {
        if threshold <= Decimal::ZERO {
            return Err(AppError::InvalidConfig(format!(
                "threshold must be greater than 0, got {}",
                threshold
            )));
        }

        let delta = threshold - current;
        let percent = delta
            .checked_div(threshold)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .ok_or_else(|| AppError::InvalidConfig(format!("cannot compare {} to {}", current, threshold)))?;

        Ok(Self { delta, percent })
    }
}

/// Whether a non-alerting price move should still be sent to the notifiers.
pub fn should_report_change(policy: NotifyOn, outcome: &ChangeOutcome) -> bool {
    let ChangeOutcome::ChangedNoAlert { previous, current } = outcome else {
        return false;
    };
    let (Some(before), Some(now)) = (previous.value.price(), current.value.price()) else {
        return false;
    };

    match policy {
        NotifyOn::Never => false,
        NotifyOn::Decrease => now < before,
        NotifyOn::Increase => now > before,
        NotifyOn::AnyChange => now != before,
    }
}
