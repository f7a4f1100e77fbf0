use crate::error::AnalyticsError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Minimum, maximum and arithmetic mean of a series of amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub min: Decimal,
    pub max: Decimal,
    pub mean: Decimal,
}

impl Summary {
    /// Summarizes `values`.
    ///
    /// # Errors
    ///
    /// `AnalyticsError::EmptyDataset` when `values` is empty; `what` names the
    /// series in the message.
    pub fn of(values: &[Decimal], what: &str) -> Result<Self, AnalyticsError> {
        let (first, rest) = values
            .split_first()
            .ok_or_else(|| AnalyticsError::EmptyDataset(what.to_string()))?;

        let mut min = *first;
        let mut max = *first;
        let mut sum = *first;
        for &value in rest {
            min = min.min(value);
            max = max.max(value);
            sum += value;
        }

        Ok(Self {
            min,
            max,
            mean: sum / Decimal::from(values.len()),
        })
    }

    /// Adds the same offset to every statistic.
    pub fn shifted(self, offset: Decimal) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
            mean: self.mean + offset,
        }
    }
}
