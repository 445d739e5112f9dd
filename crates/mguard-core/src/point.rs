//! Daily OHLCV bars and series validation.

use crate::error::{CoreError, CoreResult};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One daily price/volume bar for an instrument.
///
/// A series is strictly ascending by date with one entry per trading day.
/// Gaps in the source trading calendar are accepted as-is; the engine never
/// introduces or fills gaps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Trading date.
    pub date: NaiveDate,
    /// Opening price.
    pub open: Decimal,
    /// Session high.
    pub high: Decimal,
    /// Session low.
    pub low: Decimal,
    /// Closing price.
    pub close: Decimal,
    /// Traded volume.
    pub volume: Decimal,
}

impl PricePoint {
    /// Create a new price point.
    pub fn new(
        date: NaiveDate,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: Decimal,
    ) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

/// Validate an input series before processing.
///
/// Rejects with `MalformedSeries`:
/// - non-monotonic dates (a date not strictly after its predecessor)
/// - duplicate dates
/// - non-positive prices or volumes
///
/// An empty series is valid (the engine degrades to an empty report).
/// Insufficient history is never an error here; indicators degrade to
/// undefined values instead.
pub fn validate_series(series: &[PricePoint]) -> CoreResult<()> {
    for (idx, point) in series.iter().enumerate() {
        if point.open <= Decimal::ZERO
            || point.high <= Decimal::ZERO
            || point.low <= Decimal::ZERO
            || point.close <= Decimal::ZERO
        {
            return Err(CoreError::MalformedSeries(format!(
                "non-positive price at {}",
                point.date
            )));
        }
        if point.volume <= Decimal::ZERO {
            return Err(CoreError::MalformedSeries(format!(
                "non-positive volume at {}",
                point.date
            )));
        }
        if idx > 0 {
            let prev = &series[idx - 1];
            if point.date == prev.date {
                return Err(CoreError::MalformedSeries(format!(
                    "duplicate date {}",
                    point.date
                )));
            }
            if point.date < prev.date {
                return Err(CoreError::MalformedSeries(format!(
                    "non-monotonic date {} after {}",
                    point.date, prev.date
                )));
            }
        }
    }
    Ok(())
}
