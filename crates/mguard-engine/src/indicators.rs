//! Moving averages, day-over-day change and volume ratio.

use mguard_core::PricePoint;
use rust_decimal::Decimal;
use std::collections::VecDeque;

/// Standard moving-average windows, in trading days.
pub const MA_WINDOWS: [usize; 3] = [21, 50, 200];

/// Derived indicators for one trading day.
///
/// Fields are `None` until enough history exists: each moving average needs
/// its full window, and both `pct_change` and `volume_ratio` need a previous
/// day. `volume_ratio` is also `None` when the previous volume is zero — the
/// `None` sentinel makes every `> 1` comparison false without risking a
/// division fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorRecord {
    /// 21-day simple moving average of closes.
    pub ma21: Option<Decimal>,
    /// 50-day simple moving average of closes.
    pub ma50: Option<Decimal>,
    /// 200-day simple moving average of closes.
    pub ma200: Option<Decimal>,
    /// Day-over-day close change in percent.
    pub pct_change: Option<Decimal>,
    /// Today's volume divided by yesterday's.
    pub volume_ratio: Option<Decimal>,
}

impl IndicatorRecord {
    /// True when volume rose versus the previous day.
    pub fn volume_up(&self) -> bool {
        self.volume_ratio.is_some_and(|r| r > Decimal::ONE)
    }
}

/// Rolling arithmetic mean over a fixed trailing window.
///
/// Ring buffer plus running sum; each push is O(1).
#[derive(Debug)]
struct RollingMean {
    window: usize,
    values: VecDeque<Decimal>,
    sum: Decimal,
}

impl RollingMean {
    fn new(window: usize) -> Self {
        Self {
            window,
            values: VecDeque::with_capacity(window),
            sum: Decimal::ZERO,
        }
    }

    /// Push a value and return the mean once the window is full.
    fn push(&mut self, value: Decimal) -> Option<Decimal> {
        self.values.push_back(value);
        self.sum += value;
        if self.values.len() > self.window {
            if let Some(evicted) = self.values.pop_front() {
                self.sum -= evicted;
            }
        }
        if self.values.len() == self.window {
            Some(self.sum / Decimal::from(self.window as u64))
        } else {
            None
        }
    }
}

/// Incremental indicator calculator.
///
/// Processes a series strictly forward, one day per `push`. Appending a day
/// computes only that day's record from the fixed trailing window; previously
/// emitted records are never recomputed. Deterministic, no side effects.
#[derive(Debug)]
pub struct IndicatorCalculator {
    ma21: RollingMean,
    ma50: RollingMean,
    ma200: RollingMean,
    prev_close: Option<Decimal>,
    prev_volume: Option<Decimal>,
}

impl IndicatorCalculator {
    /// Create a calculator for the standard window set.
    pub fn new() -> Self {
        let [w21, w50, w200] = MA_WINDOWS;
        Self {
            ma21: RollingMean::new(w21),
            ma50: RollingMean::new(w50),
            ma200: RollingMean::new(w200),
            prev_close: None,
            prev_volume: None,
        }
    }

    /// Compute the indicator record for the next day in the series.
    pub fn push(&mut self, point: &PricePoint) -> IndicatorRecord {
        let pct_change = self.prev_close.map(|prev| {
            (point.close - prev) / prev * Decimal::from(100)
        });

        let volume_ratio = self.prev_volume.and_then(|prev| {
            if prev > Decimal::ZERO {
                Some(point.volume / prev)
            } else {
                None
            }
        });

        let record = IndicatorRecord {
            ma21: self.ma21.push(point.close),
            ma50: self.ma50.push(point.close),
            ma200: self.ma200.push(point.close),
            pct_change,
            volume_ratio,
        };

        self.prev_close = Some(point.close);
        self.prev_volume = Some(point.volume);
        record
    }
}

impl Default for IndicatorCalculator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn bar(offset: u64, close: Decimal, volume: Decimal) -> PricePoint {
        let date = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap() + chrono::Days::new(offset);
        PricePoint::new(date, close, close, close, close, volume)
    }

    #[test]
    fn test_first_day_undefined() {
        let mut calc = IndicatorCalculator::new();
        let record = calc.push(&bar(0, dec!(100), dec!(1000)));
        assert!(record.pct_change.is_none());
        assert!(record.volume_ratio.is_none());
        assert!(record.ma21.is_none());
        assert!(!record.volume_up());
    }

    #[test]
    fn test_pct_change_and_volume_ratio() {
        let mut calc = IndicatorCalculator::new();
        calc.push(&bar(0, dec!(100), dec!(1000)));
        let record = calc.push(&bar(1, dec!(102), dec!(1200)));
        assert_eq!(record.pct_change, Some(dec!(2)));
        assert_eq!(record.volume_ratio, Some(dec!(1.2)));
        assert!(record.volume_up());
    }

    #[test]
    fn test_zero_previous_volume_is_not_greater() {
        // Zero previous volume must not fault and must never read as "> 1".
        let mut calc = IndicatorCalculator::new();
        calc.push(&bar(0, dec!(100), dec!(0)));
        let record = calc.push(&bar(1, dec!(101), dec!(5000)));
        assert!(record.volume_ratio.is_none());
        assert!(!record.volume_up());
    }

    #[test]
    fn test_ma_window_fills_exactly() {
        let mut calc = IndicatorCalculator::new();
        let mut last = None;
        for i in 0..21u64 {
            let record = calc.push(&bar(i, dec!(100), dec!(1000)));
            if i < 20 {
                assert!(record.ma21.is_none(), "ma21 defined at day {i}");
            }
            last = record.ma21;
        }
        assert_eq!(last, Some(dec!(100)));
    }

    #[test]
    fn test_ma_matches_trailing_mean() {
        let mut calc = IndicatorCalculator::new();
        let closes: Vec<Decimal> = (0..30u64).map(|i| Decimal::from(100 + i)).collect();
        let mut records = Vec::new();
        for (i, close) in closes.iter().enumerate() {
            records.push(calc.push(&bar(i as u64, *close, dec!(1000))));
        }
        for (t, record) in records.iter().enumerate() {
            if t + 1 >= 21 {
                let window = &closes[t + 1 - 21..=t];
                let mean: Decimal =
                    window.iter().copied().sum::<Decimal>() / Decimal::from(21u64);
                assert_eq!(record.ma21, Some(mean), "mismatch at day {t}");
            } else {
                assert!(record.ma21.is_none());
            }
        }
    }

    #[test]
    fn test_push_does_not_alter_past_records() {
        let mut calc = IndicatorCalculator::new();
        calc.push(&bar(0, dec!(100), dec!(1000)));
        let second = calc.push(&bar(1, dec!(105), dec!(1500)));
        let frozen = second.clone();
        calc.push(&bar(2, dec!(90), dec!(2000)));
        assert_eq!(second, frozen);
    }
}
