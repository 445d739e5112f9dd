//! Day-type classification: distribution days and churn days.

use crate::config::ThresholdConfig;
use crate::indicators::IndicatorRecord;
use rust_decimal::Decimal;

/// Boolean day-type flags.
///
/// Mutually exclusive: a day is never both a distribution day and a churn
/// day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DayFlags {
    /// Meaningful decline on rising volume.
    pub is_distribution_day: bool,
    /// Tight price action on rising volume.
    pub is_churn_day: bool,
}

/// Classifies a day from its indicator record.
#[derive(Debug, Clone)]
pub struct DayClassifier {
    drop_threshold_pct: Decimal,
    churn_band_pct: Decimal,
}

impl DayClassifier {
    pub fn new(config: &ThresholdConfig) -> Self {
        Self {
            drop_threshold_pct: config.drop_threshold_pct,
            churn_band_pct: config.churn_band_pct,
        }
    }

    /// Derive day flags.
    ///
    /// Distribution is tested first; churn only when distribution is false.
    /// A drop of exactly `drop_threshold_pct` would satisfy both predicates
    /// when the band overlaps the threshold, so the ordering is what keeps
    /// the flags disjoint.
    pub fn classify(&self, record: &IndicatorRecord) -> DayFlags {
        let volume_up = record.volume_up();
        let Some(pct) = record.pct_change else {
            return DayFlags::default();
        };

        if pct <= self.drop_threshold_pct && volume_up {
            return DayFlags {
                is_distribution_day: true,
                is_churn_day: false,
            };
        }
        if pct.abs() <= self.churn_band_pct && volume_up {
            return DayFlags {
                is_distribution_day: false,
                is_churn_day: true,
            };
        }
        DayFlags::default()
    }
}
