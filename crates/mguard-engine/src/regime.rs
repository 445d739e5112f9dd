//! Daily regime classification.

use crate::cluster::ClusterSnapshot;
use crate::config::ThresholdConfig;
use crate::indicators::IndicatorRecord;
use crate::rally::CycleStatus;
use mguard_core::RegimeLabel;
use rust_decimal::Decimal;

/// Classifies each day into a regime label.
///
/// Pure function of same-day state. The rules are evaluated in fixed
/// priority and are not mutually exclusive, so the order is a hard contract:
/// Correction, then UnderPressure, then Uptrend, then Neutral — first match
/// wins.
#[derive(Debug, Clone)]
pub struct RegimeClassifier {
    cluster_alert: u32,
    cluster_high: u32,
}

impl RegimeClassifier {
    pub fn new(config: &ThresholdConfig) -> Self {
        Self {
            cluster_alert: config.cluster_alert,
            cluster_high: config.cluster_high,
        }
    }

    /// Classify one day.
    ///
    /// An undefined moving average makes its clause false; heavy
    /// distribution alone is sufficient for Correction even with the close
    /// above the 50-day line.
    pub fn classify(
        &self,
        close: Decimal,
        record: &IndicatorRecord,
        cluster: ClusterSnapshot,
        cycle_status: CycleStatus,
    ) -> RegimeLabel {
        let below_ma50 = record.ma50.is_some_and(|ma| close < ma);
        let below_ma21 = record.ma21.is_some_and(|ma| close < ma);

        if cluster.dd_count >= self.cluster_high || below_ma50 {
            return RegimeLabel::Correction;
        }
        if cluster.dd_count >= self.cluster_alert || below_ma21 {
            return RegimeLabel::UnderPressure;
        }
        if cycle_status == CycleStatus::Active {
            return RegimeLabel::Uptrend;
        }
        RegimeLabel::Neutral
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn record(ma21: Option<Decimal>, ma50: Option<Decimal>) -> IndicatorRecord {
        IndicatorRecord {
            ma21,
            ma50,
            ma200: None,
            pct_change: Some(dec!(0.5)),
            volume_ratio: Some(dec!(1.1)),
        }
    }

    fn cluster(dd: u32, churn: u32) -> ClusterSnapshot {
        ClusterSnapshot {
            dd_count: dd,
            churn_count: churn,
        }
    }

    fn classifier() -> RegimeClassifier {
        RegimeClassifier::new(&ThresholdConfig::default())
    }

    #[test]
    fn test_heavy_cluster_alone_is_correction() {
        // ddCount 7 with the close comfortably above ma50: rule 1 fires on
        // the cluster count alone.
        let label = classifier().classify(
            dec!(110),
            &record(Some(dec!(100)), Some(dec!(100))),
            cluster(7, 0),
            CycleStatus::None,
        );
        assert_eq!(label, RegimeLabel::Correction);
    }

    #[test]
    fn test_below_ma50_is_correction() {
        let label = classifier().classify(
            dec!(95),
            &record(Some(dec!(96)), Some(dec!(100))),
            cluster(0, 0),
            CycleStatus::Active,
        );
        assert_eq!(label, RegimeLabel::Correction);
    }

    #[test]
    fn test_alert_cluster_is_under_pressure() {
        let label = classifier().classify(
            dec!(110),
            &record(Some(dec!(100)), Some(dec!(100))),
            cluster(4, 0),
            CycleStatus::None,
        );
        assert_eq!(label, RegimeLabel::UnderPressure);
    }

    #[test]
    fn test_below_ma21_is_under_pressure() {
        let label = classifier().classify(
            dec!(99),
            &record(Some(dec!(100)), Some(dec!(95))),
            cluster(0, 0),
            CycleStatus::Active,
        );
        assert_eq!(label, RegimeLabel::UnderPressure);
    }

    #[test]
    fn test_active_cycle_is_uptrend() {
        let label = classifier().classify(
            dec!(110),
            &record(Some(dec!(100)), Some(dec!(100))),
            cluster(1, 0),
            CycleStatus::Active,
        );
        assert_eq!(label, RegimeLabel::Uptrend);
    }

    #[test]
    fn test_neutral_otherwise() {
        let label = classifier().classify(
            dec!(110),
            &record(Some(dec!(100)), Some(dec!(100))),
            cluster(1, 2),
            CycleStatus::Pending,
        );
        assert_eq!(label, RegimeLabel::Neutral);
    }

    #[test]
    fn test_undefined_mas_do_not_fire() {
        let label = classifier().classify(
            dec!(50),
            &record(None, None),
            cluster(0, 0),
            CycleStatus::None,
        );
        assert_eq!(label, RegimeLabel::Neutral);
    }
}
