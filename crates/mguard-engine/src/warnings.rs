//! Per-day and cluster-level warning assembly.

use crate::classifier::DayFlags;
use crate::cluster::ClusterSnapshot;
use crate::config::ThresholdConfig;
use crate::indicators::IndicatorRecord;
use mguard_core::{decimal_evidence, PricePoint, Severity, Warning, WarningScope};

/// Assembles top-side warnings for one day.
///
/// Bottom-side warnings come from the rally detector, except the
/// moving-average reclaim, which is derived here from plain price action.
#[derive(Debug, Clone)]
pub struct WarningAggregator {
    cluster_alert: u32,
    cluster_high: u32,
    churn_cluster_boost: u32,
    ttl_days: usize,
    ma50_break_requires_volume_confirm: bool,
}

impl WarningAggregator {
    pub fn new(config: &ThresholdConfig) -> Self {
        Self {
            cluster_alert: config.cluster_alert,
            cluster_high: config.cluster_high,
            churn_cluster_boost: config.churn_cluster_boost,
            ttl_days: config.ttl_days,
            ma50_break_requires_volume_confirm: config.ma50_break_requires_volume_confirm,
        }
    }

    /// Top-side warnings: day flags, the distribution cluster, and
    /// moving-average position.
    pub fn top_warnings(
        &self,
        point: &PricePoint,
        record: &IndicatorRecord,
        flags: DayFlags,
        cluster: ClusterSnapshot,
    ) -> Vec<Warning> {
        let mut warnings = Vec::new();

        if flags.is_distribution_day {
            warnings.push(self.flag_warning(
                "DD",
                Severity::Watch,
                "Distribution Day: price fell with higher volume.",
                record,
            ));
        }
        if flags.is_churn_day {
            warnings.push(self.flag_warning(
                "CHURN",
                Severity::Info,
                "Churn: tight price action on higher volume.",
                record,
            ));
        }

        if let Some(warning) = self.cluster_warning(cluster) {
            warnings.push(warning);
        }

        if let Some(warning) = self.ma_warning(point, record) {
            warnings.push(warning);
        }

        warnings
    }

    /// Bottom-side reclaim of the 21-day line on rising volume, after
    /// closing at or below it the prior day.
    pub fn ma21_reclaim(
        &self,
        point: &PricePoint,
        prev_point: &PricePoint,
        record: &IndicatorRecord,
        prev_record: &IndicatorRecord,
    ) -> Option<Warning> {
        let ma21 = record.ma21?;
        let prev_ma21 = prev_record.ma21?;
        if point.close > ma21 && prev_point.close <= prev_ma21 && record.volume_up() {
            Some(
                Warning::new(
                    WarningScope::Bottom,
                    "MA21_RECLAIM",
                    Severity::Watch,
                    "Reclaimed 21-day moving average on higher volume.",
                )
                .with_evidence("close", decimal_evidence(point.close))
                .with_evidence("ma21", decimal_evidence(ma21)),
            )
        } else {
            None
        }
    }

    fn flag_warning(
        &self,
        code: &str,
        severity: Severity,
        message: &str,
        record: &IndicatorRecord,
    ) -> Warning {
        let mut warning = Warning::new(WarningScope::Top, code, severity, message)
            .with_ttl(self.ttl_days as u32);
        if let Some(pct) = record.pct_change {
            warning = warning.with_evidence("pct", decimal_evidence(pct));
        }
        if let Some(ratio) = record.volume_ratio {
            warning = warning.with_evidence("vol_ratio", decimal_evidence(ratio));
        }
        warning
    }

    /// Distribution-cluster warning: alert at the alert threshold, high at
    /// the high threshold, boosted one level when churn is also piling up.
    fn cluster_warning(&self, cluster: ClusterSnapshot) -> Option<Warning> {
        if cluster.dd_count < self.cluster_alert {
            return None;
        }
        let mut severity = if cluster.dd_count >= self.cluster_high {
            Severity::High
        } else {
            Severity::Alert
        };
        if cluster.churn_count >= self.churn_cluster_boost {
            severity = severity.boosted();
        }

        Some(
            Warning::new(
                WarningScope::Top,
                "DD_CLUSTER",
                severity,
                format!(
                    "Distribution Days in last {} sessions: {}.",
                    self.ttl_days, cluster.dd_count
                ),
            )
            .with_evidence("dd_25d", serde_json::json!(cluster.dd_count))
            .with_evidence("churn_25d", serde_json::json!(cluster.churn_count)),
        )
    }

    /// Moving-average warnings are mutually exclusive: the 50-day break
    /// outranks and suppresses the 21-day notice.
    fn ma_warning(&self, point: &PricePoint, record: &IndicatorRecord) -> Option<Warning> {
        let ma50_break = record.ma50.is_some_and(|ma| point.close < ma)
            && (record.volume_up() || !self.ma50_break_requires_volume_confirm);
        if ma50_break {
            let ma50 = record.ma50.unwrap_or_default();
            return Some(
                Warning::new(
                    WarningScope::Top,
                    "MA50_BREAK",
                    Severity::Alert,
                    "Close below 50-day moving average on higher volume.",
                )
                .with_evidence("close", decimal_evidence(point.close))
                .with_evidence("ma50", decimal_evidence(ma50)),
            );
        }

        if let Some(ma21) = record.ma21 {
            if point.close < ma21 {
                return Some(
                    Warning::new(
                        WarningScope::Top,
                        "MA21_BELOW",
                        Severity::Watch,
                        "Close below 21-day moving average.",
                    )
                    .with_evidence("close", decimal_evidence(point.close))
                    .with_evidence("ma21", decimal_evidence(ma21)),
                );
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn aggregator() -> WarningAggregator {
        WarningAggregator::new(&ThresholdConfig::default())
    }

    fn point(close: Decimal) -> PricePoint {
        let date = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        PricePoint::new(date, close, close, close, close, dec!(1000))
    }

    fn record(
        ma21: Option<Decimal>,
        ma50: Option<Decimal>,
        pct: Option<Decimal>,
        volume_ratio: Option<Decimal>,
    ) -> IndicatorRecord {
        IndicatorRecord {
            ma21,
            ma50,
            ma200: None,
            pct_change: pct,
            volume_ratio,
        }
    }

    fn cluster(dd: u32, churn: u32) -> ClusterSnapshot {
        ClusterSnapshot {
            dd_count: dd,
            churn_count: churn,
        }
    }

    #[test]
    fn test_distribution_day_warning() {
        let flags = DayFlags {
            is_distribution_day: true,
            is_churn_day: false,
        };
        let warnings = aggregator().top_warnings(
            &point(dec!(100)),
            &record(None, None, Some(dec!(-0.5)), Some(dec!(1.3))),
            flags,
            cluster(1, 0),
        );
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].code, "DD");
        assert_eq!(warnings[0].severity, Severity::Watch);
        assert_eq!(warnings[0].ttl_days, Some(25));
        assert_eq!(warnings[0].evidence["pct"], serde_json::json!(-0.5));
        assert_eq!(warnings[0].evidence["vol_ratio"], serde_json::json!(1.3));
    }

    #[test]
    fn test_cluster_severity_ladder() {
        let agg = aggregator();
        let quiet = DayFlags::default();
        let rec = record(None, None, Some(dec!(0.5)), Some(dec!(0.9)));

        let warnings = agg.top_warnings(&point(dec!(100)), &rec, quiet, cluster(3, 0));
        assert!(warnings.iter().all(|w| w.code != "DD_CLUSTER"));

        let warnings = agg.top_warnings(&point(dec!(100)), &rec, quiet, cluster(4, 0));
        let w = warnings.iter().find(|w| w.code == "DD_CLUSTER").unwrap();
        assert_eq!(w.severity, Severity::Alert);

        let warnings = agg.top_warnings(&point(dec!(100)), &rec, quiet, cluster(6, 0));
        let w = warnings.iter().find(|w| w.code == "DD_CLUSTER").unwrap();
        assert_eq!(w.severity, Severity::High);
        assert_eq!(w.evidence["dd_25d"], serde_json::json!(6));
    }

    #[test]
    fn test_churn_boost_escalates_alert_to_high() {
        let warnings = aggregator().top_warnings(
            &point(dec!(100)),
            &record(None, None, Some(dec!(0.5)), Some(dec!(0.9))),
            DayFlags::default(),
            cluster(4, 2),
        );
        let w = warnings.iter().find(|w| w.code == "DD_CLUSTER").unwrap();
        assert_eq!(w.severity, Severity::High);
    }

    #[test]
    fn test_ma50_break_requires_volume_by_default() {
        let agg = aggregator();
        // Below ma50 on falling volume: no break warning, ma21 notice fires
        // instead.
        let warnings = agg.top_warnings(
            &point(dec!(95)),
            &record(Some(dec!(97)), Some(dec!(100)), Some(dec!(-1)), Some(dec!(0.8))),
            DayFlags::default(),
            cluster(0, 0),
        );
        assert!(warnings.iter().all(|w| w.code != "MA50_BREAK"));
        assert!(warnings.iter().any(|w| w.code == "MA21_BELOW"));

        // Same day on rising volume: break fires and suppresses the notice.
        let warnings = agg.top_warnings(
            &point(dec!(95)),
            &record(Some(dec!(97)), Some(dec!(100)), Some(dec!(-1)), Some(dec!(1.2))),
            DayFlags::default(),
            cluster(0, 0),
        );
        assert!(warnings.iter().any(|w| w.code == "MA50_BREAK"));
        assert!(warnings.iter().all(|w| w.code != "MA21_BELOW"));
    }

    #[test]
    fn test_ma50_break_without_volume_confirm_option() {
        let config = ThresholdConfig {
            ma50_break_requires_volume_confirm: false,
            ..Default::default()
        };
        let warnings = WarningAggregator::new(&config).top_warnings(
            &point(dec!(95)),
            &record(Some(dec!(97)), Some(dec!(100)), Some(dec!(-1)), Some(dec!(0.8))),
            DayFlags::default(),
            cluster(0, 0),
        );
        assert!(warnings.iter().any(|w| w.code == "MA50_BREAK"));
    }

    #[test]
    fn test_ma21_reclaim() {
        let agg = aggregator();
        let prev = point(dec!(99));
        let today = point(dec!(102));
        let prev_rec = record(Some(dec!(100)), None, None, None);
        let rec = record(Some(dec!(101)), None, Some(dec!(3)), Some(dec!(1.4)));

        let warning = agg.ma21_reclaim(&today, &prev, &rec, &prev_rec).unwrap();
        assert_eq!(warning.code, "MA21_RECLAIM");
        assert_eq!(warning.scope, WarningScope::Bottom);
        assert_eq!(warning.severity, Severity::Watch);

        // No reclaim when yesterday already closed above its ma21.
        let prev_above = point(dec!(101));
        assert!(agg.ma21_reclaim(&today, &prev_above, &rec, &prev_rec).is_none());

        // No reclaim without rising volume.
        let rec_low_volume = record(Some(dec!(101)), None, Some(dec!(3)), Some(dec!(0.9)));
        assert!(agg.ma21_reclaim(&today, &prev, &rec_low_volume, &prev_rec).is_none());
    }
}
