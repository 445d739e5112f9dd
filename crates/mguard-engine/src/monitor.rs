//! Post-confirmation monitoring.
//!
//! Once a follow-through day exists, tracks how the attempt behaves:
//! 50-day moving-average breaches, volume fade on up days, and whether the
//! close held the 50-day line through the first three sessions.

use crate::config::ThresholdConfig;
use crate::indicators::IndicatorRecord;
use chrono::NaiveDate;
use mguard_core::{PricePoint, RegimeLabel};
use serde::{Deserialize, Serialize};

/// Metrics gathered after a confirmation day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostEventMetrics {
    /// The confirmation day being monitored.
    pub confirmation_date: NaiveDate,
    /// Post-confirmation days observed before the window closed.
    pub days_monitored: usize,
    /// Days the close finished below the 50-day moving average.
    pub ma50_breaches: u32,
    /// Dates of those breaches.
    pub ma50_breach_dates: Vec<NaiveDate>,
    /// Longest run of up-close days on declining volume.
    pub longest_volume_fade_streak: usize,
    /// True once the streak reached the configured threshold.
    pub volume_fade: bool,
    /// First date the volume-fade flag triggered.
    pub volume_fade_date: Option<NaiveDate>,
    /// Whether the close held the 50-day line on each of the first three
    /// days after confirmation. Null when the window closed earlier.
    pub held_ma50_first_three_days: Option<bool>,
}

impl PostEventMetrics {
    fn new(confirmation_date: NaiveDate) -> Self {
        Self {
            confirmation_date,
            days_monitored: 0,
            ma50_breaches: 0,
            ma50_breach_dates: Vec::new(),
            longest_volume_fade_streak: 0,
            volume_fade: false,
            volume_fade_date: None,
            held_ma50_first_three_days: None,
        }
    }
}

/// Tracks confirmation aftermath over a bounded window.
///
/// The window runs from the day after the confirmation until either the
/// regime moves away from Uptrend or `monitor_day_budget` days elapse,
/// whichever comes first. A newer confirmation restarts monitoring; the
/// metrics of the latest confirmation are the ones reported.
#[derive(Debug)]
pub struct PostEventMonitor {
    day_budget: usize,
    fade_streak_threshold: usize,
    confirmation_idx: Option<usize>,
    window_open: bool,
    current_streak: usize,
    first_three_held: bool,
    metrics: Option<PostEventMetrics>,
}

impl PostEventMonitor {
    pub fn new(config: &ThresholdConfig) -> Self {
        Self {
            day_budget: config.monitor_day_budget,
            fade_streak_threshold: config.volume_fade_streak,
            confirmation_idx: None,
            window_open: false,
            current_streak: 0,
            first_three_held: true,
            metrics: None,
        }
    }

    /// Begin (or restart) monitoring at a confirmation day.
    pub fn start(&mut self, idx: usize, date: NaiveDate) {
        self.confirmation_idx = Some(idx);
        self.window_open = true;
        self.current_streak = 0;
        self.first_three_held = true;
        self.metrics = Some(PostEventMetrics::new(date));
    }

    /// Observe one day. Call for every day once a confirmation exists; days
    /// at or before the confirmation and days after the window closed are
    /// ignored.
    pub fn on_day(
        &mut self,
        idx: usize,
        point: &PricePoint,
        record: &IndicatorRecord,
        regime: RegimeLabel,
    ) {
        let Some(confirmation_idx) = self.confirmation_idx else {
            return;
        };
        if !self.window_open || idx <= confirmation_idx {
            return;
        }
        let Some(metrics) = self.metrics.as_mut() else {
            return;
        };

        let offset = idx - confirmation_idx;
        metrics.days_monitored = offset;

        let below_ma50 = record.ma50.is_some_and(|ma| point.close < ma);
        if below_ma50 {
            metrics.ma50_breaches += 1;
            metrics.ma50_breach_dates.push(point.date);
        }

        if offset <= 3 {
            let held = record.ma50.is_some_and(|ma| point.close >= ma);
            self.first_three_held &= held;
            if offset == 3 {
                metrics.held_ma50_first_three_days = Some(self.first_three_held);
            }
        }

        let up_close = record.pct_change.is_some_and(|pct| pct > rust_decimal::Decimal::ZERO);
        let volume_down = record
            .volume_ratio
            .is_some_and(|r| r < rust_decimal::Decimal::ONE);
        if up_close && volume_down {
            self.current_streak += 1;
            metrics.longest_volume_fade_streak =
                metrics.longest_volume_fade_streak.max(self.current_streak);
            if self.current_streak >= self.fade_streak_threshold && !metrics.volume_fade {
                metrics.volume_fade = true;
                metrics.volume_fade_date = Some(point.date);
            }
        } else {
            self.current_streak = 0;
        }

        // The window closes with the day that shows the change; that day's
        // observations are kept.
        if regime != RegimeLabel::Uptrend || offset >= self.day_budget {
            self.window_open = false;
        }
    }

    /// Metrics for the most recent confirmation, if any exists.
    pub fn metrics(&self) -> Option<&PostEventMetrics> {
        self.metrics.as_ref()
    }
}
