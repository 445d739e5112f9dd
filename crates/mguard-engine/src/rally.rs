//! Rally attempt and follow-through confirmation state machine.
//!
//! Tracks, per instrument: the reaction-low anchor, the Day1 rally
//! candidate, the follow-through confirmation window, and post-confirmation
//! invalidation. Modeled as an explicit cycle object so the forward-only
//! transition invariant (None → Pending → Active → Invalidated) is enforced
//! mechanically rather than by scattered boolean flags.

use crate::classifier::DayFlags;
use crate::config::ThresholdConfig;
use crate::indicators::IndicatorRecord;
use chrono::NaiveDate;
use mguard_core::{decimal_evidence, PricePoint, Severity, Warning, WarningScope};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Trading days after confirmation in which renewed distribution counts
/// toward invalidation.
const POST_FTD_DD_WINDOW: usize = 5;
/// Distribution days within that window that invalidate the confirmation.
const POST_FTD_DD_LIMIT: u32 = 2;

/// Confirmation cycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CycleStatus {
    /// No rally candidate.
    None,
    /// Day1 found, confirmation window open.
    Pending,
    /// Follow-through confirmed.
    Active,
    /// Confirmation retracted. Terminal for the cycle.
    Invalidated,
}

impl CycleStatus {
    /// True once the cycle can never change again.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Invalidated)
    }
}

/// One rally/follow-through confirmation cycle.
///
/// Exactly one cycle is current per instrument. Transitions only move
/// forward; a fresh cycle replaces an invalidated one when a new Day1
/// candidate appears.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationCycle {
    status: CycleStatus,
    day1_date: Option<NaiveDate>,
    confirmation_date: Option<NaiveDate>,
    invalidated_on: Option<NaiveDate>,
}

impl ConfirmationCycle {
    pub fn new() -> Self {
        Self {
            status: CycleStatus::None,
            day1_date: None,
            confirmation_date: None,
            invalidated_on: None,
        }
    }

    pub fn status(&self) -> CycleStatus {
        self.status
    }

    pub fn day1_date(&self) -> Option<NaiveDate> {
        self.day1_date
    }

    pub fn confirmation_date(&self) -> Option<NaiveDate> {
        self.confirmation_date
    }

    pub fn invalidated_on(&self) -> Option<NaiveDate> {
        self.invalidated_on
    }

    /// None → Pending with a Day1 candidate.
    fn begin(&mut self, day1: NaiveDate) {
        debug_assert_eq!(self.status, CycleStatus::None);
        self.status = CycleStatus::Pending;
        self.day1_date = Some(day1);
    }

    /// Pending → Active on the confirmation day.
    fn confirm(&mut self, date: NaiveDate) {
        debug_assert_eq!(self.status, CycleStatus::Pending);
        self.status = CycleStatus::Active;
        self.confirmation_date = Some(date);
    }

    /// Active → Invalidated. Terminal.
    fn invalidate(&mut self, date: NaiveDate) {
        debug_assert_eq!(self.status, CycleStatus::Active);
        self.status = CycleStatus::Invalidated;
        self.invalidated_on = Some(date);
    }

    /// Pending → None when the candidate is cancelled or the confirmation
    /// window closes without a match. Nothing is ever confirmed
    /// retroactively.
    fn abandon(&mut self) {
        debug_assert_eq!(self.status, CycleStatus::Pending);
        self.status = CycleStatus::None;
        self.day1_date = None;
    }
}

impl Default for ConfirmationCycle {
    fn default() -> Self {
        Self::new()
    }
}

/// Rally / follow-through detector.
///
/// Per-day flow, strictly forward:
/// 1. anchor the Day1 search at a reaction low (the trailing
///    `reaction_lookback_days` local minimum — a configurable rule, since
///    the source methodology names the concept without an algorithm);
/// 2. Day1 = first subsequent day closing up without undercutting the prior
///    day's low; cycle → Pending;
/// 3. first day at offsets `ftd_window_min..=ftd_window_max` after Day1 with
///    `pct_change ≥ ftd_gain_pct` on rising volume confirms; cycle → Active;
/// 4. while Active, renewed distribution (≥ 2 DDs within 5 days of the
///    confirmation) or a close below Day1's low invalidates.
pub struct RallyFtdDetector {
    ftd_window_min: usize,
    ftd_window_max: usize,
    ftd_gain_pct: Decimal,
    reaction_lookback_days: usize,
    cycle: ConfirmationCycle,
    anchor_idx: Option<usize>,
    day1_idx: Option<usize>,
    day1_low: Option<Decimal>,
    confirm_idx: Option<usize>,
    post_ftd_dd: u32,
}

impl RallyFtdDetector {
    pub fn new(config: &ThresholdConfig) -> Self {
        Self {
            ftd_window_min: config.ftd_window_min,
            ftd_window_max: config.ftd_window_max,
            ftd_gain_pct: config.ftd_gain_pct,
            reaction_lookback_days: config.reaction_lookback_days,
            cycle: ConfirmationCycle::new(),
            anchor_idx: None,
            day1_idx: None,
            day1_low: None,
            confirm_idx: None,
            post_ftd_dd: 0,
        }
    }

    /// The current confirmation cycle.
    pub fn cycle(&self) -> &ConfirmationCycle {
        &self.cycle
    }

    /// Process the next day. Returns the bottom-side warnings it emits.
    ///
    /// `idx` is the position of the day within `series`; days before it have
    /// already been processed in order.
    pub fn on_day(
        &mut self,
        idx: usize,
        series: &[PricePoint],
        record: &IndicatorRecord,
        flags: DayFlags,
    ) -> Vec<Warning> {
        let mut warnings = Vec::new();
        let point = &series[idx];

        if self.cycle.status() == CycleStatus::Active {
            // Invalidation first: it clears the anchor, and the collapse
            // day's own low may immediately re-anchor the next search.
            self.check_invalidation(idx, point, flags, &mut warnings);
            self.update_anchor(idx, series);
            return warnings;
        }

        self.update_anchor(idx, series);
        self.cancel_on_undercut(point);

        if self.cycle.status() == CycleStatus::Pending {
            self.check_confirmation(idx, point, record, &mut warnings);
        }

        if self.cycle.status() != CycleStatus::Active {
            self.check_day1(idx, series, record, &mut warnings);
        }

        warnings
    }

    /// Re-anchor the Day1 search when today's low is the minimum of the
    /// trailing lookback window. A fresh lookback low supersedes any pending
    /// candidate: the rally attempt it anchored has failed.
    ///
    /// A meaningful decline low needs a full lookback of context; with fewer
    /// days than the window no day anchors (insufficient history degrades,
    /// it does not error).
    fn update_anchor(&mut self, idx: usize, series: &[PricePoint]) {
        if idx + 1 < self.reaction_lookback_days {
            return;
        }
        let start = idx.saturating_sub(self.reaction_lookback_days.saturating_sub(1));
        let low = series[idx].low;
        // Strictly below every prior low in the window: a retest of an equal
        // low is not a fresh reaction low.
        let is_new_low = series[start..idx].iter().all(|p| low < p.low);
        if !is_new_low {
            return;
        }

        self.anchor_idx = Some(idx);
        if self.cycle.status() == CycleStatus::Pending {
            debug!(date = %series[idx].date, "New reaction low supersedes pending Day1");
            self.drop_candidate();
        }
    }

    /// A low under the pending Day1's low cancels the candidate even when it
    /// is not a fresh lookback minimum.
    fn cancel_on_undercut(&mut self, point: &PricePoint) {
        if self.cycle.status() != CycleStatus::Pending {
            return;
        }
        if self.day1_low.is_some_and(|day1_low| point.low < day1_low) {
            debug!(date = %point.date, "Day1 low undercut, candidate cancelled");
            self.drop_candidate();
        }
    }

    fn check_confirmation(
        &mut self,
        idx: usize,
        point: &PricePoint,
        record: &IndicatorRecord,
        warnings: &mut Vec<Warning>,
    ) {
        let Some(day1_idx) = self.day1_idx else {
            return;
        };
        let offset = idx - day1_idx;

        if offset > self.ftd_window_max {
            // Window closed without a match; the attempt is abandoned and is
            // never confirmed retroactively.
            debug!(date = %point.date, offset, "Confirmation window closed");
            self.drop_candidate();
            return;
        }
        if offset < self.ftd_window_min {
            return;
        }

        let gain_met = record.pct_change.is_some_and(|pct| pct >= self.ftd_gain_pct);
        if !gain_met || !record.volume_up() {
            return;
        }

        let day1_date = self.cycle.day1_date();
        self.cycle.confirm(point.date);
        self.confirm_idx = Some(idx);
        self.post_ftd_dd = 0;

        info!(
            date = %point.date,
            offset,
            pct = %record.pct_change.unwrap_or_default(),
            "Follow-through day confirmed"
        );

        let mut warning = Warning::new(
            WarningScope::Bottom,
            "FTD",
            Severity::Alert,
            "Follow-Through Day confirmed.",
        );
        if let Some(pct) = record.pct_change {
            warning = warning.with_evidence("pctChange", decimal_evidence(pct));
        }
        if let Some(ratio) = record.volume_ratio {
            warning = warning.with_evidence("volumeRatio", decimal_evidence(ratio));
        }
        if let Some(day1) = day1_date {
            warning = warning.with_evidence(
                "day1Date",
                serde_json::Value::String(day1.format("%Y-%m-%d").to_string()),
            );
        }
        warnings.push(warning);
    }

    fn check_day1(
        &mut self,
        idx: usize,
        series: &[PricePoint],
        record: &IndicatorRecord,
        warnings: &mut Vec<Warning>,
    ) {
        // A fresh cycle may begin from None, or replace an invalidated one.
        if !matches!(
            self.cycle.status(),
            CycleStatus::None | CycleStatus::Invalidated
        ) {
            return;
        }
        let Some(anchor_idx) = self.anchor_idx else {
            return;
        };
        if idx <= anchor_idx {
            return;
        }

        let point = &series[idx];
        let prev = &series[idx - 1];
        if point.close <= prev.close || point.low < prev.low {
            return;
        }

        if self.cycle.status().is_terminal() {
            self.cycle = ConfirmationCycle::new();
        }
        self.cycle.begin(point.date);
        self.day1_idx = Some(idx);
        self.day1_low = Some(point.low);

        info!(date = %point.date, "Rally attempt Day1");

        let mut warning = Warning::new(
            WarningScope::Bottom,
            "RALLY_DAY1",
            Severity::Info,
            "Rally attempt day 1: closed up without undercutting prior low.",
        );
        if let Some(pct) = record.pct_change {
            warning = warning.with_evidence("pct", decimal_evidence(pct));
        }
        warnings.push(warning);
    }

    fn check_invalidation(
        &mut self,
        idx: usize,
        point: &PricePoint,
        flags: DayFlags,
        warnings: &mut Vec<Warning>,
    ) {
        let Some(confirm_idx) = self.confirm_idx else {
            return;
        };

        if flags.is_distribution_day && idx - confirm_idx <= POST_FTD_DD_WINDOW {
            self.post_ftd_dd += 1;
        }

        let renewed_distribution = self.post_ftd_dd >= POST_FTD_DD_LIMIT;
        let day1_undercut = self.day1_low.is_some_and(|day1_low| point.close < day1_low);

        if !renewed_distribution && !day1_undercut {
            return;
        }

        self.cycle.invalidate(point.date);
        self.day1_idx = None;
        self.day1_low = None;
        self.confirm_idx = None;
        self.post_ftd_dd = 0;
        // The next cycle needs a fresh reaction low of its own.
        self.anchor_idx = None;

        info!(
            date = %point.date,
            renewed_distribution,
            day1_undercut,
            "Follow-through day invalidated"
        );

        warnings.push(Warning::new(
            WarningScope::Bottom,
            "FTD_INVALID",
            Severity::Invalidated,
            "Follow-Through Day invalidated.",
        ));
    }

    /// Drop the pending Day1 candidate, returning the cycle toward None.
    fn drop_candidate(&mut self) {
        self.cycle.abandon();
        self.day1_idx = None;
        self.day1_low = None;
    }
}
