//! Per-instrument output records.
//!
//! The serialized field names are a compatibility surface for downstream
//! consumers and are pinned here with explicit renames; numeric fields
//! serialize as JSON numbers.

use crate::monitor::PostEventMetrics;
use crate::rally::{ConfirmationCycle, CycleStatus};
use chrono::NaiveDate;
use mguard_core::{RegimeLabel, Warning};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One fully annotated trading day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub date: NaiveDate,
    #[serde(with = "rust_decimal::serde::float")]
    pub open: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub high: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub low: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub close: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub volume: Decimal,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub ma21: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub ma50: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub ma200: Option<Decimal>,
    #[serde(rename = "pctChange", with = "rust_decimal::serde::float_option")]
    pub pct_change: Option<Decimal>,
    pub warnings_top: Vec<Warning>,
    pub warnings_bottom: Vec<Warning>,
}

/// Confirmation-cycle fields of the summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationSummary {
    pub status: CycleStatus,
    pub date: Option<NaiveDate>,
    pub invalidated_on: Option<NaiveDate>,
    pub day1_date: Option<NaiveDate>,
}

impl From<&ConfirmationCycle> for ConfirmationSummary {
    fn from(cycle: &ConfirmationCycle) -> Self {
        Self {
            status: cycle.status(),
            date: cycle.confirmation_date(),
            invalidated_on: cycle.invalidated_on(),
            day1_date: cycle.day1_date(),
        }
    }
}

/// Per-instrument summary as of the last processed day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolSummary {
    pub symbol: String,
    pub last_date: Option<NaiveDate>,
    pub regime: RegimeLabel,
    pub dd_count_25d: u32,
    pub churn_count_25d: u32,
    pub confirmation: ConfirmationSummary,
    pub high_priority_warning_count: usize,
    pub post_event_metrics: Option<PostEventMetrics>,
    pub sparkline: String,
}

/// Full engine output for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolReport {
    pub days: Vec<DailyRecord>,
    pub summary: SymbolSummary,
}
