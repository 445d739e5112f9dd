//! Dated, severity-tagged warnings.
//!
//! The JSON shape `{scope, code, severity, message, evidence, ttlDays}` is a
//! compatibility surface for downstream consumers and must not change.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Convert a decimal evidence scalar to a JSON number, rounded to two
/// decimal places. Falls back to a string only if the value does not fit a
/// JSON number.
pub fn decimal_evidence(value: Decimal) -> serde_json::Value {
    let rounded = value.round_dp(2);
    rounded
        .to_f64()
        .and_then(serde_json::Number::from_f64)
        .map(serde_json::Value::Number)
        .unwrap_or_else(|| serde_json::Value::String(rounded.to_string()))
}

/// Where a warning renders relative to the price panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarningScope {
    /// Price-side warnings: distribution, churn, moving-average breaks.
    Top,
    /// Rally-side warnings: day-1, follow-through, invalidation.
    Bottom,
}

/// Warning severity.
///
/// `Info < Watch < Alert < High` form the ordered escalation scale.
/// `Invalidated` is a distinct terminal tag for retracted signals and takes
/// no part in ordering or boosting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Watch,
    Alert,
    High,
    Invalidated,
}

impl Severity {
    /// Escalate one level on the ordered scale, saturating at `High`.
    ///
    /// `Invalidated` is terminal and never boosted.
    #[must_use]
    pub fn boosted(self) -> Self {
        match self {
            Self::Info => Self::Watch,
            Self::Watch => Self::Alert,
            Self::Alert => Self::High,
            Self::High => Self::High,
            Self::Invalidated => Self::Invalidated,
        }
    }

    /// True for severities counted as high priority (alert and above,
    /// excluding the terminal tag).
    pub fn is_high_priority(&self) -> bool {
        matches!(self, Self::Alert | Self::High)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Watch => write!(f, "watch"),
            Self::Alert => write!(f, "alert"),
            Self::High => write!(f, "high"),
            Self::Invalidated => write!(f, "invalidated"),
        }
    }
}

/// A single dated warning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warning {
    /// Rendering scope.
    pub scope: WarningScope,
    /// Stable consumer-facing code, e.g. `DD_CLUSTER` or `FTD`.
    pub code: String,
    /// Severity tag.
    pub severity: Severity,
    /// Human-readable message.
    pub message: String,
    /// Supporting scalars keyed by name. BTreeMap keeps serialization
    /// deterministic.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub evidence: BTreeMap<String, serde_json::Value>,
    /// Days this warning contributes to rolling counts, when applicable.
    #[serde(rename = "ttlDays", default, skip_serializing_if = "Option::is_none")]
    pub ttl_days: Option<u32>,
}

impl Warning {
    /// Create a warning with no evidence and no TTL.
    pub fn new(
        scope: WarningScope,
        code: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            scope,
            code: code.into(),
            severity,
            message: message.into(),
            evidence: BTreeMap::new(),
            ttl_days: None,
        }
    }

    /// Attach an evidence scalar.
    #[must_use]
    pub fn with_evidence(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.evidence.insert(key.into(), value);
        self
    }

    /// Attach a TTL in trading days.
    #[must_use]
    pub fn with_ttl(mut self, ttl_days: u32) -> Self {
        self.ttl_days = Some(ttl_days);
        self
    }
}
