//! Threshold configuration.

use crate::error::{EngineError, EngineResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Numeric thresholds for the signal-detection engine.
///
/// Field names in serialized form (camelCase) are the recognized option
/// names of the configuration contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdConfig {
    /// Distribution-day price drop threshold in percent (inclusive, signed).
    #[serde(default = "default_drop_threshold_pct")]
    pub drop_threshold_pct: Decimal,
    /// Churn-day absolute price band in percent (inclusive).
    #[serde(default = "default_churn_band_pct")]
    pub churn_band_pct: Decimal,
    /// First trading-day offset after Day1 eligible for confirmation.
    #[serde(default = "default_ftd_window_min")]
    pub ftd_window_min: usize,
    /// Last trading-day offset after Day1 eligible for confirmation.
    #[serde(default = "default_ftd_window_max")]
    pub ftd_window_max: usize,
    /// Minimum percent gain for a confirmation day.
    #[serde(default = "default_ftd_gain_pct")]
    pub ftd_gain_pct: Decimal,
    /// Distribution-day count raising the cluster warning to alert.
    #[serde(default = "default_cluster_alert")]
    pub cluster_alert: u32,
    /// Distribution-day count raising the cluster warning to high.
    #[serde(default = "default_cluster_high")]
    pub cluster_high: u32,
    /// Churn count that boosts the cluster warning one severity level.
    #[serde(default = "default_churn_cluster_boost")]
    pub churn_cluster_boost: u32,
    /// Trailing window, in trading days, for cluster counts.
    #[serde(default = "default_ttl_days")]
    pub ttl_days: usize,
    /// Require rising volume for the MA50 break warning.
    #[serde(default = "default_ma50_break_requires_volume_confirm")]
    pub ma50_break_requires_volume_confirm: bool,
    /// Lookback window for the reaction-low local-minimum rule.
    /// The precise heuristic is an open methodology question; the window is
    /// configurable rather than fixed.
    #[serde(default = "default_reaction_lookback_days")]
    pub reaction_lookback_days: usize,
    /// Trading-day budget for post-confirmation monitoring.
    #[serde(default = "default_monitor_day_budget")]
    pub monitor_day_budget: usize,
    /// Declining-volume up-day streak that flags volume fade.
    #[serde(default = "default_volume_fade_streak")]
    pub volume_fade_streak: usize,
}

fn default_drop_threshold_pct() -> Decimal {
    Decimal::new(-2, 1) // -0.2%
}

fn default_churn_band_pct() -> Decimal {
    Decimal::new(2, 1) // 0.2%
}

fn default_ftd_window_min() -> usize {
    4
}

fn default_ftd_window_max() -> usize {
    10
}

fn default_ftd_gain_pct() -> Decimal {
    Decimal::new(17, 1) // +1.7%
}

fn default_cluster_alert() -> u32 {
    4
}

fn default_cluster_high() -> u32 {
    6
}

fn default_churn_cluster_boost() -> u32 {
    2
}

fn default_ttl_days() -> usize {
    25
}

fn default_ma50_break_requires_volume_confirm() -> bool {
    true
}

fn default_reaction_lookback_days() -> usize {
    10
}

fn default_monitor_day_budget() -> usize {
    20
}

fn default_volume_fade_streak() -> usize {
    3
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            drop_threshold_pct: default_drop_threshold_pct(),
            churn_band_pct: default_churn_band_pct(),
            ftd_window_min: default_ftd_window_min(),
            ftd_window_max: default_ftd_window_max(),
            ftd_gain_pct: default_ftd_gain_pct(),
            cluster_alert: default_cluster_alert(),
            cluster_high: default_cluster_high(),
            churn_cluster_boost: default_churn_cluster_boost(),
            ttl_days: default_ttl_days(),
            ma50_break_requires_volume_confirm: default_ma50_break_requires_volume_confirm(),
            reaction_lookback_days: default_reaction_lookback_days(),
            monitor_day_budget: default_monitor_day_budget(),
            volume_fade_streak: default_volume_fade_streak(),
        }
    }
}

impl ThresholdConfig {
    /// Validate threshold values.
    ///
    /// Runs eagerly, before any instrument is processed; a batch never
    /// starts with a rejected configuration.
    pub fn validate(&self) -> EngineResult<()> {
        if self.ttl_days == 0 {
            return Err(EngineError::Config("ttlDays must be at least 1".into()));
        }
        if self.ftd_window_min == 0 {
            return Err(EngineError::Config(
                "ftdWindowMin must be at least 1".into(),
            ));
        }
        if self.ftd_window_min > self.ftd_window_max {
            return Err(EngineError::Config(format!(
                "ftdWindowMin ({}) must not exceed ftdWindowMax ({})",
                self.ftd_window_min, self.ftd_window_max
            )));
        }
        if self.ftd_gain_pct <= Decimal::ZERO {
            return Err(EngineError::Config(format!(
                "ftdGainPct ({}) must be positive",
                self.ftd_gain_pct
            )));
        }
        if self.drop_threshold_pct > Decimal::ZERO {
            return Err(EngineError::Config(format!(
                "dropThresholdPct ({}) must not be positive",
                self.drop_threshold_pct
            )));
        }
        if self.churn_band_pct < Decimal::ZERO {
            return Err(EngineError::Config(format!(
                "churnBandPct ({}) must be non-negative",
                self.churn_band_pct
            )));
        }
        if self.cluster_alert == 0 || self.cluster_alert > self.cluster_high {
            return Err(EngineError::Config(format!(
                "clusterAlert ({}) must be at least 1 and not exceed clusterHigh ({})",
                self.cluster_alert, self.cluster_high
            )));
        }
        if self.reaction_lookback_days == 0 {
            return Err(EngineError::Config(
                "reactionLookbackDays must be at least 1".into(),
            ));
        }
        if self.monitor_day_budget == 0 {
            return Err(EngineError::Config(
                "monitorDayBudget must be at least 1".into(),
            ));
        }
        if self.volume_fade_streak == 0 {
            return Err(EngineError::Config(
                "volumeFadeStreak must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Load thresholds from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> EngineResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| EngineError::Config(format!("Failed to read config: {e}")))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }
}
