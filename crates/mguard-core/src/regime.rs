//! Market regime labels.

use serde::{Deserialize, Serialize};

/// Per-day market-health classification.
///
/// Computed fresh each day from same-day cluster counts, moving-average
/// position and confirmation state; never persisted as mutable state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegimeLabel {
    /// Confirmed rally attempt in force.
    Uptrend,
    /// Distribution building or price below the 21-day line.
    UnderPressure,
    /// Heavy distribution or price below the 50-day line.
    Correction,
    /// None of the above.
    Neutral,
}

impl std::fmt::Display for RegimeLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uptrend => write!(f, "Uptrend"),
            Self::UnderPressure => write!(f, "Under Pressure"),
            Self::Correction => write!(f, "Correction"),
            Self::Neutral => write!(f, "Neutral"),
        }
    }
}
