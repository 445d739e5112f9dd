//! Core domain types for the market-guard regime engine.
//!
//! This crate provides the vocabulary shared by the engine and the batch
//! runner:
//! - `PricePoint`: one daily OHLCV bar, plus series validation
//! - `Warning`, `Severity`, `WarningScope`: the dated warning surface
//! - `RegimeLabel`: the per-day market-health classification

pub mod error;
pub mod point;
pub mod regime;
pub mod warning;

pub use error::{CoreError, CoreResult};
pub use point::{validate_series, PricePoint};
pub use regime::RegimeLabel;
pub use warning::{decimal_evidence, Severity, Warning, WarningScope};
