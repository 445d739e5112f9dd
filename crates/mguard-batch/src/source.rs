//! Port for the market-data collaborator.
//!
//! Fetching quotes is outside the engine: retries, backoff and timeouts all
//! live behind this interface. The engine only requires that whatever comes
//! back is an ordered daily series.

use mguard_core::PricePoint;
use thiserror::Error;

/// Errors a data source may report.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("No data returned for {0}")]
    NoData(String),

    #[error("Source error: {0}")]
    Unavailable(String),
}

/// Supplies ordered daily OHLCV history per instrument.
///
/// `days` is the number of trailing trading days the caller wants; sources
/// may return more (extra leading history improves moving-average warmup).
pub trait HistorySource: Send + Sync {
    fn history(
        &self,
        symbol: &str,
        days: usize,
    ) -> impl std::future::Future<Output = Result<Vec<PricePoint>, SourceError>> + Send;
}
