//! Multi-instrument batch processing.

use crate::error::{BatchError, BatchResult};
use crate::source::HistorySource;
use mguard_core::PricePoint;
use mguard_engine::{Engine, SymbolReport, ThresholdConfig};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, info};

/// One instrument's input series.
#[derive(Debug, Clone)]
pub struct InstrumentSeries {
    pub symbol: String,
    pub series: Vec<PricePoint>,
}

/// Result for one instrument within a batch.
///
/// A batch always reports success or failure per instrument; one bad
/// instrument never aborts the others.
#[derive(Debug)]
pub struct BatchOutcome {
    pub symbol: String,
    pub result: BatchResult<SymbolReport>,
}

/// Runs the engine over many instruments in parallel.
///
/// Instruments share no mutable state, so each one runs as an independent
/// blocking task; the only synchronization point is collecting the finished
/// outputs. Output order matches input order regardless of completion order.
pub struct BatchRunner {
    engine: Arc<Engine>,
}

impl BatchRunner {
    /// Create a runner, validating the configuration eagerly — an invalid
    /// threshold set is rejected before any instrument is touched.
    pub fn new(config: ThresholdConfig) -> BatchResult<Self> {
        let engine = Engine::new(config)?;
        Ok(Self {
            engine: Arc::new(engine),
        })
    }

    /// Analyze pre-fetched series in parallel.
    pub async fn run(&self, inputs: Vec<InstrumentSeries>) -> Vec<BatchOutcome> {
        let mut set: JoinSet<(usize, BatchOutcome)> = JoinSet::new();

        for (idx, input) in inputs.into_iter().enumerate() {
            let engine = Arc::clone(&self.engine);
            set.spawn_blocking(move || {
                let result = engine
                    .analyze(&input.symbol, &input.series)
                    .map_err(BatchError::from);
                (
                    idx,
                    BatchOutcome {
                        symbol: input.symbol,
                        result,
                    },
                )
            });
        }

        let mut slots: Vec<Option<BatchOutcome>> = Vec::new();
        slots.resize_with(set.len(), || None);
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((idx, outcome)) => {
                    match &outcome.result {
                        Ok(report) => info!(
                            symbol = %outcome.symbol,
                            regime = %report.summary.regime,
                            "Instrument processed"
                        ),
                        Err(err) => error!(symbol = %outcome.symbol, %err, "Instrument failed"),
                    }
                    slots[idx] = Some(outcome);
                }
                Err(join_err) => {
                    // A panicked worker loses its slot; surface it without
                    // aborting the rest of the batch.
                    error!(%join_err, "Batch worker panicked");
                }
            }
        }

        slots
            .into_iter()
            .flatten()
            .collect()
    }

    /// Fetch each symbol through the data-source port, then analyze.
    ///
    /// Fetch failures are reported per instrument exactly like malformed
    /// series.
    pub async fn run_with_source<S: HistorySource>(
        &self,
        source: &S,
        symbols: &[String],
        days: usize,
    ) -> Vec<BatchOutcome> {
        let mut fetched: Vec<Result<InstrumentSeries, BatchOutcome>> =
            Vec::with_capacity(symbols.len());
        for symbol in symbols {
            match source.history(symbol, days).await {
                Ok(series) => fetched.push(Ok(InstrumentSeries {
                    symbol: symbol.clone(),
                    series,
                })),
                Err(err) => {
                    error!(%symbol, %err, "History fetch failed");
                    fetched.push(Err(BatchOutcome {
                        symbol: symbol.clone(),
                        result: Err(err.into()),
                    }));
                }
            }
        }

        let inputs: Vec<InstrumentSeries> = fetched
            .iter()
            .filter_map(|f| f.as_ref().ok().cloned())
            .collect();
        let mut computed = self.run(inputs).await.into_iter();

        fetched
            .into_iter()
            .map(|f| match f {
                Ok(_) => computed
                    .next()
                    .unwrap_or_else(|| unreachable_outcome()),
                Err(outcome) => outcome,
            })
            .collect()
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }
}

/// `run` returns one outcome per input; this placeholder only exists to
/// avoid a panic path if a worker is ever lost to a panic.
fn unreachable_outcome() -> BatchOutcome {
    BatchOutcome {
        symbol: String::new(),
        result: Err(BatchError::Task("worker result missing".into())),
    }
}
