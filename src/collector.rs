//! The collection cycle.
//!
//! Each cycle runs one unit of work per metric, all concurrently:
//!
//! ```text
//!            ┌──▶ fetch ──▶ render ──▶ notify ──▶ clear ──┐
//! collect() ─┼──▶ fetch ──▶ render ──▶ notify ──▶ clear ──┼──▶ CycleReport
//!            └──▶ fetch ─✗ (error) ─────────────▶ clear ──┘
//! ```
//!
//! A unit owns its metric exclusively for the duration of the cycle. The
//! cycle finishes only after every unit has gone through all of its steps,
//! and every unit's outcome is kept, so a failing metric never hides or
//! blocks its siblings.

use std::fmt;

use futures_util::stream::{FuturesUnordered, StreamExt};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use queuewatch_adapters::{AdapterError, Notifier, PrometheusFetcher};
use queuewatch_types::Metric;

/// Step of a unit of work that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Querying the metrics backend.
    Fetch,
    /// Delivering the report.
    Notify,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Fetch => f.write_str("fetch"),
            Stage::Notify => f.write_str("notify"),
        }
    }
}

/// A metric whose unit of work failed during a cycle.
#[derive(Debug)]
pub struct MetricFailure {
    /// Query of the failing metric.
    pub query: String,
    /// Step that failed.
    pub stage: Stage,
    /// What went wrong.
    pub error: AdapterError,
}

/// Outcome of every unit of work in one cycle.
#[derive(Debug, Default)]
pub struct CycleReport {
    /// Units that fetched and delivered their report.
    pub delivered: usize,
    /// Failed units, in the order they finished.
    pub failures: Vec<MetricFailure>,
}

impl CycleReport {
    /// Check if every unit succeeded.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of units that ran.
    pub fn total(&self) -> usize {
        self.delivered + self.failures.len()
    }

    /// Reduce the report to the first failure, if any.
    pub fn into_result(self) -> Result<(), CollectError> {
        let total = self.total();
        let failed = self.failures.len();
        match self.failures.into_iter().next() {
            None => Ok(()),
            Some(first) => Err(CollectError {
                query: first.query,
                stage: first.stage,
                failed,
                total,
                source: first.error,
            }),
        }
    }
}

/// A cycle in which at least one metric failed.
///
/// Carries the first failure to finish; the remaining ones are logged when
/// they happen and are available through [`Collector::collect_report`].
#[derive(Debug, Error)]
#[error("{stage} failed for '{query}' ({failed} of {total} metrics failed): {source}")]
pub struct CollectError {
    /// Query of the first failing metric.
    pub query: String,
    /// Step that failed.
    pub stage: Stage,
    /// How many metrics failed this cycle.
    pub failed: usize,
    /// How many metrics ran this cycle.
    pub total: usize,
    /// The underlying adapter error.
    #[source]
    pub source: AdapterError,
}

impl CollectError {
    /// Check if the cycle failed because shutdown was requested.
    pub fn is_cancelled(&self) -> bool {
        self.source.is_cancelled()
    }
}

/// Runs collection cycles over a fixed set of metrics.
#[derive(Debug)]
pub struct Collector {
    metrics: Vec<Metric>,
    fetcher: PrometheusFetcher,
    notifier: Notifier,
}

impl Collector {
    /// Create a collector owning `metrics` for its lifetime.
    pub fn new(metrics: Vec<Metric>, fetcher: PrometheusFetcher, notifier: Notifier) -> Self {
        Self {
            metrics,
            fetcher,
            notifier,
        }
    }

    /// The configured metrics.
    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    /// Run one cycle and return the first failure, if any.
    pub async fn collect(&mut self, cancel: &CancellationToken) -> Result<(), CollectError> {
        self.collect_report(cancel).await.into_result()
    }

    /// Run one cycle and return the outcome of every metric.
    pub async fn collect_report(&mut self, cancel: &CancellationToken) -> CycleReport {
        info!(metrics = self.metrics.len(), "collection cycle started");

        let fetcher = &self.fetcher;
        let notifier = &self.notifier;
        let mut units: FuturesUnordered<_> = self
            .metrics
            .iter_mut()
            .map(|metric| run_unit(fetcher, notifier, metric, cancel))
            .collect();

        let mut report = CycleReport {
            delivered: 0,
            failures: Vec::with_capacity(units.len()),
        };
        while let Some(outcome) = units.next().await {
            match outcome {
                Ok(()) => report.delivered += 1,
                Err(failure) => {
                    warn!(
                        query = %failure.query,
                        stage = %failure.stage,
                        error = %failure.error,
                        "metric collection failed"
                    );
                    report.failures.push(failure);
                }
            }
        }

        info!(
            delivered = report.delivered,
            failed = report.failures.len(),
            "collection cycle finished"
        );
        report
    }
}

/// Fetch, report and reset a single metric.
///
/// The metric's values are cleared whatever the outcome.
async fn run_unit(
    fetcher: &PrometheusFetcher,
    notifier: &Notifier,
    metric: &mut Metric,
    cancel: &CancellationToken,
) -> Result<(), MetricFailure> {
    let outcome = match fetcher.fetch(metric, cancel).await {
        Err(error) => Err((Stage::Fetch, error)),
        Ok(()) => {
            let report = metric.render();
            debug!(query = metric.query(), readings = metric.values().len(), "sending report");
            notifier
                .notify(&report, cancel)
                .await
                .map_err(|error| (Stage::Notify, error))
        }
    };

    metric.clear_values();

    outcome.map_err(|(stage, error)| MetricFailure {
        query: metric.query().to_string(),
        stage,
        error,
    })
}
