//! # queuewatch
//!
//! Periodically runs a set of Prometheus queries, turns each result into a
//! short report and posts it to a notification endpoint.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │ scheduler (tick / shutdown)                                 │
//! │      │                                                      │
//! │      ▼                                                      │
//! │  Collector ──┬──▶ PrometheusFetcher ──▶ Metric.values       │
//! │              │                             │                │
//! │              │                             ▼                │
//! │              └──▶ Notifier ◀──────── Metric::render()       │
//! │                      │                                      │
//! │                      ▼                                      │
//! │                HttpTransport ──▶ notification sink          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`config`]**: Layered [`Settings`] (file, environment, flags) and
//!   duration parsing
//! - **[`collector`]**: The per-cycle fan-out over metrics and outcome
//!   aggregation
//! - **[`scheduler`]**: Fixed-cadence loop and shutdown signal handling
//!
//! ## Usage
//!
//! ```bash
//! queuewatch --notify https://notify.example.com/send -t 1h --server prod
//! ```
//!
//! ### As a library
//!
//! ```no_run
//! use queuewatch::{Collector, Settings};
//! use queuewatch_adapters::{HttpTransport, Notifier, PrometheusFetcher};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let settings = Settings {
//!     notify: Some("http://localhost:8080/send".to_string()),
//!     ..Settings::default()
//! };
//! settings.validate()?;
//!
//! let transport = HttpTransport::builder().timeout(settings.timeout()?).build()?;
//! let fetcher = PrometheusFetcher::new(transport.clone(), settings.prometheus.clone());
//! let notifier = Notifier::new(transport, "http://localhost:8080/send");
//! let mut collector = Collector::new(settings.build_metrics(), fetcher, notifier);
//!
//! collector.collect(&CancellationToken::new()).await?;
//! # Ok(())
//! # }
//! ```

pub mod collector;
pub mod config;
pub mod scheduler;

pub use collector::{CollectError, Collector, CycleReport, MetricFailure, Stage};
pub use config::{MetricSettings, Settings};
