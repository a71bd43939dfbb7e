//! # queuewatch-adapters
//!
//! HTTP adapters used by the queuewatch collection cycle.
//!
//! ## Components
//!
//! - **Transport** ([`HttpTransport`]) - single-attempt GET and form-encoded
//!   POST requests that give up as soon as a shutdown token fires
//! - **Prometheus** ([`PrometheusFetcher`]) - runs a metric's instant query
//!   and stores the non-zero readings on the metric
//! - **Notify** ([`Notifier`]) - posts a rendered report to the notification
//!   sink
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use queuewatch_adapters::{HttpTransport, Notifier, PrometheusFetcher};
//! use queuewatch_types::Metric;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = HttpTransport::builder().build()?;
//!     let fetcher = PrometheusFetcher::new(transport.clone(), "http://localhost:9090");
//!     let notifier = Notifier::new(transport, "http://localhost:8080/notify");
//!     let cancel = CancellationToken::new();
//!
//!     let mut metric = Metric::builder("rabbitmq_queue_messages")
//!         .description("Queues on Hawk (prod)")
//!         .build();
//!
//!     fetcher.fetch(&mut metric, &cancel).await?;
//!     notifier.notify(&metric.render(), &cancel).await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod notify;
pub mod prometheus;
pub mod transport;

pub use error::AdapterError;
pub use notify::Notifier;
pub use prometheus::PrometheusFetcher;
pub use transport::{HttpTransport, Method};

// Re-export types for convenience
pub use queuewatch_types::{LabelValue, Metric};
