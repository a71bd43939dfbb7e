//! # queuewatch-types
//!
//! Core types for queuewatch. A [`Metric`] pairs a backend query with the
//! readings fetched for it during a collection cycle, and knows how to render
//! those readings as a notification report.
//!
//! ## Design Goals
//!
//! - **Zero dependencies**: Rendering is a pure function of a metric's values
//! - **Explicit configuration**: Description and dashboard link are set at
//!   construction time, never read from global state
//! - **Deterministic output**: Readings are ordered by value at render time,
//!   with ties kept in fetch order
//!
//! ## Example
//!
//! ```rust
//! use queuewatch_types::{LabelValue, Metric};
//!
//! let mut metric = Metric::builder("rabbitmq_queue_messages")
//!     .description("Queues on Hawk (prod)")
//!     .build();
//!
//! metric.set_values(vec![
//!     LabelValue::new("orders", "42"),
//!     LabelValue::new("payments", "7"),
//! ]);
//!
//! let report = metric.render();
//! assert!(report.starts_with("Queues on Hawk (prod)\n\n"));
//! assert!(report.contains("orders: 42\npayments: 7\n"));
//! ```

mod metric;
mod value;

pub use metric::*;
pub use value::*;

/// Label used to identify a series when none is configured.
pub const DEFAULT_LABEL_FIELD: &str = "queue";
