//! Process configuration.
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! `QUEUEWATCH_*` environment variables. Command line flags are applied on
//! top by the binary.
//!
//! ```toml
//! interval = "24h"
//! prometheus = "http://localhost:9090"
//! notify = "https://notify.example.com/send"
//! grafana = "https://grafana.example.com/d/rabbitmq"
//! server = "prod"
//!
//! [[metrics]]
//! query = "rabbitmq_queue_messages"
//! description = "Queues on Hawk ({server}) 🌀"
//! label = "queue"
//! ```

pub mod duration;

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use queuewatch_types::{Metric, DEFAULT_LABEL_FIELD};

use self::duration::parse_duration;

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "QUEUEWATCH";

/// Placeholder in metric descriptions replaced by the server name.
pub const SERVER_PLACEHOLDER: &str = "{server}";

/// Everything the collection loop needs, resolved at startup.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Time between collection cycles, e.g. "24h".
    pub interval: String,
    /// Prometheus server address.
    pub prometheus: String,
    /// Notification endpoint.
    pub notify: Option<String>,
    /// Dashboard URL linked at the bottom of every report.
    pub grafana: Option<String>,
    /// Server name substituted into metric descriptions.
    pub server: String,
    /// Per-request HTTP timeout.
    pub timeout: String,
    /// Queries to run each cycle.
    pub metrics: Vec<MetricSettings>,
}

/// One configured query.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MetricSettings {
    pub query: String,
    pub description: String,
    #[serde(default = "default_label")]
    pub label: String,
}

fn default_label() -> String {
    DEFAULT_LABEL_FIELD.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            interval: "24h".to_string(),
            prometheus: "http://localhost:9090".to_string(),
            notify: None,
            grafana: None,
            server: "prod".to_string(),
            timeout: "10s".to_string(),
            metrics: vec![MetricSettings {
                query: "rabbitmq_queue_messages".to_string(),
                description: "Queues on Hawk ({server}) 🌀".to_string(),
                label: default_label(),
            }],
        }
    }
}

impl Settings {
    /// Load settings from an optional file and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        let config = builder
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()
            .context("failed to read configuration")?;

        config
            .try_deserialize()
            .context("invalid configuration")
    }

    /// Check the settings are usable before starting.
    pub fn validate(&self) -> Result<()> {
        if self.notify.as_deref().map_or(true, |s| s.trim().is_empty()) {
            bail!("a notification endpoint is required (--notify or QUEUEWATCH_NOTIFY)");
        }
        if self.interval()?.is_zero() {
            bail!("interval must be greater than zero");
        }
        self.timeout()?;
        if self.metrics.is_empty() {
            bail!("at least one metric must be configured");
        }
        if let Some(m) = self.metrics.iter().find(|m| m.query.trim().is_empty()) {
            bail!("metric '{}' has an empty query", m.description);
        }
        Ok(())
    }

    /// Parsed collection interval.
    pub fn interval(&self) -> Result<Duration> {
        parse_duration(&self.interval).with_context(|| format!("invalid interval '{}'", self.interval))
    }

    /// Parsed request timeout.
    pub fn timeout(&self) -> Result<Duration> {
        parse_duration(&self.timeout).with_context(|| format!("invalid timeout '{}'", self.timeout))
    }

    /// Trailing report line linking the dashboard, if configured.
    pub fn dashboard_link(&self) -> Option<String> {
        self.grafana
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(|url| format!("<a href='{}'>See Details</a>", url))
    }

    /// Build the metrics collected every cycle.
    pub fn build_metrics(&self) -> Vec<Metric> {
        let link = self.dashboard_link();
        self.metrics
            .iter()
            .map(|m| {
                Metric::builder(m.query.clone())
                    .description(m.description.replace(SERVER_PLACEHOLDER, &self.server))
                    .label_field(m.label.clone())
                    .maybe_dashboard_link(link.clone())
                    .build()
            })
            .collect()
    }
}
