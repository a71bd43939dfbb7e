//! Query metrics and report rendering.

use core::fmt::Write;

use crate::{LabelValue, DEFAULT_LABEL_FIELD};

/// A backend query together with the readings fetched for it.
///
/// Metrics are built once at startup and live for the whole process. Only
/// `values` changes: it is filled by a fetch, rendered into a report, and
/// cleared before the next cycle.
///
/// # Example
///
/// ```rust
/// use queuewatch_types::Metric;
///
/// let metric = Metric::builder("rabbitmq_queue_messages")
///     .description("Queues on Hawk (prod)")
///     .label_field("queue")
///     .dashboard_link("<a href='https://grafana.local/d/rmq'>See Details</a>")
///     .build();
///
/// assert_eq!(metric.query(), "rabbitmq_queue_messages");
/// assert!(metric.values().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Metric {
    query: String,
    description: String,
    label_field: String,
    dashboard_link: Option<String>,
    values: Vec<LabelValue>,
}

impl Metric {
    /// Create a new builder for a query.
    pub fn builder(query: impl Into<String>) -> MetricBuilder {
        MetricBuilder::new(query)
    }

    /// The query sent verbatim to the backend.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Title line of the rendered report.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Name of the series label whose value identifies a reading.
    pub fn label_field(&self) -> &str {
        &self.label_field
    }

    /// Trailing line appended to every report, if any.
    pub fn dashboard_link(&self) -> Option<&str> {
        self.dashboard_link.as_deref()
    }

    /// Readings from the most recent fetch.
    pub fn values(&self) -> &[LabelValue] {
        &self.values
    }

    /// Replace the readings with a freshly fetched set.
    pub fn set_values(&mut self, values: Vec<LabelValue>) {
        self.values = values;
    }

    /// Drop the readings so nothing carries over into the next cycle.
    ///
    /// The allocation is kept for reuse.
    pub fn clear_values(&mut self) {
        self.values.clear();
    }

    /// Render the readings as a report.
    ///
    /// The report is the description, a blank line, then one `label: value`
    /// line per reading ordered by descending value. Readings with an equal
    /// value keep their fetch order. Incomplete readings are skipped. The
    /// dashboard link, when set, follows after a blank line.
    ///
    /// Rendering does not modify the metric.
    pub fn render(&self) -> String {
        let mut rows: Vec<&LabelValue> = self.values.iter().filter(|v| v.is_complete()).collect();
        // sort_by_key is stable
        rows.sort_by_key(|v| core::cmp::Reverse(v.sort_key()));

        let mut report = String::with_capacity(self.description.len() + rows.len() * 24);
        report.push_str(&self.description);
        report.push_str("\n\n");
        for row in rows {
            // Writing to a String cannot fail.
            let _ = writeln!(report, "{}: {}", row.label, row.value);
        }
        if let Some(link) = &self.dashboard_link {
            report.push('\n');
            report.push_str(link);
        }
        report
    }
}

/// Builder for [`Metric`].
#[derive(Debug)]
pub struct MetricBuilder {
    query: String,
    description: Option<String>,
    label_field: Option<String>,
    dashboard_link: Option<String>,
}

impl MetricBuilder {
    /// Create a new builder.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            description: None,
            label_field: None,
            dashboard_link: None,
        }
    }

    /// Set the report title (default: the query itself).
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the series label used as the reading name (default: "queue").
    pub fn label_field(mut self, label_field: impl Into<String>) -> Self {
        self.label_field = Some(label_field.into());
        self
    }

    /// Set the trailing dashboard line.
    pub fn dashboard_link(mut self, link: impl Into<String>) -> Self {
        self.dashboard_link = Some(link.into());
        self
    }

    /// Set the trailing dashboard line if one is given.
    pub fn maybe_dashboard_link(mut self, link: Option<String>) -> Self {
        self.dashboard_link = link;
        self
    }

    /// Build the metric.
    pub fn build(self) -> Metric {
        Metric {
            description: self.description.unwrap_or_else(|| self.query.clone()),
            query: self.query,
            label_field: self
                .label_field
                .unwrap_or_else(|| DEFAULT_LABEL_FIELD.to_string()),
            dashboard_link: self.dashboard_link,
            values: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metric_with(values: &[(&str, &str)]) -> Metric {
        let mut metric = Metric::builder("rabbitmq_queue_messages")
            .description("Queues on Hawk (prod)")
            .build();
        metric.set_values(values.iter().map(|(l, v)| LabelValue::new(*l, *v)).collect());
        metric
    }

    fn body_lines(report: &str) -> Vec<&str> {
        report.lines().skip(2).filter(|l| !l.is_empty()).collect()
    }

    #[test]
    fn test_builder_defaults() {
        let metric = Metric::builder("up").build();
        assert_eq!(metric.query(), "up");
        assert_eq!(metric.description(), "up");
        assert_eq!(metric.label_field(), "queue");
        assert!(metric.dashboard_link().is_none());
        assert!(metric.values().is_empty());
    }

    #[test]
    fn test_render_orders_by_value_descending() {
        let metric = metric_with(&[("a", "5"), ("b", "20"), ("c", "1")]);
        let report = metric.render();
        assert_eq!(body_lines(&report), vec!["b: 20", "a: 5", "c: 1"]);
    }

    #[test]
    fn test_render_layout() {
        let metric = metric_with(&[("orders", "42")]);
        assert_eq!(metric.render(), "Queues on Hawk (prod)\n\norders: 42\n");
    }

    #[test]
    fn test_render_is_idempotent() {
        let metric = metric_with(&[("a", "5"), ("b", "20"), ("c", "1")]);
        let first = metric.render();
        let second = metric.render();
        assert_eq!(first, second);
        // Fetch order is untouched by rendering
        assert_eq!(metric.values()[0].label, "a");
    }

    #[test]
    fn test_render_skips_incomplete_pairs() {
        let metric = metric_with(&[("", "10"), ("orders", "3"), ("payments", "")]);
        assert_eq!(body_lines(&metric.render()), vec!["orders: 3"]);
    }

    #[test]
    fn test_render_ties_keep_fetch_order() {
        let metric = metric_with(&[("first", "7"), ("big", "9"), ("second", "7"), ("third", "7")]);
        assert_eq!(
            body_lines(&metric.render()),
            vec!["big: 9", "first: 7", "second: 7", "third: 7"]
        );
    }

    #[test]
    fn test_render_non_integer_values_sort_as_zero() {
        let metric = metric_with(&[("fractional", "2.5"), ("whole", "1")]);
        assert_eq!(
            body_lines(&metric.render()),
            vec!["whole: 1", "fractional: 2.5"]
        );
    }

    #[test]
    fn test_render_empty_values() {
        let metric = metric_with(&[]);
        assert_eq!(metric.render(), "Queues on Hawk (prod)\n\n");
    }

    #[test]
    fn test_render_appends_dashboard_link() {
        let mut metric = Metric::builder("q")
            .description("Queues")
            .dashboard_link("<a href='http://grafana'>See Details</a>")
            .build();
        assert_eq!(
            metric.render(),
            "Queues\n\n\n<a href='http://grafana'>See Details</a>"
        );

        metric.set_values(vec![LabelValue::new("orders", "1")]);
        let report = metric.render();
        assert!(report.ends_with("orders: 1\n\n<a href='http://grafana'>See Details</a>"));
    }

    #[test]
    fn test_clear_values() {
        let mut metric = metric_with(&[("orders", "42")]);
        metric.clear_values();
        assert!(metric.values().is_empty());
        assert_eq!(metric.render(), "Queues on Hawk (prod)\n\n");
    }
}
