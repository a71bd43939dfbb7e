//! A single reading fetched for a metric.

/// One data point of a [`Metric`](crate::Metric): a series label and its
/// current reading as reported by the backend.
///
/// The value is kept as text so the report shows exactly what the backend
/// returned.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LabelValue {
    /// Series identifier, e.g. a queue name.
    pub label: String,
    /// Textual numeric reading.
    pub value: String,
}

impl LabelValue {
    /// Create a new label/value pair.
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }

    /// Check if both fields carry data.
    pub fn is_complete(&self) -> bool {
        !self.label.is_empty() && !self.value.is_empty()
    }

    /// Check if the reading is zero, i.e. "no signal".
    ///
    /// Any textual form that parses to zero counts (`"0"`, `"0.0"`, `"-0"`).
    pub fn is_zero(&self) -> bool {
        is_zero_reading(&self.value)
    }

    /// Check if this pair belongs in a report.
    pub fn is_reportable(&self) -> bool {
        self.is_complete() && !self.is_zero()
    }

    /// Integer used to order readings in a report.
    ///
    /// Values that are not integers sort as 0.
    pub fn sort_key(&self) -> i64 {
        self.value.trim().parse().unwrap_or(0)
    }
}

/// Check if a textual reading parses to zero.
pub fn is_zero_reading(value: &str) -> bool {
    let value = value.trim();
    value == "0" || value.parse::<f64>().map(|v| v == 0.0).unwrap_or(false)
}
