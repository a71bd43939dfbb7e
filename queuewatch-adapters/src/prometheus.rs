//! Prometheus adapter using the instant query HTTP API.
//!
//! The fetcher runs a metric's query against `/api/v1/query` and turns each
//! series in the result vector into a [`LabelValue`], named after the series
//! label configured on the metric.
//!
//! ## Filtering
//!
//! - Series without the label, or whose label is not a string, are skipped
//! - Series without a string reading at `value[1]` are skipped
//! - Series whose reading is zero are skipped
//!
//! ## Example
//!
//! ```rust,no_run
//! use queuewatch_adapters::{HttpTransport, PrometheusFetcher};
//! use queuewatch_types::Metric;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let fetcher = PrometheusFetcher::new(HttpTransport::builder().build()?, "http://localhost:9090");
//!     let mut metric = Metric::builder("rabbitmq_queue_messages").build();
//!
//!     fetcher.fetch(&mut metric, &CancellationToken::new()).await?;
//!
//!     for reading in metric.values() {
//!         println!("{}: {}", reading.label, reading.value);
//!     }
//!
//!     Ok(())
//! }
//! ```

use reqwest::Url;
use serde::Deserialize;
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

use queuewatch_types::{LabelValue, Metric};

use crate::{AdapterError, HttpTransport};

/// Path of the instant query endpoint, relative to the server address.
pub const QUERY_PATH: &str = "/api/v1/query";

/// Fetches query results from a Prometheus server.
#[derive(Debug, Clone)]
pub struct PrometheusFetcher {
    transport: HttpTransport,
    endpoint: String,
}

impl PrometheusFetcher {
    /// Create a fetcher for the server at `endpoint` (e.g. "http://localhost:9090").
    pub fn new(transport: HttpTransport, endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        Self {
            transport,
            endpoint,
        }
    }

    /// The server address queries are sent to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Build the instant query URL for `query`.
    pub fn query_url(&self, query: &str) -> Result<Url, AdapterError> {
        let base = format!("{}{}", self.endpoint, QUERY_PATH);
        Url::parse_with_params(&base, &[("query", query)]).map_err(|e| AdapterError::InvalidUrl {
            url: base.clone(),
            reason: e.to_string(),
        })
    }

    /// Run the metric's query and store the readings on the metric.
    ///
    /// On error the metric's current values are left untouched.
    pub async fn fetch(
        &self,
        metric: &mut Metric,
        cancel: &CancellationToken,
    ) -> Result<(), AdapterError> {
        let url = self.query_url(metric.query())?;
        let body = self.transport.get(url.as_str(), cancel).await?;
        let values = parse_samples(&body, metric.label_field())?;

        tracing::debug!(
            query = metric.query(),
            readings = values.len(),
            "fetched query result"
        );

        metric.set_values(values);
        Ok(())
    }
}

/// Parse an instant query response into readings.
///
/// Readings keep the order of the result vector.
pub fn parse_samples(body: &[u8], label_field: &str) -> Result<Vec<LabelValue>, AdapterError> {
    let response: QueryResponse = serde_json::from_slice(body)?;

    if response.status.as_deref() == Some("error") {
        return Err(AdapterError::Query {
            kind: response.error_type.unwrap_or_else(|| "unknown".to_string()),
            message: response.error.unwrap_or_default(),
        });
    }

    let result = response
        .data
        .map(|d| d.result)
        .ok_or_else(|| AdapterError::Parse("missing data.result".to_string()))?;

    // Upper bound: filtering only ever removes entries.
    let mut values = Vec::with_capacity(result.len());
    for sample in result {
        if let Some(reading) = sample.into_reading(label_field) {
            values.push(reading);
        }
    }

    Ok(values)
}

/// Instant query response envelope.
#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    data: Option<QueryData>,
    #[serde(default, rename = "errorType")]
    error_type: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueryData {
    result: Vec<Sample>,
}

/// One series of a vector result: its labels and `[timestamp, "value"]`.
#[derive(Debug, Deserialize)]
struct Sample {
    #[serde(default)]
    metric: Option<Map<String, Value>>,
    #[serde(default)]
    value: Option<Vec<Value>>,
}

impl Sample {
    fn into_reading(self, label_field: &str) -> Option<LabelValue> {
        let label = self.metric?.get(label_field)?.as_str()?.to_string();
        let value = self.value?.get(1)?.as_str()?.to_string();

        let reading = LabelValue { label, value };
        reading.is_reportable().then_some(reading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn labels(values: &[LabelValue]) -> Vec<(&str, &str)> {
        values
            .iter()
            .map(|v| (v.label.as_str(), v.value.as_str()))
            .collect()
    }

    #[test]
    fn test_parse_filters_zero_readings() {
        let body = br#"{"status":"success","data":{"resultType":"vector","result":[
            {"metric":{"queue":"orders"},"value":[1700000000.123,"42"]},
            {"metric":{"queue":"empty"},"value":[1700000000.123,"0"]}
        ]}}"#;

        let values = parse_samples(body, "queue").unwrap();
        assert_eq!(labels(&values), vec![("orders", "42")]);
    }

    #[test]
    fn test_parse_skips_incomplete_series() {
        let body = br#"{"data":{"result":[
            {"metric":{"vhost":"/"},"value":[0,"5"]},
            {"metric":{"queue":"no-value"}},
            {"metric":{"queue":"short-value"},"value":[0]},
            {"metric":{"queue":"numeric-value"},"value":[0,7]},
            {"metric":{"queue":""},"value":[0,"3"]},
            {"metric":{"queue":"blank"},"value":[0,""]},
            {"value":[0,"9"]},
            {"metric":{"queue":"kept"},"value":[0,"1"]}
        ]}}"#;

        let values = parse_samples(body, "queue").unwrap();
        assert_eq!(labels(&values), vec![("kept", "1")]);
    }

    #[test]
    fn test_parse_keeps_result_order() {
        let body = br#"{"data":{"result":[
            {"metric":{"queue":"c"},"value":[0,"1"]},
            {"metric":{"queue":"a"},"value":[0,"5"]},
            {"metric":{"queue":"b"},"value":[0,"20"]}
        ]}}"#;

        let values = parse_samples(body, "queue").unwrap();
        assert_eq!(labels(&values), vec![("c", "1"), ("a", "5"), ("b", "20")]);
    }

    #[test]
    fn test_parse_custom_label_field() {
        let body = br#"{"data":{"result":[
            {"metric":{"queue":"q","instance":"node-1"},"value":[0,"3"]}
        ]}}"#;

        let values = parse_samples(body, "instance").unwrap();
        assert_eq!(labels(&values), vec![("node-1", "3")]);
    }

    #[test]
    fn test_parse_backend_error() {
        let body = br#"{"status":"error","errorType":"bad_data","error":"parse error at char 3"}"#;

        match parse_samples(body, "queue").unwrap_err() {
            AdapterError::Query { kind, message } => {
                assert_eq!(kind, "bad_data");
                assert_eq!(message, "parse error at char 3");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_malformed_body() {
        assert!(matches!(
            parse_samples(b"<html>oops</html>", "queue"),
            Err(AdapterError::Parse(_))
        ));
        assert!(matches!(
            parse_samples(br#"{"status":"success"}"#, "queue"),
            Err(AdapterError::Parse(_))
        ));
        assert!(matches!(
            parse_samples(br#"{"data":{"result":"scalar"}}"#, "queue"),
            Err(AdapterError::Parse(_))
        ));
    }

    #[test]
    fn test_query_url_encodes_query() {
        let transport = HttpTransport::builder().build().unwrap();
        let fetcher = PrometheusFetcher::new(transport, "http://localhost:9090/");
        assert_eq!(fetcher.endpoint(), "http://localhost:9090");

        let url = fetcher
            .query_url("sum(rabbitmq_queue_messages{vhost=\"/\"}) by (queue)")
            .unwrap();
        assert_eq!(url.path(), "/api/v1/query");
        let (key, value) = url.query_pairs().next().unwrap();
        assert_eq!(key, "query");
        assert_eq!(value, "sum(rabbitmq_queue_messages{vhost=\"/\"}) by (queue)");
    }

    #[test]
    fn test_query_url_rejects_bad_endpoint() {
        let transport = HttpTransport::builder().build().unwrap();
        let fetcher = PrometheusFetcher::new(transport, "not a url");
        assert!(matches!(
            fetcher.query_url("up"),
            Err(AdapterError::InvalidUrl { .. })
        ));
    }

    #[tokio::test]
    async fn test_fetch_populates_metric() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/query"))
            .and(query_param("query", "rabbitmq_queue_messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "success",
                "data": {"result": [
                    {"metric": {"queue": "orders"}, "value": [0, "42"]},
                    {"metric": {"queue": "empty"}, "value": [0, "0"]}
                ]}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = PrometheusFetcher::new(HttpTransport::builder().build().unwrap(), server.uri());
        let mut metric = Metric::builder("rabbitmq_queue_messages").build();

        fetcher.fetch(&mut metric, &CancellationToken::new()).await.unwrap();
        assert_eq!(labels(metric.values()), vec![("orders", "42")]);
    }

    #[tokio::test]
    async fn test_fetch_error_leaves_values_untouched() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let fetcher = PrometheusFetcher::new(HttpTransport::builder().build().unwrap(), server.uri());
        let mut metric = Metric::builder("up").build();
        metric.set_values(vec![LabelValue::new("previous", "1")]);

        let err = fetcher
            .fetch(&mut metric, &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(labels(metric.values()), vec![("previous", "1")]);
    }

    #[tokio::test]
    async fn test_fetch_cancelled_mid_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"data":{"result":[]}}"#)
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let fetcher = PrometheusFetcher::new(HttpTransport::builder().build().unwrap(), server.uri());
        let mut metric = Metric::builder("up").build();

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let err = fetcher.fetch(&mut metric, &cancel).await.unwrap_err();
        assert!(err.is_cancelled());
        assert!(metric.values().is_empty());
    }
}
