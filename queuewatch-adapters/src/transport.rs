//! HTTP transport shared by the query fetcher and the notifier.
//!
//! Every call is a single attempt. A call races against a shutdown token:
//! when the token fires first, the in-flight request is dropped (closing the
//! connection and discarding any partially read body) and
//! [`AdapterError::Cancelled`] is returned.

use std::time::Duration;

use bytes::Bytes;
use reqwest::{Client, RequestBuilder};
use tokio_util::sync::CancellationToken;

use crate::AdapterError;

/// Form field carrying the notification text.
pub const MESSAGE_FIELD: &str = "message";

/// Form field carrying the formatting hint.
pub const PARSE_MODE_FIELD: &str = "parse_mode";

/// Formatting hint sent with every notification.
pub const PARSE_MODE: &str = "HTML";

/// Request method understood by [`HttpTransport::send`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Plain GET without a body.
    Get,
    /// POST with a form-encoded `message` and `parse_mode`.
    Post,
}

/// Thin wrapper over a pooled HTTP client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a new builder for configuring the transport.
    pub fn builder() -> HttpTransportBuilder {
        HttpTransportBuilder::default()
    }

    /// Send a request and return the raw response body.
    ///
    /// For [`Method::Post`] the `body` becomes the `message` form field; for
    /// [`Method::Get`] it is ignored. Any status outside 2xx is returned as
    /// [`AdapterError::Status`] with the response body attached.
    pub async fn send(
        &self,
        method: Method,
        address: &str,
        body: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Bytes, AdapterError> {
        if cancel.is_cancelled() {
            return Err(AdapterError::Cancelled);
        }

        let request = match method {
            Method::Get => self.client.get(address),
            Method::Post => self.client.post(address).form(&[
                (MESSAGE_FIELD, body.unwrap_or_default()),
                (PARSE_MODE_FIELD, PARSE_MODE),
            ]),
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(?method, address, "request abandoned on shutdown");
                Err(AdapterError::Cancelled)
            }
            result = execute(request) => result,
        }
    }

    /// Issue a GET request.
    pub async fn get(&self, address: &str, cancel: &CancellationToken) -> Result<Bytes, AdapterError> {
        self.send(Method::Get, address, None, cancel).await
    }

    /// Issue a form-encoded POST carrying `message`.
    pub async fn post_message(
        &self,
        address: &str,
        message: &str,
        cancel: &CancellationToken,
    ) -> Result<Bytes, AdapterError> {
        self.send(Method::Post, address, Some(message), cancel).await
    }
}

async fn execute(request: RequestBuilder) -> Result<Bytes, AdapterError> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.bytes().await?;

    if !status.is_success() {
        return Err(AdapterError::Status {
            status: status.as_u16(),
            body: String::from_utf8_lossy(&body).into_owned(),
        });
    }

    Ok(body)
}

/// Builder for [`HttpTransport`].
#[derive(Debug, Default)]
pub struct HttpTransportBuilder {
    timeout: Option<Duration>,
    client: Option<Client>,
}

impl HttpTransportBuilder {
    /// Set the per-request timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Use an existing client instead of building one.
    ///
    /// The configured timeout is ignored in this case.
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Build the transport.
    pub fn build(self) -> Result<HttpTransport, AdapterError> {
        let client = match self.client {
            Some(client) => client,
            None => Client::builder()
                .timeout(self.timeout.unwrap_or(Duration::from_secs(10)))
                .build()?,
        };

        Ok(HttpTransport { client })
    }
}
