//! Notification sink adapter.
//!
//! Reports are delivered as a form-encoded POST with the text in the
//! `message` field and `parse_mode=HTML`.

use tokio_util::sync::CancellationToken;

use crate::{AdapterError, HttpTransport};

/// Sends rendered reports to a notification endpoint.
#[derive(Debug, Clone)]
pub struct Notifier {
    transport: HttpTransport,
    address: String,
}

impl Notifier {
    /// Create a notifier posting to `address`.
    pub fn new(transport: HttpTransport, address: impl Into<String>) -> Self {
        Self {
            transport,
            address: address.into(),
        }
    }

    /// The sink address reports are posted to.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Deliver one report. A failure is returned as is, without retry.
    pub async fn notify(&self, report: &str, cancel: &CancellationToken) -> Result<(), AdapterError> {
        self.transport
            .post_message(&self.address, report, cancel)
            .await?;
        tracing::debug!(address = %self.address, bytes = report.len(), "report delivered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_notify_posts_report() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/send"))
            .and(body_string_contains("message=Queues+on+Hawk"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = Notifier::new(
            HttpTransport::builder().build().unwrap(),
            format!("{}/send", server.uri()),
        );
        notifier
            .notify("Queues on Hawk\n\norders: 42\n", &CancellationToken::new())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_notify_surfaces_sink_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("chat not found"))
            .mount(&server)
            .await;

        let notifier = Notifier::new(HttpTransport::builder().build().unwrap(), server.uri());
        let err = notifier
            .notify("report", &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "received code 400; body: chat not found");
    }
}
