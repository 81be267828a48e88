use crate::error::TransportError;
use crate::request::Header;
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;

/// Performs the single outbound POST of an `ai_generate_text` call.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Posts `body` to `url`. Non-2xx statuses, connection failures and
    /// timeouts are all errors; no retries are attempted.
    async fn post(
        &self,
        url: &str,
        body: String,
        headers: &[Header],
        timeout: Duration,
    ) -> Result<Bytes, TransportError>;
}

#[derive(Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    /// `connect_timeout` bounds connection setup; the per-call timeout passed
    /// to [`Transport::post`] bounds the whole exchange.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn new(connect_timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(%e, "reqwest client build failed; falling back to default client");
                reqwest::Client::new()
            });
        Self { http }
    }

    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    #[tracing::instrument(level = "debug", skip_all, fields(url = %url))]
    async fn post(
        &self,
        url: &str,
        body: String,
        headers: &[Header],
        timeout: Duration,
    ) -> Result<Bytes, TransportError> {
        let mut request = self.http.post(url).timeout(timeout).body(body);
        for header in headers {
            request = request.header(header.name.as_str(), header.value.as_str());
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.bytes().await?)
    }
}
