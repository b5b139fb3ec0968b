//! Transport layer for talking to an A2A agent.
//!
//! [`Transport`] abstracts over how JSON-RPC requests reach the agent so the
//! session can be driven by a scripted transport in tests.
//! [`JsonRpcTransport`] is the standard JSON-RPC over HTTP binding.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::error::{A2AError, A2AResult};
use crate::types::{JsonRpcRequest, JsonRpcResponse};

use super::sse::ByteStream;

/// Transport abstraction for A2A communication.
///
/// Implementations do not apply deadlines of their own beyond connection
/// setup; the session wraps every call in its own timeout.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a JSON-RPC request and receive a JSON-RPC response.
    async fn send(&self, request: &JsonRpcRequest) -> A2AResult<JsonRpcResponse>;

    /// Send a JSON-RPC request and receive the raw SSE body.
    ///
    /// Resolves once the response headers have arrived and the status is
    /// successful. Body chunks are yielded as they are received.
    async fn send_stream(&self, request: &JsonRpcRequest) -> A2AResult<ByteStream>;

    /// Release any held resources. The default is a no-op.
    async fn close(&self) -> A2AResult<()> {
        Ok(())
    }
}

/// Configuration for [`JsonRpcTransport`].
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// TCP connect timeout. Defaults to 10 seconds.
    pub connect_timeout: Duration,
    /// Additional HTTP headers to include on every request.
    pub headers: HashMap<String, String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            headers: HashMap::new(),
        }
    }
}

/// JSON-RPC over HTTP transport using `reqwest`.
///
/// Sends POST requests with `Content-Type: application/json`. Streaming
/// requests additionally ask for `text/event-stream` and hand back the body
/// unparsed.
///
/// ```no_run
/// use a2a_cli::client::JsonRpcTransport;
///
/// let transport = JsonRpcTransport::new("http://localhost:7420/a2a");
/// assert_eq!(transport.url(), "http://localhost:7420/a2a");
/// ```
#[derive(Debug, Clone)]
pub struct JsonRpcTransport {
    client: reqwest::Client,
    url: String,
}

impl JsonRpcTransport {
    /// Create a transport targeting the given endpoint with default settings.
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_config(url, TransportConfig::default())
    }

    /// Create a transport with custom headers and connect timeout.
    ///
    /// Header entries that are not valid HTTP names or values are skipped
    /// with a warning.
    pub fn with_config(url: impl Into<String>, config: TransportConfig) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .default_headers(header_map(&config.headers))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "failed to build HTTP client, using defaults");
                reqwest::Client::new()
            });

        Self {
            client,
            url: url.into(),
        }
    }

    /// The URL this transport posts to.
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn post(
        &self,
        request: &JsonRpcRequest,
        accept: &str,
        context: &str,
    ) -> A2AResult<reqwest::Response> {
        let body = serde_json::to_vec(request).map_err(|e| {
            A2AError::Transport(format!("failed to serialize JSON-RPC request: {e}"))
        })?;

        tracing::debug!(method = %request.method, url = %self.url, "sending request");

        let response = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .header("Accept", accept)
            .body(body)
            .send()
            .await
            .map_err(|e| A2AError::from_reqwest(context, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(A2AError::Http {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }
}

fn header_map(headers: &HashMap<String, String>) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (key, value) in headers {
        match (
            HeaderName::from_bytes(key.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(val)) => {
                map.insert(name, val);
            }
            _ => tracing::warn!(header = %key, "skipping invalid header"),
        }
    }
    map
}

#[async_trait]
impl Transport for JsonRpcTransport {
    async fn send(&self, request: &JsonRpcRequest) -> A2AResult<JsonRpcResponse> {
        let response = self.post(request, "application/json", "request").await?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| A2AError::from_reqwest("reading response body", e))?;

        serde_json::from_slice(&bytes).map_err(|e| {
            A2AError::malformed_with_data(
                format!("failed to parse JSON-RPC response: {e}"),
                String::from_utf8_lossy(&bytes).into_owned(),
            )
        })
    }

    async fn send_stream(&self, request: &JsonRpcRequest) -> A2AResult<ByteStream> {
        let response = self
            .post(request, "text/event-stream", "stream request")
            .await?;

        let body = response.bytes_stream().map(|chunk| {
            chunk
                .map(|bytes| bytes.to_vec())
                .map_err(|e| A2AError::from_reqwest("reading event stream", e))
        });

        Ok(Box::pin(body))
    }
}
