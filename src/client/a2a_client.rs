//! Typed JSON-RPC calls on top of a [`Transport`].

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::error::{A2AError, A2AResult};
use crate::types::{
    JsonRpcId, JsonRpcRequest, JsonRpcResponse, Message, SendMessageConfiguration,
    SendMessageParams, SendMessageResponse,
};

use super::sse::ByteStream;
use super::transport::Transport;

/// Method name for a blocking send.
pub const METHOD_SEND: &str = "message/send";

/// Method name for a streaming send.
pub const METHOD_STREAM: &str = "message/stream";

/// Client for the two message-send operations the terminal uses.
///
/// Cheap to clone; clones share the transport.
#[derive(Clone)]
pub struct A2AClient {
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for A2AClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("A2AClient").finish_non_exhaustive()
    }
}

impl A2AClient {
    /// Wrap an existing transport.
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// `message/send`, asking the agent to block until the task settles.
    pub async fn send_message(&self, message: Message) -> A2AResult<SendMessageResponse> {
        let params = SendMessageParams {
            message,
            configuration: Some(SendMessageConfiguration {
                accepted_output_modes: Some(vec!["text/plain".to_string()]),
                blocking: Some(true),
            }),
        };
        let request = build_request(METHOD_SEND, &params)?;
        let response = self.transport.send(&request).await?;
        parse_result(response)
    }

    /// `message/stream`. Returns the raw SSE body once headers arrive.
    pub async fn send_message_stream(&self, message: Message) -> A2AResult<ByteStream> {
        let params = SendMessageParams {
            message,
            configuration: None,
        };
        let request = build_request(METHOD_STREAM, &params)?;
        self.transport.send_stream(&request).await
    }

    /// Close the underlying transport.
    pub async fn close(&self) -> A2AResult<()> {
        self.transport.close().await
    }
}

/// Build a JSON-RPC request with a random UUID id.
fn build_request(method: &str, params: &impl Serialize) -> A2AResult<JsonRpcRequest> {
    let params = serde_json::to_value(params)
        .map_err(|e| A2AError::Transport(format!("failed to serialize request params: {e}")))?;

    Ok(JsonRpcRequest::new(
        JsonRpcId::String(uuid::Uuid::new_v4().to_string()),
        method,
        Some(params),
    ))
}

/// Extract `result` from a JSON-RPC response, surfacing its `error`.
fn parse_result<T: serde::de::DeserializeOwned>(response: JsonRpcResponse) -> A2AResult<T> {
    if let Some(error) = response.error {
        return Err(A2AError::JsonRpc {
            code: error.code,
            message: error.message,
            data: error.data,
        });
    }

    let result = response
        .result
        .ok_or_else(|| A2AError::malformed("JSON-RPC response has neither 'result' nor 'error'"))?;

    let raw = result.to_string();
    serde_json::from_value(result).map_err(|e| {
        A2AError::malformed_with_data(format!("failed to deserialize response result: {e}"), raw)
    })
}
