//! Client error types.
//!
//! One enum covers the whole client: connecting to an agent, sending a task,
//! and processing its event stream. Errors fall into three groups:
//! - connection/transport failures that abort a send before any data arrives
//! - per-frame failures (`MalformedPayload`, `ProtocolViolation`) that the
//!   session reports and then keeps going
//! - control-flow outcomes (`Cancelled`, `NotConnected`)

/// Unified error type for the A2A terminal client.
#[derive(Debug, Clone, thiserror::Error)]
pub enum A2AError {
    /// Agent card fetch or connect failed. The user may retry `/connect`.
    #[error("Connection error: {0}")]
    Connection(String),

    /// No data arrived before the deadline.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// One frame's payload could not be parsed.
    #[error("Malformed payload: {message}")]
    MalformedPayload {
        /// Human-readable error message.
        message: String,
        /// The offending raw payload, when available.
        data: Option<String>,
    },

    /// The agent broke a protocol invariant (e.g. the task id changed mid-send).
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    /// The user aborted the task.
    #[error("Task cancelled by user")]
    Cancelled,

    /// A task was sent while no agent is connected.
    #[error("Not connected to any agent")]
    NotConnected,

    /// The agent reported the task as failed or rejected.
    #[error("Task failed: {0}")]
    TaskFailed(String),

    /// The configuration file could not be read or parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    // -- Transport-level errors --
    /// Transport-level error (request failed, body read failed, etc.).
    #[error("Transport error: {0}")]
    Transport(String),

    /// HTTP error with status code and response body.
    #[error("HTTP {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body text.
        body: String,
    },

    /// A JSON-RPC error response was received from the remote agent.
    #[error("JSON-RPC error {code}: {message}")]
    JsonRpc {
        /// JSON-RPC error code.
        code: i64,
        /// Error message.
        message: String,
        /// Optional structured error data.
        data: Option<serde_json::Value>,
    },

    /// Catch-all for errors that don't fit other categories.
    #[error("{0}")]
    Other(String),
}

/// Convenience result type for client operations.
pub type A2AResult<T> = Result<T, A2AError>;

impl A2AError {
    /// Create a `MalformedPayload` with a message and no raw data.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedPayload {
            message: message.into(),
            data: None,
        }
    }

    /// Create a `MalformedPayload` that keeps the raw payload for logging.
    pub fn malformed_with_data(message: impl Into<String>, data: impl Into<String>) -> Self {
        Self::MalformedPayload {
            message: message.into(),
            data: Some(data.into()),
        }
    }

    /// Whether the user can reasonably retry the operation that produced this
    /// error. Nothing is retried automatically.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            A2AError::Connection(_)
                | A2AError::Timeout(_)
                | A2AError::MalformedPayload { .. }
                | A2AError::ProtocolViolation(_)
                | A2AError::Cancelled
                | A2AError::NotConnected
                | A2AError::Transport(_)
        )
    }

    /// Whether the error ends only the current frame rather than the send.
    pub fn is_frame_local(&self) -> bool {
        matches!(
            self,
            A2AError::MalformedPayload { .. } | A2AError::ProtocolViolation(_)
        )
    }

    /// Map a `reqwest` failure, telling timeouts and connect failures apart.
    pub(crate) fn from_reqwest(context: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            A2AError::Timeout(format!("{context} timed out: {err}"))
        } else if err.is_connect() {
            A2AError::Transport(format!("{context} connection failed: {err}"))
        } else {
            A2AError::Transport(format!("{context} failed: {err}"))
        }
    }
}

impl From<serde_json::Error> for A2AError {
    fn from(err: serde_json::Error) -> Self {
        A2AError::malformed(err.to_string())
    }
}
