//! Wire-level client: agent card discovery, JSON-RPC transport and SSE
//! framing.
//!
//! - [`CardResolver`] discovers agent cards via the well-known URI
//! - [`Transport`] / [`JsonRpcTransport`] post JSON-RPC requests
//! - [`A2AClient`] wraps a transport with typed `message/send` and
//!   `message/stream` calls
//! - [`SseDecoder`], [`LineBuffer`] and [`frame_stream`] turn a streaming
//!   body into [`Frame`]s
//!
//! Interpreting frames and driving a task is the job of
//! [`crate::session::Connection`].

mod a2a_client;
mod card_resolver;
mod sse;
mod transport;

pub use a2a_client::{A2AClient, METHOD_SEND, METHOD_STREAM};
pub use card_resolver::CardResolver;
pub use sse::{decode_lines, frame_stream, ByteStream, DecodeLines, Frame, LineBuffer, SseDecoder};
pub use transport::{JsonRpcTransport, Transport, TransportConfig};
