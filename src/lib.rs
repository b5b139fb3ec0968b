//! # a2a-cli: terminal client for the Agent-to-Agent (A2A) protocol
//!
//! Sends natural-language tasks to a remote A2A agent and renders its
//! replies line by line. Agents that stream answer with Server-Sent Events;
//! the library turns that byte stream into ordered domain events, reassembles
//! fragmented artifact text and tracks the task's lifecycle. Agents that do
//! not stream answer with one aggregate response, which is rendered through
//! the same pipeline so both paths print the same lines.
//!
//! ## Pipeline
//!
//! ```text
//! transport bytes -> client::sse (frames) -> events (DomainEvent)
//!     -> assembler (artifact text) -> session (lines) -> Sink
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use a2a_cli::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let sink = MemorySink::new();
//!     let mut conn = Connection::new(ClientConfig::default(), sink.clone());
//!
//!     conn.connect("http://localhost:7420").await?;
//!     match conn.run_task("Summarize the A2A protocol").await? {
//!         TaskOutcome::Completed => {
//!             for line in sink.texts() {
//!                 println!("{line}");
//!             }
//!         }
//!         TaskOutcome::Failed(err) => eprintln!("failed: {err}"),
//!         TaskOutcome::Cancelled => eprintln!("cancelled"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`client`]: agent card discovery, JSON-RPC transport, SSE framing
//! - [`events`]: frame payloads classified into [`events::DomainEvent`]s
//! - [`assembler`]: `output_start`/`output_delta`/`output_end` reassembly
//! - [`session`]: [`session::Connection`] and per-send lifecycle
//! - [`sink`]: where rendered lines go
//! - [`config`]: TOML configuration
//! - [`types`]: A2A wire types
//! - [`error`]: [`A2AError`]

pub mod assembler;
pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod session;
pub mod sink;
pub mod types;
pub mod utils;

/// Commonly used types.
///
/// ```
/// use a2a_cli::prelude::*;
///
/// let sink = MemorySink::new();
/// let conn = Connection::new(ClientConfig::default(), sink);
/// assert!(!conn.is_connected());
/// ```
pub mod prelude {
    pub use crate::assembler::{ArtifactAssembler, Assembled};
    pub use crate::client::{CardResolver, Frame, JsonRpcTransport, SseDecoder, Transport};
    pub use crate::config::{ClientConfig, StreamingMode};
    pub use crate::error::{A2AError, A2AResult};
    pub use crate::events::{map_frame, map_frame_events, DomainEvent};
    pub use crate::session::{Connection, ConnectionInfo, SessionHandle, SessionState, TaskOutcome};
    pub use crate::sink::{LineCategory, MemorySink, Sink};
    pub use crate::types::{AgentCapabilities, AgentCard, Part, TaskState};
}

pub use error::{A2AError, A2AResult};
