//! Well-known paths and artifact names shared across the client.

/// The well-known path for the agent card (A2A v0.3 and later)
pub const AGENT_CARD_WELL_KNOWN_PATH: &str = "/.well-known/agent-card.json";

/// The previous well-known path for the agent card (deprecated, but still supported)
pub const PREV_AGENT_CARD_WELL_KNOWN_PATH: &str = "/.well-known/agent.json";

/// Artifact name that opens a streamed output buffer.
pub const OUTPUT_START: &str = "output_start";

/// Artifact name carrying one chunk of streamed output.
pub const OUTPUT_DELTA: &str = "output_delta";

/// Artifact name that closes a streamed output buffer.
pub const OUTPUT_END: &str = "output_end";

/// Artifact name carrying a complete output in one event.
pub const FULL_OUTPUT: &str = "full_output";

/// Summary artifact some agents emit after streaming; hidden by default.
pub const FINAL_OUTPUT_TOTAL: &str = "final_output_total";
