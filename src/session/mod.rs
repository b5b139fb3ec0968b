//! Task sessions: one outstanding send per connected agent.
//!
//! A [`Connection`] owns the agent identity (endpoint, card, context id) and
//! at most one running [`SessionHandle`]. Each send runs on its own tokio
//! task and moves through
//!
//! ```text
//! Idle -> Sending -> Streaming -> Completed | Failed | Cancelled
//! ```
//!
//! Bytes flow transport -> [`frame_stream`] -> [`map_frame_events`] ->
//! [`EventProcessor`] -> sink. Every rendered line goes through a gate that
//! [`SessionHandle::cancel`] closes, so once `cancel` returns the sink is
//! never called again for that send.

mod fallback;
mod processor;

pub use fallback::events_from_response;
pub use processor::{EventProcessor, Line};

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex};

use futures::StreamExt;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::assembler::ArtifactAssembler;
use crate::client::{
    frame_stream, A2AClient, CardResolver, JsonRpcTransport, Transport, TransportConfig,
};
use crate::config::ClientConfig;
use crate::error::{A2AError, A2AResult};
use crate::events::map_frame_events;
use crate::sink::{LineCategory, Sink};
use crate::types::{AgentCapabilities, AgentCard};
use crate::utils::new_user_text_message;

/// Observable lifecycle of one send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Idle,
    /// Request issued, no response yet.
    Sending,
    /// Response headers (or the aggregate response) arrived.
    Streaming,
    Completed,
    Failed,
    Cancelled,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Completed | SessionState::Failed | SessionState::Cancelled
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Idle => "idle",
            SessionState::Sending => "sending",
            SessionState::Streaming => "streaming",
            SessionState::Completed => "completed",
            SessionState::Failed => "failed",
            SessionState::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// How a send ended.
#[derive(Debug, Clone)]
pub enum TaskOutcome {
    Completed,
    Failed(A2AError),
    Cancelled,
}

impl TaskOutcome {
    /// The terminal session state for this outcome.
    pub fn state(&self) -> SessionState {
        match self {
            TaskOutcome::Completed => SessionState::Completed,
            TaskOutcome::Failed(_) => SessionState::Failed,
            TaskOutcome::Cancelled => SessionState::Cancelled,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, TaskOutcome::Completed)
    }
}

/// Identity of the connected agent, as shown by `/status`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionInfo {
    /// URL the user connected to.
    pub base_url: String,
    /// JSON-RPC endpoint taken from the card.
    pub endpoint: String,
    pub agent_name: String,
    pub agent_version: String,
    /// Conversation context sent with every task.
    pub context_id: String,
    /// Whether sends use `message/stream`.
    pub streaming: bool,
    pub capabilities: AgentCapabilities,
}

#[derive(Clone)]
struct AgentContext {
    info: ConnectionInfo,
    card: AgentCard,
    client: A2AClient,
}

fn new_context_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

// ──────────────────────────────────────────────────
// Session handle
// ──────────────────────────────────────────────────

/// Serializes sink calls and shuts them off for good on close.
struct SinkGate {
    open: Mutex<bool>,
    sink: Arc<dyn Sink>,
}

impl SinkGate {
    fn new(sink: Arc<dyn Sink>) -> Self {
        Self {
            open: Mutex::new(true),
            sink,
        }
    }

    /// Emit a line unless the gate is closed. Returns whether it was emitted.
    fn emit(&self, line: &Line) -> bool {
        let open = self.open.lock().unwrap_or_else(|p| p.into_inner());
        if !*open {
            return false;
        }
        self.sink.emit(&line.text, Some(line.category));
        true
    }

    /// Emit an optional last line and close. Only the first close succeeds.
    fn close(&self, last: Option<&Line>) -> bool {
        let mut open = self.open.lock().unwrap_or_else(|p| p.into_inner());
        if !*open {
            return false;
        }
        if let Some(line) = last {
            self.sink.emit(&line.text, Some(line.category));
        }
        *open = false;
        true
    }
}

struct SessionShared {
    token: CancellationToken,
    gate: SinkGate,
    state: watch::Sender<SessionState>,
    outcome: watch::Sender<Option<TaskOutcome>>,
}

impl SessionShared {
    fn new(sink: Arc<dyn Sink>) -> Self {
        Self {
            token: CancellationToken::new(),
            gate: SinkGate::new(sink),
            state: watch::Sender::new(SessionState::Idle),
            outcome: watch::Sender::new(None),
        }
    }

    /// Move to a non-terminal state unless the send already ended.
    fn advance(&self, next: SessionState) {
        self.state.send_if_modified(|state| {
            if state.is_terminal() || *state == next {
                return false;
            }
            *state = next;
            true
        });
    }

    /// Record the terminal outcome if nobody has yet.
    fn settle(&self, outcome: TaskOutcome, last: Option<&Line>) -> bool {
        if !self.gate.close(last) {
            return false;
        }
        self.state.send_replace(outcome.state());
        self.outcome.send_replace(Some(outcome));
        true
    }
}

/// Handle to a running (or finished) send. Clones refer to the same send.
#[derive(Clone)]
pub struct SessionHandle {
    shared: Arc<SessionShared>,
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("state", &self.state())
            .finish()
    }
}

impl SessionHandle {
    /// Current state.
    pub fn state(&self) -> SessionState {
        *self.shared.state.borrow()
    }

    /// Watch state transitions.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.shared.state.subscribe()
    }

    pub fn is_finished(&self) -> bool {
        self.state().is_terminal()
    }

    /// Abort the send.
    ///
    /// Emits the cancellation notice, drops any unfinished artifact text and
    /// stops the transfer. No sink call for this send happens after this
    /// returns. Returns `false` if the send had already ended.
    pub fn cancel(&self) -> bool {
        let notice = Line::new(A2AError::Cancelled.to_string(), LineCategory::Cancelled);
        let cancelled = self.shared.settle(TaskOutcome::Cancelled, Some(&notice));
        self.shared.token.cancel();
        if cancelled {
            tracing::info!("task cancelled by user");
        }
        cancelled
    }

    /// Wait for the send to end.
    pub async fn wait(&self) -> TaskOutcome {
        let mut outcome = self.shared.outcome.subscribe();
        let settled = match outcome.wait_for(Option::is_some).await {
            Ok(settled) => settled.clone().unwrap_or(TaskOutcome::Cancelled),
            Err(_) => TaskOutcome::Cancelled,
        };
        settled
    }
}

// ──────────────────────────────────────────────────
// Runner
// ──────────────────────────────────────────────────

struct SessionRunner {
    shared: Arc<SessionShared>,
    agent: Arc<AgentContext>,
    processor: EventProcessor,
    deadline: Instant,
}

/// Settles a send that ended without an outcome, e.g. when the runner
/// unwinds from a panicking sink. Emits nothing.
struct SettleOnDrop(Arc<SessionShared>);

impl Drop for SettleOnDrop {
    fn drop(&mut self) {
        let reason = if std::thread::panicking() {
            "session task panicked"
        } else {
            "session task ended without an outcome"
        };
        if self
            .0
            .settle(TaskOutcome::Failed(A2AError::Other(reason.to_string())), None)
        {
            tracing::error!(reason, "send aborted");
        }
    }
}

impl SessionRunner {
    async fn run(mut self, text: String) {
        let _guard = SettleOnDrop(self.shared.clone());
        let token = self.shared.token.clone();
        let result = tokio::select! {
            biased;
            _ = token.cancelled() => None,
            result = self.drive(&text) => Some(result),
        };

        let outcome = self.processor.finish();
        match result {
            None => tracing::debug!("send stopped by cancellation"),
            Some(Ok(())) => {
                tracing::debug!(task_id = self.processor.task_id().unwrap_or("-"), "send finished");
                self.shared.settle(outcome, None);
            }
            Some(Err(err)) => {
                tracing::warn!(error = %err, "send failed");
                let line = Line::new(format!("Task failed: {err}"), LineCategory::Error);
                self.shared.settle(TaskOutcome::Failed(err), Some(&line));
            }
        }
    }

    async fn drive(&mut self, text: &str) -> A2AResult<()> {
        let message = new_user_text_message(text, Some(&self.agent.info.context_id));
        let client = self.agent.client.clone();

        if !self.agent.info.streaming {
            let response = until(self.deadline, "task request", client.send_message(message)).await??;
            self.shared.advance(SessionState::Streaming);
            let lines = self.processor.handle_all(events_from_response(response));
            self.emit(&lines);
            return Ok(());
        }

        let body = until(
            self.deadline,
            "stream request",
            client.send_message_stream(message),
        )
        .await??;
        self.shared.advance(SessionState::Streaming);

        let mut frames = std::pin::pin!(frame_stream(body));
        let mut next = until(self.deadline, "first event", frames.next()).await?;

        while let Some(item) = next {
            let frame = item?;
            tracing::debug!(event = %frame.event_type, bytes = frame.data.len(), "frame");

            let lines = match map_frame_events(&frame) {
                Ok(events) => self.processor.handle_all(events),
                Err(err) if err.is_frame_local() => vec![self.processor.skipped(&err)],
                Err(err) => return Err(err),
            };
            if !self.emit(&lines) {
                return Ok(());
            }

            next = frames.next().await;
        }

        Ok(())
    }

    fn emit(&self, lines: &[Line]) -> bool {
        lines.iter().all(|line| self.shared.gate.emit(line))
    }
}

async fn until<F: Future>(deadline: Instant, what: &str, fut: F) -> A2AResult<F::Output> {
    tokio::time::timeout_at(deadline, fut)
        .await
        .map_err(|_| A2AError::Timeout(format!("no response to {what} before the deadline")))
}

// ──────────────────────────────────────────────────
// Connection
// ──────────────────────────────────────────────────

/// A connected (or not yet connected) agent plus its current send.
///
/// ```no_run
/// use a2a_cli::config::ClientConfig;
/// use a2a_cli::session::Connection;
/// use a2a_cli::sink::LineCategory;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut conn = Connection::new(ClientConfig::default(), |line: &str, _: Option<LineCategory>| {
///     println!("{line}");
/// });
/// conn.connect("http://localhost:7420").await?;
/// let outcome = conn.run_task("Write a haiku about Rust").await?;
/// println!("{:?}", outcome);
/// # Ok(())
/// # }
/// ```
pub struct Connection {
    config: ClientConfig,
    sink: Arc<dyn Sink>,
    agent: Option<Arc<AgentContext>>,
    current: Option<SessionHandle>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("info", &self.info())
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

impl Connection {
    pub fn new(config: ClientConfig, sink: impl Sink + 'static) -> Self {
        Self {
            config,
            sink: Arc::new(sink),
            agent: None,
            current: None,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.agent.is_some()
    }

    /// Fetch the agent card from `url` and connect to its endpoint.
    ///
    /// On failure the previous connection, if any, is kept.
    pub async fn connect(&mut self, url: &str) -> A2AResult<AgentCapabilities> {
        let base_url = url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(A2AError::Connection("no agent URL given".to_string()));
        }

        let mut resolver = CardResolver::new();
        if let Some(path) = &self.config.card_path {
            resolver = resolver.with_card_path(path.clone());
        }

        let card = tokio::time::timeout(self.config.card_timeout(), resolver.resolve(&base_url))
            .await
            .map_err(|_| {
                A2AError::Timeout(format!(
                    "agent card fetch from {base_url} took longer than {}s",
                    self.config.card_timeout_secs
                ))
            })??;

        let endpoint = CardResolver::endpoint_url(&card, &base_url);
        let transport = JsonRpcTransport::with_config(
            endpoint.clone(),
            TransportConfig {
                headers: self.config.headers.clone(),
                ..Default::default()
            },
        );

        Ok(self
            .install(base_url, endpoint, card, Arc::new(transport))
            .await)
    }

    /// Connect using an already known card and a caller-supplied transport.
    pub async fn attach(
        &mut self,
        card: AgentCard,
        transport: Arc<dyn Transport>,
    ) -> AgentCapabilities {
        let url = card.url.clone();
        self.install(url.clone(), url, card, transport).await
    }

    async fn install(
        &mut self,
        base_url: String,
        endpoint: String,
        card: AgentCard,
        transport: Arc<dyn Transport>,
    ) -> AgentCapabilities {
        self.disconnect().await;

        let streaming = self.config.streaming.resolve(card.supports_streaming());
        let info = ConnectionInfo {
            base_url,
            endpoint,
            agent_name: card.name.clone(),
            agent_version: card.version.clone(),
            context_id: new_context_id(),
            streaming,
            capabilities: card.capabilities.clone(),
        };

        tracing::info!(
            agent = %info.agent_name,
            endpoint = %info.endpoint,
            streaming,
            "connected"
        );

        let capabilities = info.capabilities.clone();
        self.agent = Some(Arc::new(AgentContext {
            info,
            card,
            client: A2AClient::with_transport(transport),
        }));
        capabilities
    }

    /// Cancel any running send and forget the agent. Returns whether an
    /// agent was connected.
    pub async fn disconnect(&mut self) -> bool {
        self.cancel_current();
        self.current = None;

        let Some(agent) = self.agent.take() else {
            return false;
        };
        if let Err(e) = agent.client.close().await {
            tracing::warn!(error = %e, "error closing transport");
        }
        tracing::info!(agent = %agent.info.agent_name, "disconnected");
        true
    }

    /// Start a new conversation context. Returns the new id, or `None` when
    /// not connected.
    pub fn reset_context(&mut self) -> Option<String> {
        let agent = self.agent.as_mut()?;
        let mut next = AgentContext::clone(agent);
        next.info.context_id = new_context_id();
        let id = next.info.context_id.clone();
        *agent = Arc::new(next);
        tracing::debug!(context_id = %id, "context reset");
        Some(id)
    }

    pub fn info(&self) -> Option<ConnectionInfo> {
        self.agent.as_ref().map(|agent| agent.info.clone())
    }

    pub fn card(&self) -> Option<&AgentCard> {
        self.agent.as_ref().map(|agent| &agent.card)
    }

    /// The most recent send, running or finished.
    pub fn current(&self) -> Option<&SessionHandle> {
        self.current.as_ref()
    }

    /// Cancel the running send, if any.
    pub fn cancel_current(&self) -> bool {
        self.current
            .as_ref()
            .map(SessionHandle::cancel)
            .unwrap_or(false)
    }

    /// Send a task and return immediately with a handle to it.
    ///
    /// A send that is still running is cancelled first.
    ///
    /// # Errors
    ///
    /// [`A2AError::NotConnected`] when no agent is connected. Every other
    /// failure is reported through the sink and the handle's outcome.
    pub async fn send_task(&mut self, text: &str) -> A2AResult<SessionHandle> {
        let agent = self.agent.clone().ok_or(A2AError::NotConnected)?;
        self.cancel_current();

        let shared = Arc::new(SessionShared::new(self.sink.clone()));
        shared.advance(SessionState::Sending);

        let assembler = ArtifactAssembler::new()
            .with_suppressed(self.config.suppressed_artifacts.iter().cloned());
        let runner = SessionRunner {
            shared: shared.clone(),
            agent,
            processor: EventProcessor::new(assembler),
            deadline: Instant::now() + self.config.task_timeout(),
        };
        tokio::spawn(runner.run(text.to_string()));

        let handle = SessionHandle { shared };
        self.current = Some(handle.clone());
        Ok(handle)
    }

    /// Send a task and wait for it to end.
    pub async fn run_task(&mut self, text: &str) -> A2AResult<TaskOutcome> {
        let handle = self.send_task(text).await?;
        Ok(handle.wait().await)
    }
}
