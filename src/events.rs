//! Domain events decoded from SSE frames.
//!
//! [`map_frame`] parses a frame's JSON payload and classifies it into one of
//! the event kinds a task send can produce:
//! - `task` -> [`DomainEvent::TaskCreated`]
//! - `status-update` -> [`DomainEvent::StatusUpdate`]
//! - `artifact-update` -> [`DomainEvent::ArtifactUpdate`]
//! - `message` -> [`DomainEvent::Message`]
//!
//! Classification prefers the frame's `event:` field and falls back to the
//! payload's `kind` discriminator. Anything unrecognized becomes
//! [`DomainEvent::Opaque`] so the session can still log it.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::client::Frame;
use crate::error::{A2AError, A2AResult};
use crate::types::{
    Message, Part, Role, Task, TaskArtifactUpdateEvent, TaskState, TaskStatusUpdateEvent,
};
use crate::utils::get_message_text;

/// A structured event produced by the agent for one task send.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainEvent {
    /// The agent created (or reported a snapshot of) the task.
    TaskCreated(TaskCreated),
    /// The task moved to a new lifecycle state.
    StatusUpdate(StatusUpdate),
    /// The agent produced artifact content.
    ArtifactUpdate(ArtifactUpdate),
    /// The agent replied with a direct message.
    Message(AgentMessage),
    /// A payload of a kind this client does not know.
    Opaque(OpaqueEvent),
}

/// Payload of [`DomainEvent::TaskCreated`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskCreated {
    pub task_id: String,
    pub initial_state: TaskState,
}

/// Payload of [`DomainEvent::StatusUpdate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub task_id: Option<String>,
    pub state: TaskState,
    /// Text of the status message, if the agent attached one.
    pub message: Option<String>,
    pub is_final: bool,
}

/// Payload of [`DomainEvent::ArtifactUpdate`].
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactUpdate {
    pub task_id: Option<String>,
    /// Artifact name; empty when the agent sent none.
    pub artifact_name: String,
    pub parts: Vec<Part>,
}

/// Payload of [`DomainEvent::Message`].
#[derive(Debug, Clone, PartialEq)]
pub struct AgentMessage {
    pub role: Role,
    pub parts: Vec<Part>,
    pub task_id: Option<String>,
}

/// Payload of [`DomainEvent::Opaque`].
#[derive(Debug, Clone, PartialEq)]
pub struct OpaqueEvent {
    pub kind: String,
    pub payload: Value,
}

impl DomainEvent {
    /// The task this event belongs to, when it says so.
    pub fn task_id(&self) -> Option<&str> {
        match self {
            DomainEvent::TaskCreated(e) => Some(&e.task_id),
            DomainEvent::StatusUpdate(e) => e.task_id.as_deref(),
            DomainEvent::ArtifactUpdate(e) => e.task_id.as_deref(),
            DomainEvent::Message(e) => e.task_id.as_deref(),
            DomainEvent::Opaque(_) => None,
        }
    }

    /// The protocol kind name of this event.
    pub fn kind(&self) -> &str {
        match self {
            DomainEvent::TaskCreated(_) => "task",
            DomainEvent::StatusUpdate(_) => "status-update",
            DomainEvent::ArtifactUpdate(_) => "artifact-update",
            DomainEvent::Message(_) => "message",
            DomainEvent::Opaque(e) => &e.kind,
        }
    }
}

impl From<&Task> for TaskCreated {
    fn from(task: &Task) -> Self {
        TaskCreated {
            task_id: task.id.clone(),
            initial_state: task.status.state,
        }
    }
}

impl From<TaskStatusUpdateEvent> for StatusUpdate {
    fn from(event: TaskStatusUpdateEvent) -> Self {
        let message = event
            .status
            .message
            .as_ref()
            .map(|m| get_message_text(m, "\n"))
            .filter(|text| !text.is_empty());
        StatusUpdate {
            task_id: event.task_id,
            state: event.status.state,
            message,
            is_final: event.r#final,
        }
    }
}

impl From<TaskArtifactUpdateEvent> for ArtifactUpdate {
    fn from(event: TaskArtifactUpdateEvent) -> Self {
        ArtifactUpdate {
            task_id: event.task_id,
            artifact_name: event.artifact.name.unwrap_or_default(),
            parts: event.artifact.parts,
        }
    }
}

impl From<Message> for AgentMessage {
    fn from(message: Message) -> Self {
        AgentMessage {
            role: message.role,
            parts: message.parts,
            task_id: message.task_id,
        }
    }
}

/// The closed set of payload kinds the mapper understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventKind {
    Task,
    StatusUpdate,
    ArtifactUpdate,
    Message,
}

impl EventKind {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "task" => Some(EventKind::Task),
            "status-update" | "statusUpdate" => Some(EventKind::StatusUpdate),
            "artifact-update" | "artifactUpdate" => Some(EventKind::ArtifactUpdate),
            "message" => Some(EventKind::Message),
            _ => None,
        }
    }
}

/// Map one SSE frame to a domain event.
///
/// A `task` payload maps to its [`DomainEvent::TaskCreated`] header only;
/// use [`map_frame_events`] to also get the snapshot's artifacts and status.
///
/// # Errors
///
/// - [`A2AError::MalformedPayload`] when the data is not JSON or does not fit
///   the schema of its kind
/// - [`A2AError::JsonRpc`] when the frame carries a JSON-RPC error envelope
///
/// Both are local to the frame; callers skip it and keep reading.
pub fn map_frame(frame: &Frame) -> A2AResult<DomainEvent> {
    Ok(match classify(frame)? {
        Classified::Task(task) => DomainEvent::TaskCreated(TaskCreated::from(&task)),
        Classified::Event(event) => event,
    })
}

/// Map one SSE frame to every event it carries.
///
/// A `task` snapshot expands through [`events_from_task`], the same walk a
/// `message/send` result goes through. Other kinds yield a single event.
pub fn map_frame_events(frame: &Frame) -> A2AResult<Vec<DomainEvent>> {
    Ok(match classify(frame)? {
        Classified::Task(task) => events_from_task(task),
        Classified::Event(event) => vec![event],
    })
}

/// Expand a task snapshot into events, in order: `TaskCreated`, one
/// `ArtifactUpdate` per artifact, then a `StatusUpdate`.
///
/// The status is left out for a bare `submitted` snapshot with no message,
/// which is how streams usually open.
pub fn events_from_task(task: Task) -> Vec<DomainEvent> {
    let mut events = vec![DomainEvent::TaskCreated(TaskCreated::from(&task))];

    let Task {
        id,
        status,
        artifacts,
        ..
    } = task;

    events.extend(artifacts.into_iter().flatten().map(|artifact| {
        DomainEvent::ArtifactUpdate(ArtifactUpdate {
            task_id: Some(id.clone()),
            artifact_name: artifact.name.unwrap_or_default(),
            parts: artifact.parts,
        })
    }));

    let message = status
        .message
        .as_ref()
        .map(|m| get_message_text(m, "\n"))
        .filter(|text| !text.is_empty());

    if status.state != TaskState::Queued || message.is_some() {
        events.push(DomainEvent::StatusUpdate(StatusUpdate {
            task_id: Some(id),
            state: status.state,
            message,
            is_final: status.state.is_terminal(),
        }));
    }

    events
}

enum Classified {
    Task(Task),
    Event(DomainEvent),
}

fn classify(frame: &Frame) -> A2AResult<Classified> {
    let value: Value = serde_json::from_str(&frame.data).map_err(|e| {
        A2AError::malformed_with_data(format!("invalid JSON in frame: {e}"), frame.data.clone())
    })?;
    let payload = unwrap_envelope(value)?;

    let payload_kind = payload
        .get("kind")
        .and_then(Value::as_str)
        .map(str::to_string);

    let kind = EventKind::parse(&frame.event_type)
        .or_else(|| payload_kind.as_deref().and_then(EventKind::parse));

    match kind {
        Some(kind) => map_payload(kind, payload),
        None => {
            let kind = if frame.event_type.is_empty() {
                payload_kind.unwrap_or_else(|| "unknown".to_string())
            } else {
                frame.event_type.clone()
            };
            Ok(Classified::Event(DomainEvent::Opaque(OpaqueEvent {
                kind,
                payload,
            })))
        }
    }
}

/// Strip a JSON-RPC response envelope, surfacing its error member.
fn unwrap_envelope(value: Value) -> A2AResult<Value> {
    if value.get("jsonrpc").is_none() {
        return Ok(value);
    }

    if let Some(error) = value.get("error") {
        let code = error.get("code").and_then(Value::as_i64).unwrap_or(-1);
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string();
        return Err(A2AError::JsonRpc {
            code,
            message,
            data: error.get("data").cloned(),
        });
    }

    match value {
        Value::Object(mut map) => map
            .remove("result")
            .ok_or_else(|| A2AError::malformed("JSON-RPC frame has neither 'result' nor 'error'")),
        _ => Err(A2AError::malformed("JSON-RPC frame is not an object")),
    }
}

fn map_payload(kind: EventKind, payload: Value) -> A2AResult<Classified> {
    let event = match kind {
        EventKind::Task => return Ok(Classified::Task(parse_kind(payload, "task")?)),
        EventKind::StatusUpdate => {
            let event: TaskStatusUpdateEvent = parse_kind(payload, "status-update")?;
            DomainEvent::StatusUpdate(event.into())
        }
        EventKind::ArtifactUpdate => {
            let event: TaskArtifactUpdateEvent = parse_kind(payload, "artifact-update")?;
            DomainEvent::ArtifactUpdate(event.into())
        }
        EventKind::Message => {
            let message: Message = parse_kind(payload, "message")?;
            DomainEvent::Message(message.into())
        }
    };
    Ok(Classified::Event(event))
}

fn parse_kind<T: DeserializeOwned>(payload: Value, kind: &str) -> A2AResult<T> {
    let raw = payload.to_string();
    serde_json::from_value(payload).map_err(|e| {
        A2AError::malformed_with_data(format!("invalid '{kind}' payload: {e}"), raw)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_update_by_event_type() {
        let frame = Frame::new("status-update", r#"{"status":{"state":"running"}}"#);
        let event = map_frame(&frame).unwrap();
        assert_eq!(
            event,
            DomainEvent::StatusUpdate(StatusUpdate {
                task_id: None,
                state: TaskState::Running,
                message: None,
                is_final: false,
            })
        );
    }

    #[test]
    fn test_untyped_frame_uses_kind_field() {
        let frame = Frame::untyped(
            json!({"kind": "task", "id": "t1", "status": {"state": "submitted"}}).to_string(),
        );
        let event = map_frame(&frame).unwrap();
        assert_eq!(
            event,
            DomainEvent::TaskCreated(TaskCreated {
                task_id: "t1".into(),
                initial_state: TaskState::Queued,
            })
        );
    }

    #[test]
    fn test_event_type_wins_over_kind() {
        let frame = Frame::new(
            "artifact-update",
            json!({"kind": "bogus", "taskId": "t1", "artifact": {"name": "output_delta", "parts": [{"kind": "text", "text": "hi"}]}}).to_string(),
        );
        match map_frame(&frame).unwrap() {
            DomainEvent::ArtifactUpdate(update) => {
                assert_eq!(update.artifact_name, "output_delta");
                assert_eq!(update.task_id.as_deref(), Some("t1"));
                assert_eq!(update.parts, vec![Part::text("hi")]);
            }
            other => panic!("expected artifact update, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_event_type_falls_back_to_kind() {
        let frame = Frame::new(
            "update",
            json!({"kind": "status-update", "status": {"state": "completed"}, "final": true})
                .to_string(),
        );
        match map_frame(&frame).unwrap() {
            DomainEvent::StatusUpdate(update) => {
                assert_eq!(update.state, TaskState::Completed);
                assert!(update.is_final);
            }
            other => panic!("expected status update, got {:?}", other),
        }
    }

    #[test]
    fn test_status_message_text_is_extracted() {
        let frame = Frame::new(
            "status-update",
            json!({
                "taskId": "t1",
                "status": {
                    "state": "failed",
                    "message": {"role": "agent", "parts": [{"kind": "text", "text": "out of tokens"}]}
                }
            })
            .to_string(),
        );
        match map_frame(&frame).unwrap() {
            DomainEvent::StatusUpdate(update) => {
                assert_eq!(update.message.as_deref(), Some("out of tokens"));
                assert_eq!(update.task_id.as_deref(), Some("t1"));
            }
            other => panic!("expected status update, got {:?}", other),
        }
    }

    #[test]
    fn test_message_event() {
        let frame = Frame::untyped(
            json!({"kind": "message", "messageId": "m1", "role": "agent", "parts": [{"kind": "text", "text": "hello"}]}).to_string(),
        );
        match map_frame(&frame).unwrap() {
            DomainEvent::Message(message) => {
                assert_eq!(message.role, Role::Agent);
                assert_eq!(message.parts, vec![Part::text("hello")]);
            }
            other => panic!("expected message, got {:?}", other),
        }
    }

    #[test]
    fn test_unrecognized_kind_is_opaque() {
        let frame = Frame::new("heartbeat", r#"{"n":1}"#);
        match map_frame(&frame).unwrap() {
            DomainEvent::Opaque(event) => {
                assert_eq!(event.kind, "heartbeat");
                assert_eq!(event.payload, json!({"n": 1}));
            }
            other => panic!("expected opaque, got {:?}", other),
        }

        let frame = Frame::untyped(r#"{"kind":"push-config"}"#);
        let event = map_frame(&frame).unwrap();
        assert_eq!(event.kind(), "push-config");
    }

    #[test]
    fn test_malformed_json_is_malformed_payload() {
        let frame = Frame::new("status-update", "{not json");
        let err = map_frame(&frame).unwrap_err();
        match err {
            A2AError::MalformedPayload { data, .. } => assert_eq!(data.as_deref(), Some("{not json")),
            other => panic!("expected malformed payload, got {:?}", other),
        }
    }

    #[test]
    fn test_schema_mismatch_is_malformed_payload() {
        let frame = Frame::new("status-update", r#"{"status":"nope"}"#);
        assert!(matches!(
            map_frame(&frame),
            Err(A2AError::MalformedPayload { .. })
        ));
    }

    #[test]
    fn test_json_rpc_envelope_is_unwrapped() {
        let frame = Frame::untyped(
            json!({
                "jsonrpc": "2.0",
                "id": "1",
                "result": {"kind": "status-update", "taskId": "t9", "status": {"state": "working"}}
            })
            .to_string(),
        );
        let event = map_frame(&frame).unwrap();
        assert_eq!(event.task_id(), Some("t9"));
        assert_eq!(event.kind(), "status-update");
    }

    #[test]
    fn test_json_rpc_error_envelope() {
        let frame = Frame::untyped(
            json!({"jsonrpc": "2.0", "id": "1", "error": {"code": -32001, "message": "Task not found"}})
                .to_string(),
        );
        match map_frame(&frame) {
            Err(A2AError::JsonRpc { code, message, .. }) => {
                assert_eq!(code, -32001);
                assert_eq!(message, "Task not found");
            }
            other => panic!("expected JSON-RPC error, got {:?}", other),
        }
    }

    #[test]
    fn test_task_frame_expands_snapshot() {
        let frame = Frame::new(
            "task",
            json!({
                "kind": "task",
                "id": "t1",
                "status": {"state": "completed"},
                "artifacts": [
                    {"artifactId": "a1", "name": "full_output", "parts": [{"kind": "text", "text": "done"}]}
                ]
            })
            .to_string(),
        );
        let events = map_frame_events(&frame).unwrap();
        let kinds: Vec<&str> = events.iter().map(DomainEvent::kind).collect();
        assert_eq!(kinds, vec!["task", "artifact-update", "status-update"]);
        assert!(matches!(map_frame(&frame).unwrap(), DomainEvent::TaskCreated(_)));

        let opening = Frame::new("task", json!({"id": "t1", "status": {"state": "submitted"}}).to_string());
        assert_eq!(map_frame_events(&opening).unwrap().len(), 1);
    }
}
