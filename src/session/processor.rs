//! Turns domain events into display lines for one task send.

use crate::assembler::ArtifactAssembler;
use crate::error::A2AError;
use crate::events::DomainEvent;
use crate::sink::LineCategory;
use crate::types::TaskState;
use crate::utils::describe_part;

use super::TaskOutcome;

/// A rendered line waiting to go to the sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub text: String,
    pub category: LineCategory,
}

impl Line {
    pub fn new(text: impl Into<String>, category: LineCategory) -> Self {
        Self {
            text: text.into(),
            category,
        }
    }
}

/// Per-send event state: the established task id, the artifact buffer and
/// the last remote status.
#[derive(Debug, Default)]
pub struct EventProcessor {
    assembler: ArtifactAssembler,
    task_id: Option<String>,
    last_state: Option<TaskState>,
    last_message: Option<String>,
}

impl EventProcessor {
    pub fn new(assembler: ArtifactAssembler) -> Self {
        Self {
            assembler,
            ..Default::default()
        }
    }

    /// The task id established by the first event that carried one.
    pub fn task_id(&self) -> Option<&str> {
        self.task_id.as_deref()
    }

    /// Render every event of one frame. A task-id violation drops the rest
    /// of the frame's events.
    pub fn handle_all(&mut self, events: Vec<DomainEvent>) -> Vec<Line> {
        let mut lines = Vec::new();
        for event in events {
            match self.check_task_id(&event) {
                Ok(announced) => {
                    lines.extend(announced);
                    self.render(event, &mut lines);
                }
                Err(violation) => {
                    lines.push(violation);
                    break;
                }
            }
        }
        lines
    }

    /// Render one event.
    pub fn handle(&mut self, event: DomainEvent) -> Vec<Line> {
        self.handle_all(vec![event])
    }

    /// Announce the first task id; reject a different one later.
    fn check_task_id(&mut self, event: &DomainEvent) -> Result<Option<Line>, Line> {
        let Some(id) = event.task_id() else {
            return Ok(None);
        };
        match self.task_id.as_deref() {
            None => {
                self.task_id = Some(id.to_string());
                Ok(Some(Line::new(format!("Task ID: {id}"), LineCategory::TaskId)))
            }
            Some(known) if known != id => {
                let err = A2AError::ProtocolViolation(format!(
                    "task id changed from {known} to {id} on a '{}' event",
                    event.kind()
                ));
                tracing::warn!(error = %err, "dropping event");
                Err(Line::new(err.to_string(), LineCategory::Error))
            }
            Some(_) => Ok(None),
        }
    }

    fn render(&mut self, event: DomainEvent, lines: &mut Vec<Line>) {
        match event {
            DomainEvent::TaskCreated(created) => {
                self.last_state = Some(created.initial_state);
            }
            DomainEvent::StatusUpdate(update) => {
                lines.push(Line::new(
                    format!("Status: {}", update.state),
                    LineCategory::Status,
                ));
                if let Some(message) = &update.message {
                    lines.push(Line::new(message.clone(), LineCategory::StatusMessage));
                }
                self.last_state = Some(update.state);
                self.last_message = update.message;
            }
            DomainEvent::ArtifactUpdate(update) => {
                let out = self.assembler.apply(&update);
                if let Some(label) = out.label {
                    lines.push(Line::new(format!("[{label}]"), LineCategory::ArtifactLabel));
                }
                if let Some(text) = out.flush {
                    lines.push(Line::new(text, LineCategory::Artifact));
                }
                lines.extend(
                    out.attachments
                        .into_iter()
                        .map(|a| Line::new(a, LineCategory::Attachment)),
                );
            }
            DomainEvent::Message(message) => {
                for part in &message.parts {
                    match part.as_text() {
                        Some(text) => lines.push(Line::new(text, LineCategory::Message)),
                        None => {
                            if let Some(desc) = describe_part(part) {
                                lines.push(Line::new(desc, LineCategory::Attachment));
                            }
                        }
                    }
                }
            }
            DomainEvent::Opaque(opaque) => {
                tracing::debug!(kind = %opaque.kind, payload = %opaque.payload, "unrecognized event");
                lines.push(Line::new(
                    format!("Unrecognized event: {}", opaque.kind),
                    LineCategory::Notice,
                ));
            }
        }
    }

    /// Render a frame that could not be mapped.
    pub fn skipped(&self, err: &A2AError) -> Line {
        tracing::warn!(error = %err, "skipping malformed frame");
        Line::new(format!("Skipped malformed frame: {err}"), LineCategory::Notice)
    }

    /// End the send: drop any unfinished artifact text and derive the
    /// outcome from the last remote status.
    pub fn finish(&mut self) -> TaskOutcome {
        self.assembler.discard();
        match self.last_state {
            Some(state) if state.is_failure() => TaskOutcome::Failed(A2AError::TaskFailed(
                self.last_message
                    .clone()
                    .unwrap_or_else(|| format!("task ended in state '{state}'")),
            )),
            Some(TaskState::Canceled) => TaskOutcome::Cancelled,
            _ => TaskOutcome::Completed,
        }
    }
}
