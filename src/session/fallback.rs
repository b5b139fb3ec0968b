//! Non-streaming path: one aggregate `message/send` result expressed as the
//! same event sequence a streaming agent would have sent.
//!
//! A task is walked by [`events_from_task`], the expansion a streamed task
//! snapshot also goes through. A direct message becomes a single `Message`.

use crate::events::{events_from_task, AgentMessage, DomainEvent};
use crate::types::SendMessageResponse;

/// Expand a `message/send` result into domain events.
pub fn events_from_response(response: SendMessageResponse) -> Vec<DomainEvent> {
    match response {
        SendMessageResponse::Task(task) => events_from_task(task),
        SendMessageResponse::Message(message) => {
            vec![DomainEvent::Message(AgentMessage::from(message))]
        }
    }
}
