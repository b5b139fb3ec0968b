//! Utility functions for creating and reading A2A Message objects.

use crate::types::Message;
use crate::utils::parts::get_text_parts;
use uuid::Uuid;

/// Creates a user message containing a single text Part.
///
/// The message gets a fresh UUID and is bound to `context_id` when given,
/// so consecutive sends share one conversation on the agent side.
///
/// # Example
///
/// ```
/// use a2a_cli::utils::new_user_text_message;
///
/// let message = new_user_text_message("Hello, agent", Some("ctx-1"));
/// assert_eq!(message.role, a2a_cli::types::Role::User);
/// assert_eq!(message.context_id.as_deref(), Some("ctx-1"));
/// ```
pub fn new_user_text_message(text: impl Into<String>, context_id: Option<&str>) -> Message {
    Message {
        context_id: context_id.map(str::to_string),
        ..Message::user(Uuid::new_v4().to_string(), text)
    }
}

/// Extracts and joins all text content from a Message's parts.
///
/// Returns an empty string if the message has no text parts.
///
/// # Example
///
/// ```
/// use a2a_cli::utils::{new_user_text_message, get_message_text};
///
/// let message = new_user_text_message("Hello, world!", None);
/// assert_eq!(get_message_text(&message, "\n"), "Hello, world!");
/// ```
pub fn get_message_text(message: &Message, delimiter: &str) -> String {
    get_text_parts(&message.parts).join(delimiter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Part, Role};

    #[test]
    fn test_new_user_text_message_basic() {
        let message = new_user_text_message("Hello", None);
        assert_eq!(message.role, Role::User);
        assert_eq!(message.parts.len(), 1);
        assert!(Uuid::parse_str(&message.message_id).is_ok());
        assert!(message.context_id.is_none());
        assert!(message.task_id.is_none());
    }

    #[test]
    fn test_get_message_text_joins_text_parts_only() {
        let mut message = new_user_text_message("one", None);
        message.parts.push(Part::data(serde_json::json!({"x": 1})));
        message.parts.push(Part::text("two"));
        assert_eq!(get_message_text(&message, "\n"), "one\ntwo");
    }

    #[test]
    fn test_get_message_text_empty() {
        let mut message = new_user_text_message("", None);
        message.parts.clear();
        assert_eq!(get_message_text(&message, "\n"), "");
    }
}
