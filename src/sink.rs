//! Line sink: where rendered task output goes.
//!
//! The session never prints. It hands every finished line to a [`Sink`]
//! together with a [`LineCategory`] the front end can use for styling.

use std::fmt;
use std::sync::{Arc, Mutex};

/// Semantic tag attached to each emitted line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineCategory {
    /// `Task ID: <id>`
    TaskId,
    /// `Status: <state>`
    Status,
    /// Text attached to a status update.
    StatusMessage,
    /// Completed artifact text.
    Artifact,
    /// `[<name>]` header of a standalone artifact.
    ArtifactLabel,
    /// Description of a file or data part.
    Attachment,
    /// Text of a direct agent message.
    Message,
    /// Informational notice (skipped frames, unknown events).
    Notice,
    /// Failures and protocol violations.
    Error,
    /// The user cancelled the task.
    Cancelled,
}

impl LineCategory {
    /// Stable lowercase name, e.g. for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            LineCategory::TaskId => "task-id",
            LineCategory::Status => "status",
            LineCategory::StatusMessage => "status-message",
            LineCategory::Artifact => "artifact",
            LineCategory::ArtifactLabel => "artifact-label",
            LineCategory::Attachment => "attachment",
            LineCategory::Message => "message",
            LineCategory::Notice => "notice",
            LineCategory::Error => "error",
            LineCategory::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for LineCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Consumer of rendered lines.
///
/// Called from the session's task, so implementations must be cheap and
/// must not block on the session itself.
pub trait Sink: Send + Sync {
    fn emit(&self, line: &str, category: Option<LineCategory>);
}

impl<F> Sink for F
where
    F: Fn(&str, Option<LineCategory>) + Send + Sync,
{
    fn emit(&self, line: &str, category: Option<LineCategory>) {
        self(line, category)
    }
}

/// A sink that records every line in memory.
///
/// Clones share the same buffer.
///
/// ```
/// use a2a_cli::sink::{LineCategory, MemorySink, Sink};
///
/// let sink = MemorySink::new();
/// sink.emit("Status: completed", Some(LineCategory::Status));
/// assert_eq!(sink.texts(), vec!["Status: completed"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<(String, Option<LineCategory>)>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every line recorded so far, with its category.
    pub fn lines(&self) -> Vec<(String, Option<LineCategory>)> {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Just the text of every line.
    pub fn texts(&self) -> Vec<String> {
        self.lines().into_iter().map(|(text, _)| text).collect()
    }

    pub fn len(&self) -> usize {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }
}

impl Sink for MemorySink {
    fn emit(&self, line: &str, category: Option<LineCategory>) {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((line.to_string(), category));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn closures_are_sinks() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let sink = move |_line: &str, _category: Option<LineCategory>| {
            counter.fetch_add(1, Ordering::SeqCst);
        };
        sink.emit("a", None);
        sink.emit("b", Some(LineCategory::Notice));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn memory_sink_clones_share_lines() {
        let sink = MemorySink::new();
        let other = sink.clone();
        other.emit("Task ID: t1", Some(LineCategory::TaskId));
        assert_eq!(
            sink.lines(),
            vec![("Task ID: t1".to_string(), Some(LineCategory::TaskId))]
        );
        sink.clear();
        assert!(other.is_empty());
    }
}
