//! Reassembly of streamed artifact text.
//!
//! Agents stream long output as a run of artifacts named by position:
//!
//! ```text
//! output_start -> output_delta* -> output_end
//! ```
//!
//! or send it whole as `full_output`. The assembler buffers the deltas and
//! hands back complete text only when the run closes. Artifacts with any
//! other name are standalone: their text is returned at once, labelled with
//! the name, and the running buffer is left alone.

use std::collections::HashSet;

use crate::events::ArtifactUpdate;
use crate::utils::{describe_part, FULL_OUTPUT, OUTPUT_DELTA, OUTPUT_END, OUTPUT_START};

/// What one artifact event produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assembled {
    /// Name of a standalone artifact, shown before its content.
    pub label: Option<String>,
    /// Completed text, if a logical unit closed.
    pub flush: Option<String>,
    /// Descriptions of file and data parts.
    pub attachments: Vec<String>,
}

impl Assembled {
    /// Whether nothing is to be shown.
    pub fn is_empty(&self) -> bool {
        self.label.is_none() && self.flush.is_none() && self.attachments.is_empty()
    }
}

#[derive(Debug, Default)]
struct ArtifactBuffer {
    task_id: Option<String>,
    text: String,
}

/// Accumulation buffer for one task's streamed output.
#[derive(Debug, Default)]
pub struct ArtifactAssembler {
    buffer: Option<ArtifactBuffer>,
    suppressed: HashSet<String>,
}

impl ArtifactAssembler {
    /// Create an assembler that shows every artifact.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hide standalone artifacts with the given names.
    pub fn with_suppressed<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.suppressed.extend(names.into_iter().map(Into::into));
        self
    }

    /// Whether a buffer is currently open.
    pub fn is_open(&self) -> bool {
        self.buffer.is_some()
    }

    /// Text accumulated so far in the open buffer.
    pub fn pending(&self) -> Option<&str> {
        self.buffer.as_ref().map(|b| b.text.as_str())
    }

    /// Feed one artifact event.
    pub fn apply(&mut self, update: &ArtifactUpdate) -> Assembled {
        let attachments: Vec<String> = update.parts.iter().filter_map(describe_part).collect();
        let text: String = update.parts.iter().filter_map(|p| p.as_text()).collect();

        match update.artifact_name.as_str() {
            OUTPUT_START => {
                self.buffer = Some(ArtifactBuffer {
                    task_id: update.task_id.clone(),
                    text: String::new(),
                });
                Assembled {
                    attachments,
                    ..Default::default()
                }
            }
            OUTPUT_DELTA => {
                self.open(update).text.push_str(&text);
                Assembled {
                    attachments,
                    ..Default::default()
                }
            }
            OUTPUT_END | FULL_OUTPUT => {
                self.open(update).text.push_str(&text);
                let flush = self
                    .buffer
                    .take()
                    .map(|b| b.text)
                    .filter(|text| !text.is_empty());
                Assembled {
                    label: None,
                    flush,
                    attachments,
                }
            }
            name if self.suppressed.contains(name) => {
                tracing::debug!(artifact = name, "suppressed standalone artifact");
                Assembled::default()
            }
            name => {
                let text = update
                    .parts
                    .iter()
                    .filter_map(|p| p.as_text())
                    .collect::<Vec<_>>()
                    .join("\n");
                Assembled {
                    label: Some(name.to_string()).filter(|n| !n.is_empty()),
                    flush: Some(text).filter(|t| !t.is_empty()),
                    attachments,
                }
            }
        }
    }

    /// Drop any partially assembled text.
    ///
    /// Returns the number of bytes thrown away.
    pub fn discard(&mut self) -> usize {
        match self.buffer.take() {
            Some(buffer) => {
                if !buffer.text.is_empty() {
                    tracing::debug!(
                        task_id = buffer.task_id.as_deref().unwrap_or("-"),
                        bytes = buffer.text.len(),
                        "discarding unfinished artifact buffer"
                    );
                }
                buffer.text.len()
            }
            None => 0,
        }
    }

    fn open(&mut self, update: &ArtifactUpdate) -> &mut ArtifactBuffer {
        self.buffer.get_or_insert_with(|| ArtifactBuffer {
            task_id: update.task_id.clone(),
            text: String::new(),
        })
    }
}
