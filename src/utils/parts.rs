//! Utility functions for working with A2A Part objects.

use crate::types::{FileContent, Part};

/// Extracts text content from all text Parts in a list.
///
/// # Example
///
/// ```
/// use a2a_cli::types::Part;
/// use a2a_cli::utils::get_text_parts;
///
/// let parts = vec![Part::text("Hello"), Part::text("World")];
/// assert_eq!(get_text_parts(&parts), vec!["Hello", "World"]);
/// ```
pub fn get_text_parts(parts: &[Part]) -> Vec<String> {
    parts
        .iter()
        .filter_map(|part| part.as_text().map(str::to_string))
        .collect()
}

/// One-line description of a non-text part, for terminal display.
///
/// Text parts return `None`; they are rendered as-is elsewhere.
///
/// ```
/// use a2a_cli::types::Part;
/// use a2a_cli::utils::describe_part;
///
/// assert_eq!(describe_part(&Part::text("hi")), None);
/// assert_eq!(
///     describe_part(&Part::data(serde_json::json!({"n": 1}))).as_deref(),
///     Some("[data] {\"n\":1}")
/// );
/// ```
pub fn describe_part(part: &Part) -> Option<String> {
    match part {
        Part::Text { .. } => None,
        Part::Data { data, .. } => Some(format!("[data] {data}")),
        Part::File { file, .. } => {
            let (name, mime, location) = match file {
                FileContent::Uri(f) => (f.name.as_deref(), f.mime_type.as_deref(), Some(f.uri.as_str())),
                FileContent::Bytes(f) => (f.name.as_deref(), f.mime_type.as_deref(), None),
            };
            let mut line = format!("[file] {}", name.unwrap_or("unnamed"));
            if let Some(mime) = mime {
                line.push_str(&format!(" ({mime})"));
            }
            match location {
                Some(uri) => line.push_str(&format!(" {uri}")),
                None => line.push_str(" <inline>"),
            }
            Some(line)
        }
    }
}
