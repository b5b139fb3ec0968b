//! Colored terminal output for session lines.

use colored::{ColoredString, Colorize};

use a2a_cli::sink::{LineCategory, Sink};

/// Prints every line to stdout, styled by category.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalSink;

impl Sink for TerminalSink {
    fn emit(&self, line: &str, category: Option<LineCategory>) {
        println!("{}", style(line, category));
    }
}

pub fn style(line: &str, category: Option<LineCategory>) -> ColoredString {
    let Some(category) = category else {
        return line.normal();
    };
    match category {
        LineCategory::TaskId => line.dimmed(),
        LineCategory::Status => line.cyan(),
        LineCategory::StatusMessage => line.italic(),
        LineCategory::Artifact => line.normal(),
        LineCategory::ArtifactLabel => line.magenta().bold(),
        LineCategory::Attachment => line.blue(),
        LineCategory::Message => line.green(),
        LineCategory::Notice => line.yellow(),
        LineCategory::Error => line.red().bold(),
        LineCategory::Cancelled => line.yellow().bold(),
    }
}
