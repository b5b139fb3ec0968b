//! Slash commands accepted by the REPL.

pub const HELP: &str = "\
Commands:
  /connect <url>   connect to an agent (fetches its agent card)
  /disconnect      drop the current agent
  /status          show the connection and the last task
  /card            print the agent card
  /reset, /new     start a new conversation context
  /cancel          cancel the running task (Ctrl-C works too)
  /help, /?        show this help
  /quit, /exit     leave

Anything else is sent to the agent as a task.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Connect(Option<String>),
    Disconnect,
    Status,
    Card,
    Reset,
    Cancel,
    Help,
    Quit,
    Task(String),
    Unknown(String),
    Empty,
}

pub fn parse(input: &str) -> Command {
    let input = input.trim();
    if input.is_empty() {
        return Command::Empty;
    }
    if !input.starts_with('/') {
        return Command::Task(input.to_string());
    }

    let (name, arg) = match input.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, Some(rest.trim()).filter(|r| !r.is_empty())),
        None => (input, None),
    };

    match name.to_ascii_lowercase().as_str() {
        "/connect" => Command::Connect(arg.map(str::to_string)),
        "/disconnect" => Command::Disconnect,
        "/status" => Command::Status,
        "/card" => Command::Card,
        "/reset" | "/new" => Command::Reset,
        "/cancel" => Command::Cancel,
        "/help" | "/?" => Command::Help,
        "/quit" | "/exit" => Command::Quit,
        _ => Command::Unknown(name.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(
            parse("/connect http://localhost:7420 "),
            Command::Connect(Some("http://localhost:7420".into()))
        );
        assert_eq!(parse("/connect"), Command::Connect(None));
        assert_eq!(parse("/new"), Command::Reset);
        assert_eq!(parse("/?"), Command::Help);
        assert_eq!(parse("/EXIT"), Command::Quit);
        assert_eq!(parse("/frobnicate now"), Command::Unknown("/frobnicate".into()));
    }

    #[test]
    fn everything_else_is_a_task() {
        assert_eq!(parse("  write a haiku "), Command::Task("write a haiku".into()));
        assert_eq!(parse("   "), Command::Empty);
    }
}
