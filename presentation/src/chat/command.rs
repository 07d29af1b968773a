//! Parsing of REPL input lines

/// One line of REPL input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Quit,
    Help,
    Tools,
    Servers,
    Resources,
    Read(String),
    History,
    Unknown(String),
    /// Anything that is not a command goes to the model
    Message(String),
}

impl ReplCommand {
    /// Parse a line; blank lines yield `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        if line.eq_ignore_ascii_case("quit") {
            return Some(ReplCommand::Quit);
        }
        if !line.starts_with('/') {
            return Some(ReplCommand::Message(line.to_string()));
        }

        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };
        let command = match name {
            "/quit" | "/exit" | "/q" => ReplCommand::Quit,
            "/help" | "/h" | "/?" => ReplCommand::Help,
            "/tools" => ReplCommand::Tools,
            "/servers" => ReplCommand::Servers,
            "/resources" => ReplCommand::Resources,
            "/read" if !rest.is_empty() => ReplCommand::Read(rest.to_string()),
            "/history" => ReplCommand::History,
            _ => ReplCommand::Unknown(line.to_string()),
        };
        Some(command)
    }
}
