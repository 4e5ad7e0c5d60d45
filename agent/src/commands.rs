//! Chat commands answered by the host without a model call.

use crate::controller::{render_context, Agent};

/// A recognised command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Help,
    Context,
    Token,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Help => "help",
            Command::Context => "context",
            Command::Token => "token",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "help" => Some(Command::Help),
            "context" => Some(Command::Context),
            "token" => Some(Command::Token),
            _ => None,
        }
    }
}

/// `text` split into command name and arguments; `None` when it is not a command.
pub fn parse_command(text: &str) -> Option<(String, Vec<String>)> {
    let text = text.trim();
    let rest = text.strip_prefix('/')?;
    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or_default().to_string();
    Some((name, parts.map(str::to_string).collect()))
}

pub const HELP_TEXT: &str = "Available commands:\n\
/help - show this help\n\
/context - show the current context\n\
/token - show the token usage of the current context";

/// Answers `text` if it is a command. Commands take no arguments.
pub fn handle_command(agent: &Agent, text: &str) -> Option<String> {
    let (name, args) = parse_command(text)?;
    let Some(command) = Command::from_name(&name) else {
        return Some("Unknown command, send /help for help".to_string());
    };
    if !args.is_empty() {
        return Some(format!("Command /{} takes no arguments", command.name()));
    }
    let reply = match command {
        Command::Help => HELP_TEXT.to_string(),
        Command::Context => format!("Current context:\n{}", render_context(&agent.context())),
        Command::Token => format!("Current context token usage: {}", agent.token_usage()),
    };
    Some(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::AgentSettings;

    fn agent() -> Agent {
        Agent::builder()
            .settings(AgentSettings {
                system_prompt: "You are Echo.".into(),
                ..AgentSettings::default()
            })
            .build()
    }

    #[test]
    fn parse_splits_name_and_args() {
        assert_eq!(parse_command("hello"), None);
        assert_eq!(parse_command(" /token "), Some(("token".into(), vec![])));
        assert_eq!(
            parse_command("/help me now"),
            Some(("help".into(), vec!["me".into(), "now".into()]))
        );
        assert_eq!(parse_command("/"), Some((String::new(), vec![])));
    }

    #[test]
    fn commands_read_agent_snapshots() {
        let agent = agent();
        assert_eq!(handle_command(&agent, "/help").as_deref(), Some(HELP_TEXT));
        assert_eq!(
            handle_command(&agent, "/context").as_deref(),
            Some("Current context:\n[system] You are Echo.")
        );
        assert_eq!(
            handle_command(&agent, "/token").as_deref(),
            Some("Current context token usage: 0")
        );
        assert_eq!(handle_command(&agent, "plain text"), None);
    }

    #[test]
    fn arguments_and_unknown_commands_are_rejected() {
        let agent = agent();
        assert_eq!(
            handle_command(&agent, "/token now").as_deref(),
            Some("Command /token takes no arguments")
        );
        assert_eq!(
            handle_command(&agent, "/dance").as_deref(),
            Some("Unknown command, send /help for help")
        );
    }
}
