//! Slash-command parsing and dispatch for the interactive shell.
//!
//! Input that is not a known command falls through as a chat message, so a
//! typo'd `/foo` still reaches the model instead of vanishing.

use crate::core::session::ConversationSession;
use crate::ui;

pub type CommandHandler = fn(&mut ConversationSession, CommandInvocation<'_>) -> CommandResult;

pub enum CommandResult {
    /// Command fully handled; read the next input line.
    Continue,
    /// Not a command; forward to the session as a chat message.
    ProcessAsMessage(String),
}

#[derive(Clone, Copy)]
pub struct CommandInvocation<'a> {
    pub input: &'a str,
    pub args: &'a str,
}

pub struct Command {
    pub name: &'static str,
    pub usage: &'static str,
    pub help: &'static str,
    pub handler: CommandHandler,
}

const COMMANDS: &[Command] = &[
    Command {
        name: "add",
        usage: "/add <path>",
        help: "Read a file and share its content with the model for the rest of the session.",
        handler: handle_add,
    },
    Command {
        name: "help",
        usage: "/help",
        help: "Show available commands.",
        handler: handle_help,
    },
];

pub fn all_commands() -> &'static [Command] {
    COMMANDS
}

pub fn find_command(name: &str) -> Option<&'static Command> {
    COMMANDS
        .iter()
        .find(|command| command.name.eq_ignore_ascii_case(name))
}

pub fn process_input(session: &mut ConversationSession, input: &str) -> CommandResult {
    let trimmed = input.trim();

    if !trimmed.starts_with('/') {
        return CommandResult::ProcessAsMessage(trimmed.to_string());
    }

    let mut parts = trimmed[1..].splitn(2, ' ');
    let command_name = match parts.next() {
        Some(name) if !name.is_empty() => name,
        _ => return CommandResult::ProcessAsMessage(trimmed.to_string()),
    };
    let args = parts.next().unwrap_or("").trim();

    if let Some(command) = find_command(command_name) {
        let invocation = CommandInvocation {
            input: trimmed,
            args,
        };
        (command.handler)(session, invocation)
    } else {
        CommandResult::ProcessAsMessage(trimmed.to_string())
    }
}

fn handle_add(session: &mut ConversationSession, invocation: CommandInvocation<'_>) -> CommandResult {
    if invocation.args.is_empty() {
        ui::print_warning("Usage: /add <path>");
        return CommandResult::Continue;
    }

    match session.add_context(invocation.args) {
        Ok(path) => ui::print_success(&format!("Added '{path}' to the conversation.")),
        Err(e) => ui::print_error(&e.to_string()),
    }
    CommandResult::Continue
}

fn handle_help(_session: &mut ConversationSession, _invocation: CommandInvocation<'_>) -> CommandResult {
    ui::print_help(all_commands());
    CommandResult::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ProviderAdapter;
    use std::fs;
    use std::sync::Arc;
    use tempfile::tempdir;

    struct StubAdapter;

    impl ProviderAdapter for StubAdapter {
        fn id(&self) -> &str {
            "stub"
        }

        fn display_name(&self) -> &str {
            "Stub"
        }

        fn model(&self) -> &str {
            "stub-model"
        }

        fn request_builder(&self, client: &reqwest::Client) -> reqwest::RequestBuilder {
            client.post("http://127.0.0.1:9/never")
        }
    }

    fn session() -> ConversationSession {
        ConversationSession::new(Arc::new(StubAdapter))
    }

    #[test]
    fn plain_text_is_forwarded_as_a_message() {
        let mut session = session();
        match process_input(&mut session, "  hello there  ") {
            CommandResult::ProcessAsMessage(text) => assert_eq!(text, "hello there"),
            _ => panic!("expected message passthrough"),
        }
    }

    #[test]
    fn unknown_slash_commands_fall_through_as_messages() {
        let mut session = session();
        match process_input(&mut session, "/definitely-not-a-command") {
            CommandResult::ProcessAsMessage(text) => {
                assert_eq!(text, "/definitely-not-a-command")
            }
            _ => panic!("expected message passthrough"),
        }
    }

    #[test]
    fn add_registers_file_context() {
        let dir = tempdir().unwrap();
        let notes = dir.path().join("notes.txt");
        fs::write(&notes, "hello").unwrap();

        let mut session = session();
        let input = format!("/add {}", notes.display());
        assert!(matches!(
            process_input(&mut session, &input),
            CommandResult::Continue
        ));
        assert_eq!(session.contexts().len(), 1);
        assert_eq!(session.contexts()[0].content, "hello");
    }

    #[test]
    fn add_with_missing_file_leaves_context_empty() {
        let mut session = session();
        assert!(matches!(
            process_input(&mut session, "/add nope/missing.txt"),
            CommandResult::Continue
        ));
        assert!(session.contexts().is_empty());
    }

    #[test]
    fn command_lookup_is_case_insensitive() {
        assert!(find_command("Add").is_some());
        assert!(find_command("HELP").is_some());
        assert!(find_command("model").is_none());
    }
}
