//! Special commands parser for interactive chat mode
//!
//! Lines starting with `/` are commands; everything else is a chat
//! message. Command names are case-insensitive, their arguments keep
//! their case.

use crate::controller::{Tab, UiEvent};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command was given an unsupported argument
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// What a line of interactive input asks for
#[derive(Debug, Clone, PartialEq)]
pub enum SpecialCommand {
    /// Hand an event to the controller
    Event(UiEvent),

    /// Generate images from the current form with this prompt
    GenerateImage(String),

    /// Display help information
    Help,

    /// Exit the interactive session
    Exit,

    /// Not a special command; send it as a chat message
    None,
}

/// Parse a user input string into a special command
///
/// # Errors
///
/// Returns `CommandError::UnknownCommand` for an unrecognised `/name`,
/// `CommandError::MissingArgument` when a required argument is absent and
/// `CommandError::UnsupportedArgument` when an index is not a number.
///
/// # Examples
///
/// ```
/// use myai::commands::special_commands::{parse_special_command, SpecialCommand};
/// use myai::controller::UiEvent;
///
/// let cmd = parse_special_command("/new").unwrap();
/// assert_eq!(cmd, SpecialCommand::Event(UiEvent::NewChat));
///
/// let cmd = parse_special_command("hello there").unwrap();
/// assert_eq!(cmd, SpecialCommand::None);
///
/// assert!(parse_special_command("/foo").is_err());
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    if lower == "exit" || lower == "quit" {
        return Ok(SpecialCommand::Exit);
    }
    if !trimmed.starts_with('/') {
        return Ok(SpecialCommand::None);
    }

    let (name, arg) = match trimmed.split_once(char::is_whitespace) {
        Some((name, rest)) => (name.to_lowercase(), rest.trim()),
        None => (lower, ""),
    };
    let arg = (!arg.is_empty()).then_some(arg);

    let event = match name.as_str() {
        "/new" => UiEvent::NewChat,
        "/sessions" => UiEvent::SwitchTab(Tab::Chat),
        "/switch" => UiEvent::SwitchSession(required(&name, arg, "/switch <session id>")?),
        "/delete" => UiEvent::DeleteSession(required(&name, arg, "/delete <session id>")?),
        "/clear" => UiEvent::ClearChat,
        "/image" => {
            return Ok(SpecialCommand::GenerateImage(required(
                &name,
                arg,
                "/image <prompt>",
            )?))
        }
        "/images" => UiEvent::SwitchTab(Tab::Image),
        "/history" => UiEvent::SwitchTab(Tab::History),
        "/export" => UiEvent::ExportData(arg.map(PathBuf::from)),
        "/import" => UiEvent::ImportData(PathBuf::from(required(&name, arg, "/import <file>")?)),
        "/reuse" => UiEvent::ReuseSettings(index(&name, arg, "/reuse <n>")?),
        "/rmimage" => UiEvent::DeleteImage(index(&name, arg, "/rmimage <n>")?),
        "/download" => {
            let usage = "/download <n> [dir]";
            let text = required(&name, arg, usage)?;
            let (n, dir) = match text.split_once(char::is_whitespace) {
                Some((n, dir)) => (n.to_string(), PathBuf::from(dir.trim())),
                None => (text, PathBuf::from(".")),
            };
            UiEvent::DownloadImage(index(&name, Some(n.as_str()), usage)?, dir)
        }
        "/seed" => UiEvent::RandomSeed,
        "/sidebar" => UiEvent::ToggleSidebar,
        "/clear-all" => UiEvent::ClearAllData,
        "/help" | "/?" => return Ok(SpecialCommand::Help),
        "/exit" | "/quit" => return Ok(SpecialCommand::Exit),
        _ => return Err(CommandError::UnknownCommand(trimmed.to_string())),
    };

    Ok(SpecialCommand::Event(event))
}

fn required(command: &str, arg: Option<&str>, usage: &str) -> Result<String, CommandError> {
    arg.map(str::to_string)
        .ok_or_else(|| CommandError::MissingArgument {
            command: command.to_string(),
            usage: usage.to_string(),
        })
}

fn index(command: &str, arg: Option<&str>, usage: &str) -> Result<usize, CommandError> {
    let text = required(command, arg, usage)?;
    text.parse().map_err(|_| CommandError::UnsupportedArgument {
        command: command.to_string(),
        arg: text,
    })
}

/// Print help for interactive commands
pub fn print_help() {
    println!(
        r#"
Special Commands for Interactive Chat Mode
==========================================

CHAT:
  <text>              - Send a message to the assistant
  /new                - Start a new chat
  /sessions           - Show the chat list
  /switch <id>        - Switch to a chat (id or unique prefix)
  /delete <id>        - Delete a chat
  /clear              - Clear the current chat

IMAGES:
  /image <prompt>     - Generate images with the current settings
  /images             - Show settings and recent images
  /reuse <n>          - Copy settings of image n from the last batch
  /seed               - Pick a random seed for the next generation
  /download <n> [dir] - Save image n of the history as PNG
  /rmimage <n>        - Delete image n from the history

DATA:
  /history            - Show chat and image history
  /export [file]      - Export history to JSON
  /import <file>      - Merge an exported file into history
  /clear-all          - Delete all chats and images

OTHER:
  /sidebar            - Toggle the chat list
  /help               - Show this help
  /exit, exit, quit   - Leave
"#
    );
}
