use crate::cli::{ImageCommand, SessionCommand};
use crate::commands::{open_controller, open_state};
use crate::config::Config;
use crate::controller::UiEvent;
use crate::error::{MyAiError, Result};
use crate::models::{truncate_with_ellipsis, ChatMessage, ChatSession, GeneratedImage};
use crate::session::session_preview;
use colored::Colorize;
use prettytable::{format, row, Table};
use std::path::PathBuf;

const TABLE_TITLE_CHARS: usize = 40;
const TABLE_PROMPT_CHARS: usize = 40;

/// Handle `sessions` subcommands
pub async fn handle_sessions(config: Config, command: SessionCommand) -> Result<()> {
    match command {
        SessionCommand::List => {
            let state = open_state(&config)?;
            let sessions = state.sessions().sessions();
            if sessions.is_empty() {
                println!("{}", "No chat sessions found.".yellow());
                return Ok(());
            }

            println!("\nChat sessions:");
            sessions_table(sessions, state.sessions().current_id()).printstd();
            println!();
            println!(
                "Use {} to read a session.",
                "myai sessions show <ID>".cyan()
            );
            println!();
        }
        SessionCommand::Show { id } => {
            let state = open_state(&config)?;
            let session = state
                .sessions()
                .resolve_id(&id)
                .and_then(|resolved| state.sessions().get(resolved))
                .ok_or_else(|| MyAiError::Validation(format!("Unknown chat session: {}", id)))?;

            println!("\n{} {}", session.title.bold(), session.id.dimmed());
            for message in &session.messages {
                println!(
                    "{} [{}] {}",
                    message.role.to_string().cyan(),
                    message.timestamp.format("%Y-%m-%d %H:%M"),
                    message.content
                );
            }
            println!();
        }
        SessionCommand::Delete { id } => {
            let mut controller = open_controller(&config)?;
            controller.dispatch(UiEvent::DeleteSession(id)).await;
            super::check_failures(controller.view())?;
        }
    }

    Ok(())
}

/// Handle `images` subcommands
pub async fn handle_images(config: Config, command: ImageCommand) -> Result<()> {
    match command {
        ImageCommand::List => {
            let state = open_state(&config)?;
            if state.images().is_empty() {
                println!("{}", "No generated images found.".yellow());
                return Ok(());
            }
            println!("\nGenerated images:");
            images_table(state.images().recent_first()).printstd();
            println!();
        }
        ImageCommand::Delete { index } => {
            let mut controller = open_controller(&config)?;
            controller.dispatch(UiEvent::DeleteImage(index)).await;
            super::check_failures(controller.view())?;
        }
        ImageCommand::Download { index, output_dir } => {
            download(&config, index, output_dir).await?;
        }
    }

    Ok(())
}

async fn download(config: &Config, index: usize, output_dir: PathBuf) -> Result<()> {
    std::fs::create_dir_all(&output_dir)?;
    let mut controller = open_controller(config)?;
    controller
        .dispatch(UiEvent::DownloadImage(index, output_dir))
        .await;
    super::check_failures(controller.view())
}

/// Session listing, the current session marked with `*`
pub fn sessions_table(sessions: &[ChatSession], current_id: Option<&str>) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.add_row(row![
        "".bold(),
        "ID".bold(),
        "Title".bold(),
        "Messages".bold(),
        "Last Updated".bold(),
        "Preview".bold()
    ]);

    for session in sessions {
        let marker = if Some(session.id.as_str()) == current_id {
            "*".green().to_string()
        } else {
            String::new()
        };
        table.add_row(row![
            marker,
            session.id.cyan(),
            truncate_with_ellipsis(&session.title, TABLE_TITLE_CHARS),
            session.messages.len(),
            session.last_updated.format("%Y-%m-%d %H:%M"),
            session_preview(session)
        ]);
    }
    table
}

/// Image listing keyed by stored index
pub fn images_table<'a>(images: impl Iterator<Item = (usize, &'a GeneratedImage)>) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.add_row(row![
        "#".bold(),
        "Prompt".bold(),
        "Size".bold(),
        "Style".bold(),
        "Created".bold(),
        "URL".bold()
    ]);

    for (index, image) in images {
        table.add_row(row![
            index.to_string().cyan(),
            truncate_with_ellipsis(&image.prompt, TABLE_PROMPT_CHARS),
            image.size,
            image.style,
            image.timestamp.format("%Y-%m-%d %H:%M"),
            image.image_url
        ]);
    }
    table
}

/// Legacy history grouped into conversations
pub fn conversations_table(conversations: &[Vec<ChatMessage>]) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.add_row(row![
        "#".bold(),
        "Started".bold(),
        "Messages".bold(),
        "First Message".bold()
    ]);

    for (index, conversation) in conversations.iter().enumerate() {
        let Some(first) = conversation.first() else {
            continue;
        };
        table.add_row(row![
            index,
            first.timestamp.format("%Y-%m-%d %H:%M"),
            conversation.len(),
            truncate_with_ellipsis(&first.content, TABLE_PROMPT_CHARS)
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_sessions_table_has_row_per_session() {
        let sessions = vec![ChatSession::new(), ChatSession::new()];
        let table = sessions_table(&sessions, Some(&sessions[0].id));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_images_table_keeps_stored_index() {
        let image = GeneratedImage {
            id: "a".to_string(),
            prompt: "p".repeat(60),
            negative_prompt: None,
            image_url: "/img/a.png".to_string(),
            image_data: None,
            size: "512x512".to_string(),
            style: "artistic".to_string(),
            timestamp: Utc::now(),
        };
        let table = images_table(std::iter::once((7, &image)));
        assert_eq!(table.len(), 2);
        let rendered = table.to_string();
        assert!(rendered.contains('7'));
        assert!(rendered.contains("..."));
    }

    #[test]
    fn test_conversations_table_skips_empty_groups() {
        let conversations = vec![vec![ChatMessage::user("hi")], Vec::new()];
        assert_eq!(conversations_table(&conversations).len(), 2);
    }
}
