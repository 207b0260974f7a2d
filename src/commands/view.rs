//! Terminal rendering of the controller's regions
//!
//! A terminal cannot repaint a region in place, so the view remembers
//! what it already printed and only writes what changed. Switching tabs
//! resets that memory so the next render prints the region in full.

use crate::commands::history::{conversations_table, images_table, sessions_table};
use crate::controller::{Region, Tab, Toast, ToastKind, UiState, View};
use crate::images::RESTORE_DISPLAY_COUNT;
use crate::models::{ChatMessage, Role};
use crate::state::AppState;
use colored::Colorize;

/// [`View`] that prints to stdout and stderr
#[derive(Debug, Default)]
pub struct TerminalView {
    /// Session whose transcript is on screen, and how much of it
    shown_session: Option<String>,
    shown_messages: usize,
    shown_last: Option<ChatMessage>,
    /// Snapshot of the last sidebar printed
    shown_sidebar: Vec<(String, String, bool)>,
    failures: usize,
}

impl TerminalView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Error notifications shown so far
    pub fn failures(&self) -> usize {
        self.failures
    }

    fn render_messages(&mut self, state: &AppState, ui: &UiState) {
        let Some(session) = state.current_session() else {
            if self.shown_session.take().is_some() {
                println!("{}", "No active chat. Type a message to start one.".dimmed());
            }
            self.shown_messages = 0;
            self.shown_last = None;
            return;
        };

        if self.shown_session.as_deref() != Some(session.id.as_str()) {
            println!("\n{} {}", "Chat:".bold(), session.title.cyan());
            if session.messages.is_empty() {
                println!("{}", "Start a conversation by typing a message.".dimmed());
            }
            self.shown_session = Some(session.id.clone());
            self.shown_messages = 0;
            self.shown_last = None;
        }

        // cleared in place: the last message printed is no longer where it was
        if self.shown_messages > 0
            && session.messages.get(self.shown_messages - 1) != self.shown_last.as_ref()
        {
            println!("{}", "(chat cleared)".dimmed());
            self.shown_messages = 0;
        }

        for message in &session.messages[self.shown_messages..] {
            print_message(message);
        }
        self.shown_messages = session.messages.len();
        self.shown_last = session.messages.last().cloned();

        if ui.loading.chat {
            println!("{}", "Assistant is typing...".dimmed().italic());
        }
    }

    fn render_sidebar(&mut self, state: &AppState, ui: &UiState) {
        if !ui.sidebar_open {
            return;
        }
        let current = state.sessions().current_id();
        let snapshot: Vec<(String, String, bool)> = state
            .sessions()
            .sessions()
            .iter()
            .map(|s| (s.id.clone(), s.title.clone(), Some(s.id.as_str()) == current))
            .collect();
        if snapshot == self.shown_sidebar {
            return;
        }
        self.shown_sidebar = snapshot;

        if state.sessions().sessions().is_empty() {
            println!("{}", "No chat sessions yet.".yellow());
            return;
        }
        println!("\n{}", "Chats:".bold());
        sessions_table(state.sessions().sessions(), current).printstd();
    }

    fn render_history(&self, state: &AppState) {
        let conversations = state.sessions().legacy_conversations();
        println!("\n{}", "Chat history:".bold());
        if conversations.is_empty() {
            println!("{}", "No chat history yet.".yellow());
        } else {
            conversations_table(&conversations).printstd();
        }

        println!("\n{}", "Image history:".bold());
        if state.images().is_empty() {
            println!("{}", "No images generated yet.".yellow());
        } else {
            images_table(state.images().recent_first()).printstd();
        }
    }

    fn render_images(&self, state: &AppState, ui: &UiState) {
        if state.images().is_empty() {
            return;
        }
        let count = if ui.last_results.is_empty() {
            RESTORE_DISPLAY_COUNT
        } else {
            ui.last_results.len()
        };
        println!("\n{}", "Recent images:".bold());
        images_table(state.images().latest(count)).printstd();
    }

    fn render_image_form(&self, ui: &UiState) {
        let form = &ui.form;
        let seed = form
            .seed
            .map(|s| s.to_string())
            .unwrap_or_else(|| "random".to_string());
        println!(
            "{} model={} size={} style={} images={} guidance={} steps={} seed={}",
            "Image settings:".bold(),
            form.model.to_string().cyan(),
            form.size.to_string().cyan(),
            form.style.to_string().cyan(),
            form.num_images,
            form.guidance_scale,
            form.steps,
            seed.cyan()
        );
        if ui.loading.images {
            println!("{}", "Generating image...".dimmed().italic());
        }
    }

    fn render_tabs(&mut self, ui: &UiState) {
        self.shown_session = None;
        self.shown_messages = 0;
        self.shown_last = None;
        self.shown_sidebar.clear();

        let label = |tab: Tab, name: &str| {
            if ui.active_tab == tab {
                format!("[{}]", name).bold().to_string()
            } else {
                name.dimmed().to_string()
            }
        };
        println!(
            "\n{}  {}  {}",
            label(Tab::Chat, "Chat"),
            label(Tab::Image, "Image"),
            label(Tab::History, "History")
        );
    }
}

impl View for TerminalView {
    fn render(&mut self, region: Region, state: &AppState, ui: &UiState) {
        match region {
            Region::Messages => self.render_messages(state, ui),
            Region::Sidebar => self.render_sidebar(state, ui),
            Region::History => self.render_history(state),
            Region::Images => self.render_images(state, ui),
            Region::ImageForm => self.render_image_form(ui),
            Region::Tabs => self.render_tabs(ui),
        }
    }

    fn notify(&mut self, toast: Toast) {
        match toast.kind {
            ToastKind::Success => println!("{} {}", "✓".green(), toast.message.green()),
            ToastKind::Info => println!("{} {}", "i".blue(), toast.message),
            ToastKind::Warning => eprintln!("{} {}", "!".yellow(), toast.message.yellow()),
            ToastKind::Error => {
                self.failures += 1;
                eprintln!("{} {}", "✗".red(), toast.message.red());
            }
        }
    }
}

fn print_message(message: &ChatMessage) {
    let who = match message.role {
        Role::User => "You".green().bold(),
        Role::Assistant => "AI".cyan().bold(),
        Role::System => "System".magenta().bold(),
    };
    println!(
        "{} {}\n{}\n",
        who,
        message.timestamp.format("%H:%M").to_string().dimmed(),
        message.content
    );
}
