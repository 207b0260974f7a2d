/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

- `chat`    - Interactive chat client
- `image`   - One-shot image generation
- `history` - Session and image listings
- `data`    - Export, import and clear
*/

use crate::client::HttpBackend;
use crate::config::Config;
use crate::controller::Controller;
use crate::error::{MyAiError, Result};
use crate::persistence::Persistence;
use crate::state::AppState;
use crate::storage::SledStore;

// Special commands parser for the interactive loop
pub mod special_commands;

// Session and image listings
pub mod history;

// Terminal rendering
pub mod view;

pub use view::TerminalView;

/// Controller wired to the HTTP backend and the terminal
pub type TerminalController = Controller<HttpBackend, TerminalView>;

/// Open the configured store and restore state from it
pub fn open_state(config: &Config) -> Result<AppState> {
    let store = match &config.storage.path {
        Some(path) => SledStore::new_with_path(path.clone())?,
        None => SledStore::new()?,
    };
    tracing::debug!("Using state store at {}", store.path().display());
    Ok(AppState::restore(Persistence::new(Box::new(store))))
}

/// Build a controller over the configured store and backend
pub fn open_controller(config: &Config) -> Result<TerminalController> {
    let state = open_state(config)?;
    let backend = HttpBackend::new(&config.api.base_url)?;
    Ok(Controller::new(backend, state, TerminalView::new(), config))
}

/// Turn error notifications from a one-shot command into a failure
fn check_failures(view: &TerminalView) -> Result<()> {
    match view.failures() {
        0 => Ok(()),
        n => Err(MyAiError::Validation(format!("{} operation(s) failed", n)).into()),
    }
}

// Chat command handler
pub mod chat {
    //! Interactive chat client.
    //!
    //! Lines are read on a blocking thread and handed to an async loop
    //! over a channel. Backend requests run on their own tasks, so the
    //! prompt stays live while a reply or an image is on its way; the
    //! controller's loading gates turn away duplicate submissions.

    use super::*;
    use crate::client::BackendClient;
    use crate::commands::special_commands::{parse_special_command, print_help, SpecialCommand};
    use crate::controller::{Completion, UiEvent, View};
    use colored::Colorize;
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;
    use tokio::sync::mpsc;

    /// What the loop should do after a line
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Flow {
        Continue,
        Exit,
    }

    /// Start the interactive client
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    ///
    /// # Errors
    ///
    /// Returns error if storage cannot be opened or the terminal cannot
    /// be put into line-editing mode
    pub async fn run_chat(config: Config) -> Result<()> {
        tracing::info!("Starting interactive chat");

        let mut controller = open_controller(&config)?;

        print_welcome_banner(&config);
        controller.start();

        let (line_tx, line_rx) = mpsc::channel::<String>(1);
        let (ready_tx, mut ready_rx) = mpsc::unbounded_channel::<()>();
        let reader = tokio::task::spawn_blocking(move || -> rustyline::Result<()> {
            let mut rl = DefaultEditor::new()?;
            // one line per ready signal, so the terminal is released on exit
            while ready_rx.blocking_recv().is_some() {
                let prompt = format!("{} ", ">".green().bold());
                match rl.readline(&prompt) {
                    Ok(line) => {
                        let trimmed = line.trim();
                        if !trimmed.is_empty() {
                            rl.add_history_entry(trimmed)?;
                        }
                        if line_tx.blocking_send(trimmed.to_string()).is_err() {
                            break;
                        }
                    }
                    Err(ReadlineError::Interrupted) => {
                        println!("CTRL-C");
                        break;
                    }
                    Err(ReadlineError::Eof) => {
                        println!("CTRL-D");
                        break;
                    }
                    Err(err) => {
                        tracing::error!("Readline error: {:?}", err);
                        return Err(err);
                    }
                }
            }
            Ok(())
        });

        drive(&mut controller, line_rx, ready_tx).await;
        reader.await??;

        println!("Goodbye!");
        Ok(())
    }

    /// Feed input lines to the controller until exit or end of input
    ///
    /// A unit is sent on `ready` whenever the loop can take another
    /// line. Requests are run on spawned tasks against a clone of the
    /// controller's backend and completed as their results arrive.
    pub async fn drive<B, V>(
        controller: &mut Controller<B, V>,
        mut lines: mpsc::Receiver<String>,
        ready: mpsc::UnboundedSender<()>,
    ) where
        B: BackendClient + Clone + 'static,
        V: View,
    {
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<Completion>();
        signal_ready(&ready);

        loop {
            tokio::select! {
                line = lines.recv() => {
                    let Some(line) = line else {
                        break;
                    };
                    if handle_line(controller, &line, &done_tx) == Flow::Exit {
                        break;
                    }
                    signal_ready(&ready);
                }
                Some(completion) = done_rx.recv() => controller.complete(completion),
            }
        }
    }

    /// Turn one input line into controller work
    pub fn handle_line<B, V>(
        controller: &mut Controller<B, V>,
        line: &str,
        done: &mpsc::UnboundedSender<Completion>,
    ) -> Flow
    where
        B: BackendClient + Clone + 'static,
        V: View,
    {
        let line = line.trim();
        if line.is_empty() {
            return Flow::Continue;
        }

        let event = match parse_special_command(line) {
            Ok(SpecialCommand::Event(event)) => event,
            Ok(SpecialCommand::GenerateImage(prompt)) => {
                UiEvent::GenerateImages(controller.ui().form.clone().with_prompt(prompt))
            }
            Ok(SpecialCommand::Help) => {
                print_help();
                return Flow::Continue;
            }
            Ok(SpecialCommand::Exit) => return Flow::Exit,
            Ok(SpecialCommand::None) => UiEvent::SendMessage(line.to_string()),
            Err(e) => {
                eprintln!("{}", e.to_string().red());
                return Flow::Continue;
            }
        };

        if let Some(request) = controller.submit(event) {
            let backend = controller.backend().clone();
            let done = done.clone();
            tokio::spawn(async move {
                let completion = request.run(&backend).await;
                if done.send(completion).is_err() {
                    tracing::debug!("Request finished after the chat loop ended");
                }
            });
        }
        Flow::Continue
    }

    fn signal_ready(ready: &mpsc::UnboundedSender<()>) {
        if ready.send(()).is_err() {
            tracing::debug!("Line reader has stopped");
        }
    }

    fn print_welcome_banner(config: &Config) {
        println!(
            "\n{}\n{}",
            "myai - AI chat and image generation".bold(),
            format!("Backend: {}", config.api.base_url).dimmed()
        );
        println!(
            "Type a message to chat, {} for commands, {} to leave.",
            "/help".cyan(),
            "/exit".cyan()
        );
    }
}

// Image command handler
pub mod image {
    //! One-shot image generation.

    use super::*;
    use crate::cli::ImageArgs;
    use crate::controller::{save_image, ImageForm, UiEvent};
    use colored::Colorize;

    /// Build the form from configured defaults and command-line knobs
    pub fn form_from_args(config: &Config, args: &ImageArgs) -> ImageForm {
        let mut form = ImageForm::from_defaults(&config.images).with_prompt(args.prompt.clone());
        if let Some(negative) = &args.negative {
            form.negative_prompt = negative.clone();
        }
        if let Some(model) = args.model {
            form.model = model;
        }
        if let Some(size) = args.size {
            form.size = size;
        }
        if let Some(style) = args.style {
            form.style = style;
        }
        if let Some(num_images) = args.num_images {
            form.num_images = num_images;
        }
        if let Some(guidance_scale) = args.guidance_scale {
            form.guidance_scale = guidance_scale;
        }
        if let Some(steps) = args.steps {
            form.steps = steps;
        }
        form.seed = args.seed;
        form
    }

    /// Generate images and optionally save them
    ///
    /// # Errors
    ///
    /// Returns error if the request is rejected or fails, or an image
    /// cannot be written
    pub async fn run_image(config: Config, args: ImageArgs) -> Result<()> {
        let mut controller = open_controller(&config)?;
        let before = controller.state().images().len();

        controller
            .dispatch(UiEvent::GenerateImages(form_from_args(&config, &args)))
            .await;
        check_failures(controller.view())?;

        if let Some(dir) = &args.output_dir {
            std::fs::create_dir_all(dir)?;
            let images = controller.state().images();
            for index in before..images.len() {
                if let Some(image) = images.get(index) {
                    let path = save_image(image, dir)?;
                    println!("{} {}", "Saved".green(), path.display());
                }
            }
        }
        Ok(())
    }
}

// Export, import and clear handlers
pub mod data {
    //! Local data management.

    use super::*;
    use crate::controller::UiEvent;
    use std::io::Write;
    use std::path::PathBuf;

    /// Write the export file
    pub async fn export(config: Config, output: Option<PathBuf>) -> Result<()> {
        let mut controller = open_controller(&config)?;
        controller.dispatch(UiEvent::ExportData(output)).await;
        check_failures(controller.view())
    }

    /// Merge an export file into local history
    pub async fn import(config: Config, file: PathBuf) -> Result<()> {
        let mut controller = open_controller(&config)?;
        controller.dispatch(UiEvent::ImportData(file)).await;
        check_failures(controller.view())
    }

    /// Delete everything after confirmation
    pub async fn clear(config: Config, yes: bool) -> Result<()> {
        if !yes && !confirm("Clear all data? This action cannot be undone. [y/N] ")? {
            println!("Aborted.");
            return Ok(());
        }
        let mut controller = open_controller(&config)?;
        controller.dispatch(UiEvent::ClearAllData).await;
        check_failures(controller.view())
    }

    fn confirm(question: &str) -> Result<bool> {
        print!("{}", question);
        std::io::stdout().flush()?;
        let mut answer = String::new();
        std::io::stdin().read_line(&mut answer)?;
        Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
    }
}
