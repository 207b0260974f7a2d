//! Command-line interface definition for myai
//!
//! This module defines the CLI structure using clap's derive API,
//! providing the interactive chat client plus one-shot commands for
//! image generation and local data management.

use crate::models::{ImageModel, ImageSize, ImageStyle};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// myai - terminal client for the My-AI chat and image service
///
/// Chat with the assistant, generate images and manage the locally
/// stored history.
#[derive(Parser, Debug, Clone)]
#[command(name = "myai")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the local storage database path
    #[arg(long)]
    pub storage_path: Option<PathBuf>,

    /// Override the backend base URL
    #[arg(long)]
    pub api_base: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for myai
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the interactive chat client
    Chat,

    /// Generate images from a prompt
    Image(ImageArgs),

    /// Manage chat sessions
    Sessions {
        #[command(subcommand)]
        command: SessionCommand,
    },

    /// Manage generated image history
    Images {
        #[command(subcommand)]
        command: ImageCommand,
    },

    /// Export chat and image history to a JSON file
    Export {
        /// Output file (defaults to ai-web-app-data-YYYY-MM-DD.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Merge a previously exported file into local history
    Import {
        /// File produced by `export`
        file: PathBuf,
    },

    /// Delete all sessions, messages and images
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Options for one-shot image generation
///
/// Knobs left unset fall back to the configured defaults.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ImageArgs {
    /// Text prompt
    pub prompt: String,

    /// What to avoid in the image
    #[arg(short, long)]
    pub negative: Option<String>,

    /// Model (sdxl, sd_turbo, playground, realistic)
    #[arg(short, long)]
    pub model: Option<ImageModel>,

    /// Size (512x512, 768x768, 1024x1024)
    #[arg(long)]
    pub size: Option<ImageSize>,

    /// Style (realistic, artistic, cartoon, abstract)
    #[arg(long)]
    pub style: Option<ImageStyle>,

    /// Number of images (1-4)
    #[arg(long)]
    pub num_images: Option<u32>,

    /// How closely to follow the prompt (1.0-20.0)
    #[arg(long)]
    pub guidance_scale: Option<f32>,

    /// Denoising steps (10-50)
    #[arg(long)]
    pub steps: Option<u32>,

    /// Seed for reproducible output
    #[arg(long)]
    pub seed: Option<u64>,

    /// Also save each image as a PNG into this directory
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
}

/// Session management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum SessionCommand {
    /// List sessions, newest first
    List,

    /// Print every message of a session
    Show {
        /// Session id or unique prefix
        id: String,
    },

    /// Delete a session
    Delete {
        /// Session id or unique prefix
        id: String,
    },
}

/// Image history subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ImageCommand {
    /// List generated images, most recent first
    List,

    /// Delete an image by its history index
    Delete {
        /// Index shown by `images list`
        index: usize,
    },

    /// Save an image's PNG data to disk
    Download {
        /// Index shown by `images list`
        index: usize,

        /// Target directory
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            storage_path: None,
            api_base: None,
            command: Commands::Chat,
        }
    }
}
