//! myai - terminal client library for the My-AI chat and image service
//!
//! This library provides the client-side state of the service's
//! front-end: chat sessions, generated image history, their persistence,
//! the HTTP client for the backend and the controller that ties them to
//! a view.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `models`: Chat, image and export records
//! - `session`: Chat session store
//! - `images`: Generated image history
//! - `storage`: Key-value stores (`sled` on disk, in-memory for tests)
//! - `persistence`: JSON serialization of the client state
//! - `state`: Application state kept in sync with storage
//! - `client`: Backend client trait and HTTP implementation
//! - `controller`: Event dispatch, validation and render requests
//! - `commands`: Terminal front-end
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use myai::client::HttpBackend;
//! use myai::commands::TerminalView;
//! use myai::controller::{Controller, UiEvent};
//! use myai::persistence::Persistence;
//! use myai::state::AppState;
//! use myai::storage::SledStore;
//! use myai::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let state = AppState::restore(Persistence::new(Box::new(SledStore::new()?)));
//!     let backend = HttpBackend::new(&config.api.base_url)?;
//!     let mut controller = Controller::new(backend, state, TerminalView::new(), &config);
//!     controller
//!         .dispatch(UiEvent::SendMessage("Hello".to_string()))
//!         .await;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod controller;
pub mod error;
pub mod images;
pub mod models;
pub mod persistence;
pub mod session;
pub mod state;
pub mod storage;

// Re-export commonly used types
pub use client::{BackendClient, HttpBackend};
pub use config::Config;
pub use controller::{Controller, UiEvent, View};
pub use error::{MyAiError, Result};
pub use state::AppState;
