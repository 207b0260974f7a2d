//! Persistence adapter
//!
//! Serializes the client state to JSON text under four fixed keys of a
//! [`KeyValueStore`]. Reads never fail: a missing key means an empty
//! collection, and a malformed one is replaced by its default with a
//! warning the caller can show.

use crate::error::{MyAiError, Result};
use crate::models::{ChatMessage, ChatSession, GeneratedImage};
use crate::storage::KeyValueStore;
use serde::de::DeserializeOwned;

/// Legacy flat chat history
pub const CHAT_HISTORY_KEY: &str = "ai-web-app-chat-history";
/// Generated image history
pub const IMAGE_HISTORY_KEY: &str = "ai-web-app-image-history";
/// Chat sessions
pub const CHAT_SESSIONS_KEY: &str = "ai-web-app-chat-sessions";
/// Current session id, empty when there is none
pub const CURRENT_SESSION_KEY: &str = "ai-web-app-current-session";

/// Everything read back at startup
#[derive(Debug, Clone, Default)]
pub struct LoadedState {
    pub sessions: Vec<ChatSession>,
    pub legacy_history: Vec<ChatMessage>,
    pub image_history: Vec<GeneratedImage>,
    pub current_session_id: Option<String>,
    /// Human-readable problems met while loading
    pub warnings: Vec<String>,
}

/// Reads and writes the serialized client state
pub struct Persistence {
    store: Box<dyn KeyValueStore>,
}

impl Persistence {
    /// Wrap a key-value store
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Write all four keys
    ///
    /// # Errors
    ///
    /// Returns `MyAiError::Storage` when serialization or a write fails.
    /// Keys written before the failure keep their new value.
    pub fn save(
        &self,
        sessions: &[ChatSession],
        legacy_history: &[ChatMessage],
        image_history: &[GeneratedImage],
        current_session_id: Option<&str>,
    ) -> Result<()> {
        let chat_json = to_json(legacy_history)?;
        let image_json = to_json(image_history)?;
        let sessions_json = to_json(sessions)?;

        self.store.set(CHAT_HISTORY_KEY, &chat_json)?;
        self.store.set(IMAGE_HISTORY_KEY, &image_json)?;
        self.store.set(CHAT_SESSIONS_KEY, &sessions_json)?;
        self.store
            .set(CURRENT_SESSION_KEY, current_session_id.unwrap_or(""))?;

        tracing::debug!(
            sessions = sessions.len(),
            legacy_messages = legacy_history.len(),
            images = image_history.len(),
            "Saved client state"
        );
        Ok(())
    }

    /// Read all four keys
    pub fn load(&self) -> LoadedState {
        let mut state = LoadedState::default();

        state.legacy_history = self.read_json(CHAT_HISTORY_KEY, &mut state.warnings);
        state.image_history = self.read_json(IMAGE_HISTORY_KEY, &mut state.warnings);
        state.sessions = self.read_json(CHAT_SESSIONS_KEY, &mut state.warnings);

        state.current_session_id = match self.store.get(CURRENT_SESSION_KEY) {
            Ok(Some(id)) if !id.is_empty() => Some(id),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", CURRENT_SESSION_KEY, e);
                state.warnings.push(format!("Failed to load stored data: {}", e));
                None
            }
        };

        tracing::debug!(
            sessions = state.sessions.len(),
            legacy_messages = state.legacy_history.len(),
            images = state.image_history.len(),
            "Loaded client state"
        );
        state
    }

    fn read_json<T: DeserializeOwned + Default>(&self, key: &str, warnings: &mut Vec<String>) -> T {
        let text = match self.store.get(key) {
            Ok(Some(text)) => text,
            Ok(None) => return T::default(),
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", key, e);
                warnings.push(format!("Failed to load stored data: {}", e));
                return T::default();
            }
        };

        match serde_json::from_str(&text) {
            Ok(value) => value,
            Err(e) => {
                let err = MyAiError::Parse(format!("Malformed value under {}: {}", key, e));
                tracing::warn!("{}", err);
                warnings.push(err.to_string());
                T::default()
            }
        }
    }
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string(value)
        .map_err(|e| MyAiError::Storage(format!("Failed to serialize state: {}", e)).into())
}
