//! Application state
//!
//! [`AppState`] owns the session store, the image history and the
//! persistence adapter. Every mutating method writes the whole state
//! back to storage before returning. A failed write never rolls back the
//! in-memory change; it is logged and queued as a warning for the
//! front-end to show.

use crate::images::ImageHistory;
use crate::models::{ChatMessage, ChatSession, GeneratedImage, ImportDocument, Role};
use crate::persistence::Persistence;
use crate::session::SessionStore;

/// Counts of records merged by an import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub messages: usize,
    pub images: usize,
}

/// In-memory client state kept in sync with storage
pub struct AppState {
    sessions: SessionStore,
    images: ImageHistory,
    persistence: Persistence,
    pending_warnings: Vec<String>,
}

impl AppState {
    /// Load persisted state and reconcile it
    ///
    /// Existing sessions get their current pointer repaired. Without
    /// sessions, a non-empty legacy history is migrated into one session
    /// and written back.
    pub fn restore(persistence: Persistence) -> Self {
        let loaded = persistence.load();
        let mut state = Self {
            sessions: SessionStore::from_parts(
                loaded.sessions,
                loaded.legacy_history,
                loaded.current_session_id,
            ),
            images: ImageHistory::from_images(loaded.image_history),
            persistence,
            pending_warnings: loaded.warnings,
        };

        if state.sessions.sessions().is_empty() {
            if state.sessions.migrate_legacy_history() {
                state.sync();
            }
        } else {
            state.sessions.reconcile();
        }

        tracing::info!(
            sessions = state.sessions.sessions().len(),
            images = state.images.len(),
            "Restored client state"
        );
        state
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn images(&self) -> &ImageHistory {
        &self.images
    }

    /// The current session, if any
    pub fn current_session(&self) -> Option<&ChatSession> {
        self.sessions.current()
    }

    /// Create a session and make it current
    pub fn create_session(&mut self) -> String {
        let id = self.sessions.create_session();
        self.sync();
        id
    }

    /// Append a message; `false` when the session does not exist
    pub fn append_message(&mut self, session_id: &str, role: Role, content: &str) -> bool {
        let appended = self.sessions.append_message(session_id, role, content);
        if appended {
            self.sync();
        }
        appended
    }

    pub fn delete_session(&mut self, session_id: &str) -> bool {
        let deleted = self.sessions.delete_session(session_id);
        if deleted {
            self.sync();
        }
        deleted
    }

    pub fn switch_session(&mut self, session_id: &str) -> bool {
        let switched = self.sessions.switch_current(session_id);
        if switched {
            self.sync();
        }
        switched
    }

    pub fn clear_session(&mut self, session_id: &str) -> bool {
        let cleared = self.sessions.clear_session(session_id);
        if cleared {
            self.sync();
        }
        cleared
    }

    /// Append generated images in order
    pub fn add_images(&mut self, images: Vec<GeneratedImage>) {
        if images.is_empty() {
            return;
        }
        for image in images {
            self.images.append(image);
        }
        self.sync();
    }

    /// Remove an image by stored index
    pub fn delete_image(&mut self, index: usize) -> Option<GeneratedImage> {
        let removed = self.images.delete_at(index);
        if removed.is_some() {
            self.sync();
        }
        removed
    }

    /// Merge an imported document by appending
    pub fn import(&mut self, document: ImportDocument) -> ImportSummary {
        let mut summary = ImportSummary::default();
        if let Some(messages) = document.chat_history {
            summary.messages = messages.len();
            self.sessions.extend_legacy(messages);
        }
        if let Some(images) = document.image_history {
            summary.images = images.len();
            self.images.extend(images);
        }
        self.sync();
        summary
    }

    /// Drop every session, message and image
    pub fn clear_all(&mut self) {
        self.sessions.clear_all();
        self.images.clear();
        self.sync();
    }

    /// The legacy flat history
    pub fn legacy_history(&self) -> &[ChatMessage] {
        self.sessions.legacy_history()
    }

    /// Take the warnings queued since the last call
    pub fn drain_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.pending_warnings)
    }

    fn sync(&mut self) {
        let result = self.persistence.save(
            self.sessions.sessions(),
            self.sessions.legacy_history(),
            self.images.as_slice(),
            self.sessions.current_id(),
        );
        if let Err(e) = result {
            tracing::warn!("Failed to save client state: {}", e);
            self.pending_warnings
                .push(format!("Could not save data: {}", e));
        }
    }
}
