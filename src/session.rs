//! Chat session store
//!
//! In-memory owner of every chat session, the current-session pointer
//! and the legacy flat history. The store never touches persistence
//! itself; [`crate::state::AppState`] syncs after each mutation.

use crate::models::{
    new_migrated_session_id, title_from_message, ChatMessage, ChatSession, Role,
    DEFAULT_SESSION_TITLE, MIGRATED_SESSION_TITLE,
};
use chrono::Utc;

/// Characters of the last message shown as a session preview
pub const PREVIEW_MAX_CHARS: usize = 50;

/// Sessions (newest first), the current pointer and legacy history
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Vec<ChatSession>,
    current_id: Option<String>,
    legacy_history: Vec<ChatMessage>,
}

impl SessionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from persisted parts
    ///
    /// The current id is kept as given; [`SessionStore::reconcile`]
    /// repairs it.
    pub fn from_parts(
        sessions: Vec<ChatSession>,
        legacy_history: Vec<ChatMessage>,
        current_id: Option<String>,
    ) -> Self {
        Self {
            sessions,
            current_id,
            legacy_history,
        }
    }

    /// Create a session, make it current and return its id
    pub fn create_session(&mut self) -> String {
        let mut session = ChatSession::new();
        while self.get(&session.id).is_some() {
            session = ChatSession::new();
        }
        let id = session.id.clone();
        self.sessions.insert(0, session);
        self.current_id = Some(id.clone());
        tracing::debug!(session_id = %id, "Created chat session");
        id
    }

    /// Append a message to a session
    ///
    /// Returns `false` and changes nothing when the session does not
    /// exist. The message also goes to the legacy history. The first
    /// user message names a session still carrying the default title.
    pub fn append_message(
        &mut self,
        session_id: &str,
        role: Role,
        content: impl Into<String>,
    ) -> bool {
        let Some(session) = self.sessions.iter_mut().find(|s| s.id == session_id) else {
            tracing::debug!(session_id, "Dropping message for unknown session");
            return false;
        };

        let message = ChatMessage::new(role, content);
        if role == Role::User && session.has_default_title() {
            session.title = title_from_message(&message.content);
        }
        session.last_updated = message.timestamp;
        session.messages.push(message.clone());
        self.legacy_history.push(message);
        true
    }

    /// Remove a session
    ///
    /// Deleting the current session starts a fresh one. Returns `false`
    /// when no session had that id.
    pub fn delete_session(&mut self, session_id: &str) -> bool {
        let before = self.sessions.len();
        self.sessions.retain(|s| s.id != session_id);
        if self.sessions.len() == before {
            return false;
        }

        if self.current_id.as_deref() == Some(session_id) {
            self.create_session();
        }
        tracing::debug!(session_id, "Deleted chat session");
        true
    }

    /// Point the current session at an existing session
    pub fn switch_current(&mut self, session_id: &str) -> bool {
        if self.get(session_id).is_none() {
            return false;
        }
        self.current_id = Some(session_id.to_string());
        true
    }

    /// Empty a session and restore its default title
    pub fn clear_session(&mut self, session_id: &str) -> bool {
        let Some(session) = self.get_mut(session_id) else {
            return false;
        };
        session.messages.clear();
        session.title = DEFAULT_SESSION_TITLE.to_string();
        session.last_updated = Utc::now();
        true
    }

    /// Wrap the legacy history in a single session
    ///
    /// Only acts when there are no sessions and legacy history exists;
    /// returns whether a migration happened.
    pub fn migrate_legacy_history(&mut self) -> bool {
        if !self.sessions.is_empty() || self.legacy_history.is_empty() {
            return false;
        }

        let title = self
            .legacy_history
            .iter()
            .find(|m| m.role == Role::User)
            .map(|m| title_from_message(&m.content))
            .unwrap_or_else(|| MIGRATED_SESSION_TITLE.to_string());

        let now = Utc::now();
        let session = ChatSession {
            id: new_migrated_session_id(),
            title,
            messages: self.legacy_history.clone(),
            created_at: self.legacy_history.first().map_or(now, |m| m.timestamp),
            last_updated: self.legacy_history.last().map_or(now, |m| m.timestamp),
        };

        tracing::info!(
            messages = session.messages.len(),
            "Migrated legacy chat history into a session"
        );
        self.current_id = Some(session.id.clone());
        self.sessions = vec![session];
        true
    }

    /// Repair the current pointer after loading
    ///
    /// A missing or dangling pointer moves to the first session; with no
    /// sessions it is cleared.
    pub fn reconcile(&mut self) {
        let valid = self
            .current_id
            .as_deref()
            .is_some_and(|id| self.get(id).is_some());
        if !valid {
            self.current_id = self.sessions.first().map(|s| s.id.clone());
        }
    }

    /// Drop every session and the legacy history
    pub fn clear_all(&mut self) {
        self.sessions.clear();
        self.legacy_history.clear();
        self.current_id = None;
    }

    /// Append imported messages to the legacy history
    pub fn extend_legacy(&mut self, messages: Vec<ChatMessage>) {
        self.legacy_history.extend(messages);
    }

    /// Current session id, validated against the collection
    pub fn current_id(&self) -> Option<&str> {
        self.current().map(|s| s.id.as_str())
    }

    /// The current session, if the pointer is valid
    pub fn current(&self) -> Option<&ChatSession> {
        self.current_id.as_deref().and_then(|id| self.get(id))
    }

    /// Look up a session
    pub fn get(&self, session_id: &str) -> Option<&ChatSession> {
        self.sessions.iter().find(|s| s.id == session_id)
    }

    fn get_mut(&mut self, session_id: &str) -> Option<&mut ChatSession> {
        self.sessions.iter_mut().find(|s| s.id == session_id)
    }

    /// Resolve a full id or a unique prefix of one
    pub fn resolve_id(&self, id_or_prefix: &str) -> Option<&str> {
        if let Some(session) = self.get(id_or_prefix) {
            return Some(session.id.as_str());
        }
        let mut matches = self
            .sessions
            .iter()
            .filter(|s| s.id.starts_with(id_or_prefix));
        match (matches.next(), matches.next()) {
            (Some(only), None) => Some(only.id.as_str()),
            _ => None,
        }
    }

    /// All sessions, newest first
    pub fn sessions(&self) -> &[ChatSession] {
        &self.sessions
    }

    /// The legacy flat history
    pub fn legacy_history(&self) -> &[ChatMessage] {
        &self.legacy_history
    }

    /// The last `limit` messages of a session, oldest first
    pub fn recent_context(&self, session_id: &str, limit: usize) -> Vec<ChatMessage> {
        self.get(session_id)
            .map(|s| {
                let start = s.messages.len().saturating_sub(limit);
                s.messages[start..].to_vec()
            })
            .unwrap_or_default()
    }

    /// Group the legacy history into conversations
    ///
    /// A user message closes the group in progress and opens a new one.
    pub fn legacy_conversations(&self) -> Vec<Vec<ChatMessage>> {
        let mut conversations = Vec::new();
        let mut current: Vec<ChatMessage> = Vec::new();

        for message in &self.legacy_history {
            if message.role == Role::User && !current.is_empty() {
                conversations.push(std::mem::take(&mut current));
            }
            current.push(message.clone());
        }
        if !current.is_empty() {
            conversations.push(current);
        }
        conversations
    }
}

/// One-line preview of a session's last message
pub fn session_preview(session: &ChatSession) -> String {
    match session.last_message() {
        Some(message) => format!(
            "{}...",
            message
                .content
                .chars()
                .take(PREVIEW_MAX_CHARS)
                .collect::<String>()
        ),
        None => "No messages yet".to_string(),
    }
}
