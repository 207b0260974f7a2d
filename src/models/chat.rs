//! Chat message and session records
//!
//! These are the records persisted under the chat keys and sent to the
//! backend as conversation context. Sessions serialize with camelCase
//! keys so existing stored data keeps loading.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Title given to a session until its first user message arrives
pub const DEFAULT_SESSION_TITLE: &str = "New Chat";

/// Title of a session migrated from legacy history without user messages
pub const MIGRATED_SESSION_TITLE: &str = "Migrated Chat";

/// Number of characters kept when deriving a title from a message
pub const TITLE_MAX_CHARS: usize = 30;

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Message typed by the user
    User,
    /// Reply produced by the backend
    Assistant,
    /// Accepted from the wire, never created by the client
    System,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
            Self::System => write!(f, "system"),
        }
    }
}

/// A single chat message
///
/// # Examples
///
/// ```
/// use myai::models::{ChatMessage, Role};
///
/// let message = ChatMessage::user("Hello");
/// assert_eq!(message.role, Role::User);
/// assert_eq!(message.content, "Hello");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who wrote the message
    pub role: Role,
    /// Message text
    pub content: String,
    /// When the message was created
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// Create a message stamped with the current time
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// A named conversation thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    /// Unique time-based identifier
    pub id: String,
    /// Display title
    pub title: String,
    /// Messages in insertion order
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Time of the last mutation
    pub last_updated: DateTime<Utc>,
}

impl ChatSession {
    /// Create an empty session with a fresh id and the default title
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: new_session_id(),
            title: DEFAULT_SESSION_TITLE.to_string(),
            messages: Vec::new(),
            created_at: now,
            last_updated: now,
        }
    }

    /// Whether the title is still the placeholder
    pub fn has_default_title(&self) -> bool {
        self.title == DEFAULT_SESSION_TITLE
    }

    /// The most recent message, if any
    pub fn last_message(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate a session id
///
/// ULIDs embed the creation time and stay unique within a millisecond.
pub fn new_session_id() -> String {
    format!("session_{}", Ulid::new())
}

/// Generate an id for a session migrated from legacy history
pub fn new_migrated_session_id() -> String {
    format!("session_migrated_{}", Ulid::new())
}

/// Keep the first `max_chars` characters, adding `...` when anything was cut
///
/// # Examples
///
/// ```
/// use myai::models::truncate_with_ellipsis;
///
/// assert_eq!(truncate_with_ellipsis("Hello", 30), "Hello");
/// assert_eq!(truncate_with_ellipsis("abcdef", 3), "abc...");
/// ```
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Derive a session title from the first user message
pub fn title_from_message(content: &str) -> String {
    truncate_with_ellipsis(content, TITLE_MAX_CHARS)
}
