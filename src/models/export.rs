//! Export and import documents
//!
//! The export format is the one the web front-end wrote, so files move
//! freely between the two clients.

use super::{ChatMessage, GeneratedImage};
use crate::error::{MyAiError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Format version written into every export
pub const EXPORT_VERSION: &str = "1.0";

/// Document written by an export
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub chat_history: Vec<ChatMessage>,
    pub image_history: Vec<GeneratedImage>,
    pub export_date: DateTime<Utc>,
    pub version: String,
}

impl ExportDocument {
    /// Snapshot the legacy history and image history
    ///
    /// Image payloads are dropped to keep the file small.
    pub fn new(chat_history: &[ChatMessage], image_history: &[GeneratedImage]) -> Self {
        Self {
            chat_history: chat_history.to_vec(),
            image_history: image_history
                .iter()
                .cloned()
                .map(|mut image| {
                    image.image_data = None;
                    image
                })
                .collect(),
            export_date: Utc::now(),
            version: EXPORT_VERSION.to_string(),
        }
    }

    /// Default file name, `ai-web-app-data-YYYY-MM-DD.json`
    pub fn default_file_name(&self) -> String {
        format!(
            "ai-web-app-data-{}.json",
            self.export_date.format("%Y-%m-%d")
        )
    }

    /// Pretty-printed JSON text
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Document accepted by an import
///
/// Both arrays are optional; anything else in the file is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportDocument {
    #[serde(default)]
    pub chat_history: Option<Vec<ChatMessage>>,
    #[serde(default)]
    pub image_history: Option<Vec<GeneratedImage>>,
}

impl ImportDocument {
    /// Parse an uploaded file
    ///
    /// # Errors
    ///
    /// Returns `MyAiError::Parse` when the text is not a valid document
    pub fn parse(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| MyAiError::Parse(format!("Invalid import file: {}", e)).into())
    }
}
