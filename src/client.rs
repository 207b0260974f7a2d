//! Backend HTTP client
//!
//! [`BackendClient`] is the seam between the controller and the network.
//! [`HttpBackend`] talks to the My-AI service over JSON; tests substitute
//! their own implementations.

use crate::error::{MyAiError, Result};
use crate::models::{
    ChatMessage, GeneratedImageDescriptor, ImageGenerationRequest, ImageGenerationResponse,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Most recent messages of the active session sent as context
pub const CHAT_CONTEXT_LIMIT: usize = 10;

const CHAT_PATH: &str = "/api/chat/message";
const IMAGES_PATH: &str = "/api/images/generate";

/// Operations the controller needs from the backend
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// Send a chat message with its conversation context
    ///
    /// Returns the assistant's reply text.
    async fn send_chat_message(
        &self,
        message: &str,
        conversation_history: &[ChatMessage],
    ) -> Result<String>;

    /// Request image generation, returning descriptors in backend order
    async fn generate_images(
        &self,
        request: &ImageGenerationRequest,
    ) -> Result<Vec<GeneratedImageDescriptor>>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    conversation_history: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    response: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

/// JSON-over-HTTP implementation of [`BackendClient`]
///
/// # Examples
///
/// ```no_run
/// use myai::client::{BackendClient, HttpBackend};
///
/// # tokio_test::block_on(async {
/// let backend = HttpBackend::new("http://localhost:8000/").unwrap();
/// assert_eq!(backend.base_url(), "http://localhost:8000");
/// let reply = backend.send_chat_message("Hello", &[]).await.unwrap();
/// println!("{}", reply);
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// Create a client for the service at `base_url`
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("myai/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MyAiError::Config(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!("Initialized backend client: base_url={}", base_url);

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<reqwest::Response> {
        let url = self.endpoint(path);
        self.client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Request to {} failed: {}", url, e);
                MyAiError::Request {
                    status: None,
                    message: e.to_string(),
                }
                .into()
            })
    }
}

#[async_trait]
impl BackendClient for HttpBackend {
    async fn send_chat_message(
        &self,
        message: &str,
        conversation_history: &[ChatMessage],
    ) -> Result<String> {
        tracing::debug!(
            "Sending chat message: {} chars, {} context messages",
            message.chars().count(),
            conversation_history.len()
        );

        let response = self
            .post(
                CHAT_PATH,
                &ChatRequest {
                    message,
                    conversation_history,
                },
            )
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Chat endpoint returned error {}: {}", status, error_text);
            return Err(MyAiError::status(
                status.as_u16(),
                format!("HTTP error! status: {}", status.as_u16()),
            )
            .into());
        }

        let body: ChatResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse chat response: {}", e);
            MyAiError::Request {
                status: Some(status.as_u16()),
                message: format!("Failed to parse chat response: {}", e),
            }
        })?;

        Ok(body.response)
    }

    async fn generate_images(
        &self,
        request: &ImageGenerationRequest,
    ) -> Result<Vec<GeneratedImageDescriptor>> {
        tracing::debug!(
            "Requesting {} image(s): model={}, size={}, steps={}",
            request.num_images,
            request.model,
            request.size,
            request.steps
        );

        let response = self.post(IMAGES_PATH, request).await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Image endpoint returned error {}: {}", status, error_text);
            let message = serde_json::from_str::<ErrorBody>(&error_text)
                .ok()
                .and_then(|body| body.detail)
                .unwrap_or_else(|| "Failed to generate image".to_string());
            return Err(MyAiError::status(status.as_u16(), message).into());
        }

        let body: ImageGenerationResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse image response: {}", e);
            MyAiError::Request {
                status: Some(status.as_u16()),
                message: format!("Failed to parse image response: {}", e),
            }
        })?;

        tracing::debug!(
            "Received {} image(s), generation_time={:?}, request_id={:?}",
            body.images.len(),
            body.generation_time,
            body.request_id
        );
        Ok(body.images)
    }
}
