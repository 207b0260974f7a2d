//! Plain data records shared by the stores, the backend client and the
//! persistence layer.

pub mod chat;
pub mod export;
pub mod image;

pub use chat::{
    new_migrated_session_id, new_session_id, title_from_message, truncate_with_ellipsis,
    ChatMessage, ChatSession, Role, DEFAULT_SESSION_TITLE, MIGRATED_SESSION_TITLE,
    TITLE_MAX_CHARS,
};
pub use export::{ExportDocument, ImportDocument, EXPORT_VERSION};
pub use image::{
    GeneratedImage, GeneratedImageDescriptor, GenerationParams, ImageGenerationRequest,
    ImageGenerationResponse, ImageModel, ImageSize, ImageStyle, GUIDANCE_SCALE_RANGE,
    NEGATIVE_PROMPT_MAX_CHARS, NUM_IMAGES_RANGE, PROMPT_MAX_CHARS, STEPS_RANGE,
};
