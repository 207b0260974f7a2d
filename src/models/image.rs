//! Image generation request, response and history records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Longest accepted image prompt, in characters
pub const PROMPT_MAX_CHARS: usize = 1000;
/// Longest accepted negative prompt, in characters
pub const NEGATIVE_PROMPT_MAX_CHARS: usize = 500;
/// Accepted range for the number of images per request
pub const NUM_IMAGES_RANGE: std::ops::RangeInclusive<u32> = 1..=4;
/// Accepted range for the guidance scale
pub const GUIDANCE_SCALE_RANGE: std::ops::RangeInclusive<f32> = 1.0..=20.0;
/// Accepted range for the number of denoising steps
pub const STEPS_RANGE: std::ops::RangeInclusive<u32> = 10..=50;

fn parse_choice<T: Copy>(what: &str, input: &str, choices: &[(&str, T)]) -> Result<T, String> {
    let wanted = input.trim().to_lowercase();
    choices
        .iter()
        .find(|(wire, _)| *wire == wanted)
        .map(|(_, value)| *value)
        .ok_or_else(|| {
            let names: Vec<&str> = choices.iter().map(|(wire, _)| *wire).collect();
            format!(
                "Unknown {}: {}. Must be one of: {}",
                what,
                wanted,
                names.join(", ")
            )
        })
}

/// Backend image model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ImageModel {
    #[default]
    Sdxl,
    SdTurbo,
    Playground,
    Realistic,
}

impl ImageModel {
    /// Every accepted value, in backend order
    pub const ALL: [ImageModel; 4] = [
        Self::Sdxl,
        Self::SdTurbo,
        Self::Playground,
        Self::Realistic,
    ];

    /// Wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sdxl => "sdxl",
            Self::SdTurbo => "sd_turbo",
            Self::Playground => "playground",
            Self::Realistic => "realistic",
        }
    }
}

/// Output dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ImageSize {
    #[serde(rename = "512x512")]
    Small,
    #[default]
    #[serde(rename = "768x768")]
    Medium,
    #[serde(rename = "1024x1024")]
    Large,
}

impl ImageSize {
    /// Every accepted value, in backend order
    pub const ALL: [ImageSize; 3] = [Self::Small, Self::Medium, Self::Large];

    /// Wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Small => "512x512",
            Self::Medium => "768x768",
            Self::Large => "1024x1024",
        }
    }
}

/// Rendering style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ImageStyle {
    #[default]
    Realistic,
    Artistic,
    Cartoon,
    Abstract,
}

impl ImageStyle {
    /// Every accepted value, in backend order
    pub const ALL: [ImageStyle; 4] = [
        Self::Realistic,
        Self::Artistic,
        Self::Cartoon,
        Self::Abstract,
    ];

    /// Wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Realistic => "realistic",
            Self::Artistic => "artistic",
            Self::Cartoon => "cartoon",
            Self::Abstract => "abstract",
        }
    }
}

impl fmt::Display for ImageModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ImageStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let choices: Vec<(&str, Self)> = Self::ALL.iter().map(|m| (m.as_str(), *m)).collect();
        parse_choice("model", s, &choices)
    }
}

impl FromStr for ImageSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let choices: Vec<(&str, Self)> = Self::ALL.iter().map(|m| (m.as_str(), *m)).collect();
        parse_choice("size", s, &choices)
    }
}

impl FromStr for ImageStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let choices: Vec<(&str, Self)> = Self::ALL.iter().map(|m| (m.as_str(), *m)).collect();
        parse_choice("style", s, &choices)
    }
}

/// Body of `POST /api/images/generate`
///
/// `seed` is always serialized; `None` becomes `null`, letting the
/// backend pick one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageGenerationRequest {
    pub prompt: String,
    pub negative_prompt: String,
    pub model: ImageModel,
    pub size: ImageSize,
    pub style: ImageStyle,
    pub num_images: u32,
    pub guidance_scale: f32,
    pub steps: u32,
    pub seed: Option<u64>,
}

/// Parameters the backend echoes back with every image
///
/// All fields are optional because the backend is free to omit them;
/// anything unknown is kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guidance_scale: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_prompt: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One image as returned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedImageDescriptor {
    #[serde(default)]
    pub image_id: Option<String>,
    pub prompt: String,
    #[serde(default)]
    pub negative_prompt: Option<String>,
    pub image_url: String,
    #[serde(default)]
    pub image_data: Option<String>,
    #[serde(default)]
    pub generation_params: GenerationParams,
}

/// Body returned by `POST /api/images/generate`
#[derive(Debug, Clone, Deserialize)]
pub struct ImageGenerationResponse {
    pub images: Vec<GeneratedImageDescriptor>,
    #[serde(default)]
    pub generation_time: Option<f64>,
    #[serde(default)]
    pub request_id: Option<String>,
}

/// A generated image kept in local history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub id: String,
    pub prompt: String,
    #[serde(default)]
    pub negative_prompt: Option<String>,
    pub image_url: String,
    /// Base64 PNG; stripped from exports
    #[serde(default)]
    pub image_data: Option<String>,
    pub size: String,
    pub style: String,
    pub timestamp: DateTime<Utc>,
}

impl GeneratedImage {
    /// Build a history record from a backend descriptor
    ///
    /// Size and style come from the request that produced the image, not
    /// from the echoed parameters.
    pub fn from_descriptor(
        descriptor: GeneratedImageDescriptor,
        request: &ImageGenerationRequest,
    ) -> Self {
        Self {
            id: descriptor
                .image_id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| Ulid::new().to_string()),
            prompt: descriptor.prompt,
            negative_prompt: descriptor.negative_prompt,
            image_url: descriptor.image_url,
            image_data: descriptor.image_data,
            size: request.size.to_string(),
            style: request.style.to_string(),
            timestamp: Utc::now(),
        }
    }
}
