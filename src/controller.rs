//! View controller
//!
//! Turns typed UI events into store mutations and backend calls, then
//! tells the [`View`] which regions to redraw and which notifications to
//! show. Nothing here knows how a region is drawn.
//!
//! Chat and image generation run in two phases so a front-end can keep
//! accepting input while a request is in flight: `begin_*` validates,
//! records what it can and raises the loading gate, `finish_*` applies
//! the backend's answer and always lowers it.

use crate::client::BackendClient;
use crate::config::{Config, ImageDefaults};
use crate::error::{MyAiError, Result};
use crate::models::{
    ChatMessage, ExportDocument, GeneratedImage, GeneratedImageDescriptor, GenerationParams,
    ImageGenerationRequest, ImageModel, ImageSize, ImageStyle, ImportDocument, Role,
    GUIDANCE_SCALE_RANGE, NEGATIVE_PROMPT_MAX_CHARS, NUM_IMAGES_RANGE, PROMPT_MAX_CHARS,
    STEPS_RANGE,
};
use crate::state::AppState;
use base64::Engine as _;
use rand::Rng as _;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Longest chat message accepted
pub const CHAT_MESSAGE_MAX_CHARS: usize = 2000;

/// Random seeds are drawn from `0..RANDOM_SEED_MAX`
pub const RANDOM_SEED_MAX: u64 = 1_000_000;

/// Prompt characters kept in a download file name
const DOWNLOAD_NAME_PROMPT_CHARS: usize = 30;

/// Top-level tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Chat,
    Image,
    History,
}

/// Independently redrawable parts of the interface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Messages,
    Sidebar,
    History,
    Images,
    ImageForm,
    Tabs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Warning,
    Info,
}

/// A transient notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
}

impl Toast {
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(ToastKind::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(ToastKind::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(ToastKind::Warning, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(ToastKind::Info, message)
    }

    fn new(kind: ToastKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Rendering collaborator
pub trait View {
    /// Redraw one region from the current state
    fn render(&mut self, region: Region, state: &AppState, ui: &UiState);

    /// Show a notification
    fn notify(&mut self, toast: Toast);
}

/// Values of the image generation form
#[derive(Debug, Clone, PartialEq)]
pub struct ImageForm {
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

impl ImageForm {
    /// Empty form carrying the configured defaults
    pub fn from_defaults(defaults: &ImageDefaults) -> Self {
        Self {
            prompt: String::new(),
            negative_prompt: String::new(),
            model: defaults.model,
            size: defaults.size,
            style: defaults.style,
            num_images: defaults.num_images,
            guidance_scale: defaults.guidance_scale,
            steps: defaults.steps,
            seed: None,
        }
    }

    /// Same settings with a different prompt
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Validate the form and build the backend request
    ///
    /// # Errors
    ///
    /// Returns `MyAiError::Validation` describing the first problem found
    pub fn to_request(&self) -> Result<ImageGenerationRequest> {
        let prompt = self.prompt.trim();
        let negative_prompt = self.negative_prompt.trim();

        if prompt.is_empty() {
            return Err(MyAiError::Validation("Please enter an image prompt".into()).into());
        }
        if prompt.chars().count() > PROMPT_MAX_CHARS {
            return Err(MyAiError::Validation(format!(
                "Prompt is too long (max {} characters)",
                PROMPT_MAX_CHARS
            ))
            .into());
        }
        if negative_prompt.chars().count() > NEGATIVE_PROMPT_MAX_CHARS {
            return Err(MyAiError::Validation(format!(
                "Negative prompt is too long (max {} characters)",
                NEGATIVE_PROMPT_MAX_CHARS
            ))
            .into());
        }
        if !NUM_IMAGES_RANGE.contains(&self.num_images) {
            return Err(MyAiError::Validation(format!(
                "Number of images must be between {} and {}",
                NUM_IMAGES_RANGE.start(),
                NUM_IMAGES_RANGE.end()
            ))
            .into());
        }
        if !GUIDANCE_SCALE_RANGE.contains(&self.guidance_scale) {
            return Err(MyAiError::Validation(format!(
                "Guidance scale must be between {} and {}",
                GUIDANCE_SCALE_RANGE.start(),
                GUIDANCE_SCALE_RANGE.end()
            ))
            .into());
        }
        if !STEPS_RANGE.contains(&self.steps) {
            return Err(MyAiError::Validation(format!(
                "Steps must be between {} and {}",
                STEPS_RANGE.start(),
                STEPS_RANGE.end()
            ))
            .into());
        }

        Ok(ImageGenerationRequest {
            prompt: prompt.to_string(),
            negative_prompt: negative_prompt.to_string(),
            model: self.model,
            size: self.size,
            style: self.style,
            num_images: self.num_images,
            guidance_scale: self.guidance_scale,
            steps: self.steps,
            seed: self.seed,
        })
    }

    /// Copy echoed generation parameters onto the form
    ///
    /// Values the backend did not echo, or that no longer parse, leave
    /// the form unchanged.
    pub fn apply_params(&mut self, params: &GenerationParams) {
        if let Some(model) = params.model.as_deref().and_then(|m| m.parse().ok()) {
            self.model = model;
        }
        if let Some(size) = params.size.as_deref().and_then(|s| s.parse().ok()) {
            self.size = size;
        }
        if let Some(style) = params.style.as_deref().and_then(|s| s.parse().ok()) {
            self.style = style;
        }
        if let Some(guidance_scale) = params.guidance_scale {
            self.guidance_scale = guidance_scale;
        }
        if let Some(steps) = params.steps {
            self.steps = steps;
        }
        if let Some(seed) = params.seed {
            self.seed = Some(seed);
        }
    }
}

/// Per-kind loading gates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadingState {
    pub chat: bool,
    pub images: bool,
}

/// Presentation state that is never persisted
#[derive(Debug, Clone)]
pub struct UiState {
    pub active_tab: Tab,
    pub sidebar_open: bool,
    pub form: ImageForm,
    pub loading: LoadingState,
    /// Descriptors of the most recent generation, in backend order
    pub last_results: Vec<GeneratedImageDescriptor>,
}

/// Typed user input
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    SendMessage(String),
    NewChat,
    SwitchSession(String),
    DeleteSession(String),
    ClearChat,
    GenerateImages(ImageForm),
    DeleteImage(usize),
    ReuseSettings(usize),
    RandomSeed,
    SwitchTab(Tab),
    ToggleSidebar,
    /// Write an export; `None` uses the default file name
    ExportData(Option<PathBuf>),
    ImportData(PathBuf),
    DownloadImage(usize, PathBuf),
    ClearAllData,
}

/// A chat request waiting for the backend
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub session_id: String,
    pub message: String,
    /// Recent messages of the session, the new user message included
    pub context: Vec<ChatMessage>,
}

/// Backend work started by an event, to be run off the controller
#[derive(Debug, Clone)]
pub enum PendingRequest {
    Chat(ChatTurn),
    Images(ImageGenerationRequest),
}

impl PendingRequest {
    /// Perform the request against `backend`
    pub async fn run<B: BackendClient + ?Sized>(self, backend: &B) -> Completion {
        match self {
            Self::Chat(turn) => {
                let result = backend
                    .send_chat_message(&turn.message, &turn.context)
                    .await;
                Completion::Chat(turn, result)
            }
            Self::Images(request) => {
                let result = backend.generate_images(&request).await;
                Completion::Images(request, result)
            }
        }
    }
}

/// Outcome of a [`PendingRequest`]
#[derive(Debug)]
pub enum Completion {
    Chat(ChatTurn, Result<String>),
    Images(ImageGenerationRequest, Result<Vec<GeneratedImageDescriptor>>),
}

/// Drives the application state from UI events
pub struct Controller<B: BackendClient, V: View> {
    backend: B,
    state: AppState,
    view: V,
    ui: UiState,
    context_limit: usize,
}

impl<B: BackendClient, V: View> Controller<B, V> {
    pub fn new(backend: B, state: AppState, view: V, config: &Config) -> Self {
        Self {
            backend,
            state,
            view,
            ui: UiState {
                active_tab: Tab::default(),
                sidebar_open: true,
                form: ImageForm::from_defaults(&config.images),
                loading: LoadingState::default(),
                last_results: Vec::new(),
            },
            context_limit: config.chat.context_limit,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Initial paint, plus any warnings raised while restoring state
    pub fn start(&mut self) {
        self.render(&[Region::Tabs, Region::Sidebar, Region::Messages, Region::Images]);
        self.flush_warnings();
    }

    /// Handle one event to completion, awaiting any backend call it starts
    pub async fn dispatch(&mut self, event: UiEvent) {
        if let Some(request) = self.submit(event) {
            let completion = request.run(&self.backend).await;
            self.complete(completion);
        }
    }

    /// Apply an event without waiting on the backend
    ///
    /// Events that need the backend pass their gate here and come back
    /// as a [`PendingRequest`]; the caller runs it and hands the result
    /// to [`Controller::complete`]. Everything else is applied at once.
    pub fn submit(&mut self, event: UiEvent) -> Option<PendingRequest> {
        tracing::debug!(?event, "Dispatching UI event");
        let pending = match event {
            UiEvent::SendMessage(text) => self.begin_chat(&text).map(PendingRequest::Chat),
            UiEvent::GenerateImages(form) => self.begin_images(form).map(PendingRequest::Images),
            other => {
                self.apply(other);
                None
            }
        };
        self.flush_warnings();
        pending
    }

    /// Apply the outcome of a request started by [`Controller::submit`]
    pub fn complete(&mut self, completion: Completion) {
        match completion {
            Completion::Chat(turn, result) => self.finish_chat(turn, result),
            Completion::Images(request, result) => self.finish_images(&request, result),
        }
        self.flush_warnings();
    }

    fn apply(&mut self, event: UiEvent) {
        match event {
            UiEvent::SendMessage(_) | UiEvent::GenerateImages(_) => {}
            UiEvent::NewChat => self.new_chat(),
            UiEvent::SwitchSession(id) => self.switch_session(&id),
            UiEvent::DeleteSession(id) => self.delete_session(&id),
            UiEvent::ClearChat => self.clear_chat(),
            UiEvent::DeleteImage(index) => self.delete_image(index),
            UiEvent::ReuseSettings(index) => self.reuse_settings(index),
            UiEvent::RandomSeed => self.random_seed(),
            UiEvent::SwitchTab(tab) => self.switch_tab(tab),
            UiEvent::ToggleSidebar => {
                self.ui.sidebar_open = !self.ui.sidebar_open;
                self.render(&[Region::Sidebar]);
            }
            UiEvent::ExportData(path) => self.export_data(path),
            UiEvent::ImportData(path) => self.import_data(&path),
            UiEvent::DownloadImage(index, dir) => self.download_image(index, &dir),
            UiEvent::ClearAllData => self.clear_all_data(),
        }
    }

    /// Validate and record a user message, raising the chat gate
    ///
    /// Returns `None` when the message is rejected; the view has already
    /// been told why.
    pub fn begin_chat(&mut self, text: &str) -> Option<ChatTurn> {
        if self.ui.loading.chat {
            self.view
                .notify(Toast::info("Still waiting for the previous response"));
            return None;
        }

        let message = text.trim();
        if message.is_empty() {
            self.view.notify(Toast::error("Please enter a message"));
            return None;
        }
        if message.chars().count() > CHAT_MESSAGE_MAX_CHARS {
            self.view.notify(Toast::error(format!(
                "Message is too long (max {} characters)",
                CHAT_MESSAGE_MAX_CHARS
            )));
            return None;
        }

        let session_id = match self.state.sessions().current_id() {
            Some(id) => id.to_string(),
            None => self.state.create_session(),
        };
        self.state.append_message(&session_id, Role::User, message);
        let context = self
            .state
            .sessions()
            .recent_context(&session_id, self.context_limit);

        self.ui.loading.chat = true;
        self.render(&[Region::Messages, Region::Sidebar]);

        Some(ChatTurn {
            session_id,
            message: message.to_string(),
            context,
        })
    }

    /// Apply the backend's answer to a chat turn and lower the gate
    pub fn finish_chat(&mut self, turn: ChatTurn, result: Result<String>) {
        self.ui.loading.chat = false;
        match result {
            Ok(reply) => {
                if !self
                    .state
                    .append_message(&turn.session_id, Role::Assistant, &reply)
                {
                    tracing::warn!(
                        session_id = %turn.session_id,
                        "Session removed before the reply arrived"
                    );
                }
                self.view
                    .notify(Toast::success("Response generated successfully!"));
            }
            Err(e) => {
                tracing::error!("Chat request failed: {}", e);
                self.view
                    .notify(Toast::error(format!("Failed to generate response: {}", e)));
            }
        }
        self.render(&[Region::Messages, Region::Sidebar]);
    }

    /// Validate an image form and raise the image gate
    pub fn begin_images(&mut self, form: ImageForm) -> Option<ImageGenerationRequest> {
        if self.ui.loading.images {
            self.view
                .notify(Toast::info("Image generation already in progress"));
            return None;
        }

        let request = match form.to_request() {
            Ok(request) => request,
            Err(e) => {
                self.view.notify(Toast::error(validation_message(&e)));
                return None;
            }
        };

        self.ui.form = form;
        self.ui.loading.images = true;
        self.render(&[Region::ImageForm]);
        Some(request)
    }

    /// Store generated images and lower the gate
    pub fn finish_images(
        &mut self,
        request: &ImageGenerationRequest,
        result: Result<Vec<GeneratedImageDescriptor>>,
    ) {
        self.ui.loading.images = false;
        match result {
            Ok(descriptors) => {
                let images: Vec<GeneratedImage> = descriptors
                    .iter()
                    .cloned()
                    .map(|d| GeneratedImage::from_descriptor(d, request))
                    .collect();
                let count = images.len();
                self.state.add_images(images);
                self.ui.last_results = descriptors;

                let message = if count == 1 {
                    "Image generated successfully!".to_string()
                } else {
                    format!("{} images generated successfully!", count)
                };
                self.view.notify(Toast::success(message));
                self.render(&[Region::Images, Region::History]);
            }
            Err(e) => {
                tracing::error!("Image generation failed: {}", e);
                self.view
                    .notify(Toast::error(format!("Failed to generate image: {}", e)));
                self.render(&[Region::ImageForm]);
            }
        }
    }

    fn new_chat(&mut self) {
        self.state.create_session();
        self.render(&[Region::Messages, Region::Sidebar]);
        self.view.notify(Toast::success("New chat started!"));
    }

    fn switch_session(&mut self, id: &str) {
        let Some(resolved) = self.resolve_session(id) else {
            return;
        };
        self.state.switch_session(&resolved);
        self.render(&[Region::Messages, Region::Sidebar]);
    }

    fn delete_session(&mut self, id: &str) {
        let Some(resolved) = self.resolve_session(id) else {
            return;
        };
        self.state.delete_session(&resolved);
        self.render(&[Region::Messages, Region::Sidebar]);
        self.view.notify(Toast::success("Chat session deleted"));
    }

    fn clear_chat(&mut self) {
        let Some(id) = self.state.sessions().current_id().map(str::to_string) else {
            self.view.notify(Toast::info("No active chat to clear"));
            return;
        };
        self.state.clear_session(&id);
        self.render(&[Region::Messages, Region::Sidebar]);
        self.view.notify(Toast::success("Chat cleared"));
    }

    fn delete_image(&mut self, index: usize) {
        if self.state.delete_image(index).is_none() {
            self.view
                .notify(Toast::error(format!("No image at index {}", index)));
            return;
        }
        self.render(&[Region::History, Region::Images]);
        self.view.notify(Toast::success("Image deleted"));
    }

    fn reuse_settings(&mut self, index: usize) {
        let Some(descriptor) = self.ui.last_results.get(index) else {
            self.view.notify(Toast::error("Failed to copy settings"));
            return;
        };
        let params = descriptor.generation_params.clone();
        self.ui.form.apply_params(&params);
        self.render(&[Region::ImageForm]);
        self.view.notify(Toast::success("Settings copied to form!"));
    }

    fn random_seed(&mut self) {
        let seed = rand::rng().random_range(0..RANDOM_SEED_MAX);
        self.ui.form.seed = Some(seed);
        self.render(&[Region::ImageForm]);
    }

    fn switch_tab(&mut self, tab: Tab) {
        self.ui.active_tab = tab;
        self.render(&[Region::Tabs]);
        match tab {
            Tab::Chat => self.render(&[Region::Sidebar, Region::Messages]),
            Tab::Image => self.render(&[Region::ImageForm, Region::Images]),
            Tab::History => self.render(&[Region::History]),
        }
    }

    fn export_data(&mut self, path: Option<PathBuf>) {
        let document = ExportDocument::new(self.state.legacy_history(), self.state.images().as_slice());
        let path = path.unwrap_or_else(|| PathBuf::from(document.default_file_name()));

        let written = document
            .to_json_pretty()
            .and_then(|json| Ok(std::fs::write(&path, json)?));
        match written {
            Ok(()) => {
                tracing::info!(path = %path.display(), "Exported data");
                self.view.notify(Toast::success(format!(
                    "Data exported successfully to {}",
                    path.display()
                )));
            }
            Err(e) => {
                tracing::error!("Export to {} failed: {}", path.display(), e);
                self.view
                    .notify(Toast::error(format!("Failed to export data: {}", e)));
            }
        }
    }

    fn import_data(&mut self, path: &Path) {
        let document = std::fs::read_to_string(path)
            .map_err(anyhow::Error::from)
            .and_then(|text| ImportDocument::parse(&text));
        let document = match document {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!("Import from {} failed: {}", path.display(), e);
                self.view.notify(Toast::error(
                    "Failed to import data. Invalid file format.",
                ));
                return;
            }
        };

        let summary = self.state.import(document);
        tracing::info!(
            messages = summary.messages,
            images = summary.images,
            "Imported data"
        );
        self.render(&[Region::History, Region::Images]);
        self.view.notify(Toast::success(format!(
            "Data imported successfully! ({} messages, {} images)",
            summary.messages, summary.images
        )));
    }

    fn download_image(&mut self, index: usize, dir: &Path) {
        let Some(image) = self.state.images().get(index) else {
            self.view
                .notify(Toast::error(format!("No image at index {}", index)));
            return;
        };

        match save_image(image, dir) {
            Ok(path) => {
                tracing::info!(path = %path.display(), "Downloaded image");
                self.view.notify(Toast::success(format!(
                    "Image downloaded successfully to {}",
                    path.display()
                )));
            }
            Err(e) => {
                tracing::error!("Image download failed: {}", e);
                self.view
                    .notify(Toast::error(format!("Failed to download image: {}", e)));
            }
        }
    }

    fn clear_all_data(&mut self) {
        self.state.clear_all();
        self.ui.last_results.clear();
        self.render(&[
            Region::Messages,
            Region::Sidebar,
            Region::History,
            Region::Images,
        ]);
        self.view
            .notify(Toast::success("All data cleared successfully!"));
    }

    fn resolve_session(&mut self, id: &str) -> Option<String> {
        let resolved = self.state.sessions().resolve_id(id).map(str::to_string);
        if resolved.is_none() {
            self.view
                .notify(Toast::error(format!("Unknown chat session: {}", id)));
        }
        resolved
    }

    fn render(&mut self, regions: &[Region]) {
        for region in regions {
            self.view.render(*region, &self.state, &self.ui);
        }
    }

    fn flush_warnings(&mut self) {
        for warning in self.state.drain_warnings() {
            self.view.notify(Toast::warning(warning));
        }
    }
}

/// File name used when saving an image
///
/// `ai-generated-` plus the first 30 prompt characters with everything
/// but ASCII letters and digits replaced by `_`.
pub fn download_file_name(prompt: &str) -> String {
    static NON_ALNUM: OnceLock<Regex> = OnceLock::new();
    let re = NON_ALNUM.get_or_init(|| Regex::new(r"[^a-zA-Z0-9]").expect("valid pattern"));
    let head: String = prompt.chars().take(DOWNLOAD_NAME_PROMPT_CHARS).collect();
    format!("ai-generated-{}.png", re.replace_all(&head, "_"))
}

/// Decode an image's base64 payload into `dir`
///
/// # Errors
///
/// Returns `MyAiError::Validation` when the image carries no data and
/// `MyAiError::Parse` when the data is not valid base64
pub fn save_image(image: &GeneratedImage, dir: &Path) -> Result<PathBuf> {
    let data = image
        .image_data
        .as_deref()
        .filter(|d| !d.is_empty())
        .ok_or_else(|| MyAiError::Validation("Image has no data to download".into()))?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(data)
        .map_err(|e| MyAiError::Parse(format!("Invalid image data: {}", e)))?;

    let path = dir.join(download_file_name(&image.prompt));
    std::fs::write(&path, bytes)?;
    Ok(path)
}

fn validation_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<MyAiError>() {
        Some(MyAiError::Validation(message)) => message.clone(),
        _ => err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::Persistence;
    use crate::storage::MemoryStore;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeBackend {
        chat_reply: Option<String>,
        images: Option<Vec<GeneratedImageDescriptor>>,
        chat_calls: Mutex<Vec<(String, Vec<ChatMessage>)>>,
        image_calls: Mutex<Vec<ImageGenerationRequest>>,
    }

    #[async_trait]
    impl BackendClient for FakeBackend {
        async fn send_chat_message(
            &self,
            message: &str,
            conversation_history: &[ChatMessage],
        ) -> Result<String> {
            self.chat_calls
                .lock()
                .unwrap()
                .push((message.to_string(), conversation_history.to_vec()));
            self.chat_reply.clone().ok_or_else(|| {
                MyAiError::status(500, "HTTP error! status: 500").into()
            })
        }

        async fn generate_images(
            &self,
            request: &ImageGenerationRequest,
        ) -> Result<Vec<GeneratedImageDescriptor>> {
            self.image_calls.lock().unwrap().push(request.clone());
            self.images
                .clone()
                .ok_or_else(|| MyAiError::status(400, "bad prompt").into())
        }
    }

    #[derive(Default)]
    struct RecordingView {
        regions: Vec<Region>,
        toasts: Vec<Toast>,
    }

    impl View for RecordingView {
        fn render(&mut self, region: Region, _state: &AppState, _ui: &UiState) {
            self.regions.push(region);
        }

        fn notify(&mut self, toast: Toast) {
            self.toasts.push(toast);
        }
    }

    impl RecordingView {
        fn last_toast(&self) -> &Toast {
            self.toasts.last().expect("a toast")
        }
    }

    fn controller(backend: FakeBackend) -> (Controller<FakeBackend, RecordingView>, MemoryStore) {
        let store = MemoryStore::new();
        let state = AppState::restore(Persistence::new(Box::new(store.clone())));
        let controller = Controller::new(backend, state, RecordingView::default(), &Config::default());
        (controller, store)
    }

    fn descriptor(id: Option<&str>, data: Option<&str>) -> GeneratedImageDescriptor {
        GeneratedImageDescriptor {
            image_id: id.map(str::to_string),
            prompt: "a castle at dusk".to_string(),
            negative_prompt: Some("fog".to_string()),
            image_url: "/generated/castle.png".to_string(),
            image_data: data.map(str::to_string),
            generation_params: GenerationParams {
                model: Some("playground".to_string()),
                size: Some("512x512".to_string()),
                style: Some("abstract".to_string()),
                steps: Some(40),
                guidance_scale: Some(12.0),
                seed: Some(1234),
                ..GenerationParams::default()
            },
        }
    }

    fn form(prompt: &str) -> ImageForm {
        ImageForm::from_defaults(&ImageDefaults::default()).with_prompt(prompt)
    }

    #[tokio::test]
    async fn test_send_message_creates_session_and_appends_reply() {
        let (mut controller, _) = controller(FakeBackend {
            chat_reply: Some("Hi there".to_string()),
            ..FakeBackend::default()
        });

        controller
            .dispatch(UiEvent::SendMessage("  Hello  ".to_string()))
            .await;

        let session = controller.state().current_session().expect("session");
        assert_eq!(session.title, "Hello");
        assert_eq!(session.messages.len(), 2);
        assert_eq!(session.messages[0].content, "Hello");
        assert_eq!(session.messages[1].role, Role::Assistant);
        assert_eq!(controller.view().last_toast().kind, ToastKind::Success);
        assert!(!controller.ui().loading.chat);

        let calls = controller.backend().chat_calls.lock().unwrap();
        assert_eq!(calls[0].0, "Hello");
        assert_eq!(calls[0].1.len(), 1);
    }

    #[tokio::test]
    async fn test_server_error_keeps_user_message_only() {
        let (mut controller, _) = controller(FakeBackend::default());

        controller
            .dispatch(UiEvent::SendMessage("Will this fail?".to_string()))
            .await;

        let session = controller.state().current_session().expect("session");
        assert_eq!(session.messages.len(), 1);
        assert_eq!(session.messages[0].role, Role::User);
        let toast = controller.view().last_toast();
        assert_eq!(toast.kind, ToastKind::Error);
        assert!(toast.message.contains("500"));
        assert!(!controller.ui().loading.chat);
    }

    #[tokio::test]
    async fn test_context_is_capped_to_recent_messages() {
        let (mut controller, _) = controller(FakeBackend {
            chat_reply: Some("ok".to_string()),
            ..FakeBackend::default()
        });

        for i in 0..7 {
            controller
                .dispatch(UiEvent::SendMessage(format!("message {}", i)))
                .await;
        }

        let calls = controller.backend().chat_calls.lock().unwrap();
        let last = calls.last().unwrap();
        assert_eq!(last.1.len(), 10);
        assert_eq!(last.1.last().unwrap().content, "message 6");
    }

    #[tokio::test]
    async fn test_invalid_chat_input_is_rejected() {
        let (mut controller, store) = controller(FakeBackend::default());

        controller.dispatch(UiEvent::SendMessage("   ".to_string())).await;
        controller
            .dispatch(UiEvent::SendMessage("x".repeat(CHAT_MESSAGE_MAX_CHARS + 1)))
            .await;

        assert!(controller.state().current_session().is_none());
        assert!(controller.backend().chat_calls.lock().unwrap().is_empty());
        assert!(store.is_empty());
        assert!(controller
            .view()
            .toasts
            .iter()
            .all(|t| t.kind == ToastKind::Error));
    }

    #[test]
    fn test_chat_gate_blocks_second_submission() {
        let (mut controller, _) = controller(FakeBackend::default());

        let turn = controller.begin_chat("first").expect("accepted");
        assert!(controller.ui().loading.chat);
        assert!(controller.begin_chat("second").is_none());

        controller.finish_chat(turn, Ok("done".to_string()));
        assert!(!controller.ui().loading.chat);
        assert!(controller.begin_chat("third").is_some());
    }

    #[tokio::test]
    async fn test_submit_keeps_other_events_flowing_while_chat_pending() {
        let (mut controller, _) = controller(FakeBackend {
            chat_reply: Some("late reply".to_string()),
            ..FakeBackend::default()
        });

        let pending = controller
            .submit(UiEvent::SendMessage("first".to_string()))
            .expect("request started");
        let first_session = controller.state().sessions().current_id().unwrap().to_string();

        assert!(controller
            .submit(UiEvent::SendMessage("second".to_string()))
            .is_none());
        assert_eq!(controller.view().last_toast().kind, ToastKind::Info);
        assert!(controller.submit(UiEvent::NewChat).is_none());
        assert_eq!(controller.state().sessions().sessions().len(), 2);

        let completion = pending.run(controller.backend()).await;
        controller.complete(completion);

        let first = controller.state().sessions().get(&first_session).unwrap();
        assert_eq!(first.messages.len(), 2);
        assert_eq!(first.messages[1].content, "late reply");
        assert!(controller.state().current_session().unwrap().messages.is_empty());
        assert!(!controller.ui().loading.chat);
    }

    #[test]
    fn test_image_gate_is_independent_of_chat_gate() {
        let (mut controller, _) = controller(FakeBackend::default());

        let _turn = controller.begin_chat("busy").expect("accepted");
        let request = controller.begin_images(form("a tree")).expect("accepted");
        assert!(controller.begin_images(form("another")).is_none());

        controller.finish_images(&request, Err(MyAiError::status(500, "boom").into()));
        assert!(!controller.ui().loading.images);
        assert!(controller.ui().loading.chat);
    }

    #[tokio::test]
    async fn test_generated_images_take_size_and_style_from_request() {
        let (mut controller, _) = controller(FakeBackend {
            images: Some(vec![descriptor(Some("img-1"), None), descriptor(None, None)]),
            ..FakeBackend::default()
        });

        let mut image_form = form("a castle at dusk");
        image_form.size = ImageSize::Large;
        image_form.style = ImageStyle::Cartoon;
        controller
            .dispatch(UiEvent::GenerateImages(image_form))
            .await;

        let request = controller.backend().image_calls.lock().unwrap()[0].clone();
        assert!(request.seed.is_none());
        let body = serde_json::to_value(&request).unwrap();
        assert!(body["seed"].is_null());

        let images = controller.state().images();
        assert_eq!(images.len(), 2);
        assert_eq!(images.get(0).unwrap().id, "img-1");
        assert!(!images.get(1).unwrap().id.is_empty());
        for (_, image) in images.recent_first() {
            assert_eq!(image.size, "1024x1024");
            assert_eq!(image.style, "cartoon");
        }
        assert!(controller.view().regions.contains(&Region::Images));
    }

    #[tokio::test]
    async fn test_invalid_image_form_never_reaches_backend() {
        let (mut controller, _) = controller(FakeBackend::default());

        let mut bad_steps = form("ok");
        bad_steps.steps = 5;
        controller.dispatch(UiEvent::GenerateImages(bad_steps)).await;
        controller
            .dispatch(UiEvent::GenerateImages(form(&"p".repeat(PROMPT_MAX_CHARS + 1))))
            .await;
        let mut long_negative = form("ok");
        long_negative.negative_prompt = "n".repeat(NEGATIVE_PROMPT_MAX_CHARS + 1);
        controller
            .dispatch(UiEvent::GenerateImages(long_negative))
            .await;

        assert!(controller.backend().image_calls.lock().unwrap().is_empty());
        assert_eq!(controller.view().toasts.len(), 3);
        assert_eq!(controller.view().toasts[0].message, "Steps must be between 10 and 50");
    }

    #[tokio::test]
    async fn test_reuse_settings_copies_echoed_params() {
        let (mut controller, _) = controller(FakeBackend {
            images: Some(vec![descriptor(Some("img-1"), None)]),
            ..FakeBackend::default()
        });
        controller
            .dispatch(UiEvent::GenerateImages(form("a castle")))
            .await;

        controller.dispatch(UiEvent::ReuseSettings(0)).await;
        let form = &controller.ui().form;
        assert_eq!(form.model, ImageModel::Playground);
        assert_eq!(form.size, ImageSize::Small);
        assert_eq!(form.style, ImageStyle::Abstract);
        assert_eq!(form.steps, 40);
        assert_eq!(form.seed, Some(1234));

        controller.dispatch(UiEvent::ReuseSettings(9)).await;
        assert_eq!(controller.view().last_toast().kind, ToastKind::Error);
    }

    #[tokio::test]
    async fn test_random_seed_in_range() {
        let (mut controller, _) = controller(FakeBackend::default());
        controller.dispatch(UiEvent::RandomSeed).await;
        let seed = controller.ui().form.seed.expect("seed set");
        assert!(seed < RANDOM_SEED_MAX);
    }

    #[tokio::test]
    async fn test_delete_current_session_starts_new_one() {
        let (mut controller, _) = controller(FakeBackend::default());
        controller.dispatch(UiEvent::NewChat).await;
        let id = controller.state().sessions().current_id().unwrap().to_string();

        controller.dispatch(UiEvent::DeleteSession(id.clone())).await;

        let sessions = controller.state().sessions();
        assert_eq!(sessions.sessions().len(), 1);
        assert_ne!(sessions.current_id().unwrap(), id);
    }

    #[tokio::test]
    async fn test_unknown_session_reports_error() {
        let (mut controller, _) = controller(FakeBackend::default());
        controller
            .dispatch(UiEvent::SwitchSession("session_nope".to_string()))
            .await;
        assert_eq!(controller.view().last_toast().kind, ToastKind::Error);
    }

    #[tokio::test]
    async fn test_switch_tab_renders_matching_regions() {
        let (mut controller, _) = controller(FakeBackend::default());
        controller.dispatch(UiEvent::SwitchTab(Tab::History)).await;
        assert_eq!(controller.ui().active_tab, Tab::History);
        assert_eq!(controller.view().regions, vec![Region::Tabs, Region::History]);

        controller.dispatch(UiEvent::ToggleSidebar).await;
        assert!(!controller.ui().sidebar_open);
    }

    #[tokio::test]
    async fn test_storage_failure_becomes_warning_toast() {
        let (mut controller, store) = controller(FakeBackend::default());
        store.set_fail_writes(true);

        controller.dispatch(UiEvent::NewChat).await;

        assert!(controller.state().current_session().is_some());
        assert!(controller
            .view()
            .toasts
            .iter()
            .any(|t| t.kind == ToastKind::Warning && t.message.contains("Quota exceeded")));
    }

    #[tokio::test]
    async fn test_export_then_import_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let (mut controller, _) = controller(FakeBackend {
            chat_reply: Some("pong".to_string()),
            images: Some(vec![descriptor(Some("img-1"), Some("aGVsbG8="))]),
            ..FakeBackend::default()
        });
        controller.dispatch(UiEvent::SendMessage("ping".to_string())).await;
        controller
            .dispatch(UiEvent::GenerateImages(form("a castle")))
            .await;

        let path = dir.path().join("export.json");
        controller
            .dispatch(UiEvent::ExportData(Some(path.clone())))
            .await;
        let text = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["chatHistory"].as_array().unwrap().len(), 2);
        assert!(value["imageHistory"][0]["image_data"].is_null());

        controller.dispatch(UiEvent::ImportData(path)).await;
        assert_eq!(controller.state().legacy_history().len(), 4);
        assert_eq!(controller.state().images().len(), 2);
        assert_eq!(controller.view().last_toast().kind, ToastKind::Success);
    }

    #[tokio::test]
    async fn test_import_malformed_file_leaves_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{oops").unwrap();
        let (mut controller, _) = controller(FakeBackend::default());

        controller.dispatch(UiEvent::ImportData(path)).await;

        assert!(controller.state().legacy_history().is_empty());
        assert_eq!(
            controller.view().last_toast(),
            &Toast::error("Failed to import data. Invalid file format.")
        );
    }

    #[tokio::test]
    async fn test_download_image_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let (mut controller, _) = controller(FakeBackend {
            images: Some(vec![descriptor(Some("img-1"), Some("aGVsbG8="))]),
            ..FakeBackend::default()
        });
        controller
            .dispatch(UiEvent::GenerateImages(form("a castle at dusk")))
            .await;

        controller
            .dispatch(UiEvent::DownloadImage(0, dir.path().to_path_buf()))
            .await;

        let written = dir.path().join("ai-generated-a_castle_at_dusk.png");
        assert_eq!(std::fs::read(written).unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_clear_all_data() {
        let (mut controller, store) = controller(FakeBackend {
            chat_reply: Some("pong".to_string()),
            ..FakeBackend::default()
        });
        controller.dispatch(UiEvent::SendMessage("ping".to_string())).await;
        controller.dispatch(UiEvent::ClearAllData).await;

        assert!(controller.state().current_session().is_none());
        assert!(controller.state().legacy_history().is_empty());
        let reloaded = AppState::restore(Persistence::new(Box::new(store)));
        assert!(reloaded.sessions().sessions().is_empty());
    }

    #[test]
    fn test_download_file_name() {
        assert_eq!(
            download_file_name("A cat, on a mat!"),
            "ai-generated-A_cat__on_a_mat_.png"
        );
        let long = "abcdefghijklmnopqrstuvwxyz0123456789";
        assert_eq!(
            download_file_name(long),
            "ai-generated-abcdefghijklmnopqrstuvwxyz0123.png"
        );
    }
}
