//! Generated image history store

use crate::models::GeneratedImage;

/// Number of images shown when the client starts
pub const RESTORE_DISPLAY_COUNT: usize = 5;

/// Generated images in generation order
#[derive(Debug, Clone, Default)]
pub struct ImageHistory {
    images: Vec<GeneratedImage>,
}

impl ImageHistory {
    /// Create an empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted records
    pub fn from_images(images: Vec<GeneratedImage>) -> Self {
        Self { images }
    }

    /// Add an image at the end
    pub fn append(&mut self, image: GeneratedImage) {
        self.images.push(image);
    }

    /// Add imported images at the end, without deduplication
    pub fn extend(&mut self, images: Vec<GeneratedImage>) {
        self.images.extend(images);
    }

    /// Remove the image at `index`; `None` when out of bounds
    pub fn delete_at(&mut self, index: usize) -> Option<GeneratedImage> {
        if index >= self.images.len() {
            return None;
        }
        Some(self.images.remove(index))
    }

    /// Drop every image
    pub fn clear(&mut self) {
        self.images.clear();
    }

    /// Image at `index` in generation order
    pub fn get(&self, index: usize) -> Option<&GeneratedImage> {
        self.images.get(index)
    }

    /// Images in generation order
    pub fn as_slice(&self) -> &[GeneratedImage] {
        &self.images
    }

    /// Most-recent-first view, each item paired with its stored index
    pub fn recent_first(&self) -> impl Iterator<Item = (usize, &GeneratedImage)> + '_ {
        self.images.iter().enumerate().rev()
    }

    /// The newest `count` images, most recent first
    pub fn latest(&self, count: usize) -> impl Iterator<Item = (usize, &GeneratedImage)> + '_ {
        self.recent_first().take(count)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}
