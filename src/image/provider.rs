//! The external image service boundary.

use crate::error::Result;
use crate::image::types::{EditRequest, GenerateRequest, ImageArtifact};
use async_trait::async_trait;

/// Trait for generative-image services.
///
/// The service is an opaque boundary: it accepts a request and eventually
/// resolves with an image or an error. Callers decide what to do with
/// failures; no retrying happens at this layer.
#[async_trait]
pub trait ImageService: Send + Sync {
    /// Edits an existing image according to a natural-language instruction.
    async fn edit(&self, request: &EditRequest) -> Result<ImageArtifact>;

    /// Generates a new image from a text prompt.
    async fn generate(&self, request: &GenerateRequest) -> Result<ImageArtifact>;

    /// Returns the name of this service for display.
    fn name(&self) -> &str;

    /// Checks if the service is reachable and authenticated.
    async fn health_check(&self) -> Result<()>;
}
