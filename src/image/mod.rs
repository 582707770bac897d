//! Image editing and generation module.

mod provider;
pub mod providers;
mod types;

pub use provider::ImageService;
pub use types::{
    ArtifactMetadata, EditRequest, GenerateRequest, ImageArtifact, ImageFormat, SelectedFile,
    SOFT_SIZE_LIMIT_BYTES,
};
