#![warn(missing_docs)]
//! Retouch - prompt-driven image editing and generation.
//!
//! This crate forwards natural-language image requests to a generative-image
//! service and hands back the resulting image. Two independent flows share
//! the same shape: editing an existing image with an instruction, and
//! generating a new image from a prompt. Each flow is driven by a
//! [`session`] state machine that validates inputs, tracks the in-flight
//! call, and folds the outcome into a single observable phase.
//!
//! # Quick Start - Editing
//!
//! ```no_run
//! use retouch::{EditSession, GeminiService, SelectedFile};
//!
//! #[tokio::main]
//! async fn main() -> retouch::Result<()> {
//!     let service = GeminiService::builder().build()?;
//!
//!     let mut session = EditSession::new();
//!     session.select_file(SelectedFile::from_path("photo.png")?);
//!     session.set_prompt("Remove the person in the background");
//!
//!     if let Some(image) = session.run(&service).await.artifact() {
//!         image.save("edited.png")?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Quick Start - Generation
//!
//! ```no_run
//! use retouch::{GeminiService, GenerateSession};
//!
//! #[tokio::main]
//! async fn main() -> retouch::Result<()> {
//!     let service = GeminiService::builder().build()?;
//!
//!     let mut session = GenerateSession::new();
//!     session.set_prompt("An astronaut riding a horse on Mars");
//!
//!     if let Some(image) = session.run(&service).await.artifact() {
//!         image.save("generated.png")?;
//!     }
//!     Ok(())
//! }
//! ```

pub mod encode;
mod error;
pub mod image;
pub mod session;

pub use error::{Result, RetouchError, UNKNOWN_ERROR_MESSAGE};

pub use image::providers::{EditModel, GeminiService, GeminiServiceBuilder, ImagenModel};
pub use image::{
    ArtifactMetadata, EditRequest, GenerateRequest, ImageArtifact, ImageFormat, ImageService,
    SelectedFile,
};

pub use session::{EditSession, GenerateSession, Phase, Ticket};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{Result, RetouchError};
    pub use crate::image::{ImageArtifact, ImageService, SelectedFile};
    pub use crate::image::providers::GeminiService;
    pub use crate::session::{EditSession, GenerateSession, Phase};
}
