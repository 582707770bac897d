//! Concrete image service implementations.

mod gemini;

pub use gemini::{EditModel, GeminiService, GeminiServiceBuilder, ImagenModel};
