//! Gemini API access: the text, image and image-edit calls.

mod client;
mod types;

pub use client::{GeminiClient, GeminiClientBuilder, ImageModel, TextModel};
