#![warn(missing_docs)]
//! Recipe Chef - recipes and food photos from a list of ingredients.
//!
//! Give it what is in your fridge and it asks a Gemini text model for a
//! recipe, then a Gemini image model for a photo of the finished dish. The
//! photo can be refined afterwards with plain-language edit instructions.
//!
//! # Quick Start
//!
//! ```no_run
//! use recipe_chef::{GeminiClient, KitchenSession};
//!
//! #[tokio::main]
//! async fn main() -> recipe_chef::Result<()> {
//!     let client = GeminiClient::builder().build()?;
//!     let mut session = KitchenSession::new(client);
//!
//!     session.set_ingredients("tomato, egg, onion");
//!     if let Err(alert) = session.recommend().await {
//!         eprintln!("{alert}");
//!     }
//!     println!("{}", session.state().recipe());
//!
//!     session.set_edit_prompt("add parsley");
//!     session.apply_edit().await.ok();
//!     session.download_image(".")?;
//!     Ok(())
//! }
//! ```
//!
//! # Credentials
//!
//! The API key is resolved on every call, in this order: an explicit key
//! given to the builder, a key baked in at build time through `VITE_API_KEY`,
//! then the `VITE_API_KEY`, `GEMINI_API_KEY` and `API_KEY` environment
//! variables. See [`CredentialResolver`].
//!
//! # Features
//!
//! - `cli` (default): the `recipe-chef` command-line interface

pub mod backend;
pub mod config;
pub mod credentials;
mod error;
pub mod gemini;
pub mod image;
pub mod prompts;
pub mod retry;
pub mod session;

// Re-export error types at crate root
pub use error::{ChefError, Result};

pub use backend::KitchenBackend;
pub use config::ChefConfig;
pub use credentials::{CredentialResolver, CredentialSource};
pub use gemini::{GeminiClient, GeminiClientBuilder, ImageModel, TextModel};
pub use image::{AspectRatio, DataUri, ImageFormat};
pub use retry::{with_retry, RetryPolicy};
pub use session::{Alert, EditOutcome, KitchenSession, Phase, SessionState};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::backend::KitchenBackend;
    pub use crate::error::{ChefError, Result};
    pub use crate::gemini::GeminiClient;
    pub use crate::image::DataUri;
    pub use crate::session::{Alert, KitchenSession};
}
