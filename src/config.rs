//! Client configuration.

use crate::gemini::{ImageModel, TextModel};
use crate::image::AspectRatio;
use crate::prompts::DEFAULT_RECIPE_LANGUAGE;
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};

/// Root of the Generative Language REST API.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Shared folder where users are invited to upload their saved dishes.
pub const DEFAULT_SHARE_FOLDER_URL: &str =
    "https://drive.google.com/drive/folders/1VdAp3F6YAH7NkWjf6pN1If6nvOPvFViJ?usp=drive_link";

/// Settings for talking to the models.
///
/// Every field has a default, so a partial JSON document deserializes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChefConfig {
    /// Model that writes the recipe.
    pub text_model: TextModel,
    /// Model that draws and edits the photo.
    pub image_model: ImageModel,
    /// Language the recipe is written in.
    pub recipe_language: String,
    /// Aspect ratio requested for new photos. Edits keep the source ratio.
    pub aspect_ratio: AspectRatio,
    /// Retry budget applied to every model call.
    pub retry: RetryPolicy,
    /// API root, overridable for proxies and tests.
    pub base_url: String,
    /// Link offered next to the download action.
    pub share_folder_url: String,
}

impl Default for ChefConfig {
    fn default() -> Self {
        Self {
            text_model: TextModel::default(),
            image_model: ImageModel::default(),
            recipe_language: DEFAULT_RECIPE_LANGUAGE.to_string(),
            aspect_ratio: AspectRatio::Square,
            retry: RetryPolicy::default(),
            base_url: DEFAULT_BASE_URL.to_string(),
            share_folder_url: DEFAULT_SHARE_FOLDER_URL.to_string(),
        }
    }
}
