//! The model-facing seam used by the session controller.

use crate::error::Result;
use crate::image::DataUri;
use async_trait::async_trait;

/// The three remote calls a cooking session needs.
#[async_trait]
pub trait KitchenBackend: Send + Sync {
    /// Asks the text model for a recipe using `ingredients`.
    ///
    /// Returns the raw recipe text. Fails with
    /// [`ChefError::EmptyGeneration`](crate::ChefError::EmptyGeneration) if the model
    /// answered without text.
    async fn generate_recipe(&self, ingredients: &str) -> Result<String>;

    /// Asks the image model for a photo of the dish called `title`.
    ///
    /// `Ok(None)` means the model answered but produced no image.
    async fn generate_image(&self, title: &str) -> Result<Option<DataUri>>;

    /// Asks the image model to transform `image` according to `instruction`.
    ///
    /// `Ok(None)` means the model answered but produced no image.
    async fn edit_image(&self, image: &DataUri, instruction: &str) -> Result<Option<DataUri>>;

    /// Returns the name of this backend for display.
    fn name(&self) -> &str;

    /// Checks if the backend is reachable and authenticated.
    async fn health_check(&self) -> Result<()>;
}
