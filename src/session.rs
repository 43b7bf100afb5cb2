//! The cooking session: view state plus the flows that drive it.
//!
//! A session walks `Idle → Recommending → ImageGenerating → Ready`, and from
//! `Ready` through `Editing` and back for each photo edit. All state lives in
//! [`SessionState`] and only changes through the transition methods below.
//! Every flow takes `&mut self`, so a session never runs two at once.

use crate::backend::KitchenBackend;
use crate::error::Result;
use crate::image::DataUri;
use crate::prompts::derive_title;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where a session is in its request pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Nothing shown yet, or a recommendation failed before any recipe.
    #[default]
    Idle,
    /// Waiting for the recipe text.
    Recommending,
    /// Recipe shown; waiting for the photo.
    ImageGenerating,
    /// Recipe (and maybe photo) shown; nothing in flight.
    Ready,
    /// Waiting for an edited photo.
    Editing,
}

/// A user-visible notification raised by a flow.
///
/// Deliberately generic: the underlying error is logged, not shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Alert {
    /// Recommend was pressed with a blank ingredient field.
    #[error("Please enter some ingredients!")]
    MissingIngredients,
    /// The recipe or photo request failed.
    #[error("Something went wrong. Please try again.")]
    RecommendFailed,
    /// The edit request succeeded but returned no photo.
    #[error("The image could not be edited.")]
    EditProducedNoImage,
    /// The edit request failed.
    #[error("Something went wrong while editing the image.")]
    EditFailed,
}

/// Result of [`KitchenSession::apply_edit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// The photo was replaced.
    Applied,
    /// Nothing to do: no photo, a blank prompt, or an edit already running.
    Skipped,
}

/// Everything the page shows. Serializable, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    ingredients: String,
    recipe: String,
    image: Option<DataUri>,
    edit_prompt: String,
    phase: Phase,
    is_loading: bool,
    is_image_loading: bool,
    is_editing: bool,
}

impl SessionState {
    /// Current ingredient field.
    pub fn ingredients(&self) -> &str {
        &self.ingredients
    }

    /// Recipe text, empty until one arrives.
    pub fn recipe(&self) -> &str {
        &self.recipe
    }

    /// Current photo.
    pub fn image(&self) -> Option<&DataUri> {
        self.image.as_ref()
    }

    /// Current edit field.
    pub fn edit_prompt(&self) -> &str {
        &self.edit_prompt
    }

    /// Pipeline phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// True for the whole recommendation flow, photo included.
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// True while the photo is being generated.
    pub fn is_image_loading(&self) -> bool {
        self.is_image_loading
    }

    /// True while an edit is in flight.
    pub fn is_editing(&self) -> bool {
        self.is_editing
    }

    fn begin_recommendation(&mut self) {
        self.phase = Phase::Recommending;
        self.is_loading = true;
        self.recipe.clear();
        self.image = None;
    }

    /// Stores the recipe and moves on to the photo. Returns the photo title.
    fn recipe_ready(&mut self, recipe: String) -> String {
        let title = derive_title(&recipe, &self.ingredients);
        self.recipe = recipe;
        self.phase = Phase::ImageGenerating;
        self.is_image_loading = true;
        title
    }

    fn image_ready(&mut self, image: Option<DataUri>) {
        if image.is_some() {
            self.image = image;
        }
        self.phase = Phase::Ready;
        self.is_loading = false;
        self.is_image_loading = false;
    }

    /// Clears the loading flags, keeping whatever was already shown.
    fn recommendation_failed(&mut self) {
        self.is_loading = false;
        self.is_image_loading = false;
        self.phase = if self.recipe.is_empty() {
            Phase::Idle
        } else {
            Phase::Ready
        };
    }

    fn begin_edit(&mut self) {
        self.phase = Phase::Editing;
        self.is_editing = true;
    }

    fn edit_succeeded(&mut self, image: DataUri) {
        self.image = Some(image);
        self.edit_prompt.clear();
        self.phase = Phase::Ready;
        self.is_editing = false;
    }

    fn edit_failed(&mut self) {
        self.phase = Phase::Ready;
        self.is_editing = false;
    }
}

/// Drives one user's session against a [`KitchenBackend`].
pub struct KitchenSession<B> {
    backend: B,
    state: SessionState,
}

impl<B: KitchenBackend> KitchenSession<B> {
    /// Starts an empty session.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            state: SessionState::default(),
        }
    }

    /// Read-only view of the session state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The backend serving this session.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Updates the ingredient field.
    pub fn set_ingredients(&mut self, ingredients: impl Into<String>) {
        self.state.ingredients = ingredients.into();
    }

    /// Updates the edit field.
    pub fn set_edit_prompt(&mut self, prompt: impl Into<String>) {
        self.state.edit_prompt = prompt.into();
    }

    /// Whether the recommend control is enabled.
    pub fn can_recommend(&self) -> bool {
        !self.state.is_loading
    }

    /// Whether the apply-edit control is enabled.
    pub fn can_edit(&self) -> bool {
        self.state.image.is_some()
            && !self.state.is_loading
            && !self.state.is_editing
            && !self.state.edit_prompt.trim().is_empty()
    }

    /// Runs the recommendation flow: recipe, then photo.
    pub async fn recommend(&mut self) -> std::result::Result<(), Alert> {
        self.recommend_with(|_| {}).await
    }

    /// Like [`recommend`](Self::recommend), calling `on_recipe` with the
    /// recipe text as soon as it arrives, before the photo is requested.
    pub async fn recommend_with<F>(&mut self, on_recipe: F) -> std::result::Result<(), Alert>
    where
        F: FnOnce(&str) + Send,
    {
        if self.state.ingredients.trim().is_empty() {
            return Err(Alert::MissingIngredients);
        }

        let ingredients = self.state.ingredients.clone();
        self.state.begin_recommendation();
        tracing::debug!(%ingredients, "requesting recipe");

        let recipe = match self.backend.generate_recipe(&ingredients).await {
            Ok(recipe) => recipe,
            Err(e) => {
                tracing::error!(error = %e, "recipe generation failed");
                self.state.recommendation_failed();
                return Err(Alert::RecommendFailed);
            }
        };

        let title = self.state.recipe_ready(recipe);
        on_recipe(&self.state.recipe);
        tracing::debug!(%title, "requesting food photo");

        match self.backend.generate_image(&title).await {
            Ok(image) => {
                if image.is_none() {
                    tracing::warn!(%title, "no photo produced for recipe");
                }
                self.state.image_ready(image);
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "photo generation failed");
                self.state.recommendation_failed();
                Err(Alert::RecommendFailed)
            }
        }
    }

    /// Applies the edit field to the current photo.
    ///
    /// On success the photo is replaced and the edit field cleared. On
    /// failure the previous photo stays.
    pub async fn apply_edit(&mut self) -> std::result::Result<EditOutcome, Alert> {
        if !self.can_edit() {
            return Ok(EditOutcome::Skipped);
        }
        let Some(image) = self.state.image.clone() else {
            return Ok(EditOutcome::Skipped);
        };
        let instruction = self.state.edit_prompt.clone();

        self.state.begin_edit();
        tracing::debug!(%instruction, "requesting photo edit");

        match self.backend.edit_image(&image, &instruction).await {
            Ok(Some(edited)) => {
                self.state.edit_succeeded(edited);
                Ok(EditOutcome::Applied)
            }
            Ok(None) => {
                tracing::warn!(%instruction, "edit produced no photo");
                self.state.edit_failed();
                Err(Alert::EditProducedNoImage)
            }
            Err(e) => {
                tracing::error!(error = %e, "photo edit failed");
                self.state.edit_failed();
                Err(Alert::EditFailed)
            }
        }
    }

    /// Saves the current photo into `dir` as `recipe-image-<unix-millis>.<ext>`.
    ///
    /// Returns `None` when there is no photo.
    pub fn download_image(&self, dir: impl AsRef<Path>) -> Result<Option<PathBuf>> {
        let Some(image) = &self.state.image else {
            return Ok(None);
        };

        let filename = format!(
            "recipe-image-{}.{}",
            chrono::Utc::now().timestamp_millis(),
            image.file_extension()
        );
        let path = dir.as_ref().join(filename);
        image.save(&path)?;
        tracing::debug!(path = %path.display(), "photo saved");
        Ok(Some(path))
    }
}
