//! Gemini (Google) client for recipes, food photos and photo edits.

use crate::backend::KitchenBackend;
use crate::config::ChefConfig;
use crate::credentials::CredentialResolver;
use crate::error::{parse_retry_after, sanitize_error_message, ChefError, Result};
use crate::gemini::types::{
    is_safety_finish_reason, GenerateContentRequest, GenerateContentResponse,
};
use crate::image::{AspectRatio, DataUri};
use crate::prompts::{food_photo_prompt, recipe_prompt};
use crate::retry::{with_retry, RetryPolicy};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Gemini text model variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextModel {
    /// Gemini 3 Flash (preview).
    #[default]
    #[serde(rename = "gemini-3-flash-preview")]
    Gemini3Flash,
    /// Gemini 2.5 Flash.
    #[serde(rename = "gemini-2.5-flash")]
    Gemini25Flash,
    /// Gemini 2.5 Pro.
    #[serde(rename = "gemini-2.5-pro")]
    Gemini25Pro,
}

impl TextModel {
    /// Returns the API model identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini3Flash => "gemini-3-flash-preview",
            Self::Gemini25Flash => "gemini-2.5-flash",
            Self::Gemini25Pro => "gemini-2.5-pro",
        }
    }
}

/// Gemini image model variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageModel {
    /// Nano Banana - Gemini 2.5 Flash Image (fast, economical).
    #[default]
    #[serde(rename = "gemini-2.5-flash-image")]
    NanoBanana,
    /// Nano Banana Pro - Gemini 3 Pro Image (highest quality).
    #[serde(rename = "gemini-3-pro-image-preview")]
    NanoBananaPro,
}

impl ImageModel {
    /// Returns the API model identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NanoBanana => "gemini-2.5-flash-image",
            Self::NanoBananaPro => "gemini-3-pro-image-preview",
        }
    }
}

/// Builder for [`GeminiClient`].
#[derive(Debug, Clone, Default)]
pub struct GeminiClientBuilder {
    api_key: Option<String>,
    credentials: Option<CredentialResolver>,
    config: ChefConfig,
}

impl GeminiClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key, ahead of every other credential source.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Replaces the credential sources. Defaults to
    /// [`CredentialResolver::default`].
    pub fn credentials(mut self, resolver: CredentialResolver) -> Self {
        self.credentials = Some(resolver);
        self
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ChefConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the text model.
    pub fn text_model(mut self, model: TextModel) -> Self {
        self.config.text_model = model;
        self
    }

    /// Sets the image model.
    pub fn image_model(mut self, model: ImageModel) -> Self {
        self.config.image_model = model;
        self
    }

    /// Sets the language recipes are written in.
    pub fn recipe_language(mut self, language: impl Into<String>) -> Self {
        self.config.recipe_language = language.into();
        self
    }

    /// Sets the aspect ratio of generated photos.
    pub fn aspect_ratio(mut self, ratio: AspectRatio) -> Self {
        self.config.aspect_ratio = ratio;
        self
    }

    /// Sets the retry policy applied to every call.
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.config.retry = policy;
        self
    }

    /// Overrides the API root.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Builds the client. The key itself is resolved per call.
    pub fn build(self) -> Result<GeminiClient> {
        let mut credentials = self.credentials.unwrap_or_default();
        if let Some(key) = self.api_key {
            credentials = credentials.with_explicit_key(key);
        }

        let client = reqwest::Client::builder()
            .user_agent(concat!("recipe-chef/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(GeminiClient {
            client,
            credentials,
            config: self.config,
        })
    }
}

/// Client for the Gemini `generateContent` API.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    credentials: CredentialResolver,
    config: ChefConfig,
}

impl GeminiClient {
    /// Creates a new `GeminiClientBuilder`.
    pub fn builder() -> GeminiClientBuilder {
        GeminiClientBuilder::new()
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &ChefConfig {
        &self.config
    }

    /// Resolves the API key now, without making a request.
    pub fn resolve_api_key(&self) -> Result<String> {
        self.credentials.resolve()
    }

    fn model_url(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}",
            self.config.base_url.trim_end_matches('/'),
            model
        )
    }

    async fn generate_content(
        &self,
        model: &str,
        api_key: &str,
        body: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let url = format!("{}:generateContent", self.model_url(model));
        tracing::debug!(model, "sending generateContent request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let text = response.text().await.unwrap_or_default();
            return Err(parse_error(status.as_u16(), &text, &headers));
        }

        let response: GenerateContentResponse = response.json().await?;
        if let Some(message) = response.block_message() {
            return Err(ChefError::ContentBlocked(message));
        }
        Ok(response)
    }

    async fn recipe_impl(&self, ingredients: &str) -> Result<String> {
        let api_key = self.credentials.resolve()?;
        let body = GenerateContentRequest::text(recipe_prompt(
            ingredients,
            &self.config.recipe_language,
        ));
        let model = self.config.text_model.as_str();
        let start = Instant::now();

        let (client, api_key, body) = (self, api_key.as_str(), &body);
        let recipe = with_retry(&self.config.retry, move || async move {
            let response = client.generate_content(model, api_key, body).await?;
            response.text().ok_or(ChefError::EmptyGeneration)
        })
        .await?;

        tracing::debug!(
            model,
            chars = recipe.chars().count(),
            duration_ms = start.elapsed().as_millis() as u64,
            "recipe generated"
        );
        Ok(recipe)
    }

    /// Sends an image-model request and pulls the first inline image out of
    /// the answer. `Ok(None)` means the model answered without an image.
    async fn image_request(&self, body: GenerateContentRequest) -> Result<Option<DataUri>> {
        let api_key = self.credentials.resolve()?;
        let model = self.config.image_model.as_str();
        let start = Instant::now();

        let (client, api_key, body) = (self, api_key.as_str(), &body);
        let response = with_retry(&self.config.retry, move || async move {
            client.generate_content(model, api_key, body).await
        })
        .await?;

        let image = response.first_inline_image();
        match (&image, response.finish_reason()) {
            (None, Some(reason)) if is_safety_finish_reason(reason) => {
                tracing::warn!(model, reason, "image withheld by safety filter");
            }
            (None, reason) => {
                tracing::warn!(model, ?reason, "response contained no image");
            }
            (Some(uri), _) => {
                tracing::debug!(
                    model,
                    mime_type = uri.mime_type(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    "image generated"
                );
            }
        }
        Ok(image)
    }
}

#[async_trait]
impl KitchenBackend for GeminiClient {
    async fn generate_recipe(&self, ingredients: &str) -> Result<String> {
        self.recipe_impl(ingredients).await
    }

    async fn generate_image(&self, title: &str) -> Result<Option<DataUri>> {
        let body = GenerateContentRequest::image(
            food_photo_prompt(title),
            self.config.aspect_ratio.as_str(),
        );
        self.image_request(body).await
    }

    async fn edit_image(&self, image: &DataUri, instruction: &str) -> Result<Option<DataUri>> {
        let bytes = image
            .decode()
            .map_err(|e| ChefError::InvalidDataUri(e.to_string()))?;
        let body = GenerateContentRequest::edit(image.mime_type(), &bytes, instruction.to_string());
        self.image_request(body).await
    }

    fn name(&self) -> &str {
        "Gemini (Google)"
    }

    async fn health_check(&self) -> Result<()> {
        let api_key = self.credentials.resolve()?;
        let url = self.model_url(self.config.image_model.as_str());

        let response = self
            .client
            .get(&url)
            .header("x-goog-api-key", &api_key)
            .send()
            .await?;

        match response.status().as_u16() {
            401 | 403 => Err(ChefError::Auth("Invalid API key".into())),
            404 => Err(ChefError::InvalidRequest(
                "Model not found. Verify the model name is correct.".into(),
            )),
            s if !(200..300).contains(&s) => Err(ChefError::Api {
                status: s,
                message: "Health check failed".into(),
            }),
            _ => Ok(()),
        }
    }
}

fn parse_error(status: u16, text: &str, headers: &reqwest::header::HeaderMap) -> ChefError {
    let text = sanitize_error_message(text);
    if status == 404 {
        return ChefError::InvalidRequest(
            "Model not found. Verify the model name is correct.".into(),
        );
    }
    if status == 429 {
        let retry_after = parse_retry_after(headers).map(std::time::Duration::from_secs);
        return ChefError::RateLimited { retry_after };
    }
    if status == 401 || status == 403 {
        return ChefError::Auth(text);
    }
    let lower = text.to_lowercase();
    if lower.contains("safety") || lower.contains("blocked") || lower.contains("prohibited") {
        return ChefError::ContentBlocked(text);
    }
    if status == 400 && lower.contains("api key") {
        return ChefError::Auth(text);
    }
    ChefError::Api {
        status,
        message: text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::CredentialSource;
    use reqwest::header::{HeaderMap, HeaderValue, RETRY_AFTER};

    #[test]
    fn test_model_ids() {
        assert_eq!(TextModel::Gemini3Flash.as_str(), "gemini-3-flash-preview");
        assert_eq!(ImageModel::NanoBanana.as_str(), "gemini-2.5-flash-image");
        assert_eq!(
            ImageModel::NanoBananaPro.as_str(),
            "gemini-3-pro-image-preview"
        );
    }

    #[test]
    fn test_model_serde_matches_api_ids() {
        for model in [TextModel::Gemini3Flash, TextModel::Gemini25Flash, TextModel::Gemini25Pro] {
            let json = serde_json::to_string(&model).unwrap();
            assert_eq!(json, format!("\"{}\"", model.as_str()));
        }
        for model in [ImageModel::NanoBanana, ImageModel::NanoBananaPro] {
            let json = serde_json::to_string(&model).unwrap();
            assert_eq!(json, format!("\"{}\"", model.as_str()));
        }
    }

    #[test]
    fn test_builder_does_not_require_key_up_front() {
        let client = GeminiClient::builder()
            .credentials(CredentialResolver::new(vec![]))
            .build()
            .unwrap();
        assert!(matches!(
            client.resolve_api_key(),
            Err(ChefError::MissingCredential)
        ));
    }

    #[test]
    fn test_builder_explicit_key_wins() {
        let client = GeminiClient::builder()
            .credentials(CredentialResolver::new(vec![CredentialSource::BuildTime(Some(
                "baked",
            ))]))
            .api_key("explicit")
            .build()
            .unwrap();
        assert_eq!(client.resolve_api_key().unwrap(), "explicit");
    }

    #[test]
    fn test_builder_settings_reach_config() {
        let client = GeminiClient::builder()
            .api_key("k")
            .text_model(TextModel::Gemini25Pro)
            .image_model(ImageModel::NanoBananaPro)
            .recipe_language("English")
            .aspect_ratio(AspectRatio::Landscape)
            .retry_policy(RetryPolicy::none())
            .base_url("http://localhost:9999/")
            .build()
            .unwrap();

        let config = client.config();
        assert_eq!(config.text_model, TextModel::Gemini25Pro);
        assert_eq!(config.image_model, ImageModel::NanoBananaPro);
        assert_eq!(config.recipe_language, "English");
        assert_eq!(config.aspect_ratio, AspectRatio::Landscape);
        assert_eq!(config.retry.max_retries, 0);
        assert_eq!(
            client.model_url("gemini-2.5-flash-image"),
            "http://localhost:9999/v1beta/models/gemini-2.5-flash-image"
        );
    }

    #[test]
    fn test_parse_error_mapping() {
        let headers = HeaderMap::new();
        assert!(matches!(
            parse_error(401, "nope", &headers),
            ChefError::Auth(_)
        ));
        assert!(matches!(
            parse_error(404, "", &headers),
            ChefError::InvalidRequest(_)
        ));
        assert!(matches!(
            parse_error(
                400,
                r#"{"error": {"message": "API key not valid. Please pass a valid API key."}}"#,
                &headers
            ),
            ChefError::Auth(_)
        ));
        assert!(matches!(
            parse_error(400, "Request blocked for safety reasons", &headers),
            ChefError::ContentBlocked(_)
        ));
        assert!(matches!(
            parse_error(503, "overloaded", &headers),
            ChefError::Api { status: 503, .. }
        ));
    }

    #[test]
    fn test_parse_error_rate_limit_reads_retry_after() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("12"));
        match parse_error(429, "slow down", &headers) {
            ChefError::RateLimited { retry_after } => {
                assert_eq!(retry_after, Some(std::time::Duration::from_secs(12)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
