//! Text-to-image generation.
//!
//! [`ImageGenerator`] is what the image tool depends on; [`ImageGenerationClient`] implements
//! it over the OpenAI images API (DALL-E or compatible endpoints).

use anyhow::Result;
use async_openai::{
    config::OpenAIConfig,
    types::{CreateImageRequestArgs, Image, ImageModel, ImageSize, ImageResponseFormat as ResponseFormat},
    Client,
};
use async_trait::async_trait;
use openai_client::mask_token;
use std::sync::Arc;

/// Generates images from a text prompt.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Returns one URL (http(s) or `data:`) per generated image.
    async fn generate(&self, prompt: &str) -> Result<Vec<String>>;
}

#[derive(Clone)]
pub struct ImageGenerationClient {
    client: Arc<Client<OpenAIConfig>>,
    model: String,
    size: ImageSize,
    count: u8,
    api_key_for_logging: String,
}

impl ImageGenerationClient {
    pub fn new(api_key: String) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key.clone());
        Self::from_config(config, api_key)
    }

    /// Client for an OpenAI-compatible endpoint.
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key.clone())
            .with_api_base(base_url);
        Self::from_config(config, api_key)
    }

    fn from_config(config: OpenAIConfig, api_key: String) -> Self {
        Self {
            client: Arc::new(Client::with_config(config)),
            model: "dall-e-3".to_string(),
            size: ImageSize::S1024x1024,
            count: 1,
            api_key_for_logging: api_key,
        }
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    pub fn with_size(mut self, size: ImageSize) -> Self {
        self.size = size;
        self
    }

    /// Images per request (dall-e-3 only accepts 1).
    pub fn with_count(mut self, count: u8) -> Self {
        self.count = count.max(1);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

fn image_to_url(image: &Image) -> String {
    match image {
        Image::Url { url, .. } => url.clone(),
        Image::B64Json { b64_json, .. } => format!("data:image/png;base64,{}", b64_json),
    }
}

#[async_trait]
impl ImageGenerator for ImageGenerationClient {
    #[tracing::instrument(skip(self, prompt))]
    async fn generate(&self, prompt: &str) -> Result<Vec<String>> {
        tracing::info!(
            model = %self.model,
            size = ?self.size,
            count = self.count,
            prompt_preview = %prompt.chars().take(100).collect::<String>(),
            api_key = %mask_token(&self.api_key_for_logging),
            "OpenAI image generation request"
        );

        let request = CreateImageRequestArgs::default()
            .prompt(prompt)
            .model(ImageModel::Other(self.model.clone()))
            .size(self.size)
            .response_format(ResponseFormat::Url)
            .n(self.count)
            .build()?;
        if let Ok(json) = serde_json::to_string(&request) {
            tracing::debug!(request_json = %json, "OpenAI image generation request JSON");
        }

        let response = self.client.images().create(request).await?;
        let urls: Vec<String> = response.data.iter().map(|d| image_to_url(d)).collect();
        if urls.is_empty() {
            anyhow::bail!("No image in response");
        }
        tracing::info!(count = urls.len(), "OpenAI image generation completed");
        Ok(urls)
    }
}
