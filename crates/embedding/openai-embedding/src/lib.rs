//! # OpenAI Embedding Service
//!
//! [`EmbeddingService`] over OpenAI-compatible embeddings endpoints (`text-embedding-3-small`
//! by default). Used by the memory backends to embed fragment contents and recall queries.
//!
//! ```rust,no_run
//! use embedding::EmbeddingService;
//! use openai_embedding::OpenAIEmbedding;
//!
//! async fn example() -> Result<(), anyhow::Error> {
//!     let service = OpenAIEmbedding::with_api_key("sk-...".to_string());
//!     let vector = service.embed("I prefer tea over coffee").await?;
//!     println!("dimension: {}", vector.len());
//!     Ok(())
//! }
//! ```

use async_openai::types::{CreateEmbeddingRequestArgs, EmbeddingInput};
use async_openai::Client;
use async_trait::async_trait;
use embedding::{EmbeddingConfig, EmbeddingService};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

const EMBED_TIMEOUT: Duration = Duration::from_secs(30);
const EMBED_BATCH_TIMEOUT: Duration = Duration::from_secs(60);

/// OpenAI embedding service implementation. Holds the async-openai client and model name.
#[derive(Debug, Clone)]
pub struct OpenAIEmbedding {
    client: Client<async_openai::config::OpenAIConfig>,
    model: String,
}

impl OpenAIEmbedding {
    /// Creates a service with an optional base URL (proxies and compatible endpoints).
    ///
    /// An empty `api_key` falls back to `OPENAI_API_KEY`.
    pub fn new(api_key: String, model: String, base_url: Option<&str>) -> Self {
        let api_key = if api_key.is_empty() {
            std::env::var("OPENAI_API_KEY").unwrap_or_default()
        } else {
            api_key
        };
        let mut openai_config = async_openai::config::OpenAIConfig::new().with_api_key(api_key);
        if let Some(url) = base_url.filter(|s| !s.is_empty()) {
            openai_config = openai_config.with_api_base(url);
        }
        Self {
            client: Client::with_config(openai_config),
            model,
        }
    }

    /// Default model, default endpoint.
    pub fn with_api_key(api_key: String) -> Self {
        Self::new(api_key, DEFAULT_EMBEDDING_MODEL.to_string(), None)
    }

    pub fn from_config(config: &dyn EmbeddingConfig) -> Self {
        Self::new(
            config.openai_api_key().to_string(),
            config.model().to_string(),
            config.openai_base_url(),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn request(&self, input: EmbeddingInput, timeout: Duration) -> anyhow::Result<Vec<Vec<f32>>> {
        let request = CreateEmbeddingRequestArgs::default()
            .model(self.model.clone())
            .input(input)
            .build()?;
        let embeddings = self.client.embeddings();
        let response = match tokio::time::timeout(timeout, embeddings.create(request)).await {
            Ok(Ok(r)) => r,
            Ok(Err(e)) => {
                warn!(error = %e, "OpenAI embed request failed");
                return Err(e.into());
            }
            Err(_) => {
                warn!(timeout_secs = timeout.as_secs(), "OpenAI embed request timed out");
                anyhow::bail!(
                    "OpenAI embed request timed out after {} seconds",
                    timeout.as_secs()
                );
            }
        };
        debug!(items = response.data.len(), "OpenAI embed response received");
        Ok(response.data.into_iter().map(|item| item.embedding).collect())
    }
}

#[async_trait]
impl EmbeddingService for OpenAIEmbedding {
    #[instrument(skip(self, text), fields(model = %self.model, text_len = text.len()))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>, anyhow::Error> {
        let vectors = self
            .request(EmbeddingInput::StringArray(vec![text.to_string()]), EMBED_TIMEOUT)
            .await?;
        let embedding = vectors
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("No embedding in response"))?;
        info!(dimension = embedding.len(), "step: embedding OpenAI embed done");
        Ok(embedding)
    }

    #[instrument(skip(self, texts), fields(model = %self.model, batch_size = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, anyhow::Error> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        let embeddings = self
            .request(EmbeddingInput::StringArray(texts.to_vec()), EMBED_BATCH_TIMEOUT)
            .await?;
        if embeddings.len() != texts.len() {
            anyhow::bail!("Expected {} embeddings, got {}", texts.len(), embeddings.len());
        }
        info!(count = embeddings.len(), "step: embedding OpenAI embed_batch done");
        Ok(embeddings)
    }
}
