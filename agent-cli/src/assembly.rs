//! Builds the memory store, the chat model and the agent from configuration.

use agent::Agent;
use agent_core::Tool;
use agent_tools::{GenerateImageTool, PlaySoundTool, RecallMemoryTool, RememberTool};
use anyhow::{Context, Result};
use embedding::{EmbeddingConfig, EmbeddingProvider, EmbeddingService, EnvEmbeddingConfig, HashingEmbedding};
use image_generation_client::ImageGenerationClient;
use llm_client::{ChatModel, EnvLlmConfig, LlmConfig, OpenAIChatModel};
use memory::{MemoryStore, RecallSession, VectorStore};
use memory_inmemory::InMemoryVectorStore;
use memory_sqlite::SQLiteVectorStore;
use openai_embedding::OpenAIEmbedding;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{CliConfig, MemoryStoreType};

fn build_embedding() -> Result<Arc<dyn EmbeddingService>> {
    let cfg = EnvEmbeddingConfig::from_env()?;
    cfg.validate()?;
    let embedding: Arc<dyn EmbeddingService> = match cfg.provider() {
        EmbeddingProvider::OpenAI => {
            info!(model = %cfg.model(), "Using OpenAI embeddings");
            Arc::new(OpenAIEmbedding::from_config(&cfg))
        }
        EmbeddingProvider::Hashing => {
            info!("Using offline hashing embeddings");
            Arc::new(HashingEmbedding::default())
        }
    };
    Ok(embedding)
}

/// Creates the shared memory store for the configured backend.
pub async fn build_memory_store(config: &CliConfig) -> Result<Arc<MemoryStore>> {
    let embedding = build_embedding().context("Load embedding config (EMBEDDING_PROVIDER, OPENAI_API_KEY)")?;
    let backend: Arc<dyn VectorStore> = match config.memory_store_type {
        MemoryStoreType::Memory => {
            warn!("MEMORY_STORE_TYPE=memory: memories are lost on exit");
            Arc::new(InMemoryVectorStore::new(embedding))
        }
        MemoryStoreType::Sqlite => {
            if let Some(parent) = Path::new(&config.memory_sqlite_path).parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Create directory for {}", config.memory_sqlite_path))?;
            }
            Arc::new(
                SQLiteVectorStore::new(&config.memory_sqlite_path, embedding)
                    .await
                    .with_context(|| format!("Open memory database {}", config.memory_sqlite_path))?,
            )
        }
    };
    Ok(Arc::new(MemoryStore::new(backend).with_params(config.decay)))
}

/// Builds one conversation's agent over the shared store.
pub fn build_agent(config: &CliConfig, llm: &EnvLlmConfig, store: Arc<MemoryStore>) -> Agent {
    let model: Arc<dyn ChatModel> = Arc::new(OpenAIChatModel::from_config(llm));
    let session = Arc::new(RecallSession::new(Arc::clone(&store)));
    let images = ImageGenerationClient::with_base_url(llm.api_key().to_string(), llm.base_url().to_string());

    let tools: Vec<Arc<dyn Tool>> = vec![
        Arc::new(GenerateImageTool::new(Arc::new(images))),
        Arc::new(PlaySoundTool::new(config.sounds_dir.clone())),
        Arc::new(RecallMemoryTool::new(Arc::clone(&session))),
        Arc::new(RememberTool::new(store)),
    ];

    if let Some(s) = llm.system_prompt() {
        let prefix: String = s.chars().take(50).collect();
        info!(len = s.len(), prefix = %prefix, "Using custom system prompt from env");
    }

    Agent::builder()
        .model(model)
        .recall(session)
        .tools(tools)
        .settings(config.agent_settings(llm.system_prompt()))
        .build()
}
