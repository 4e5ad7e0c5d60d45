//! agent CLI: interactive chat, and direct access to long-term memory. Config from env (.env).

mod assembly;
mod chat;
mod cli;
mod config;

use anyhow::{Context, Result};
use clap::Parser;
use llm_client::EnvLlmConfig;
use memory::{Clock, MemoryStore, MetadataFilter, RecalledSet, DEFAULT_IMPORTANCE, DEFAULT_MEMORY_TYPE};
use std::path::Path;

use crate::cli::{Cli, Commands};
use crate::config::CliConfig;

const CONTENT_PREVIEW_LEN: usize = 80;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = CliConfig::load()?;

    match cli.command {
        Commands::Chat {
            message,
            delimiters,
            verbose,
        } => {
            init_logging(&config, verbose)?;
            handle_chat(&config, message, delimiters).await
        }
        Commands::Remember {
            content,
            memory_type,
            importance,
        } => {
            init_logging(&config, true)?;
            let store = assembly::build_memory_store(&config).await?;
            handle_remember(&store, content, memory_type, importance).await
        }
        Commands::Recall {
            query,
            k,
            threshold,
            memory_type,
        } => {
            init_logging(&config, false)?;
            let store = assembly::build_memory_store(&config).await?;
            handle_recall(&store, &query, k, threshold, memory_type).await
        }
    }
}

fn init_logging(config: &CliConfig, console: bool) -> Result<()> {
    if let Some(parent) = Path::new(&config.log_file).parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Create log directory for {}", config.log_file))?;
    }
    agent_core::init_tracing(&config.log_file, console)
}

async fn handle_chat(config: &CliConfig, message: Option<String>, delimiters: Vec<String>) -> Result<()> {
    let llm = EnvLlmConfig::from_env().context("Load LLM config (OPENAI_API_KEY, OPENAI_BASE_URL, MODEL)")?;
    let store = assembly::build_memory_store(config).await?;
    let agent = assembly::build_agent(config, &llm, store);
    chat::run_chat(agent, message, delimiters).await
}

async fn handle_remember(
    store: &MemoryStore,
    content: String,
    memory_type: Option<String>,
    importance: Option<f64>,
) -> Result<()> {
    let ids = store
        .store(
            content,
            memory_type.unwrap_or_else(|| DEFAULT_MEMORY_TYPE.to_string()),
            importance.unwrap_or(DEFAULT_IMPORTANCE),
        )
        .await?;
    for id in ids {
        println!("Stored memory {}", id);
    }
    Ok(())
}

async fn handle_recall(
    store: &MemoryStore,
    query: &str,
    k: usize,
    threshold: f64,
    memory_type: Option<String>,
) -> Result<()> {
    let filter = memory_type.map(MetadataFilter::by_type);
    let mut recalled = RecalledSet::default();
    let memories = store
        .retrieve(query, k, threshold, filter.as_ref(), &mut recalled)
        .await?;

    if memories.is_empty() {
        println!("No memories above threshold {}.", threshold);
        return Ok(());
    }

    let now = store.clock().now_secs();
    println!(
        "{:<6} {:<6} {:<12} {:<16} {}",
        "score", "sim", "type", "created", "content"
    );
    println!("{}", "-".repeat(100));
    for m in &memories {
        let content: String = m.fragment.content.chars().take(CONTENT_PREVIEW_LEN).collect();
        println!(
            "{:<6.3} {:<6.3} {:<12} {:<16} {}",
            m.score,
            m.similarity,
            m.fragment.metadata.memory_type,
            prompt::relative_time_label(m.fragment.metadata.created_at, now),
            content.replace('\n', " ")
        );
    }
    Ok(())
}
