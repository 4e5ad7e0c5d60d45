//! Tests for [`openai_embedding::OpenAIEmbedding`].
//!
//! The API test is `#[ignore]`d; run it with `cargo test -p openai-embedding -- --ignored`
//! and `OPENAI_API_KEY` set (the workspace `.env` is loaded).

use std::path::Path;

use embedding::{EmbeddingProvider, EmbeddingService, EnvEmbeddingConfig};
use openai_embedding::{OpenAIEmbedding, DEFAULT_EMBEDDING_MODEL};

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    dot / (na * nb)
}

/// **Test: Related memories embed closer than unrelated ones (real API).**
///
/// **Expected:** A query about tea is nearer to a tea preference than to a car fact.
/// Quota or rate-limit errors skip the test.
#[tokio::test]
#[ignore]
async fn test_related_texts_are_closer() {
    let _ = dotenvy::from_path(Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../.env"));
    let Ok(api_key) = std::env::var("OPENAI_API_KEY") else {
        eprintln!("OPENAI_API_KEY not set, skipped");
        return;
    };
    let service = OpenAIEmbedding::with_api_key(api_key);

    let texts = vec![
        "What tea does Alex like?".to_string(),
        "Alex prefers oolong tea".to_string(),
        "The car needs new tyres".to_string(),
    ];
    match service.embed_batch(&texts).await {
        Ok(v) => {
            assert_eq!(v.len(), 3);
            assert!(cosine(&v[0], &v[1]) > cosine(&v[0], &v[2]));
        }
        Err(e) if e.to_string().contains("quota") || e.to_string().contains("rate_limit") => {
            eprintln!("skipped: {}", e);
        }
        Err(e) => panic!("embed_batch failed: {}", e),
    }
}

/// **Test: Construction from config (no API call).**
///
/// **Expected:** The configured model is used; empty batches short-circuit without a request.
#[tokio::test]
async fn test_openai_embedding_from_config() {
    let config = EnvEmbeddingConfig {
        embedding_provider: EmbeddingProvider::OpenAI,
        embedding_model: "text-embedding-3-large".to_string(),
        openai_api_key: "sk-unused".to_string(),
        openai_base_url: Some("http://127.0.0.1:9".to_string()),
    };
    let service = OpenAIEmbedding::from_config(&config);
    assert_eq!(service.model(), "text-embedding-3-large");
    assert!(service.embed_batch(&[]).await.unwrap().is_empty());
    assert_eq!(OpenAIEmbedding::with_api_key(String::new()).model(), DEFAULT_EMBEDDING_MODEL);
}
