//! LLM configuration: trait and env-based implementation.

use anyhow::{Context, Result};
use std::env;

/// LLM configuration interface for OpenAI-compatible APIs.
pub trait LlmConfig: Send + Sync {
    fn api_key(&self) -> &str;
    fn base_url(&self) -> &str;
    fn model(&self) -> &str;
    /// Sampling temperature for conversation turns; `None` uses the backend default.
    fn temperature(&self) -> Option<f32>;
    fn system_prompt(&self) -> Option<&str>;
}

/// LLM config loaded from environment variables.
#[derive(Debug, Clone)]
pub struct EnvLlmConfig {
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub llm_model: String,
    pub llm_temperature: Option<f32>,
    pub llm_system_prompt: Option<String>,
}

impl LlmConfig for EnvLlmConfig {
    fn api_key(&self) -> &str {
        &self.openai_api_key
    }
    fn base_url(&self) -> &str {
        &self.openai_base_url
    }
    fn model(&self) -> &str {
        &self.llm_model
    }
    fn temperature(&self) -> Option<f32> {
        self.llm_temperature
    }
    fn system_prompt(&self) -> Option<&str> {
        self.llm_system_prompt.as_deref()
    }
}

impl EnvLlmConfig {
    /// Load from environment variables.
    pub fn from_env() -> Result<Self> {
        let openai_api_key = env::var("OPENAI_API_KEY").context("OPENAI_API_KEY not set")?;
        let openai_base_url = env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
        let llm_model = env::var("MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
        let llm_temperature = match env::var("LLM_TEMPERATURE") {
            Ok(s) if !s.trim().is_empty() => Some(
                s.trim()
                    .parse::<f32>()
                    .with_context(|| format!("LLM_TEMPERATURE is not a number: {}", s))?,
            ),
            _ => None,
        };
        let llm_system_prompt = env::var("LLM_SYSTEM_PROMPT")
            .or_else(|_| env::var("SYSTEM_PROMPT"))
            .ok()
            .filter(|s| !s.trim().is_empty());
        Ok(Self {
            openai_api_key,
            openai_base_url,
            llm_model,
            llm_temperature,
            llm_system_prompt,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear() {
        for key in [
            "OPENAI_API_KEY",
            "OPENAI_BASE_URL",
            "MODEL",
            "LLM_TEMPERATURE",
            "LLM_SYSTEM_PROMPT",
            "SYSTEM_PROMPT",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_from_env_requires_api_key() {
        clear();
        assert!(EnvLlmConfig::from_env().is_err());
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear();
        env::set_var("OPENAI_API_KEY", "sk-test");
        let config = EnvLlmConfig::from_env().unwrap();
        assert_eq!(config.base_url(), "https://api.openai.com/v1");
        assert_eq!(config.model(), "gpt-4o-mini");
        assert_eq!(config.temperature(), None);
        assert_eq!(config.system_prompt(), None);
        clear();
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clear();
        env::set_var("OPENAI_API_KEY", "sk-test");
        env::set_var("MODEL", "deepseek-chat");
        env::set_var("LLM_TEMPERATURE", "0.7");
        env::set_var("SYSTEM_PROMPT", "Be brief.");
        let config = EnvLlmConfig::from_env().unwrap();
        assert_eq!(config.model(), "deepseek-chat");
        assert_eq!(config.temperature(), Some(0.7));
        assert_eq!(config.system_prompt(), Some("Be brief."));

        env::set_var("LLM_TEMPERATURE", "warm");
        assert!(EnvLlmConfig::from_env().is_err());
        clear();
    }
}
