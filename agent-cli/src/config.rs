//! Agent configuration loaded from environment variables.

use agent::{AgentSettings, DEFAULT_TOKEN_LIMIT};
use anyhow::Result;
use memory::DecayParams;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Backend of the long-term memory store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryStoreType {
    /// In-process; forgotten on exit.
    Memory,
    Sqlite,
}

pub struct CliConfig {
    pub token_limit: u32,
    pub max_tool_rounds: usize,
    pub recall_k: usize,
    pub recall_threshold: f64,
    pub can_see_datetime: bool,
    pub memory_store_type: MemoryStoreType,
    pub memory_sqlite_path: String,
    pub decay: DecayParams,
    /// Directory `play_sound` resolves file names against.
    pub sounds_dir: PathBuf,
    pub log_file: String,
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

impl CliConfig {
    pub fn load() -> Result<Self> {
        let defaults = AgentSettings::default();
        let decay_defaults = DecayParams::default();

        let memory_store_type = match env::var("MEMORY_STORE_TYPE")
            .unwrap_or_else(|_| "memory".to_string())
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "memory" => MemoryStoreType::Memory,
            "sqlite" => MemoryStoreType::Sqlite,
            other => anyhow::bail!("MEMORY_STORE_TYPE must be 'memory' or 'sqlite', got '{}'", other),
        };

        let decay = DecayParams {
            base_half_life: env_or("MEMORY_BASE_HALF_LIFE", decay_defaults.base_half_life),
            strength_factor: env_or("MEMORY_STRENGTH_FACTOR", decay_defaults.strength_factor),
            importance_curve: env_or("MEMORY_IMPORTANCE_CURVE", decay_defaults.importance_curve),
        };
        if !decay.base_half_life.is_finite() || decay.base_half_life <= 0.0 {
            anyhow::bail!("MEMORY_BASE_HALF_LIFE must be a positive number, got {}", decay.base_half_life);
        }
        if !(0.0..=1.0).contains(&decay.strength_factor) {
            anyhow::bail!("MEMORY_STRENGTH_FACTOR must be within [0, 1], got {}", decay.strength_factor);
        }
        if !(decay.importance_curve > 0.0 && decay.importance_curve < 1.0) {
            anyhow::bail!("MEMORY_IMPORTANCE_CURVE must be within (0, 1), got {}", decay.importance_curve);
        }

        Ok(Self {
            token_limit: env_or("TOKEN_LIMIT", DEFAULT_TOKEN_LIMIT),
            max_tool_rounds: env_or("MAX_TOOL_ROUNDS", defaults.max_tool_rounds),
            recall_k: env_or("RECALL_K", defaults.recall_k),
            recall_threshold: env_or("RECALL_THRESHOLD", defaults.recall_threshold),
            can_see_datetime: env_or("AGENT_CAN_SEE_DATETIME", false),
            memory_store_type,
            memory_sqlite_path: env::var("MEMORY_SQLITE_PATH")
                .unwrap_or_else(|_| "./data/memory.db".to_string()),
            decay,
            sounds_dir: env::var("SOUNDS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./sounds")),
            log_file: env::var("LOG_FILE").unwrap_or_else(|_| "logs/agent.log".to_string()),
        })
    }

    /// Controller settings; `system_prompt` replaces the default when set.
    pub fn agent_settings(&self, system_prompt: Option<&str>) -> AgentSettings {
        let defaults = AgentSettings::default();
        AgentSettings {
            system_prompt: system_prompt
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string)
                .unwrap_or(defaults.system_prompt.clone()),
            token_limit: self.token_limit,
            max_tool_rounds: self.max_tool_rounds,
            recall_k: self.recall_k,
            recall_threshold: self.recall_threshold,
            can_see_datetime: self.can_see_datetime,
            ..defaults
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const KEYS: &[&str] = &[
        "TOKEN_LIMIT",
        "MAX_TOOL_ROUNDS",
        "RECALL_K",
        "RECALL_THRESHOLD",
        "AGENT_CAN_SEE_DATETIME",
        "MEMORY_STORE_TYPE",
        "MEMORY_SQLITE_PATH",
        "MEMORY_BASE_HALF_LIFE",
        "MEMORY_STRENGTH_FACTOR",
        "MEMORY_IMPORTANCE_CURVE",
        "SOUNDS_DIR",
        "LOG_FILE",
    ];

    fn clear_env() {
        for key in KEYS {
            env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_load_config_with_defaults() {
        clear_env();

        let config = CliConfig::load().unwrap();

        assert_eq!(config.token_limit, 16_000);
        assert_eq!(config.max_tool_rounds, 8);
        assert_eq!(config.recall_k, 2);
        assert_eq!(config.recall_threshold, 0.8);
        assert!(!config.can_see_datetime);
        assert_eq!(config.memory_store_type, MemoryStoreType::Memory);
        assert_eq!(config.memory_sqlite_path, "./data/memory.db");
        assert_eq!(config.decay, DecayParams::default());
        assert_eq!(config.sounds_dir, PathBuf::from("./sounds"));
        assert_eq!(config.log_file, "logs/agent.log");
    }

    #[test]
    #[serial]
    fn test_load_config_with_custom_values() {
        clear_env();
        env::set_var("TOKEN_LIMIT", "8000");
        env::set_var("MAX_TOOL_ROUNDS", "3");
        env::set_var("RECALL_THRESHOLD", "0.75");
        env::set_var("AGENT_CAN_SEE_DATETIME", "true");
        env::set_var("MEMORY_STORE_TYPE", "SQLite");
        env::set_var("MEMORY_SQLITE_PATH", "/tmp/agent-memory.db");
        env::set_var("MEMORY_BASE_HALF_LIFE", "14");

        let config = CliConfig::load().unwrap();

        assert_eq!(config.token_limit, 8000);
        assert_eq!(config.max_tool_rounds, 3);
        assert_eq!(config.recall_threshold, 0.75);
        assert!(config.can_see_datetime);
        assert_eq!(config.memory_store_type, MemoryStoreType::Sqlite);
        assert_eq!(config.memory_sqlite_path, "/tmp/agent-memory.db");
        assert_eq!(config.decay.base_half_life, 14.0);

        let settings = config.agent_settings(Some("You are Echo."));
        assert_eq!(settings.system_prompt, "You are Echo.");
        assert_eq!(settings.token_limit, 8000);
        assert!(settings.can_see_datetime);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_load_config_rejects_unknown_store_type() {
        clear_env();
        env::set_var("MEMORY_STORE_TYPE", "lance");
        assert!(CliConfig::load().is_err());
        clear_env();
    }

    #[test]
    #[serial]
    fn test_load_config_rejects_out_of_range_decay_params() {
        for (key, value) in [
            ("MEMORY_BASE_HALF_LIFE", "nan"),
            ("MEMORY_BASE_HALF_LIFE", "inf"),
            ("MEMORY_BASE_HALF_LIFE", "0"),
            ("MEMORY_STRENGTH_FACTOR", "1.5"),
            ("MEMORY_STRENGTH_FACTOR", "NaN"),
            ("MEMORY_IMPORTANCE_CURVE", "0"),
            ("MEMORY_IMPORTANCE_CURVE", "1"),
        ] {
            clear_env();
            env::set_var(key, value);
            assert!(CliConfig::load().is_err(), "{}={} should be rejected", key, value);
        }

        clear_env();
        env::set_var("MEMORY_STRENGTH_FACTOR", "1");
        env::set_var("MEMORY_IMPORTANCE_CURVE", "0.9");
        let config = CliConfig::load().unwrap();
        assert_eq!(config.decay.strength_factor, 1.0);
        assert_eq!(config.decay.importance_curve, 0.9);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_unparseable_numbers_fall_back_to_defaults() {
        clear_env();
        env::set_var("RECALL_K", "many");
        let config = CliConfig::load().unwrap();
        assert_eq!(config.recall_k, 2);
        assert_eq!(
            config.agent_settings(None).system_prompt,
            AgentSettings::default().system_prompt
        );
        clear_env();
    }
}
