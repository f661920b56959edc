//! # Configuration
//!
//! Manages the loading and parsing of the application's configuration file (`config.yaml`).
//! Defines the agents, the fallback order, and the cache and call-log settings.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::domain::types::Provider;

pub const DEFAULT_CONFIG_PATH: &str = "data/config.yaml";
pub const DEFAULT_CACHE_FILE: &str = "llm_cache.json";
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Main application configuration structure.
/// Matches the layout of `data/config.yaml`.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub agents: AgentsConfig,
    /// Agent names in priority order
    #[serde(default)]
    pub fallback: Vec<String>,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

pub type AgentsConfig = HashMap<String, AgentConfig>;

#[derive(Debug, Deserialize, Clone)]
pub struct AgentConfig {
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_key_env: Option<String>, // e.g. "OPENROUTER_API_KEY"
    /// Request timeout in seconds
    #[serde(default)]
    pub timeout: Option<u64>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub temperature: Option<f32>,
    /// Anthropic extended thinking budget
    #[serde(default)]
    pub thinking_budget: Option<u32>,
    /// OpenAI reasoning models ("low", "medium", "high")
    #[serde(default)]
    pub reasoning_effort: Option<String>,
    /// Gemini on Vertex AI
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            provider: String::new(),
            model: String::new(),
            endpoint: None,
            api_key: None,
            api_key_env: None,
            timeout: None,
            max_tokens: None,
            temperature: None,
            thinking_budget: None,
            reasoning_effort: None,
            project_id: None,
            location: None,
        }
    }
}

impl AgentConfig {
    fn openrouter(model: &str) -> Self {
        Self {
            provider: Provider::OpenRouter.as_str().to_string(),
            model: model.to_string(),
            api_key_env: Some(Provider::OpenRouter.default_key_env().to_string()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_cache_path")]
    pub path: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_cache_path(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_dir")]
    pub dir: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_cache_path() -> PathBuf {
    PathBuf::from(DEFAULT_CACHE_FILE)
}

fn default_log_dir() -> PathBuf {
    PathBuf::from(DEFAULT_LOG_DIR)
}

/// Four models behind one aggregator key
const DEFAULT_CHAIN: [(&str, &str); 4] = [
    ("gemini-pro", "google/gemini-2.5-pro"),
    ("o1", "openai/o1"),
    ("claude-sonnet", "anthropic/claude-3.7-sonnet"),
    ("deepseek-r1", "deepseek/deepseek-r1"),
];

impl Default for AppConfig {
    fn default() -> Self {
        let agents = DEFAULT_CHAIN
            .iter()
            .map(|(name, model)| (name.to_string(), AgentConfig::openrouter(model)))
            .collect();
        Self {
            agents,
            fallback: DEFAULT_CHAIN.iter().map(|(name, _)| name.to_string()).collect(),
            cache: CacheConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration.
    ///
    /// An explicit `path` must exist. Without one, `data/config.yaml` is used when
    /// present and the built-in OpenRouter chain otherwise. Environment overrides
    /// are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_PATH))?
            }
            None => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: AppConfig = serde_yaml::from_str(content)?;
        // An empty file means "use the defaults"
        if config.agents.is_empty() && config.fallback.is_empty() {
            return Ok(Self {
                cache: config.cache,
                logging: config.logging,
                ..Self::default()
            });
        }
        Ok(config)
    }

    /// `LOG_DIR` moves the call log; `GEMINI_PROJECT_ID` / `GEMINI_LOCATION`
    /// fill Vertex settings that gemini agents leave unset.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup("LOG_DIR").filter(|d| !d.is_empty()) {
            self.logging.dir = PathBuf::from(dir);
        }

        let project = lookup("GEMINI_PROJECT_ID");
        let location = lookup("GEMINI_LOCATION");
        for agent in self.agents.values_mut() {
            if Provider::from_str(&agent.provider) != Some(Provider::Gemini) {
                continue;
            }
            if agent.project_id.is_none() {
                agent.project_id = project.clone();
            }
            if agent.location.is_none() {
                agent.location = location.clone();
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.fallback.is_empty() {
            bail!("`fallback` must list at least one agent");
        }
        for name in &self.fallback {
            // An unknown provider is not fatal here; that agent fails at call time
            if !self.agents.contains_key(name) {
                bail!("Fallback entry `{}` is not a configured agent", name);
            }
        }
        Ok(())
    }

    /// Agent configurations in fallback order.
    pub fn chain(&self) -> Vec<(&str, &AgentConfig)> {
        self.fallback
            .iter()
            .filter_map(|name| self.agents.get(name).map(|agent| (name.as_str(), agent)))
            .collect()
    }
}
