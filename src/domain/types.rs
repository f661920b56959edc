//! # Domain Types
//!
//! Common data structures and enums shared by the adapters, the cache and the dispatcher.

/// Returned by `estimate_tokens` when the count is unavailable.
/// Callers must read this as "unknown", never as zero.
pub const TOKENS_UNKNOWN: i64 = -1;

/// Wire protocol spoken by a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAI,
    OpenRouter,
    Anthropic,
    Gemini,
}

impl Provider {
    pub fn as_str(&self) -> &str {
        match self {
            Provider::OpenAI => "openai",
            Provider::OpenRouter => "openrouter",
            Provider::Anthropic => "anthropic",
            Provider::Gemini => "gemini",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Some(Provider::OpenAI),
            "openrouter" | "open_router" => Some(Provider::OpenRouter),
            "anthropic" | "claude" => Some(Provider::Anthropic),
            "gemini" | "google" => Some(Provider::Gemini),
            _ => None,
        }
    }

    /// Environment variable consulted when an agent names no key source.
    pub fn default_key_env(&self) -> &'static str {
        match self {
            Provider::OpenAI => "OPENAI_API_KEY",
            Provider::OpenRouter => "OPENROUTER_API_KEY",
            Provider::Anthropic => "ANTHROPIC_API_KEY",
            Provider::Gemini => "GEMINI_API_KEY",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A model advertised by a provider account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    pub id: String,
    pub created: Option<String>,
}

/// Error raised by a single adapter
#[derive(Debug, Clone)]
pub struct Error {
    pub message: String,
    pub provider: String,
}

impl Error {
    pub fn new(provider: &str, message: impl Into<String>) -> Self {
        Self {
            provider: provider.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.provider, self.message)
    }
}

impl std::error::Error for Error {}

/// Failure of a whole dispatch
#[derive(Debug)]
pub enum DispatchError {
    /// The fallback chain was empty.
    NoAdapters,
    /// Every adapter failed; `last` is the final adapter's error.
    Exhausted { attempts: usize, last: Error },
}

impl std::fmt::Display for DispatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DispatchError::NoAdapters => write!(f, "No providers configured"),
            DispatchError::Exhausted { attempts, last } => {
                write!(f, "All {} providers failed. Last error: {}", attempts, last)
            }
        }
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DispatchError::NoAdapters => None,
            DispatchError::Exhausted { last, .. } => Some(last),
        }
    }
}
