//! # Fallback Dispatcher
//!
//! Sends one prompt through an ordered chain of adapters:
//!
//! ```text
//! START -> cache hit? -> RETURN
//!       -> for each adapter: TRY -> ok:  CACHE + RETURN
//!                                -> err: NEXT
//!       -> chain exhausted -> FAIL
//! ```
//!
//! The order is a static priority list. First success wins.

use tracing::{info, warn};

use crate::domain::config::AppConfig;
use crate::domain::traits::ModelAdapter;
use crate::domain::types::{DispatchError, Error};
use crate::infrastructure::cache::ResponseCache;
use crate::infrastructure::llm::build_adapter;
use crate::infrastructure::logging::CallLog;

/// Everything a dispatch needs besides the adapters, owned by the caller
#[derive(Debug)]
pub struct CallContext {
    pub log: CallLog,
    /// `None` when caching is disabled in configuration
    pub cache: Option<ResponseCache>,
}

impl CallContext {
    pub fn new(log: CallLog, cache: Option<ResponseCache>) -> Self {
        Self { log, cache }
    }

    /// Open the call log and cache described by `config`.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let log = CallLog::daily(&config.logging.dir)?;
        let cache = config
            .cache
            .enabled
            .then(|| ResponseCache::new(&config.cache.path));
        Ok(Self::new(log, cache))
    }
}

pub struct Dispatcher {
    adapters: Vec<Box<dyn ModelAdapter>>,
    context: CallContext,
}

impl Dispatcher {
    pub fn new(adapters: Vec<Box<dyn ModelAdapter>>, context: CallContext) -> Self {
        Self { adapters, context }
    }

    /// Build the configured chain, in fallback order.
    pub fn from_config(config: &AppConfig, context: CallContext) -> Self {
        let adapters = config
            .chain()
            .into_iter()
            .map(|(name, agent)| build_adapter(name, agent))
            .collect();
        Self::new(adapters, context)
    }

    pub fn adapters(&self) -> &[Box<dyn ModelAdapter>] {
        &self.adapters
    }

    /// Answer `prompt` from the cache or the first adapter that succeeds.
    ///
    /// `use_cache` only takes effect when a cache is configured.
    pub async fn dispatch(&self, prompt: &str, use_cache: bool) -> Result<String, DispatchError> {
        let cache = self.context.cache.as_ref().filter(|_| use_cache);

        if let Some(cached) = cache.and_then(|c| c.get(prompt)) {
            info!("Cache hit");
            self.context.log.response(&cached);
            return Ok(cached);
        }

        let mut last_error: Option<Error> = None;
        for adapter in &self.adapters {
            info!("Calling {} model {}", adapter.name(), adapter.model());

            match adapter.invoke(prompt).await {
                Ok(text) => {
                    self.context.log.response(&text);
                    if let Some(cache) = cache {
                        cache.put(prompt, &text);
                    }
                    return Ok(text);
                }
                Err(e) => {
                    warn!("{} failed: {}", adapter.name(), e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(last) => Err(DispatchError::Exhausted {
                attempts: self.adapters.len(),
                last,
            }),
            None => Err(DispatchError::NoAdapters),
        }
    }

    /// Per-adapter token estimates, in chain order.
    pub async fn estimate_tokens(&self, prompt: &str) -> Vec<(String, i64)> {
        let mut estimates = Vec::with_capacity(self.adapters.len());
        for adapter in &self.adapters {
            estimates.push((adapter.name().to_string(), adapter.estimate_tokens(prompt).await));
        }
        estimates
    }
}
