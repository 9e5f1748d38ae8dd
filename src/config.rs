//! Client configuration
//!
//! `ClientConfig` gathers everything needed to build an RPC client or a
//! WebSocket subscriber. All fields have defaults, so a config can be
//! deserialized from a partial document or built with the setters.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::provider::RpcProvider;

/// Fixed-delay retry settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay between attempts in milliseconds
    pub delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay_ms: 500,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay_ms: delay.as_millis() as u64,
        }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// RPC client and subscriber configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Endpoint provider
    pub provider: RpcProvider,
    /// Endpoint URL, required when `provider` is `custom`
    pub endpoint: Option<String>,
    /// API key substituted into keyed provider templates
    pub api_key: String,
    /// Maximum requests per second; unlimited when `None`
    pub rate_limit: Option<u32>,
    /// Log every request and response at debug level
    pub debug: bool,
    /// Cache responses of idempotent methods
    pub cache: bool,
    /// Capacity of the response cache
    pub cache_capacity: usize,
    /// Per-message timeout for WebSocket subscriptions, in seconds
    pub ws_timeout_secs: u64,
    /// Retry settings for batched block queries
    pub retry: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            provider: RpcProvider::Default,
            endpoint: None,
            api_key: String::new(),
            rate_limit: None,
            debug: false,
            cache: true,
            cache_capacity: 256,
            ws_timeout_secs: 10,
            retry: RetryPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Config for a caller-supplied endpoint
    pub fn custom(endpoint: impl Into<String>) -> Self {
        Self {
            provider: RpcProvider::Custom,
            endpoint: Some(endpoint.into()),
            ..Default::default()
        }
    }

    pub fn with_provider(mut self, provider: RpcProvider) -> Self {
        self.provider = provider;
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    pub fn with_rate_limit(mut self, per_second: u32) -> Self {
        self.rate_limit = Some(per_second);
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn ws_timeout(&self) -> Duration {
        Duration::from_secs(self.ws_timeout_secs)
    }
}
