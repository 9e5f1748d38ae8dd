//! JSON-RPC client
//!
//! [`EthRpc`] is the seam between the views in this crate and the node.
//! Implementors only provide [`EthRpc::request`]; the typed helpers
//! (`get_code`, `get_block_receipts`, `trace_block`, ...) are built on it.
//!
//! [`RpcClient`] is the production implementation on top of an `alloy`
//! provider. Around each request it applies, in order:
//! - the rate limiter, when configured
//! - the response cache for idempotent methods
//! - debug logging of request and response
//!
//! # Example
//! ```no_run
//! use evm_query_kit::{create_client, ChainId, ClientConfig};
//! use alloy::primitives::address;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = create_client(ChainId::Eth, &ClientConfig::default())?;
//! let code = client
//!     .get_code(address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"))
//!     .await?;
//! println!("WETH bytecode: {} bytes", code.len());
//! # Ok(())
//! # }
//! ```

use alloy::{
    network::AnyNetwork,
    primitives::{Address, Bytes, B256},
    providers::{DynProvider, Provider, ProviderBuilder},
};
use async_trait::async_trait;
use log::debug;
use lru::LruCache;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::{num::NonZeroUsize, sync::Arc, sync::Mutex};

use crate::{
    chain::ChainId,
    config::ClientConfig,
    errors::{InitError, RpcError},
    provider::{resolve_endpoint, Transport},
    types::{
        BlockNumberOrTag, BlockTraceEntry, CallFrame, CallRequest, Receipt, RpcBlock,
        TracerOptions, TxData,
    },
    utils::rate_limit_utils::RateLimiter,
};

/// Type-erased `alloy` provider over any EVM network
pub type AnyNetworkProvider = DynProvider<AnyNetwork>;

/// Shared handle to an RPC implementation
pub type SharedRpc = Arc<dyn EthRpc>;

/// Methods whose responses never change for a given endpoint
pub const CACHEABLE_METHODS: [&str; 3] = ["web3_clientVersion", "net_version", "eth_chainId"];

fn decode<T: DeserializeOwned>(method: &str, value: Value) -> Result<T, RpcError> {
    serde_json::from_value(value).map_err(|e| RpcError::Decode {
        method: method.to_string(),
        reason: e.to_string(),
    })
}

fn required(method: &str, value: Value) -> Result<Value, RpcError> {
    if value.is_null() {
        Err(RpcError::EmptyResult {
            method: method.to_string(),
        })
    } else {
        Ok(value)
    }
}

/// JSON-RPC access to an EVM node
#[async_trait]
pub trait EthRpc: Send + Sync {
    /// Send one request and return the raw `result`
    ///
    /// # Arguments
    /// * `method` - JSON-RPC method name
    /// * `params` - Positional parameters as a JSON array
    async fn request(&self, method: &'static str, params: Value) -> Result<Value, RpcError>;

    async fn chain_id(&self) -> Result<u64, RpcError> {
        let value = required("eth_chainId", self.request("eth_chainId", json!([])).await?)?;
        let id: alloy::primitives::U64 = decode("eth_chainId", value)?;
        Ok(id.to::<u64>())
    }

    /// Deployed bytecode at the latest block; empty for EOAs
    async fn get_code(&self, address: Address) -> Result<Bytes, RpcError> {
        let value = self
            .request("eth_getCode", json!([address, BlockNumberOrTag::Latest]))
            .await?;
        decode("eth_getCode", required("eth_getCode", value)?)
    }

    async fn get_transaction(&self, hash: B256) -> Result<Option<TxData>, RpcError> {
        let value = self
            .request("eth_getTransactionByHash", json!([hash]))
            .await?;
        decode("eth_getTransactionByHash", value)
    }

    async fn get_transaction_receipt(&self, hash: B256) -> Result<Option<Receipt>, RpcError> {
        let value = self
            .request("eth_getTransactionReceipt", json!([hash]))
            .await?;
        decode("eth_getTransactionReceipt", value)
    }

    /// Block header with full transactions or hashes only
    async fn get_block(
        &self,
        block: BlockNumberOrTag,
        full_transactions: bool,
    ) -> Result<Option<RpcBlock>, RpcError> {
        let value = self
            .request("eth_getBlockByNumber", json!([block, full_transactions]))
            .await?;
        decode("eth_getBlockByNumber", value)
    }

    /// All receipts of a block in one call
    async fn get_block_receipts(&self, block: BlockNumberOrTag) -> Result<Vec<Receipt>, RpcError> {
        let value = self.request("eth_getBlockReceipts", json!([block])).await?;
        decode(
            "eth_getBlockReceipts",
            required("eth_getBlockReceipts", value)?,
        )
    }

    /// `callTracer` traces of every transaction in a block
    async fn trace_block(&self, block: BlockNumberOrTag) -> Result<Vec<BlockTraceEntry>, RpcError> {
        let value = self
            .request(
                "debug_traceBlockByNumber",
                json!([block, TracerOptions::call_tracer()]),
            )
            .await?;
        decode(
            "debug_traceBlockByNumber",
            required("debug_traceBlockByNumber", value)?,
        )
    }

    /// Raw `debug_traceTransaction`, with the node's default tracer when `options` is `None`
    async fn debug_trace_transaction(
        &self,
        hash: B256,
        options: Option<TracerOptions>,
    ) -> Result<Value, RpcError> {
        let params = match options {
            Some(options) => json!([hash, options]),
            None => json!([hash]),
        };
        let value = self.request("debug_traceTransaction", params).await?;
        required("debug_traceTransaction", value)
    }

    /// Call tree of a transaction, with logs
    async fn trace_transaction_calls(&self, hash: B256) -> Result<CallFrame, RpcError> {
        let value = self
            .debug_trace_transaction(hash, Some(TracerOptions::call_tracer_with_logs()))
            .await?;
        decode("debug_traceTransaction", value)
    }

    /// Call tree of a simulated call, with logs
    async fn debug_trace_call(
        &self,
        request: &CallRequest,
        block: BlockNumberOrTag,
    ) -> Result<CallFrame, RpcError> {
        let value = self
            .request(
                "debug_traceCall",
                json!([request, block, TracerOptions::call_tracer_with_logs()]),
            )
            .await?;
        decode("debug_traceCall", required("debug_traceCall", value)?)
    }

    async fn call(&self, request: &CallRequest, block: BlockNumberOrTag) -> Result<Bytes, RpcError> {
        let value = self.request("eth_call", json!([request, block])).await?;
        decode("eth_call", required("eth_call", value)?)
    }
}

/// `alloy`-backed [`EthRpc`] implementation
pub struct RpcClient {
    chain: ChainId,
    endpoint: String,
    provider: AnyNetworkProvider,
    limiter: Option<RateLimiter>,
    cache: Option<Mutex<LruCache<String, Value>>>,
    debug: bool,
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("chain", &self.chain)
            .field("endpoint", &self.endpoint)
            .field("rate_limit", &self.limiter.as_ref().map(|l| l.per_second()))
            .field("cache", &self.cache.is_some())
            .field("debug", &self.debug)
            .finish()
    }
}

impl RpcClient {
    /// Build a client for `chain` from `config`
    ///
    /// Resolves the HTTP endpoint through the provider registry
    /// (or uses `config.endpoint` for the custom provider).
    pub fn new(chain: ChainId, config: &ClientConfig) -> Result<Self, InitError> {
        let endpoint = resolve_endpoint(
            chain,
            config.provider,
            Transport::Http,
            config.endpoint.as_deref(),
            &config.api_key,
        )?;
        let url = endpoint
            .parse()
            .map_err(|_| InitError::InvalidRpcUrl(endpoint.clone()))?;
        let provider = ProviderBuilder::new()
            .network::<AnyNetwork>()
            .connect_http(url)
            .erased();
        let cache = if config.cache {
            let capacity = NonZeroUsize::new(config.cache_capacity).unwrap_or(NonZeroUsize::MIN);
            Some(Mutex::new(LruCache::new(capacity)))
        } else {
            None
        };
        Ok(Self {
            chain,
            endpoint,
            provider,
            limiter: config.rate_limit.map(RateLimiter::new),
            cache,
            debug: config.debug,
        })
    }

    pub fn chain(&self) -> ChainId {
        self.chain
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Underlying provider, for calls this crate does not wrap
    pub fn provider(&self) -> &AnyNetworkProvider {
        &self.provider
    }

    fn cache_key(method: &str, params: &Value) -> Option<String> {
        CACHEABLE_METHODS
            .contains(&method)
            .then(|| format!("{method}:{params}"))
    }

    fn cached(&self, key: &str) -> Option<Value> {
        let cache = self.cache.as_ref()?;
        let mut cache = cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        cache.get(key).cloned()
    }

    fn store(&self, key: String, value: &Value) {
        if value.is_null() {
            return;
        }
        if let Some(cache) = self.cache.as_ref() {
            let mut cache = cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            cache.put(key, value.clone());
        }
    }
}

#[async_trait]
impl EthRpc for RpcClient {
    async fn request(&self, method: &'static str, params: Value) -> Result<Value, RpcError> {
        let key = Self::cache_key(method, &params);
        if let Some(hit) = key.as_deref().and_then(|key| self.cached(key)) {
            return Ok(hit);
        }
        if let Some(limiter) = &self.limiter {
            limiter.acquire().await;
        }
        if self.debug {
            debug!("{method}, {params}");
        }
        let response: Value = self
            .provider
            .raw_request(method.into(), params)
            .await
            .map_err(|e| RpcError::Transport {
                method: method.to_string(),
                reason: e.to_string(),
            })?;
        if self.debug {
            debug!("{method}, {response}");
        }
        if let Some(key) = key {
            self.store(key, &response);
        }
        Ok(response)
    }
}

/// Build a shared client for `chain`
///
/// # Example
/// ```no_run
/// use evm_query_kit::{create_client, ChainId, ClientConfig, RpcProvider};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ClientConfig::default()
///     .with_provider(RpcProvider::Chainbase)
///     .with_api_key("your-api-key")
///     .with_rate_limit(10);
/// let client = create_client(ChainId::Bsc, &config)?;
/// # Ok(())
/// # }
/// ```
pub fn create_client(chain: ChainId, config: &ClientConfig) -> Result<SharedRpc, InitError> {
    Ok(Arc::new(RpcClient::new(chain, config)?))
}
