//! Error types for chain queries
//!
//! This module defines the error handling system for the crate:
//! - Client construction errors (unknown provider, missing endpoint, bad URL)
//! - RPC request and response decoding errors
//! - Transaction view errors (missing payloads, missing receiver)
//! - Block assembly errors

use alloy::primitives::B256;
use thiserror::Error;

/// Top-level error type for the crate
///
/// Wraps every error a public operation can return so callers that do not
/// care about the source can use a single type.
#[derive(Debug, Error)]
pub enum ToolkitError {
    /// Errors occurring while building a client or subscriber
    #[error("Failed to initialize client: {0}")]
    Init(#[from] InitError),

    /// Errors returned by the node or while decoding its response
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    /// Errors raised by a transaction view
    #[error("Transaction error: {0}")]
    Transaction(#[from] TxError),

    /// Errors raised while assembling a block view
    #[error("Block error: {0}")]
    Block(#[from] BlockError),
}

/// Initialization-specific errors
///
/// These errors occur while resolving endpoints and connecting,
/// before any chain data is requested.
#[derive(Debug, Error)]
pub enum InitError {
    /// Chain name or id is not in the registry
    #[error("Unknown chain: {0}")]
    UnknownChain(String),

    /// Provider name is not recognized
    #[error("Unknown RPC provider: {0}")]
    UnknownProvider(String),

    /// The provider has no endpoint registered for this chain
    #[error("Provider {provider} has no {transport} endpoint for chain {chain}")]
    UnsupportedProvider {
        chain: String,
        provider: String,
        transport: &'static str,
    },

    /// The `custom` provider was selected without an endpoint
    #[error("An endpoint must be provided when the provider is custom")]
    MissingEndpoint,

    /// The provider's endpoint template needs an API key
    #[error("Provider {0} requires an API key")]
    MissingApiKey(String),

    /// A registered endpoint template is malformed
    #[error("Invalid endpoint template for {provider} on {chain}: {reason}")]
    InvalidTemplate {
        chain: String,
        provider: String,
        reason: String,
    },

    /// Invalid or malformed RPC URL
    #[error("Invalid RPC URL: {0}")]
    InvalidRpcUrl(String),

    /// WebSocket connection or subscription errors
    #[error("WebSocket connection failed: {0}")]
    WsConnection(String),
}

/// Errors raised while talking to the node
#[derive(Debug, Error)]
pub enum RpcError {
    /// The request failed at the transport level or the node returned an error
    #[error("{method} failed: {reason}")]
    Transport {
        method: String,
        reason: String,
    },

    /// The response could not be decoded into the expected type
    #[error("Failed to decode {method} response: {reason}")]
    Decode {
        method: String,
        reason: String,
    },

    /// The node answered with `null` where a value was required
    #[error("{method} returned no result")]
    EmptyResult {
        method: String,
    },
}

/// Transaction view errors
#[derive(Debug, Error)]
pub enum TxError {
    /// A payload the accessor depends on could not be fetched
    ///
    /// # Fields
    /// * `payload` - Which payload is missing (`txdata`, `receipt`)
    /// * `hash` - Transaction hash
    /// * `reason` - Why the fetch failed
    #[error("{payload} unavailable for {hash}: {reason}")]
    PayloadUnavailable {
        payload: &'static str,
        hash: B256,
        reason: String,
    },

    /// Transaction has neither a destination nor a created contract
    #[error("receiver not found, tx may be failed, txhash: {0}")]
    ReceiverNotFound(B256),

    /// Operation needs a mined transaction
    #[error("transaction {0} is pending")]
    Pending(B256),

    /// Errors from direct RPC calls (simulation, raw traces)
    #[error(transparent)]
    Rpc(#[from] RpcError),
}

/// Block assembly errors
#[derive(Debug, Error)]
pub enum BlockError {
    /// The node does not know the requested block
    #[error("Block not found: {0}")]
    NotFound(String),

    /// Header fetch failed
    #[error(transparent)]
    Rpc(#[from] RpcError),
}
