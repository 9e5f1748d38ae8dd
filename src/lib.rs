//! # EVM Query Kit
//!
//! Helpers for querying EVM chains over JSON-RPC and turning the raw
//! responses into convenient views.
//!
//! ## Core Features
//!
//! - **Client Setup**
//!   - Chain registry with ids, names and wrapped native tokens
//!   - Provider endpoint tables (public, Infura, Alchemy, Chainbase, custom)
//!   - Optional rate limiting and response caching
//!
//! - **Views**
//!   - Lazily-fetched transactions (txdata, receipt, call trace)
//!   - Blocks with bulk-fetched receipts and traces
//!   - Per-block aggregates and a simple sandwich heuristic
//!
//! - **Analysis**
//!   - EOA / ERC20 / v2 pair / v3 pool classification by selector matching
//!   - Internal call flattening from `callTracer` results
//!   - WETH deposit and withdrawal parsing
//!
//! - **Streaming**
//!   - WebSocket subscriptions for pending transactions, new heads and logs
//!
//! ## Features
//!
//! - `rustls-tls`: Uses rustls as the TLS implementation instead of native-tls (OpenSSL).
//!
//!   Usage example:
//!   ```toml
//!   [dependencies]
//!   evm-query-kit = { version = "0.1", default-features = false, features = ["rustls-tls"] }
//!   ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use evm_query_kit::{create_client, ChainId, ClientConfig, Transaction};
//! use alloy::primitives::b256;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = create_client(ChainId::Eth, &ClientConfig::default())?;
//! let hash = b256!("f3f2f5b39c5a4c4e1d1ac1bb7e1b53c5e0f8e1d6c3b1a0e6b5b0d2f7a9c8e7d6");
//! let mut tx = Transaction::new(ChainId::Eth, hash, client);
//!
//! println!("sender: {}", tx.sender().await?);
//! println!("receiver: {}", tx.receiver().await?);
//! println!("fee: {}", tx.fee().await?);
//! for call in tx.internal_transactions().await {
//!     println!("{}{} -> {:?}", " ".repeat(call.depth), call.call_type, call.to);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Structure
//!
//! - `chain`: Chain ids and per-chain constants
//! - `provider`: Endpoint templates per chain and provider
//! - `config`: Client configuration
//! - `rpc`: The `EthRpc` trait and its `alloy`-backed client
//! - `types`: Wire types for JSON-RPC payloads
//! - `trace`: Call-tree walks
//! - `address`: Address classification
//! - `tx`: Transaction view
//! - `block`: Block view and aggregates
//! - `events`: Event log parsers
//! - `subscribe`: WebSocket subscriptions
//! - `errors`: Error types
//! - `utils`: Retry and rate limiting helpers

pub mod address;
pub mod block;
pub mod chain;
pub mod config;
pub mod errors;
pub mod events;
pub mod provider;
pub mod rpc;
pub mod subscribe;
pub mod trace;
pub mod tx;
pub mod types;
pub mod utils;

// Re-export only the essential types and functions
pub use address::{AddressClassifier, ContractKind};
pub use block::{Block, BlockCache, BlockFetcher, FetchOptions, SharedBlock};
pub use chain::ChainId;
pub use config::{ClientConfig, RetryPolicy};
pub use errors::{BlockError, InitError, RpcError, ToolkitError, TxError};
pub use events::{EventParser, TransferEvent, WethDeposit, WethWithdrawal};
pub use provider::{RpcProvider, Transport};
pub use rpc::{create_client, EthRpc, RpcClient, SharedRpc};
pub use subscribe::{StreamMessage, SubscriptionKind, WsSubscriber};
pub use tx::{CallOverrides, SimulationBlock, Transaction};
