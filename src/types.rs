//! Core wire types for chain queries
//!
//! Serde models of the JSON-RPC payloads this crate consumes:
//! - Transactions, receipts and logs
//! - Blocks with full or hash-only transaction lists
//! - `callTracer` frames and tracer options
//! - Call requests for simulation
//!
//! Quantities are hex strings on the wire and plain integers here.

use alloy::primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};

pub use alloy::eips::BlockNumberOrTag;

/// Transaction as returned by `eth_getTransactionByHash` / full blocks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxData {
    pub hash: B256,
    pub from: Address,
    /// `None` for contract creations
    #[serde(default)]
    pub to: Option<Address>,
    #[serde(with = "alloy::serde::quantity")]
    pub nonce: u64,
    #[serde(default)]
    pub value: U256,
    /// Gas limit
    #[serde(with = "alloy::serde::quantity")]
    pub gas: u64,
    #[serde(default, with = "alloy::serde::quantity::opt")]
    pub gas_price: Option<u128>,
    #[serde(default, with = "alloy::serde::quantity::opt")]
    pub max_fee_per_gas: Option<u128>,
    #[serde(default, with = "alloy::serde::quantity::opt")]
    pub max_priority_fee_per_gas: Option<u128>,
    #[serde(default)]
    pub input: Bytes,
    /// `None` while the transaction is pending
    #[serde(default, with = "alloy::serde::quantity::opt")]
    pub block_number: Option<u64>,
    #[serde(default)]
    pub block_hash: Option<B256>,
    #[serde(default, with = "alloy::serde::quantity::opt")]
    pub transaction_index: Option<u64>,
    #[serde(rename = "type", default, with = "alloy::serde::quantity::opt")]
    pub tx_type: Option<u8>,
}

/// Event log, from a receipt or from a `callTracer` frame
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcLog {
    pub address: Address,
    #[serde(default)]
    pub topics: Vec<B256>,
    #[serde(default)]
    pub data: Bytes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_hash: Option<B256>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "alloy::serde::quantity::opt")]
    pub block_number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<B256>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "alloy::serde::quantity::opt")]
    pub transaction_index: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "alloy::serde::quantity::opt")]
    pub log_index: Option<u64>,
    #[serde(default)]
    pub removed: bool,
}

impl RpcLog {
    /// First topic, the event signature hash for non-anonymous events
    pub fn signature(&self) -> Option<&B256> {
        self.topics.first()
    }
}

/// Transaction receipt
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub transaction_hash: B256,
    #[serde(default, with = "alloy::serde::quantity::opt")]
    pub transaction_index: Option<u64>,
    #[serde(default)]
    pub block_hash: Option<B256>,
    #[serde(default, with = "alloy::serde::quantity::opt")]
    pub block_number: Option<u64>,
    #[serde(default)]
    pub from: Address,
    #[serde(default)]
    pub to: Option<Address>,
    #[serde(default, with = "alloy::serde::quantity")]
    pub gas_used: u64,
    #[serde(default, with = "alloy::serde::quantity::opt")]
    pub effective_gas_price: Option<u128>,
    /// Address of the contract deployed by this transaction
    #[serde(default)]
    pub contract_address: Option<Address>,
    /// 1 for success, 0 for failure; absent on pre-Byzantium receipts
    #[serde(default, with = "alloy::serde::quantity::opt")]
    pub status: Option<u8>,
    #[serde(default)]
    pub logs: Vec<RpcLog>,
}

/// Transaction list of a block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockTransactions {
    Full(Vec<TxData>),
    Hashes(Vec<B256>),
}

impl Default for BlockTransactions {
    fn default() -> Self {
        BlockTransactions::Hashes(Vec::new())
    }
}

impl BlockTransactions {
    pub fn len(&self) -> usize {
        match self {
            BlockTransactions::Full(txs) => txs.len(),
            BlockTransactions::Hashes(hashes) => hashes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn hashes(&self) -> Vec<B256> {
        match self {
            BlockTransactions::Full(txs) => txs.iter().map(|tx| tx.hash).collect(),
            BlockTransactions::Hashes(hashes) => hashes.clone(),
        }
    }
}

/// Block as returned by `eth_getBlockByNumber`
///
/// `extra_data` is kept as opaque bytes of any length, so proof-of-authority
/// chains (BSC, Polygon) with oversized extra data decode without special handling.
/// `hash` and `number` are null for the pending block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcBlock {
    #[serde(default)]
    pub hash: Option<B256>,
    #[serde(default)]
    pub parent_hash: B256,
    #[serde(default, with = "alloy::serde::quantity::opt")]
    pub number: Option<u64>,
    #[serde(with = "alloy::serde::quantity")]
    pub timestamp: u64,
    #[serde(default)]
    pub miner: Address,
    #[serde(default)]
    pub extra_data: Bytes,
    #[serde(default)]
    pub transactions: BlockTransactions,
}

/// One frame of a `callTracer` result
///
/// The root frame is the transaction itself; `calls` holds nested frames
/// in execution order. `logs` is only populated with `withLog: true`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallFrame {
    /// CALL, STATICCALL, DELEGATECALL, CREATE, CREATE2, SELFDESTRUCT, ...
    #[serde(rename = "type", default)]
    pub call_type: String,
    #[serde(default)]
    pub from: Address,
    #[serde(default)]
    pub to: Option<Address>,
    #[serde(default)]
    pub value: Option<U256>,
    #[serde(default, with = "alloy::serde::quantity::opt")]
    pub gas: Option<u64>,
    #[serde(default, with = "alloy::serde::quantity::opt")]
    pub gas_used: Option<u64>,
    #[serde(default)]
    pub input: Bytes,
    #[serde(default)]
    pub output: Option<Bytes>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub revert_reason: Option<String>,
    #[serde(default)]
    pub calls: Vec<CallFrame>,
    #[serde(default)]
    pub logs: Vec<RpcLog>,
}

impl CallFrame {
    /// Whether this frame deploys a contract
    pub fn is_create(&self) -> bool {
        is_create_type(&self.call_type)
    }
}

pub(crate) fn is_create_type(call_type: &str) -> bool {
    call_type.eq_ignore_ascii_case("create") || call_type.eq_ignore_ascii_case("create2")
}

/// One element of a `debug_traceBlockByNumber` response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockTraceEntry {
    #[serde(default)]
    pub tx_hash: Option<B256>,
    #[serde(default)]
    pub result: Option<CallFrame>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Flattened internal call recovered from a trace
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InternalCall {
    pub call_type: String,
    pub from: Address,
    pub to: Option<Address>,
    /// Native value transferred, zero when the frame has none
    pub value: U256,
    pub gas: Option<u64>,
    pub gas_used: Option<u64>,
    pub input: Bytes,
    pub output: Option<Bytes>,
    pub error: Option<String>,
    /// Nesting depth, 1 for direct children of the transaction
    pub depth: usize,
}

impl InternalCall {
    pub(crate) fn from_frame(frame: &CallFrame, depth: usize) -> Self {
        Self {
            call_type: frame.call_type.clone(),
            from: frame.from,
            to: frame.to,
            value: frame.value.unwrap_or_default(),
            gas: frame.gas,
            gas_used: frame.gas_used,
            input: frame.input.clone(),
            output: frame.output.clone(),
            error: frame.error.clone(),
            depth,
        }
    }

    /// CREATE or CREATE2
    pub fn is_create(&self) -> bool {
        is_create_type(&self.call_type)
    }
}

/// Tracers understood by `debug_trace*`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TracerKind {
    #[serde(rename = "callTracer")]
    CallTracer,
    #[serde(rename = "prestateTracer")]
    PrestateTracer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TracerConfig {
    pub with_log: bool,
}

/// Options object passed to `debug_trace*` methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TracerOptions {
    pub tracer: TracerKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracer_config: Option<TracerConfig>,
}

impl TracerOptions {
    /// `callTracer` without log capture
    pub fn call_tracer() -> Self {
        Self {
            tracer: TracerKind::CallTracer,
            tracer_config: None,
        }
    }

    /// `callTracer` with `withLog: true`
    pub fn call_tracer_with_logs() -> Self {
        Self::new(TracerKind::CallTracer, true)
    }

    pub fn new(tracer: TracerKind, with_log: bool) -> Self {
        Self {
            tracer,
            tracer_config: Some(TracerConfig { with_log }),
        }
    }
}

/// Request body for `eth_call` / `debug_traceCall`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRequest {
    pub from: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    pub value: U256,
    pub data: Bytes,
    #[serde(with = "alloy::serde::quantity")]
    pub gas: u64,
    #[serde(with = "alloy::serde::quantity")]
    pub gas_price: u128,
}
