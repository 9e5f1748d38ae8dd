//! Lazily-fetched transaction view
//!
//! A [`Transaction`] wraps a hash and fetches three payloads on demand:
//! the transaction data, its receipt and its `callTracer` trace. Each
//! payload is fetched at most once; afterwards the slot is frozen, either
//! holding the value or the reason the fetch failed.
//!
//! Derived values (receiver, fee, internal calls, logs, call depth) are
//! computed from the payloads on every call.
//!
//! # Example
//! ```no_run
//! use evm_query_kit::{create_client, ChainId, ClientConfig, Transaction};
//! use alloy::primitives::b256;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = create_client(ChainId::Eth, &ClientConfig::default())?;
//! let mut tx = Transaction::new(
//!     ChainId::Eth,
//!     b256!("5c504ed432cb51138bcf09aa5e8a410dd4a1e204ef84bfed1be16dfba1b22060"),
//!     client,
//! );
//! println!("sender: {}", tx.sender().await?);
//! println!("fee: {} wei", tx.fee().await?);
//! for call in tx.internal_transactions().await {
//!     println!("{} {} -> {:?} value {}", call.call_type, call.from, call.to, call.value);
//! }
//! # Ok(())
//! # }
//! ```

use alloy::primitives::{Address, Bytes, FixedBytes, B256, U256};
use log::{debug, error};
use once_cell::sync::Lazy;
use serde_json::Value;

use crate::{
    chain::ChainId,
    errors::TxError,
    rpc::SharedRpc,
    trace,
    types::{
        BlockNumberOrTag, CallFrame, CallRequest, InternalCall, Receipt, RpcLog, TracerKind,
        TracerOptions, TxData,
    },
};

/// Hash used for views that wrap a simulated call
pub const DUMMY_TXHASH: B256 = B256::ZERO;

static EMPTY_TRACE: Lazy<CallFrame> = Lazy::new(CallFrame::default);

/// State of a lazily fetched payload
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Slot<T> {
    /// Not requested yet
    #[default]
    Unfetched,
    /// Fetched successfully
    Ready(T),
    /// Fetch was attempted and failed
    Failed(String),
}

impl<T> Slot<T> {
    pub fn is_unfetched(&self) -> bool {
        matches!(self, Slot::Unfetched)
    }

    pub fn get(&self) -> Option<&T> {
        match self {
            Slot::Ready(value) => Some(value),
            _ => None,
        }
    }

    fn ready(&self, payload: &'static str, hash: B256) -> Result<&T, TxError> {
        match self {
            Slot::Ready(value) => Ok(value),
            Slot::Failed(reason) => Err(TxError::PayloadUnavailable {
                payload,
                hash,
                reason: reason.clone(),
            }),
            Slot::Unfetched => Err(TxError::PayloadUnavailable {
                payload,
                hash,
                reason: "not fetched".to_string(),
            }),
        }
    }
}

impl<T> From<Option<T>> for Slot<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Slot::Unfetched, Slot::Ready)
    }
}

/// Parameter overrides for simulating a transaction
///
/// Unset fields fall back to the transaction's own values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallOverrides {
    pub from: Option<Address>,
    pub to: Option<Address>,
    pub value: Option<U256>,
    pub gas: Option<u64>,
    pub gas_price: Option<u128>,
}

/// Block state a simulation runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SimulationBlock {
    #[default]
    Latest,
    /// The block before the one that included the transaction
    Parent,
    At(BlockNumberOrTag),
}

/// Lazily-fetched view of one transaction
#[derive(Clone)]
pub struct Transaction {
    chain: ChainId,
    hash: B256,
    rpc: SharedRpc,
    txdata: Slot<TxData>,
    receipt: Slot<Receipt>,
    trace: Slot<CallFrame>,
    timestamp: Option<u64>,
}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("chain", &self.chain)
            .field("hash", &self.hash)
            .field("txdata", &self.txdata)
            .field("receipt", &self.receipt)
            .field("trace", &self.trace)
            .finish()
    }
}

impl Transaction {
    /// View with nothing fetched yet
    pub fn new(chain: ChainId, hash: B256, rpc: SharedRpc) -> Self {
        Self::with_payloads(chain, hash, rpc, None, None, None)
    }

    /// View seeded with payloads the caller already has
    ///
    /// `None` payloads are fetched on first access.
    pub fn with_payloads(
        chain: ChainId,
        hash: B256,
        rpc: SharedRpc,
        txdata: Option<TxData>,
        receipt: Option<Receipt>,
        trace: Option<CallFrame>,
    ) -> Self {
        Self {
            chain,
            hash,
            rpc,
            txdata: txdata.into(),
            receipt: receipt.into(),
            trace: trace.into(),
            timestamp: None,
        }
    }

    /// Seed the timestamp of the including block
    pub(crate) fn with_block_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn chain(&self) -> ChainId {
        self.chain
    }

    pub fn hash(&self) -> B256 {
        self.hash
    }

    pub fn txdata_slot(&self) -> &Slot<TxData> {
        &self.txdata
    }

    pub fn receipt_slot(&self) -> &Slot<Receipt> {
        &self.receipt
    }

    pub fn trace_slot(&self) -> &Slot<CallFrame> {
        &self.trace
    }

    // ---- payloads ----

    /// Transaction data, fetched with `eth_getTransactionByHash` on first access
    pub async fn txdata(&mut self) -> Result<&TxData, TxError> {
        if self.txdata.is_unfetched() {
            self.txdata = match self.rpc.get_transaction(self.hash).await {
                Ok(Some(data)) => Slot::Ready(data),
                Ok(None) => {
                    error!("get txdata failed: transaction not found, txhash: {}", self.hash);
                    Slot::Failed("transaction not found".to_string())
                }
                Err(e) => {
                    error!("get txdata failed: {e}, txhash: {}", self.hash);
                    Slot::Failed(e.to_string())
                }
            };
        }
        self.txdata.ready("txdata", self.hash)
    }

    /// Receipt of the transaction
    ///
    /// For a pending transaction there is no receipt yet, so one is
    /// synthesized from the trace: logs from nested calls, gas used and
    /// addresses from the root frame. If the trace is unavailable the
    /// receipt is unavailable too.
    pub async fn receipt(&mut self) -> Result<&Receipt, TxError> {
        if self.receipt.is_unfetched() {
            self.receipt = if self.is_pending().await? {
                self.receipt_from_trace().await
            } else {
                match self.rpc.get_transaction_receipt(self.hash).await {
                    Ok(Some(receipt)) => Slot::Ready(receipt),
                    Ok(None) => {
                        error!("get receipt failed: receipt not found, txhash: {}", self.hash);
                        Slot::Failed("receipt not found".to_string())
                    }
                    Err(e) => {
                        error!("get receipt failed: {e}, txhash: {}", self.hash);
                        Slot::Failed(e.to_string())
                    }
                }
            };
        }
        self.receipt.ready("receipt", self.hash)
    }

    /// `callTracer` trace with logs, requested once
    ///
    /// A failed request is logged and an empty trace is returned instead.
    pub async fn trace(&mut self) -> &CallFrame {
        if self.trace.is_unfetched() {
            self.trace = match self.rpc.trace_transaction_calls(self.hash).await {
                Ok(frame) => Slot::Ready(frame),
                Err(e) => {
                    error!("get calls from debug_traceTransaction failed: {e}, txhash: {}", self.hash);
                    Slot::Failed(e.to_string())
                }
            };
        }
        self.trace.get().unwrap_or(&*EMPTY_TRACE)
    }

    async fn receipt_from_trace(&mut self) -> Slot<Receipt> {
        self.trace().await;
        let root = match &self.trace {
            Slot::Ready(root) => root,
            Slot::Failed(reason) => return Slot::Failed(format!("trace unavailable: {reason}")),
            Slot::Unfetched => return Slot::Failed("trace unavailable".to_string()),
        };
        Slot::Ready(Receipt {
            transaction_hash: self.hash,
            from: root.from,
            to: if root.is_create() { None } else { root.to },
            contract_address: if root.is_create() { root.to } else { None },
            gas_used: root.gas_used.unwrap_or_default(),
            logs: trace::trace_logs(root),
            ..Default::default()
        })
    }

    // ---- txdata ----

    pub async fn block_number(&mut self) -> Result<Option<u64>, TxError> {
        Ok(self.txdata().await?.block_number)
    }

    /// Not yet included in a block
    pub async fn is_pending(&mut self) -> Result<bool, TxError> {
        Ok(self.block_number().await?.is_none())
    }

    pub async fn sender(&mut self) -> Result<Address, TxError> {
        Ok(self.txdata().await?.from)
    }

    /// Destination, `None` for contract creations
    pub async fn to(&mut self) -> Result<Option<Address>, TxError> {
        Ok(self.txdata().await?.to)
    }

    pub async fn value(&mut self) -> Result<U256, TxError> {
        Ok(self.txdata().await?.value)
    }

    pub async fn nonce(&mut self) -> Result<u64, TxError> {
        Ok(self.txdata().await?.nonce)
    }

    /// EIP-2718 type, 0 for legacy transactions
    pub async fn tx_type(&mut self) -> Result<u8, TxError> {
        Ok(self.txdata().await?.tx_type.unwrap_or_default())
    }

    pub async fn gas_limit(&mut self) -> Result<u64, TxError> {
        Ok(self.txdata().await?.gas)
    }

    pub async fn gas_price(&mut self) -> Result<u128, TxError> {
        Ok(self.txdata().await?.gas_price.unwrap_or_default())
    }

    pub async fn max_fee_per_gas(&mut self) -> Result<u128, TxError> {
        Ok(self.txdata().await?.max_fee_per_gas.unwrap_or_default())
    }

    pub async fn max_priority_fee_per_gas(&mut self) -> Result<u128, TxError> {
        Ok(self.txdata().await?.max_priority_fee_per_gas.unwrap_or_default())
    }

    pub async fn input(&mut self) -> Result<Bytes, TxError> {
        Ok(self.txdata().await?.input.clone())
    }

    /// First four bytes of the input, `None` when the input is shorter
    pub async fn method_selector(&mut self) -> Result<Option<FixedBytes<4>>, TxError> {
        let input = &self.txdata().await?.input;
        Ok(input.get(..4).map(FixedBytes::from_slice))
    }

    /// Plain value transfer without calldata
    pub async fn is_native_transfer(&mut self) -> Result<bool, TxError> {
        Ok(self.txdata().await?.input.is_empty())
    }

    // ---- receipt ----

    pub async fn tx_index(&mut self) -> Result<Option<u64>, TxError> {
        Ok(self.receipt().await?.transaction_index)
    }

    pub async fn status(&mut self) -> Result<Option<u8>, TxError> {
        Ok(self.receipt().await?.status)
    }

    pub async fn gas_used(&mut self) -> Result<u64, TxError> {
        Ok(self.receipt().await?.gas_used)
    }

    /// Gas price × gas used, in wei
    pub async fn fee(&mut self) -> Result<U256, TxError> {
        let gas_price = self.gas_price().await?;
        let receipt = self.receipt().await?;
        let price = if gas_price == 0 {
            receipt.effective_gas_price.unwrap_or_default()
        } else {
            gas_price
        };
        Ok(U256::from(price) * U256::from(receipt.gas_used))
    }

    /// Gas used matches a plain transfer: 21000 to an EOA, 21033 to a contract
    pub async fn is_transfer_gas_used(&mut self) -> Result<bool, TxError> {
        let gas_used = self.gas_used().await?;
        Ok(gas_used == 21_000 || gas_used == 21_033)
    }

    /// Event logs
    ///
    /// Receipt logs for mined transactions; for pending ones, the logs of
    /// nested calls in trace order.
    pub async fn logs(&mut self) -> Result<Vec<RpcLog>, TxError> {
        if self.is_pending().await? {
            return Ok(trace::trace_logs(self.trace().await));
        }
        Ok(self.receipt().await?.logs.clone())
    }

    pub async fn logs_num(&mut self) -> Result<usize, TxError> {
        Ok(self.logs().await?.len())
    }

    /// Destination address, or the deployed contract for creations
    ///
    /// # Returns
    /// * `Err(TxError::ReceiverNotFound)` - Creation without a contract address,
    ///   usually a failed deployment
    pub async fn receiver(&mut self) -> Result<Address, TxError> {
        if let Some(to) = self.to().await? {
            return Ok(to);
        }
        match self.receipt().await?.contract_address {
            Some(address) => Ok(address),
            None => Err(TxError::ReceiverNotFound(self.hash)),
        }
    }

    /// The receipt records a deployed contract
    pub async fn contract_deployed(&mut self) -> Result<bool, TxError> {
        Ok(self.receipt().await?.contract_address.is_some())
    }

    /// Deployed a contract directly or through a CREATE/CREATE2 call
    pub async fn contract_created(&mut self) -> Result<bool, TxError> {
        if self.has_create_call().await {
            return Ok(true);
        }
        self.contract_deployed().await
    }

    // ---- trace ----

    /// Nested calls in depth-first pre-order
    pub async fn internal_transactions(&mut self) -> Vec<InternalCall> {
        trace::internal_calls(self.trace().await)
    }

    pub async fn internal_transactions_num(&mut self) -> usize {
        trace::CallWalker::new(self.trace().await).count()
    }

    /// CREATE and CREATE2 calls
    pub async fn create_calls(&mut self) -> Vec<InternalCall> {
        self.internal_transactions()
            .await
            .into_iter()
            .filter(InternalCall::is_create)
            .collect()
    }

    pub async fn has_create_call(&mut self) -> bool {
        trace::CallWalker::new(self.trace().await).any(|(frame, _)| frame.is_create())
    }

    /// Deepest nesting level of the call tree, 0 without nested calls
    pub async fn max_call_depth(&mut self) -> usize {
        trace::max_call_depth(self.trace().await)
    }

    // ---- block ----

    /// Timestamp of the including block, requested once
    pub async fn timestamp(&mut self) -> Result<u64, TxError> {
        if let Some(timestamp) = self.timestamp {
            return Ok(timestamp);
        }
        let number = self
            .block_number()
            .await?
            .ok_or(TxError::Pending(self.hash))?;
        let block = self
            .rpc
            .get_block(BlockNumberOrTag::Number(number), false)
            .await?
            .ok_or_else(|| TxError::PayloadUnavailable {
                payload: "block",
                hash: self.hash,
                reason: format!("block {number} not found"),
            })?;
        self.timestamp = Some(block.timestamp);
        Ok(block.timestamp)
    }

    // ---- debugging and simulation ----

    /// Raw `debug_traceTransaction` output
    ///
    /// # Arguments
    /// * `tracer` - `None` uses the node's default struct logger
    pub async fn debug_trace(
        &self,
        tracer: Option<TracerKind>,
        with_log: bool,
    ) -> Result<Value, TxError> {
        let options = tracer.map(|tracer| TracerOptions::new(tracer, with_log));
        Ok(self.rpc.debug_trace_transaction(self.hash, options).await?)
    }

    async fn call_request(&mut self, overrides: &CallOverrides) -> Result<CallRequest, TxError> {
        let gas_price = match overrides.gas_price {
            Some(price) => price,
            None => self.gas_price().await?,
        };
        let data = self.txdata().await?;
        Ok(CallRequest {
            from: overrides.from.unwrap_or(data.from),
            to: overrides.to.or(data.to),
            value: overrides.value.unwrap_or(data.value),
            data: data.input.clone(),
            gas: overrides.gas.unwrap_or(data.gas),
            gas_price,
        })
    }

    /// Replay the transaction with `eth_call` at the latest block
    pub async fn simulate_call(&mut self, overrides: &CallOverrides) -> Result<Bytes, TxError> {
        let request = self.call_request(overrides).await?;
        Ok(self.rpc.call(&request, BlockNumberOrTag::Latest).await?)
    }

    /// Replay the transaction with `debug_traceCall`
    ///
    /// # Returns
    /// * `Ok(Some(tx))` - Pending view (hash [`DUMMY_TXHASH`]) wrapping the simulated trace
    /// * `Ok(None)` - The simulated execution reported an error
    pub async fn simulate_debug_trace_call(
        &mut self,
        overrides: &CallOverrides,
        block: SimulationBlock,
    ) -> Result<Option<Transaction>, TxError> {
        let request = self.call_request(overrides).await?;
        let block = match block {
            SimulationBlock::Latest => BlockNumberOrTag::Latest,
            SimulationBlock::At(block) => block,
            SimulationBlock::Parent => {
                let number = self
                    .block_number()
                    .await?
                    .ok_or(TxError::Pending(self.hash))?;
                BlockNumberOrTag::Number(number.saturating_sub(1))
            }
        };
        let frame = self.rpc.debug_trace_call(&request, block).await?;
        if let Some(err) = &frame.error {
            debug!("trace error: {err}, txhash: {}", self.hash);
            return Ok(None);
        }
        let txdata = TxData {
            hash: DUMMY_TXHASH,
            from: request.from,
            to: request.to,
            value: request.value,
            gas: request.gas,
            gas_price: Some(request.gas_price),
            input: request.data,
            ..Default::default()
        };
        Ok(Some(Transaction::with_payloads(
            self.chain,
            DUMMY_TXHASH,
            self.rpc.clone(),
            Some(txdata),
            None,
            Some(frame),
        )))
    }
}
