//! Block view with bulk-fetched transactions, receipts and traces
//!
//! [`BlockFetcher::fetch`] loads a block header and, depending on
//! [`FetchOptions`], the full transactions, all receipts
//! (`eth_getBlockReceipts`) and all call traces (`debug_traceBlockByNumber`).
//! Receipts and traces are retried with a fixed delay; when every attempt
//! fails they are left unfetched so each transaction view can still fetch
//! its own payload later.
//!
//! Mined blocks are cached by number as [`SharedBlock`]s, so payloads a
//! transaction view fetches later are visible to every holder of the block.
//!
//! # Example
//! ```no_run
//! use evm_query_kit::{create_client, BlockFetcher, ChainId, ClientConfig, FetchOptions};
//! use alloy::eips::BlockNumberOrTag;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ClientConfig::default();
//! let client = create_client(ChainId::Bsc, &config)?;
//! let mut fetcher = BlockFetcher::new(ChainId::Bsc, client, config.retry.clone());
//! let block = fetcher
//!     .fetch(BlockNumberOrTag::Number(35_578_786), FetchOptions::default())
//!     .await?;
//! let mut block = block.lock().await;
//! println!("{} txs at {}", block.transactions().len(), block.timestamp());
//! for hash in block.sandwich_transactions().await {
//!     println!("possible sandwich: {hash}");
//! }
//! # Ok(())
//! # }
//! ```

use alloy::primitives::{Address, B256};
use log::warn;
use lru::LruCache;
use std::{
    collections::{HashMap, HashSet},
    num::NonZeroUsize,
    sync::Arc,
};
use tokio::sync::Mutex;

use crate::{
    chain::ChainId,
    config::RetryPolicy,
    errors::BlockError,
    rpc::SharedRpc,
    tx::Transaction,
    types::{BlockNumberOrTag, BlockTransactions, CallFrame, Receipt, RpcBlock, TxData},
    utils::retry_utils::retry_fixed,
};

/// Default number of blocks kept by a [`BlockCache`]
pub const DEFAULT_BLOCK_CACHE_CAPACITY: usize = 10;

/// Block handle shared between the cache and callers
pub type SharedBlock = Arc<Mutex<Block>>;

/// Which payloads to fetch in bulk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FetchOptions {
    /// Full transaction objects instead of hashes
    pub need_txdatas: bool,
    pub need_receipts: bool,
    pub need_traces: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            need_txdatas: true,
            need_receipts: true,
            need_traces: true,
        }
    }
}

impl FetchOptions {
    /// Header and transaction hashes only
    pub fn header_only() -> Self {
        Self {
            need_txdatas: false,
            need_receipts: false,
            need_traces: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct BlockCacheKey {
    chain: ChainId,
    number: u64,
    options: FetchOptions,
}

/// Small LRU cache of assembled blocks, keyed by resolved block number
///
/// Pending blocks have no number and are never cached.
pub struct BlockCache {
    inner: LruCache<BlockCacheKey, SharedBlock>,
}

impl Default for BlockCache {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCK_CACHE_CAPACITY)
    }
}

impl BlockCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: LruCache::new(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    fn get(&mut self, chain: ChainId, number: u64, options: FetchOptions) -> Option<SharedBlock> {
        let key = BlockCacheKey {
            chain,
            number,
            options,
        };
        self.inner.get(&key).cloned()
    }

    fn put(&mut self, chain: ChainId, number: u64, options: FetchOptions, block: SharedBlock) {
        let key = BlockCacheKey {
            chain,
            number,
            options,
        };
        self.inner.put(key, block);
    }
}

/// A block and views of its transactions
///
/// `hash` and `number` are `None` for the pending block.
#[derive(Debug, Clone)]
pub struct Block {
    chain: ChainId,
    hash: Option<B256>,
    number: Option<u64>,
    timestamp: u64,
    txs: Vec<Transaction>,
}

impl Block {
    /// Assemble a block from parallel payload lists
    ///
    /// `txdatas`, `receipts` and `traces` are matched to `txhashes` by index;
    /// missing or `None` entries are fetched lazily by each transaction.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        chain: ChainId,
        hash: Option<B256>,
        number: Option<u64>,
        timestamp: u64,
        txhashes: Vec<B256>,
        rpc: SharedRpc,
        txdatas: Vec<Option<TxData>>,
        receipts: Vec<Option<Receipt>>,
        traces: Vec<Option<CallFrame>>,
    ) -> Self {
        let mut txdatas = txdatas.into_iter();
        let mut receipts = receipts.into_iter();
        let mut traces = traces.into_iter();
        let txs = txhashes
            .into_iter()
            .map(|txhash| {
                let tx = Transaction::with_payloads(
                    chain,
                    txhash,
                    rpc.clone(),
                    txdatas.next().flatten(),
                    receipts.next().flatten(),
                    traces.next().flatten(),
                );
                match number {
                    Some(_) => tx.with_block_timestamp(timestamp),
                    None => tx,
                }
            })
            .collect();
        Self {
            chain,
            hash,
            number,
            timestamp,
            txs,
        }
    }

    pub fn chain(&self) -> ChainId {
        self.chain
    }

    pub fn hash(&self) -> Option<B256> {
        self.hash
    }

    pub fn number(&self) -> Option<u64> {
        self.number
    }

    pub fn is_pending(&self) -> bool {
        self.number.is_none()
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.txs
    }

    pub fn transactions_mut(&mut self) -> &mut [Transaction] {
        &mut self.txs
    }

    /// (sender, to) of every transaction, `None` where txdata is unavailable
    async fn sender_to_pairs(&mut self) -> Vec<Option<(Address, Option<Address>)>> {
        let mut pairs = Vec::with_capacity(self.txs.len());
        for tx in &mut self.txs {
            let txhash = tx.hash();
            let pair = match tx.txdata().await {
                Ok(data) => Some((data.from, data.to)),
                Err(e) => {
                    warn!("skip transaction {txhash}: {e}");
                    None
                }
            };
            pairs.push(pair);
        }
        pairs
    }

    /// Transactions per sender
    pub async fn sender_counts(&mut self) -> HashMap<Address, usize> {
        let mut counts = HashMap::new();
        for (sender, _) in self.sender_to_pairs().await.into_iter().flatten() {
            *counts.entry(sender).or_insert(0) += 1;
        }
        counts
    }

    /// Transactions per receiver (destination or created contract)
    pub async fn receiver_counts(&mut self) -> HashMap<Address, usize> {
        let mut counts = HashMap::new();
        for tx in &mut self.txs {
            match tx.receiver().await {
                Ok(receiver) => *counts.entry(receiver).or_insert(0) += 1,
                Err(e) => warn!("skip transaction {} in receiver counts: {e}", tx.hash()),
            }
        }
        counts
    }

    /// Transactions per (sender, to) pair; `to` is `None` for creations
    pub async fn from_to_counts(&mut self) -> HashMap<(Address, Option<Address>), usize> {
        let mut counts = HashMap::new();
        for pair in self.sender_to_pairs().await.into_iter().flatten() {
            *counts.entry(pair).or_insert(0) += 1;
        }
        counts
    }

    /// Hashes of transactions that look like sandwich legs
    ///
    /// Flags transaction `i` and `i - 2` when both share the same sender and
    /// destination. Only legs exactly one transaction apart are found;
    /// sandwiches with several victims in between are missed.
    pub async fn sandwich_transactions(&mut self) -> HashSet<B256> {
        let pairs = self.sender_to_pairs().await;
        let entries: Vec<(B256, Option<(Address, Option<Address>)>)> = self
            .txs
            .iter()
            .map(Transaction::hash)
            .zip(pairs)
            .collect();
        sandwich_hashes(&entries)
    }
}

/// Sandwich heuristic over (hash, (sender, to)) entries in block order
pub fn sandwich_hashes(entries: &[(B256, Option<(Address, Option<Address>)>)]) -> HashSet<B256> {
    let mut hashes = HashSet::new();
    for idx in 2..entries.len() {
        let (hash, current) = &entries[idx];
        let (front_hash, front) = &entries[idx - 2];
        let (Some((sender, Some(to))), Some((front_sender, Some(front_to)))) = (current, front)
        else {
            continue;
        };
        if sender == front_sender && to == front_to {
            hashes.insert(*hash);
            hashes.insert(*front_hash);
        }
    }
    hashes
}

/// Fetches blocks for one chain, caching assembled results
pub struct BlockFetcher {
    chain: ChainId,
    rpc: SharedRpc,
    retry: RetryPolicy,
    cache: BlockCache,
}

impl BlockFetcher {
    pub fn new(chain: ChainId, rpc: SharedRpc, retry: RetryPolicy) -> Self {
        Self::with_cache(chain, rpc, retry, BlockCache::default())
    }

    pub fn with_cache(chain: ChainId, rpc: SharedRpc, retry: RetryPolicy, cache: BlockCache) -> Self {
        Self {
            chain,
            rpc,
            retry,
            cache,
        }
    }

    pub fn cache(&self) -> &BlockCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut BlockCache {
        &mut self.cache
    }

    /// Fetch a block and the requested payloads
    ///
    /// A cache hit returns the same [`SharedBlock`] as the first fetch,
    /// including every payload fetched through it since. Tags such as
    /// `latest` always request the header and hit the cache only if they
    /// resolve to an already cached number.
    ///
    /// # Arguments
    /// * `block` - Block number or tag
    /// * `options` - Which payloads to load in bulk
    ///
    /// # Returns
    /// * `Ok(SharedBlock)` - Receipts/traces that could not be fetched after all
    ///   retries are left for the transaction views to fetch individually
    /// * `Err(BlockError)` - The header request failed or the block does not exist
    pub async fn fetch(
        &mut self,
        block: BlockNumberOrTag,
        options: FetchOptions,
    ) -> Result<SharedBlock, BlockError> {
        if let BlockNumberOrTag::Number(number) = block {
            if let Some(hit) = self.cache.get(self.chain, number, options) {
                return Ok(hit);
            }
        }

        let data: RpcBlock = self
            .rpc
            .get_block(block, options.need_txdatas)
            .await?
            .ok_or_else(|| BlockError::NotFound(block.to_string()))?;
        if let Some(number) = data.number {
            if let Some(hit) = self.cache.get(self.chain, number, options) {
                return Ok(hit);
            }
        }
        let txhashes = data.transactions.hashes();
        let count = txhashes.len();
        let txdatas: Vec<Option<TxData>> = match data.transactions {
            BlockTransactions::Full(txs) => txs.into_iter().map(Some).collect(),
            BlockTransactions::Hashes(_) => vec![None; count],
        };

        // Later requests are pinned to the resolved number, not the tag
        let pinned = data.number.map_or(block, BlockNumberOrTag::Number);

        let mut receipts: Vec<Option<Receipt>> = vec![None; count];
        if options.need_receipts {
            let rpc = &self.rpc;
            let label = format!("get block receipts {pinned}");
            if let Some(fetched) =
                retry_fixed(&self.retry, &label, move || rpc.get_block_receipts(pinned)).await
            {
                receipts = fetched.into_iter().map(Some).collect();
            }
        }

        let mut traces: Vec<Option<CallFrame>> = vec![None; count];
        if options.need_traces {
            let rpc = &self.rpc;
            let label = format!("trace block {pinned}");
            if let Some(fetched) =
                retry_fixed(&self.retry, &label, move || rpc.trace_block(pinned)).await
            {
                traces = fetched.into_iter().map(|entry| entry.result).collect();
            }
        }

        let assembled = Arc::new(Mutex::new(Block::new(
            self.chain,
            data.hash,
            data.number,
            data.timestamp,
            txhashes,
            self.rpc.clone(),
            txdatas,
            receipts,
            traces,
        )));
        if let Some(number) = data.number {
            self.cache.put(self.chain, number, options, assembled.clone());
        }
        Ok(assembled)
    }
}
