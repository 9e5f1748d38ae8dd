//! Integration tests for block fetching and aggregates
//!
//! # Test Coverage
//! - Bulk receipts and traces paired with transactions by index
//! - Retry exhaustion falling back to per-transaction fetching
//! - Block cache hits, tag resolution and missing blocks
//! - Sender/receiver counts and the sandwich heuristic

mod common;

use alloy::primitives::B256;
use common::{addr, hash, init_logger, receipt_json, tx_json, MockRpc};
use evm_query_kit::{
    BlockError, BlockFetcher, ChainId, FetchOptions, RetryPolicy, SharedRpc,
};
use evm_query_kit::types::BlockNumberOrTag;
use serde_json::{json, Value};
use std::{collections::HashSet, sync::Arc, time::Duration};

/// tx0: aa -> 01, tx1: bb -> 01, tx2: aa -> 01, tx3: cc creates a contract
fn block_txs() -> Vec<Value> {
    vec![
        tx_json(hash(0x10), addr(0xaa), Some(addr(0x01)), Some(100)),
        tx_json(hash(0x11), addr(0xbb), Some(addr(0x01)), Some(100)),
        tx_json(hash(0x12), addr(0xaa), Some(addr(0x01)), Some(100)),
        tx_json(hash(0x13), addr(0xcc), None, Some(100)),
    ]
}

fn block_receipts() -> Value {
    json!([
        receipt_json(hash(0x10), addr(0xaa), Some(addr(0x01)), None, 60_000),
        receipt_json(hash(0x11), addr(0xbb), Some(addr(0x01)), None, 80_000),
        receipt_json(hash(0x12), addr(0xaa), Some(addr(0x01)), None, 60_000),
        receipt_json(hash(0x13), addr(0xcc), None, Some(addr(0xdd)), 900_000),
    ])
}

fn block_json(full: bool) -> Value {
    let transactions: Vec<Value> = if full {
        block_txs()
    } else {
        block_txs().into_iter().map(|tx| tx["hash"].clone()).collect()
    };
    json!({
        "hash": hash(0xbb),
        "parentHash": hash(0xba),
        "number": "0x64",
        "timestamp": "0x65f0a000",
        "miner": addr(0x99),
        "extraData": "0xd883010d0e846765746888676f312e32312e36856c696e7578",
        "transactions": transactions,
    })
}

fn block_traces() -> Value {
    json!([
        { "txHash": hash(0x10), "result": { "type": "CALL", "from": addr(0xaa), "to": addr(0x01), "input": "0x",
            "calls": [{ "type": "CALL", "from": addr(0x01), "to": addr(0x02), "input": "0x" }] } },
        { "txHash": hash(0x11), "result": { "type": "CALL", "from": addr(0xbb), "to": addr(0x01), "input": "0x" } },
        { "txHash": hash(0x12), "result": null, "error": "execution timeout" },
        { "txHash": hash(0x13), "result": { "type": "CREATE", "from": addr(0xcc), "to": addr(0xdd), "input": "0x6080" } },
    ])
}

fn no_delay() -> RetryPolicy {
    RetryPolicy::new(5, Duration::ZERO)
}

fn full_node() -> MockRpc {
    MockRpc::new()
        .on("eth_getBlockByNumber", |params| Ok(block_json(params[1] == json!(true))))
        .respond("eth_getBlockReceipts", block_receipts())
        .respond("debug_traceBlockByNumber", block_traces())
}

#[tokio::test]
async fn test_fetch_pairs_payloads_by_index() {
    init_logger();
    let mock = full_node().shared();
    let rpc: SharedRpc = mock.clone();
    let mut fetcher = BlockFetcher::new(ChainId::Eth, rpc, no_delay());

    let shared = fetcher
        .fetch(BlockNumberOrTag::Number(100), FetchOptions::default())
        .await
        .unwrap();
    let mut block = shared.lock().await;
    assert_eq!(block.number(), Some(100));
    assert_eq!(block.hash(), Some(hash(0xbb)));
    assert_eq!(block.timestamp(), 0x65f0a000);
    assert_eq!(block.transactions().len(), 4);

    let txs = block.transactions_mut();
    assert_eq!(txs[1].gas_used().await.unwrap(), 80_000);
    assert_eq!(txs[3].receiver().await.unwrap(), addr(0xdd));
    assert_eq!(txs[0].internal_transactions_num().await, 1);
    assert!(txs[2].trace_slot().is_unfetched());

    assert_eq!(mock.calls("eth_getBlockReceipts"), 1);
    assert_eq!(mock.calls("debug_traceBlockByNumber"), 1);
    assert_eq!(mock.calls("eth_getTransactionByHash"), 0);
    assert_eq!(mock.calls("eth_getTransactionReceipt"), 0);
    assert_eq!(mock.calls("debug_traceTransaction"), 0);
}

#[tokio::test]
async fn test_receipts_retry_exhaustion_falls_back() {
    init_logger();
    let mock = MockRpc::new()
        .on("eth_getBlockByNumber", |params| Ok(block_json(params[1] == json!(true))))
        .fail("eth_getBlockReceipts")
        .respond("debug_traceBlockByNumber", block_traces())
        .respond(
            "eth_getTransactionReceipt",
            receipt_json(hash(0x11), addr(0xbb), Some(addr(0x01)), None, 80_000),
        )
        .shared();
    let rpc: SharedRpc = mock.clone();
    let mut fetcher = BlockFetcher::new(ChainId::Eth, rpc, no_delay());

    let shared = fetcher
        .fetch(BlockNumberOrTag::Number(100), FetchOptions::default())
        .await
        .unwrap();
    let mut block = shared.lock().await;
    assert_eq!(mock.calls("eth_getBlockReceipts"), 5);
    assert_eq!(block.transactions().len(), 4);
    assert!(block.transactions().iter().all(|tx| tx.receipt_slot().is_unfetched()));

    // Receipts are fetched per transaction once the bulk call gave up
    let tx = &mut block.transactions_mut()[1];
    assert_eq!(tx.gas_used().await.unwrap(), 80_000);
    assert_eq!(mock.calls("eth_getTransactionReceipt"), 1);
}

#[tokio::test]
async fn test_block_cache() {
    let mock = full_node().shared();
    let rpc: SharedRpc = mock.clone();
    let mut fetcher = BlockFetcher::new(ChainId::Eth, rpc, no_delay());

    let options = FetchOptions::default();
    fetcher.fetch(BlockNumberOrTag::Number(100), options).await.unwrap();
    fetcher.fetch(BlockNumberOrTag::Number(100), options).await.unwrap();
    assert_eq!(mock.calls("eth_getBlockByNumber"), 1);
    assert_eq!(fetcher.cache().len(), 1);

    // Different flags are a different entry
    fetcher
        .fetch(BlockNumberOrTag::Number(100), FetchOptions::header_only())
        .await
        .unwrap();
    assert_eq!(mock.calls("eth_getBlockByNumber"), 2);
    assert_eq!(fetcher.cache().len(), 2);
}

#[tokio::test]
async fn test_missing_block() {
    let mock = MockRpc::new().respond("eth_getBlockByNumber", Value::Null).shared();
    let mut fetcher = BlockFetcher::new(ChainId::Bsc, mock, no_delay());

    let err = fetcher
        .fetch(BlockNumberOrTag::Number(1), FetchOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, BlockError::NotFound(_)));
}

/// Serves headers and single transactions only
fn lazy_node() -> MockRpc {
    MockRpc::new()
        .on("eth_getBlockByNumber", |params| Ok(block_json(params[1] == json!(true))))
        .on("eth_getTransactionByHash", |params| {
            let requested: B256 = serde_json::from_value(params[0].clone()).unwrap();
            let tx = block_txs()
                .into_iter()
                .find(|tx| tx["hash"] == json!(requested))
                .unwrap_or(Value::Null);
            Ok(tx)
        })
}

#[tokio::test]
async fn test_header_only_fetches_txdata_lazily() {
    let mock = lazy_node().shared();
    let rpc: SharedRpc = mock.clone();
    let mut fetcher = BlockFetcher::new(ChainId::Eth, rpc, no_delay());

    let shared = fetcher
        .fetch(BlockNumberOrTag::Number(100), FetchOptions::header_only())
        .await
        .unwrap();
    let mut block = shared.lock().await;
    assert_eq!(mock.calls("eth_getBlockReceipts"), 0);
    assert_eq!(mock.calls("debug_traceBlockByNumber"), 0);

    let senders = block.sender_counts().await;
    assert_eq!(senders[&addr(0xaa)], 2);
    assert_eq!(senders[&addr(0xbb)], 1);
    assert_eq!(senders[&addr(0xcc)], 1);
    assert_eq!(mock.calls("eth_getTransactionByHash"), 4);
}

#[tokio::test]
async fn test_aggregates() {
    let mock = full_node().shared();
    let mut fetcher = BlockFetcher::new(ChainId::Eth, mock, no_delay());
    let shared = fetcher
        .fetch(BlockNumberOrTag::Number(100), FetchOptions::default())
        .await
        .unwrap();
    let mut block = shared.lock().await;

    let receivers = block.receiver_counts().await;
    assert_eq!(receivers[&addr(0x01)], 3);
    assert_eq!(receivers[&addr(0xdd)], 1);

    let pairs = block.from_to_counts().await;
    assert_eq!(pairs[&(addr(0xaa), Some(addr(0x01)))], 2);
    assert_eq!(pairs[&(addr(0xcc), None)], 1);

    let sandwiches = block.sandwich_transactions().await;
    assert_eq!(sandwiches, HashSet::from([hash(0x10), hash(0x12)]));
}

#[tokio::test]
async fn test_aggregates_skip_unavailable_transactions() {
    init_logger();
    let mock = MockRpc::new()
        .on("eth_getBlockByNumber", |params| Ok(block_json(params[1] == json!(true))))
        .fail("eth_getTransactionByHash")
        .shared();
    let mut fetcher = BlockFetcher::new(ChainId::Eth, mock, no_delay());
    let shared = fetcher
        .fetch(BlockNumberOrTag::Number(100), FetchOptions::header_only())
        .await
        .unwrap();
    let mut block = shared.lock().await;

    assert!(block.sender_counts().await.is_empty());
    assert!(block.sandwich_transactions().await.is_empty());
}

#[tokio::test]
async fn test_cache_hit_keeps_lazily_fetched_payloads() {
    let mock = lazy_node().shared();
    let rpc: SharedRpc = mock.clone();
    let mut fetcher = BlockFetcher::new(ChainId::Eth, rpc, no_delay());

    let first = fetcher
        .fetch(BlockNumberOrTag::Number(100), FetchOptions::header_only())
        .await
        .unwrap();
    first.lock().await.sender_counts().await;
    assert_eq!(mock.calls("eth_getTransactionByHash"), 4);

    let second = fetcher
        .fetch(BlockNumberOrTag::Number(100), FetchOptions::header_only())
        .await
        .unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    let senders = second.lock().await.sender_counts().await;
    assert_eq!(senders[&addr(0xaa)], 2);

    assert_eq!(mock.calls("eth_getBlockByNumber"), 1);
    assert_eq!(mock.calls("eth_getTransactionByHash"), 4);
}

#[tokio::test]
async fn test_tags_resolve_before_cache_lookup() {
    let mock = full_node().shared();
    let rpc: SharedRpc = mock.clone();
    let mut fetcher = BlockFetcher::new(ChainId::Eth, rpc, no_delay());
    let options = FetchOptions::default();

    // Tags always ask the node which block they point at
    let first = fetcher.fetch(BlockNumberOrTag::Latest, options).await.unwrap();
    let second = fetcher.fetch(BlockNumberOrTag::Latest, options).await.unwrap();
    assert_eq!(mock.calls("eth_getBlockByNumber"), 2);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.lock().await.number(), Some(100));

    // The resolved number shares the entry
    let by_number = fetcher.fetch(BlockNumberOrTag::Number(100), options).await.unwrap();
    assert!(Arc::ptr_eq(&first, &by_number));
    assert_eq!(mock.calls("eth_getBlockByNumber"), 2);
    assert_eq!(mock.calls("eth_getBlockReceipts"), 1);
    assert_eq!(fetcher.cache().len(), 1);
}

#[tokio::test]
async fn test_pending_block_is_not_cached() {
    let mock = MockRpc::new()
        .on("eth_getBlockByNumber", |params| {
            let mut block = block_json(params[1] == json!(true));
            block["hash"] = Value::Null;
            block["number"] = Value::Null;
            Ok(block)
        })
        .shared();
    let rpc: SharedRpc = mock.clone();
    let mut fetcher = BlockFetcher::new(ChainId::Eth, rpc, no_delay());

    let shared = fetcher
        .fetch(BlockNumberOrTag::Pending, FetchOptions::header_only())
        .await
        .unwrap();
    {
        let block = shared.lock().await;
        assert!(block.is_pending());
        assert_eq!(block.hash(), None);
        assert_eq!(block.transactions().len(), 4);
    }
    fetcher
        .fetch(BlockNumberOrTag::Pending, FetchOptions::header_only())
        .await
        .unwrap();
    assert_eq!(mock.calls("eth_getBlockByNumber"), 2);
    assert!(fetcher.cache().is_empty());
}

#[tokio::test]
async fn test_block_transactions_know_their_timestamp() {
    let mock = full_node().shared();
    let rpc: SharedRpc = mock.clone();
    let mut fetcher = BlockFetcher::new(ChainId::Eth, rpc, no_delay());

    let shared = fetcher
        .fetch(BlockNumberOrTag::Number(100), FetchOptions::default())
        .await
        .unwrap();
    let mut block = shared.lock().await;
    let tx = &mut block.transactions_mut()[0];
    assert_eq!(tx.timestamp().await.unwrap(), 0x65f0a000);
    assert_eq!(mock.calls("eth_getBlockByNumber"), 1);
}
