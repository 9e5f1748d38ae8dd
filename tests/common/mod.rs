//! Shared test helpers
//!
//! `MockRpc` answers JSON-RPC methods from closures registered per method
//! and counts every request, so tests can check both results and traffic.

#![allow(dead_code)]

use alloy::primitives::{Address, B256, U256};
use async_trait::async_trait;
use evm_query_kit::{EthRpc, RpcError};
use serde_json::{json, Value};
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

type Handler = Box<dyn Fn(&Value) -> Result<Value, String> + Send + Sync>;

#[derive(Default)]
pub struct MockRpc {
    handlers: HashMap<&'static str, Handler>,
    calls: Mutex<HashMap<String, usize>>,
    total: AtomicUsize,
}

impl MockRpc {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `method` with a closure over the request params
    pub fn on<F>(mut self, method: &'static str, handler: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.handlers.insert(method, Box::new(handler));
        self
    }

    /// Answer `method` with a fixed result
    pub fn respond(self, method: &'static str, result: Value) -> Self {
        self.on(method, move |_| Ok(result.clone()))
    }

    /// Fail every `method` request with a transport error
    pub fn fail(self, method: &'static str) -> Self {
        self.on(method, move |_| Err(format!("{method} unavailable")))
    }

    pub fn calls(&self, method: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(method)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait]
impl EthRpc for MockRpc {
    async fn request(&self, method: &'static str, params: Value) -> Result<Value, RpcError> {
        self.total.fetch_add(1, Ordering::SeqCst);
        *self
            .calls
            .lock()
            .unwrap()
            .entry(method.to_string())
            .or_insert(0) += 1;
        let handler = self.handlers.get(method).ok_or_else(|| RpcError::Transport {
            method: method.to_string(),
            reason: "method not mocked".to_string(),
        })?;
        handler(&params).map_err(|reason| RpcError::Transport {
            method: method.to_string(),
            reason,
        })
    }
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn hash(tag: u8) -> B256 {
    B256::repeat_byte(tag)
}

pub fn addr(tag: u8) -> Address {
    Address::repeat_byte(tag)
}

pub fn quantity(value: u64) -> String {
    format!("{value:#x}")
}

/// `eth_getTransactionByHash` result; `block_number` `None` means pending
pub fn tx_json(hash: B256, from: Address, to: Option<Address>, block_number: Option<u64>) -> Value {
    json!({
        "hash": hash,
        "from": from,
        "to": to,
        "nonce": "0x1",
        "value": U256::from(1_000_000_000_000_000u64),
        "gas": quantity(100_000),
        "gasPrice": quantity(2_000_000_000),
        "input": "0xa9059cbb",
        "blockNumber": block_number.map(quantity),
        "blockHash": block_number.map(|_| B256::repeat_byte(0xbb)),
        "transactionIndex": block_number.map(|_| "0x0"),
        "type": "0x0",
    })
}

pub fn receipt_json(
    hash: B256,
    from: Address,
    to: Option<Address>,
    contract_address: Option<Address>,
    gas_used: u64,
) -> Value {
    json!({
        "transactionHash": hash,
        "transactionIndex": "0x0",
        "blockHash": B256::repeat_byte(0xbb),
        "blockNumber": quantity(100),
        "from": from,
        "to": to,
        "gasUsed": quantity(gas_used),
        "effectiveGasPrice": quantity(2_000_000_000),
        "contractAddress": contract_address,
        "status": "0x1",
        "logs": [],
    })
}

pub fn log_json(address: Address, topic: B256) -> Value {
    json!({
        "address": address,
        "topics": [topic],
        "data": "0x",
    })
}
