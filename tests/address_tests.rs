//! Integration tests for address classification
//!
//! Bytecode is synthesized from the required selectors, so these tests
//! exercise the matching and caching without a node.

mod common;

use alloy::primitives::{hex, Bytes};
use common::{addr, init_logger, MockRpc};
use evm_query_kit::{address::selector, AddressClassifier, ChainId, ContractKind, SharedRpc};
use serde_json::{json, Value};

/// Minimal dispatcher-like bytecode containing every given selector
fn bytecode_with(signatures: &[&str]) -> Value {
    let mut code = hex!("6080604052").to_vec();
    for signature in signatures {
        code.push(0x63);
        code.extend_from_slice(selector(signature).as_slice());
        code.extend_from_slice(&hex!("1461"));
    }
    json!(Bytes::from(code))
}

fn erc20_code() -> Value {
    bytecode_with(&[
        "name()",
        "symbol()",
        "decimals()",
        "totalSupply()",
        "balanceOf(address)",
        "transfer(address,uint256)",
        "transferFrom(address,address,uint256)",
        "approve(address,uint256)",
        "allowance(address,address)",
    ])
}

#[tokio::test]
async fn test_eoa_detection() {
    let mock = MockRpc::new().respond("eth_getCode", json!("0x")).shared();
    let mut classifier = AddressClassifier::new(16);

    assert!(classifier.is_eoa(mock.as_ref(), addr(0x01)).await.unwrap());
    assert!(classifier.is_eoa(mock.as_ref(), addr(0x01)).await.unwrap());
    assert_eq!(mock.calls("eth_getCode"), 1);
}

#[tokio::test]
async fn test_eoa_error_is_returned() {
    let mock = MockRpc::new().fail("eth_getCode").shared();
    let mut classifier = AddressClassifier::default();

    assert!(classifier.is_eoa(mock.as_ref(), addr(0x01)).await.is_err());
    assert!(classifier.is_eoa(mock.as_ref(), addr(0x01)).await.is_err());
    assert_eq!(mock.calls("eth_getCode"), 2);
}

#[tokio::test]
async fn test_erc20_detection_and_cache() {
    let mock = MockRpc::new().respond("eth_getCode", erc20_code()).shared();
    let rpc: SharedRpc = mock.clone();
    let mut classifier = AddressClassifier::default();

    assert!(classifier.is_erc20(rpc.as_ref(), addr(0x02), ChainId::Eth).await);
    assert!(classifier.is_erc20(rpc.as_ref(), addr(0x02), ChainId::Eth).await);
    assert_eq!(mock.calls("eth_getCode"), 1);
    assert_eq!(classifier.cached(ContractKind::Erc20), 1);

    // The cache is keyed by chain as well
    assert!(classifier.is_erc20(rpc.as_ref(), addr(0x02), ChainId::Bsc).await);
    assert_eq!(mock.calls("eth_getCode"), 2);

    // An ERC20 is not a v2 pair
    assert!(!classifier.is_lpv2(rpc.as_ref(), addr(0x02), ChainId::Eth).await);
    assert_eq!(mock.calls("eth_getCode"), 3);

    classifier.clear();
    assert_eq!(classifier.cached(ContractKind::Erc20), 0);
}

#[tokio::test]
async fn test_pool_detection() {
    let v2 = MockRpc::new()
        .respond("eth_getCode", bytecode_with(&["getReserves()", "token0()", "token1()"]))
        .shared();
    let v3 = MockRpc::new()
        .respond("eth_getCode", bytecode_with(&["token0()", "slot0()", "tickSpacing()", "token1()"]))
        .shared();
    let mut classifier = AddressClassifier::default();

    assert!(classifier.is_lpv2(v2.as_ref(), addr(0x03), ChainId::Bsc).await);
    assert!(!classifier.is_lpv3(v2.as_ref(), addr(0x03), ChainId::Bsc).await);
    assert!(classifier.is_lpv3(v3.as_ref(), addr(0x04), ChainId::Bsc).await);
    assert!(!classifier.is_erc20(v3.as_ref(), addr(0x04), ChainId::Bsc).await);
}

#[tokio::test]
async fn test_rpc_failure_is_not_cached() {
    init_logger();
    let mock = MockRpc::new().fail("eth_getCode").shared();
    let mut classifier = AddressClassifier::default();

    assert!(!classifier.is_erc20(mock.as_ref(), addr(0x05), ChainId::Eth).await);
    assert!(!classifier.is_erc20(mock.as_ref(), addr(0x05), ChainId::Eth).await);
    assert_eq!(mock.calls("eth_getCode"), 2);
    assert_eq!(classifier.cached(ContractKind::Erc20), 0);
}

#[tokio::test]
async fn test_capacity_evicts_oldest() {
    let mock = MockRpc::new().respond("eth_getCode", erc20_code()).shared();
    let mut classifier = AddressClassifier::new(2);

    for tag in 1..=3 {
        classifier.is_erc20(mock.as_ref(), addr(tag), ChainId::Eth).await;
    }
    assert_eq!(classifier.cached(ContractKind::Erc20), 2);
    // addr(1) was evicted
    classifier.is_erc20(mock.as_ref(), addr(1), ChainId::Eth).await;
    assert_eq!(mock.calls("eth_getCode"), 4);
}
