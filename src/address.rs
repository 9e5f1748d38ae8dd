//! Address classification by bytecode inspection
//!
//! Decides whether an address is an externally-owned account, an ERC20
//! token, or a Uniswap-style v2/v3 pool by looking for the 4-byte function
//! selectors each kind must expose.
//!
//! This is a heuristic: unrelated code can contain the same byte sequences,
//! and proxies whose bytecode only delegates will not match.
//!
//! Results are memoized in an [`AddressClassifier`], which the caller owns
//! and passes around; there is no global cache.

use alloy::primitives::{keccak256, Address, FixedBytes};
use log::warn;
use lru::LruCache;
use once_cell::sync::Lazy;
use std::num::NonZeroUsize;

use crate::{chain::ChainId, errors::RpcError, rpc::EthRpc};

/// Default number of entries kept per classification kind
pub const DEFAULT_CLASSIFIER_CAPACITY: usize = 10_000;

/// 4-byte function selector of a canonical signature
pub fn selector(signature: &str) -> FixedBytes<4> {
    FixedBytes::from_slice(&keccak256(signature.as_bytes())[..4])
}

fn selectors(signatures: &[&str]) -> Vec<FixedBytes<4>> {
    signatures.iter().map(|signature| selector(signature)).collect()
}

static ERC20_SELECTORS: Lazy<Vec<FixedBytes<4>>> = Lazy::new(|| {
    selectors(&[
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
});

static LPV2_SELECTORS: Lazy<Vec<FixedBytes<4>>> =
    Lazy::new(|| selectors(&["token0()", "token1()", "getReserves()"]));

static LPV3_SELECTORS: Lazy<Vec<FixedBytes<4>>> =
    Lazy::new(|| selectors(&["slot0()", "token0()", "token1()", "tickSpacing()"]));

/// Contract kinds recognized by selector matching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractKind {
    Erc20,
    /// Uniswap v2 style pair
    LpV2,
    /// Uniswap v3 style pool
    LpV3,
}

impl ContractKind {
    /// Selectors that must all appear in the bytecode
    pub fn required_selectors(self) -> &'static [FixedBytes<4>] {
        match self {
            ContractKind::Erc20 => &ERC20_SELECTORS,
            ContractKind::LpV2 => &LPV2_SELECTORS,
            ContractKind::LpV3 => &LPV3_SELECTORS,
        }
    }
}

/// Check that every selector occurs somewhere in `code`
pub fn code_has_selectors(code: &[u8], selectors: &[FixedBytes<4>]) -> bool {
    selectors
        .iter()
        .all(|selector| code.windows(4).any(|window| window == selector.as_slice()))
}

/// Memoizing address classifier
///
/// Each check kind has its own LRU cache. Contract checks are keyed by
/// (address, chain); the EOA check by address alone. Entries never expire,
/// so a result can go stale if the address later gets code.
pub struct AddressClassifier {
    eoa: LruCache<Address, bool>,
    erc20: LruCache<(Address, ChainId), bool>,
    lpv2: LruCache<(Address, ChainId), bool>,
    lpv3: LruCache<(Address, ChainId), bool>,
}

impl Default for AddressClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_CLASSIFIER_CAPACITY)
    }
}

impl AddressClassifier {
    /// Classifier holding up to `capacity` results per kind
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            eoa: LruCache::new(capacity),
            erc20: LruCache::new(capacity),
            lpv2: LruCache::new(capacity),
            lpv3: LruCache::new(capacity),
        }
    }

    fn cache_mut(&mut self, kind: ContractKind) -> &mut LruCache<(Address, ChainId), bool> {
        match kind {
            ContractKind::Erc20 => &mut self.erc20,
            ContractKind::LpV2 => &mut self.lpv2,
            ContractKind::LpV3 => &mut self.lpv3,
        }
    }

    /// Whether `address` has no deployed code
    ///
    /// Unlike the contract checks, an RPC failure is returned to the caller
    /// and nothing is cached.
    pub async fn is_eoa(&mut self, rpc: &dyn EthRpc, address: Address) -> Result<bool, RpcError> {
        if let Some(hit) = self.eoa.get(&address) {
            return Ok(*hit);
        }
        let code = rpc.get_code(address).await?;
        let is_eoa = code.is_empty();
        self.eoa.put(address, is_eoa);
        Ok(is_eoa)
    }

    /// Whether `address` looks like a contract of `kind`
    ///
    /// # Arguments
    /// * `rpc` - Client connected to `chain`
    /// * `address` - Address to inspect
    /// * `chain` - Chain the client talks to, part of the cache key
    /// * `kind` - Which selector set to look for
    ///
    /// # Returns
    /// `true` only if every required selector occurs in the bytecode.
    /// RPC failures are logged and yield `false` without being cached.
    pub async fn classify(
        &mut self,
        rpc: &dyn EthRpc,
        address: Address,
        chain: ChainId,
        kind: ContractKind,
    ) -> bool {
        let key = (address, chain);
        if let Some(hit) = self.cache_mut(kind).get(&key) {
            return *hit;
        }
        match rpc.get_code(address).await {
            Ok(code) => {
                let matched = code_has_selectors(&code, kind.required_selectors());
                self.cache_mut(kind).put(key, matched);
                matched
            }
            Err(e) => {
                warn!("Failed to check {address}: {e}");
                false
            }
        }
    }

    pub async fn is_erc20(&mut self, rpc: &dyn EthRpc, address: Address, chain: ChainId) -> bool {
        self.classify(rpc, address, chain, ContractKind::Erc20).await
    }

    pub async fn is_lpv2(&mut self, rpc: &dyn EthRpc, address: Address, chain: ChainId) -> bool {
        self.classify(rpc, address, chain, ContractKind::LpV2).await
    }

    pub async fn is_lpv3(&mut self, rpc: &dyn EthRpc, address: Address, chain: ChainId) -> bool {
        self.classify(rpc, address, chain, ContractKind::LpV3).await
    }

    /// Number of cached results for `kind`
    pub fn cached(&self, kind: ContractKind) -> usize {
        match kind {
            ContractKind::Erc20 => self.erc20.len(),
            ContractKind::LpV2 => self.lpv2.len(),
            ContractKind::LpV3 => self.lpv3.len(),
        }
    }

    /// Drop every cached result
    pub fn clear(&mut self) {
        self.eoa.clear();
        self.erc20.clear();
        self.lpv2.clear();
        self.lpv3.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::hex;

    #[test]
    fn test_known_selectors() {
        assert_eq!(selector("transfer(address,uint256)"), FixedBytes::new(hex!("a9059cbb")));
        assert_eq!(selector("balanceOf(address)"), FixedBytes::new(hex!("70a08231")));
        assert_eq!(selector("getReserves()"), FixedBytes::new(hex!("0902f1ac")));
        assert_eq!(selector("slot0()"), FixedBytes::new(hex!("3850c7bd")));
    }

    #[test]
    fn test_selector_lists() {
        assert_eq!(ContractKind::Erc20.required_selectors().len(), 9);
        assert_eq!(ContractKind::LpV2.required_selectors().len(), 3);
        assert_eq!(ContractKind::LpV3.required_selectors().len(), 4);
    }

    #[test]
    fn test_code_has_selectors() {
        let wanted = selectors(&["token0()", "token1()", "getReserves()"]);
        let mut code = vec![0x60, 0x80, 0x60, 0x40];
        for selector in &wanted {
            code.push(0x63);
            code.extend_from_slice(selector.as_slice());
        }
        assert!(code_has_selectors(&code, &wanted));
        assert!(!code_has_selectors(&code[..code.len() - 1], &wanted));
        assert!(!code_has_selectors(&[], &wanted));
        assert!(code_has_selectors(&[], &[]));
    }
}
