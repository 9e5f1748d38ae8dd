//! Wrapped-native token event parsers
//!
//! Turns WETH-style `Deposit` / `Withdrawal` logs into [`TransferEvent`]s so
//! wrapping and unwrapping can be handled like ordinary token transfers.
//! Decoding is local; no RPC access is needed.

use alloy::{
    primitives::{Address, B256, U256},
    sol_types::SolEvent,
};
use log::warn;
use rust_decimal::Decimal;

use crate::{chain::ChainId, types::RpcLog};

/// Decimals of every wrapped-native token supported in [`crate::chain`]
pub const WRAPPED_NATIVE_DECIMALS: u32 = 18;

mod weth {
    alloy::sol! {
        event Deposit(address indexed dst, uint256 wad);
        event Withdrawal(address indexed src, uint256 wad);
    }
}

pub use weth::{Deposit, Withdrawal};

/// Token movement decoded from a log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferEvent {
    /// Token contract that emitted the log
    pub token: Address,
    pub from: Address,
    pub to: Address,
    /// Amount scaled by the token decimals
    pub value: Decimal,
    /// Amount in the smallest unit
    pub raw_value: U256,
    pub transaction_hash: Option<B256>,
    pub log_index: Option<u64>,
}

/// Parser for one event kind
pub trait EventParser {
    /// Event signature hash expected in the first topic
    const SIGNATURE_HASH: B256;

    /// Decode `log` if it is this event emitted by the chain's wrapped native token
    fn parse(log: &RpcLog, chain: ChainId) -> Option<TransferEvent>;
}

/// WETH `Deposit(address,uint256)`: native coin wrapped into the token
pub struct WethDeposit;

/// WETH `Withdrawal(address,uint256)`: token unwrapped into the native coin
pub struct WethWithdrawal;

impl EventParser for WethDeposit {
    const SIGNATURE_HASH: B256 = Deposit::SIGNATURE_HASH;

    fn parse(log: &RpcLog, chain: ChainId) -> Option<TransferEvent> {
        let token = matching_token(log, chain, Self::SIGNATURE_HASH)?;
        let event = Deposit::decode_raw_log(log.topics.iter().copied(), &log.data).ok()?;
        transfer(log, token, token, event.dst, event.wad)
    }
}

impl EventParser for WethWithdrawal {
    const SIGNATURE_HASH: B256 = Withdrawal::SIGNATURE_HASH;

    fn parse(log: &RpcLog, chain: ChainId) -> Option<TransferEvent> {
        let token = matching_token(log, chain, Self::SIGNATURE_HASH)?;
        let event = Withdrawal::decode_raw_log(log.topics.iter().copied(), &log.data).ok()?;
        transfer(log, token, event.src, token, event.wad)
    }
}

/// Try every known parser
pub fn parse_wrapped_native_log(log: &RpcLog, chain: ChainId) -> Option<TransferEvent> {
    WethDeposit::parse(log, chain).or_else(|| WethWithdrawal::parse(log, chain))
}

fn matching_token(log: &RpcLog, chain: ChainId, signature: B256) -> Option<Address> {
    if log.signature() != Some(&signature) {
        return None;
    }
    let token = chain.wrapped_native()?;
    (log.address == token).then_some(token)
}

fn transfer(log: &RpcLog, token: Address, from: Address, to: Address, raw: U256) -> Option<TransferEvent> {
    let value = match scale_amount(raw, WRAPPED_NATIVE_DECIMALS) {
        Some(value) => value,
        None => {
            warn!("amount {raw} in log of {token} does not fit a decimal");
            return None;
        }
    };
    Some(TransferEvent {
        token,
        from,
        to,
        value,
        raw_value: raw,
        transaction_hash: log.transaction_hash,
        log_index: log.log_index,
    })
}

/// `raw / 10^decimals` as a decimal, `None` if it cannot be represented
pub fn scale_amount(raw: U256, decimals: u32) -> Option<Decimal> {
    let mantissa = i128::try_from(raw).ok()?;
    Decimal::try_from_i128_with_scale(mantissa, decimals).ok()
}
