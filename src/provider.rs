//! RPC provider registry
//!
//! Maps (chain, provider) pairs to HTTP and WebSocket endpoint templates.
//! Templates containing `{}` are filled with the caller's API key.
//! The table is checked once, on first lookup.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::{chain::ChainId, errors::InitError};

/// Placeholder substituted with the API key
const KEY_PLACEHOLDER: &str = "{}";

/// Named RPC providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RpcProvider {
    /// Public endpoint, no key required
    #[default]
    Default,
    Infura,
    Alchemy,
    Chainbase,
    /// Caller-supplied endpoint
    Custom,
}

impl RpcProvider {
    /// Providers backed by the static table
    pub const REGISTERED: [RpcProvider; 4] = [
        RpcProvider::Default,
        RpcProvider::Infura,
        RpcProvider::Alchemy,
        RpcProvider::Chainbase,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RpcProvider::Default => "default",
            RpcProvider::Infura => "infura",
            RpcProvider::Alchemy => "alchemy",
            RpcProvider::Chainbase => "chainbase",
            RpcProvider::Custom => "custom",
        }
    }

    /// Whether this provider's templates take an API key
    pub fn requires_api_key(self) -> bool {
        matches!(
            self,
            RpcProvider::Infura | RpcProvider::Alchemy | RpcProvider::Chainbase
        )
    }
}

impl fmt::Display for RpcProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RpcProvider {
    type Err = InitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "default" => Ok(RpcProvider::Default),
            "infura" => Ok(RpcProvider::Infura),
            "alchemy" => Ok(RpcProvider::Alchemy),
            "chainbase" => Ok(RpcProvider::Chainbase),
            "custom" => Ok(RpcProvider::Custom),
            _ => Err(InitError::UnknownProvider(s.to_string())),
        }
    }
}

/// Endpoint transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Http,
    Ws,
}

impl Transport {
    fn as_str(self) -> &'static str {
        match self {
            Transport::Http => "http",
            Transport::Ws => "ws",
        }
    }

    fn schemes(self) -> &'static [&'static str] {
        match self {
            Transport::Http => &["http://", "https://"],
            Transport::Ws => &["ws://", "wss://"],
        }
    }
}

fn http_template(chain: ChainId, provider: RpcProvider) -> Option<&'static str> {
    match (chain, provider) {
        (ChainId::Eth, RpcProvider::Default) => Some("https://eth.llamarpc.com"),
        (ChainId::Eth, RpcProvider::Infura) => Some("https://mainnet.infura.io/v3/{}"),
        (ChainId::Eth, RpcProvider::Alchemy) => Some("https://eth-mainnet.alchemyapi.io/v2/{}"),
        (ChainId::Eth, RpcProvider::Chainbase) => {
            Some("https://ethereum-mainnet.s.chainbase.online/v1/{}")
        }
        (ChainId::Bsc, RpcProvider::Default) => Some("https://bsc.llamarpc.com"),
        (ChainId::Bsc, RpcProvider::Chainbase) => Some("https://bsc-mainnet.s.chainbase.online/v1/{}"),
        _ => None,
    }
}

fn ws_template(chain: ChainId, provider: RpcProvider) -> Option<&'static str> {
    match (chain, provider) {
        (ChainId::Eth, RpcProvider::Default) => Some("wss://ethereum-rpc.publicnode.com"),
        (ChainId::Eth, RpcProvider::Infura) => Some("wss://mainnet.infura.io/ws/v3/{}"),
        (ChainId::Eth, RpcProvider::Alchemy) => Some("wss://eth-mainnet.g.alchemy.com/v2/{}"),
        (ChainId::Eth, RpcProvider::Chainbase) => {
            Some("wss://ethereum-mainnet.s.chainbase.online/v1/{}")
        }
        (ChainId::Bsc, RpcProvider::Default) => Some("wss://bsc-rpc.publicnode.com"),
        (ChainId::Bsc, RpcProvider::Chainbase) => Some("wss://bsc-mainnet.s.chainbase.online/v1/{}"),
        _ => None,
    }
}

fn template(chain: ChainId, provider: RpcProvider, transport: Transport) -> Option<&'static str> {
    match transport {
        Transport::Http => http_template(chain, provider),
        Transport::Ws => ws_template(chain, provider),
    }
}

fn check_template(
    chain: ChainId,
    provider: RpcProvider,
    transport: Transport,
    template: &str,
) -> Result<(), InitError> {
    let invalid = |reason: &str| InitError::InvalidTemplate {
        chain: chain.to_string(),
        provider: provider.to_string(),
        reason: reason.to_string(),
    };
    if !transport.schemes().iter().any(|scheme| template.starts_with(scheme)) {
        return Err(invalid("unexpected URL scheme"));
    }
    let placeholders = template.matches(KEY_PLACEHOLDER).count();
    match (provider.requires_api_key(), placeholders) {
        (true, 1) | (false, 0) => Ok(()),
        (true, _) => Err(invalid("expected exactly one API key placeholder")),
        (false, _) => Err(invalid("keyless provider must not take an API key")),
    }
}

/// Check every registered template
///
/// # Returns
/// * `Ok(())` - All templates have a matching scheme and placeholder count
/// * `Err(InitError::InvalidTemplate)` - The first malformed entry
pub fn validate_registry() -> Result<(), InitError> {
    for chain in ChainId::ALL {
        for provider in RpcProvider::REGISTERED {
            for transport in [Transport::Http, Transport::Ws] {
                if let Some(template) = template(*chain, provider, transport) {
                    check_template(*chain, provider, transport, template)?;
                }
            }
        }
    }
    Ok(())
}

static REGISTRY_CHECK: Lazy<Result<(), String>> =
    Lazy::new(|| validate_registry().map_err(|e| e.to_string()));

/// Resolve the endpoint URL for a chain and provider
///
/// # Arguments
/// * `chain` - Target network
/// * `provider` - Registered provider, or `Custom`
/// * `transport` - HTTP or WebSocket
/// * `endpoint` - Caller-supplied URL, required for `Custom`
/// * `api_key` - Substituted into the template for keyed providers
///
/// # Returns
/// The full endpoint URL
pub fn resolve_endpoint(
    chain: ChainId,
    provider: RpcProvider,
    transport: Transport,
    endpoint: Option<&str>,
    api_key: &str,
) -> Result<String, InitError> {
    if provider == RpcProvider::Custom {
        return match endpoint {
            Some(url) if !url.trim().is_empty() => Ok(url.to_string()),
            _ => Err(InitError::MissingEndpoint),
        };
    }
    if let Err(reason) = REGISTRY_CHECK.as_ref() {
        return Err(InitError::InvalidTemplate {
            chain: chain.to_string(),
            provider: provider.to_string(),
            reason: reason.clone(),
        });
    }
    let template = template(chain, provider, transport).ok_or_else(|| {
        InitError::UnsupportedProvider {
            chain: chain.to_string(),
            provider: provider.to_string(),
            transport: transport.as_str(),
        }
    })?;
    if provider.requires_api_key() && api_key.is_empty() {
        return Err(InitError::MissingApiKey(provider.to_string()));
    }
    Ok(template.replace(KEY_PLACEHOLDER, api_key))
}
