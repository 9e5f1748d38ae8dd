//! Chain registry
//!
//! Static identifiers for EVM networks plus metadata (native token,
//! wrapped-native contract) for the chains the crate knows in detail.

use alloy::primitives::{address, Address};
use std::{fmt, str::FromStr};

use crate::errors::InitError;

/// Placeholder address commonly used for the native token in DEX routers
pub const NATIVE_ETH: Address = address!("eeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee");

/// The zero address
pub const ZERO_ADDRESS: Address = Address::ZERO;

/// Addresses tokens are sent to in order to burn them
pub const BLACKHOLE_ADDRESSES: [Address; 2] = [
    ZERO_ADDRESS,
    address!("000000000000000000000000000000000000dead"),
];

/// Check whether `address` is a burn address
pub fn is_blackhole(address: &Address) -> bool {
    BLACKHOLE_ADDRESSES.contains(address)
}

macro_rules! chain_ids {
    ($($variant:ident = $id:literal => $name:literal,)*) => {
        /// EVM chain identifiers (EIP-155 chain ids)
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum ChainId {
            $($variant,)*
        }

        impl ChainId {
            /// Every registered chain
            pub const ALL: &'static [ChainId] = &[$(ChainId::$variant,)*];

            /// Numeric EIP-155 chain id
            pub const fn id(self) -> u64 {
                match self {
                    $(ChainId::$variant => $id,)*
                }
            }

            /// Short upper-case name, e.g. `ETH`, `BSC`
            pub const fn name(self) -> &'static str {
                match self {
                    $(ChainId::$variant => $name,)*
                }
            }

            /// Look up a chain by numeric id
            pub fn from_id(id: u64) -> Option<Self> {
                match id {
                    $($id => Some(ChainId::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

chain_ids! {
    Eth = 1 => "ETH",
    Ubiq = 8 => "UBIQ",
    Op = 10 => "OP",
    Flare = 14 => "FLARE",
    Songbird = 19 => "SONGBIRD",
    Elastos = 20 => "ELASTOS",
    Kardiachain = 24 => "KARDIACHAIN",
    Cronos = 25 => "CRONOS",
    Rsk = 30 => "RSK",
    Telos = 40 => "TELOS",
    Xdc = 50 => "XDC",
    Csc = 52 => "CSC",
    Zyx = 55 => "ZYX",
    Bsc = 56 => "BSC",
    Syscoin = 57 => "SYSCOIN",
    Gochain = 60 => "GOCHAIN",
    EthClassic = 61 => "ETH_CLASSIC",
    Okexchain = 66 => "OKEXCHAIN",
    Hoo = 70 => "HOO",
    Meter = 82 => "METER",
    NovaNetwork = 87 => "NOVA_NETWORK",
    Viction = 88 => "VICTION",
    Xdai = 100 => "XDAI",
    Velas = 106 => "VELAS",
    Thundercore = 108 => "THUNDERCORE",
    Fuse = 122 => "FUSE",
    Heco = 128 => "HECO",
    Polygon = 137 => "POLYGON",
    ShimmerEvm = 148 => "SHIMMER_EVM",
    Manta = 169 => "MANTA",
    XdaiArb = 200 => "XDAIARB",
    OpBnb = 204 => "OP_BNB",
    Energyweb = 246 => "ENERGYWEB",
    Oasys = 248 => "OASYS",
    Fantom = 250 => "FANTOM",
    Hpb = 269 => "HPB",
    Boba = 288 => "BOBA",
    Omax = 311 => "OMAX",
    Filecoin = 314 => "FILECOIN",
    Kucoin = 321 => "KUCOIN",
    Era = 324 => "ERA",
    Shiden = 336 => "SHIDEN",
    Theta = 361 => "THETA",
    Pulse = 369 => "PULSE",
    Sx = 416 => "SX",
    Areon = 463 => "AREON",
    Candle = 534 => "CANDLE",
    Rollux = 570 => "ROLLUX",
    Astar = 592 => "ASTAR",
    Callisto = 820 => "CALLISTO",
    Wanchain = 888 => "WANCHAIN",
    Conflux = 1030 => "CONFLUX",
    Metis = 1088 => "METIS",
    PolygonZkevm = 1101 => "POLYGON_ZKEVM",
    Core = 1116 => "CORE",
    Ultron = 1231 => "ULTRON",
    Step = 1234 => "STEP",
    Moonbeam = 1284 => "MOONBEAM",
    Moonriver = 1285 => "MOONRIVER",
    LivingAssetsMainnet = 1440 => "LIVING_ASSETS_MAINNET",
    Tenet = 1559 => "TENET",
    Onus = 1975 => "ONUS",
    Hubblenet = 1992 => "HUBBLENET",
    Dogechain = 2000 => "DOGECHAIN",
    Kava = 2222 => "KAVA",
    Soma = 2332 => "SOMA",
    Beam = 4337 => "BEAM",
    Iotex = 4689 => "IOTEX",
    Mantle = 5000 => "MANTLE",
    Xlc = 5050 => "XLC",
    Nahmii = 5551 => "NAHMII",
    Tombchain = 6969 => "TOMBCHAIN",
    Bitrock = 7171 => "BITROCK",
    Canto = 7700 => "CANTO",
    Klaytn = 8217 => "KLAYTN",
    Base = 8453 => "BASE",
    Jbc = 8899 => "JBC",
    Evmos = 9001 => "EVMOS",
    Carbon = 9790 => "CARBON",
    Smartbch = 10000 => "SMARTBCH",
    Loop = 15551 => "LOOP",
    EosEvm = 17777 => "EOS_EVM",
    Blast = 23888 => "BLAST",
    Bitgert = 32520 => "BITGERT",
    Fusion = 32659 => "FUSION",
    Zilliqa = 32769 => "ZILLIQA",
    Arb = 42161 => "ARB",
    ArbNova = 42170 => "ARB_NOVA",
    Celo = 42220 => "CELO",
    Oasis = 42262 => "OASIS",
    Avalanche = 43114 => "AVALANCHE",
    Rei = 47805 => "REI",
    Reichain = 55555 => "REICHAIN",
    Linea = 59144 => "LINEA",
    Godwoken = 71402 => "GODWOKEN",
    Chiliz = 88888 => "CHILIZ",
    Polis = 333999 => "POLIS",
    Kekchain = 420420 => "KEKCHAIN",
    Vision = 888888 => "VISION",
    EthSepolia = 11155111 => "ETH_SEPOLIA",
    Neon = 245022934 => "NEON",
    Aurora = 1313161554 => "AURORA",
    Harmony = 1666600000 => "HARMONY",
    Palm = 11297108109 => "PALM",
    Curio = 836542336838601 => "CURIO",
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parses either a chain name (case-insensitive) or a decimal chain id
impl FromStr for ChainId {
    type Err = InitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(id) = s.parse::<u64>() {
            return ChainId::from_id(id).ok_or_else(|| InitError::UnknownChain(s.to_string()));
        }
        ChainId::ALL
            .iter()
            .copied()
            .find(|chain| chain.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| InitError::UnknownChain(s.to_string()))
    }
}

impl TryFrom<u64> for ChainId {
    type Error = InitError;

    fn try_from(id: u64) -> Result<Self, Self::Error> {
        ChainId::from_id(id).ok_or_else(|| InitError::UnknownChain(id.to_string()))
    }
}

/// Network metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainInfo {
    pub chain_id: ChainId,
    /// Human readable network name
    pub name: &'static str,
    pub symbol: &'static str,
    pub native_token_name: &'static str,
    pub native_token_symbol: &'static str,
    /// Wrapped native token contract (WETH, WBNB, ...)
    pub wrapped_native: Address,
}

const ETH_INFO: ChainInfo = ChainInfo {
    chain_id: ChainId::Eth,
    name: "Ethereum",
    symbol: "ETH",
    native_token_name: "Ether",
    native_token_symbol: "ETH",
    wrapped_native: address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"),
};

const BSC_INFO: ChainInfo = ChainInfo {
    chain_id: ChainId::Bsc,
    name: "Binance Smart Chain",
    symbol: "BSC",
    native_token_name: "BNB",
    native_token_symbol: "BNB",
    wrapped_native: address!("bb4cdb9cbd36b01bd1cbaebf2de08d9173bc095c"),
};

const POLYGON_INFO: ChainInfo = ChainInfo {
    chain_id: ChainId::Polygon,
    name: "Polygon",
    symbol: "POLYGON",
    native_token_name: "POL",
    native_token_symbol: "POL",
    wrapped_native: address!("0d500b1d8e8ef31e21c99d1db9a6444d3adf1270"),
};

const ARB_INFO: ChainInfo = ChainInfo {
    chain_id: ChainId::Arb,
    name: "Arbitrum One",
    symbol: "ARB",
    native_token_name: "Ether",
    native_token_symbol: "ETH",
    wrapped_native: address!("82af49447d8a07e3bd95bd0d56f35241523fbab1"),
};

const OP_INFO: ChainInfo = ChainInfo {
    chain_id: ChainId::Op,
    name: "OP Mainnet",
    symbol: "OP",
    native_token_name: "Ether",
    native_token_symbol: "ETH",
    wrapped_native: address!("4200000000000000000000000000000000000006"),
};

const BASE_INFO: ChainInfo = ChainInfo {
    chain_id: ChainId::Base,
    name: "Base",
    symbol: "BASE",
    native_token_name: "Ether",
    native_token_symbol: "ETH",
    wrapped_native: address!("4200000000000000000000000000000000000006"),
};

impl ChainId {
    /// Metadata for chains with a known wrapped-native token
    pub fn info(self) -> Option<&'static ChainInfo> {
        match self {
            ChainId::Eth => Some(&ETH_INFO),
            ChainId::Bsc => Some(&BSC_INFO),
            ChainId::Polygon => Some(&POLYGON_INFO),
            ChainId::Arb => Some(&ARB_INFO),
            ChainId::Op => Some(&OP_INFO),
            ChainId::Base => Some(&BASE_INFO),
            _ => None,
        }
    }

    /// Wrapped native token address, if known
    pub fn wrapped_native(self) -> Option<Address> {
        self.info().map(|info| info.wrapped_native)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_chain_ids_are_unique() {
        let ids: HashSet<u64> = ChainId::ALL.iter().map(|c| c.id()).collect();
        assert_eq!(ids.len(), ChainId::ALL.len());
        for chain in ChainId::ALL {
            assert_eq!(ChainId::from_id(chain.id()), Some(*chain));
        }
    }

    #[test]
    fn test_parse_chain() {
        assert_eq!("eth".parse::<ChainId>().unwrap(), ChainId::Eth);
        assert_eq!("BSC".parse::<ChainId>().unwrap(), ChainId::Bsc);
        assert_eq!("eth_sepolia".parse::<ChainId>().unwrap(), ChainId::EthSepolia);
        assert_eq!("56".parse::<ChainId>().unwrap(), ChainId::Bsc);
        assert!("not-a-chain".parse::<ChainId>().is_err());
        assert!(ChainId::try_from(999_999_999_999u64).is_err());
    }

    #[test]
    fn test_chain_info() {
        let eth = ChainId::Eth.info().unwrap();
        assert_eq!(eth.native_token_symbol, "ETH");
        assert_eq!(
            eth.wrapped_native,
            address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2")
        );
        assert_eq!(ChainId::Bsc.info().unwrap().native_token_symbol, "BNB");
        assert!(ChainId::Ubiq.info().is_none());
        assert_eq!(ChainId::Ubiq.wrapped_native(), None);
    }

    #[test]
    fn test_blackhole() {
        assert!(is_blackhole(&Address::ZERO));
        assert!(is_blackhole(&address!("000000000000000000000000000000000000dEaD")));
        assert!(!is_blackhole(&NATIVE_ETH));
    }
}
