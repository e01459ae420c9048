//! Network parameters: which chain a wallet lives on and how its addresses
//! are encoded.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a network carries real value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NetworkKind {
    /// Production network.
    #[default]
    Mainnet,
    /// Public test network.
    Testnet,
    /// Local regression-test network.
    Regtest,
}

impl NetworkKind {
    pub fn is_mainnet(&self) -> bool {
        matches!(self, Self::Mainnet)
    }

    /// BIP-32 serialization family for extended keys on this network.
    pub fn bip32_kind(&self) -> bitcoin::NetworkKind {
        match self {
            Self::Mainnet => bitcoin::NetworkKind::Main,
            Self::Testnet | Self::Regtest => bitcoin::NetworkKind::Test,
        }
    }
}

/// Chain-specific constants used for addressing.
///
/// Identified by `name` (e.g. `"bitcoin-main"`); two wallets of the same user
/// on different networks are different wallets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NetworkParams {
    /// Stable identifier, used as a registry key and in logs.
    pub name: &'static str,
    pub kind: NetworkKind,
    /// Base58 version byte of pay-to-pubkey-hash addresses.
    pub pubkey_address_prefix: u8,
    /// Base58 version byte of pay-to-script-hash addresses.
    pub script_address_prefix: u8,
}

impl NetworkParams {
    pub const fn bitcoin_mainnet() -> Self {
        Self {
            name: "bitcoin-main",
            kind: NetworkKind::Mainnet,
            pubkey_address_prefix: 0x00,
            script_address_prefix: 0x05,
        }
    }

    pub const fn bitcoin_testnet() -> Self {
        Self {
            name: "bitcoin-test",
            kind: NetworkKind::Testnet,
            pubkey_address_prefix: 0x6f,
            script_address_prefix: 0xc4,
        }
    }

    pub const fn litecoin_mainnet() -> Self {
        Self {
            name: "litecoin-main",
            kind: NetworkKind::Mainnet,
            pubkey_address_prefix: 0x30,
            script_address_prefix: 0x32,
        }
    }

    pub const fn litecoin_testnet() -> Self {
        Self {
            name: "litecoin-test",
            kind: NetworkKind::Testnet,
            pubkey_address_prefix: 0x6f,
            script_address_prefix: 0x3a,
        }
    }

    pub const fn monacoin_mainnet() -> Self {
        Self {
            name: "monacoin-main",
            kind: NetworkKind::Mainnet,
            pubkey_address_prefix: 0x32,
            script_address_prefix: 0x37,
        }
    }

    pub const fn monacoin_testnet() -> Self {
        Self {
            name: "monacoin-test",
            kind: NetworkKind::Testnet,
            pubkey_address_prefix: 0x6f,
            script_address_prefix: 0x75,
        }
    }

    /// All built-in networks.
    pub fn known() -> [Self; 6] {
        [
            Self::bitcoin_mainnet(),
            Self::bitcoin_testnet(),
            Self::litecoin_mainnet(),
            Self::litecoin_testnet(),
            Self::monacoin_mainnet(),
            Self::monacoin_testnet(),
        ]
    }

    /// Look up a built-in network by name.
    pub fn by_name(name: &str) -> Option<Self> {
        Self::known().into_iter().find(|params| params.name == name)
    }
}

impl fmt::Display for NetworkParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
