//! Wallet-wide constants. All monetary values in base units (1 coin = 10^8 units).

/// Base units per whole coin.
pub const COIN: u64 = 100_000_000;

/// Number of decimal places carried by [`Money`](crate::money::Money).
pub const MONEY_DECIMALS: u32 = 8;

/// Largest decimal scale accepted when parsing user amounts.
pub const MAX_DECIMAL_SCALE: u32 = 28;

/// BIP-44 purpose segment.
pub const BIP44_PURPOSE: u32 = 44;

/// SLIP-44 coin type shared by every test network.
pub const TESTNET_COIN_TYPE: u32 = 1;

/// High bit marking a hardened BIP-32 path segment.
pub const HARDENED_BIT: u32 = 0x8000_0000;

/// Largest serialized transaction size accepted by the policy check, in bytes.
pub const MAX_TRANSACTION_SIZE: usize = 1_000_000;

/// Estimated size of a signed P2PKH input, in bytes.
pub const P2PKH_INPUT_SIZE: usize = 148;

/// Estimated size of a P2PKH output, in bytes.
pub const P2PKH_OUTPUT_SIZE: usize = 34;

/// Version, locktime and count prefixes of a legacy transaction, in bytes.
pub const TRANSACTION_OVERHEAD: usize = 10;
