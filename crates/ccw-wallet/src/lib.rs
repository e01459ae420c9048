//! # ccw-wallet: per-user HD wallets for chat-bot integrations.
//!
//! Derives a BIP-44 receiving key from a user's master key, tracks
//! confirmed/pending/unconfirmed balances from a block explorer, and builds,
//! checks and broadcasts signed transactions.
//!
//! # Modules
//!
//! - [`error`]: `WalletError` enum
//! - [`keys`]: BIP-32/44 key paths, master key, signing
//! - [`balance`]: confirmation-depth classification and balance snapshots
//! - [`builder`]: transaction builder with fee and change
//! - [`broadcast`]: submission and rejection-message extraction
//! - [`wallet`]: per-user wallet facade
//! - [`service`]: one wallet per (user, network)

pub mod balance;
pub mod broadcast;
pub mod builder;
pub mod error;
pub mod keys;
pub mod service;
pub mod wallet;

// Re-exports for convenient access
pub use balance::{BalanceSnapshot, BalanceTracker, CoinBucket};
pub use broadcast::BroadcastOutcome;
pub use builder::{BuiltTransaction, TransactionBuilder};
pub use error::WalletError;
pub use keys::{DerivedKey, KeyPath, MasterKey};
pub use service::{KeyStore, NetworkContext, SeedKeyStore, UserId, WalletService};
pub use wallet::{SendOutcome, Wallet};
