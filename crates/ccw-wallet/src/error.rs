//! Wallet error types.

use ccw_core::check::TransactionCheck;
use ccw_core::error::{AddressError, MoneyError, TransportError};
use thiserror::Error;

/// Errors that can occur in wallet operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    /// Amount conversion or money arithmetic failure.
    #[error(transparent)]
    Money(#[from] MoneyError),

    /// A single output exceeds the currency's limit.
    #[error("output is too large")]
    OutputTooLarge,

    /// The outputs together exceed the currency's limit.
    #[error("total output is too large")]
    OutputTotalTooLarge,

    /// Any other policy check failure.
    #[error("transaction check failed: {0}")]
    TransactionValidation(TransactionCheck),

    /// Confirmed coins do not cover the payment plus fee.
    #[error("insufficient funds: have {have}, need {need}")]
    InsufficientFunds {
        /// Confirmed balance in base units.
        have: u64,
        /// Payment plus fee in base units.
        need: u64,
    },

    /// Destination address is malformed or for another network.
    #[error(transparent)]
    InvalidAddress(#[from] AddressError),

    /// Key derivation failure.
    #[error("key derivation: {0}")]
    KeyDerivation(String),

    /// Input signing failure.
    #[error("signing: {0}")]
    Signing(String),

    /// Unspent-output query failed; the previous balance is kept.
    #[error("balance query failed: {0}")]
    Query(TransportError),

    /// Broadcast failed in a way that carries no rejection message.
    #[error("unrecoverable transport failure: {0}")]
    UnrecoverableTransport(TransportError),

    /// No wallet context is registered for the network.
    #[error("unknown network: {0}")]
    UnknownNetwork(String),
}
