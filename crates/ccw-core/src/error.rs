//! Error types for ccwallet core types.
use thiserror::Error;

use crate::money::DecimalAmount;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    #[error("too many decimal places: {amount}")] Precision { amount: DecimalAmount },
    #[error("under the minimum amount: {amount} < {min}")] BelowMinimum { amount: DecimalAmount, min: DecimalAmount },
    #[error("exceeds the maximum amount: {amount} > {max}")] AboveMaximum { amount: DecimalAmount, max: DecimalAmount },
    #[error("arithmetic overflow")] Overflow,
    #[error("invalid amount: {0}")] Parse(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid base58: {0}")] InvalidBase58(String),
    #[error("invalid length: {0}")] InvalidLength(usize),
    #[error("version byte {version:#04x} is not valid on {network}")] WrongNetwork { version: u8, network: &'static str },
}

/// Failure reported by a [`NetworkClient`](crate::client::NetworkClient).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The remote answered with a non-success HTTP status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    /// The request never produced a response.
    #[error("I/O: {0}")]
    Io(String),
    /// The response could not be decoded.
    #[error("decode: {0}")]
    Decode(String),
    /// Several underlying failures reported together.
    #[error("{} transport failures", .0.len())]
    Aggregate(Vec<TransportError>),
}
