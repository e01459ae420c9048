//! Block-explorer capability consumed by the wallet.

use async_trait::async_trait;
use bitcoin::{Transaction, Txid};

use crate::address::Address;
use crate::error::TransportError;
use crate::types::UnspentCoin;

/// Query and submission interface to a network data source.
///
/// Implementations own their wire format, connection reuse and timeouts.
/// They must not retry on their own; failures are surfaced as-is.
#[async_trait]
pub trait NetworkClient: Send + Sync {
    /// All unspent outputs currently paying to `address`, including
    /// unconfirmed ones.
    async fn unspent_coins(&self, address: &Address) -> Result<Vec<UnspentCoin>, TransportError>;

    /// Submit a signed transaction. Returns the id the network assigned.
    async fn broadcast(&self, tx: &Transaction) -> Result<Txid, TransportError>;
}
