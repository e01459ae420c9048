//! Wallet-side views of chain data.

use bitcoin::{OutPoint, ScriptBuf};

use crate::money::Money;

/// A spendable output reported by the block explorer.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UnspentCoin {
    /// Transaction reference and output index.
    pub outpoint: OutPoint,
    pub amount: Money,
    /// Blocks mined on top of the including block, plus one. Zero while in the mempool.
    pub confirmations: u32,
    /// Locking script of the output, needed to sign a spend of it.
    pub script_pubkey: ScriptBuf,
}

impl UnspentCoin {
    pub fn new(outpoint: OutPoint, amount: Money, confirmations: u32, script_pubkey: ScriptBuf) -> Self {
        Self {
            outpoint,
            amount,
            confirmations,
            script_pubkey,
        }
    }
}
