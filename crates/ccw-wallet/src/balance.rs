//! Balance tracking by confirmation depth.
//!
//! Every refresh replaces the whole [`BalanceSnapshot`]; coins are never
//! merged across refreshes.

use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{info, warn};

use ccw_core::address::Address;
use ccw_core::client::NetworkClient;
use ccw_core::currency::Currency;
use ccw_core::error::MoneyError;
use ccw_core::money::Money;
use ccw_core::types::UnspentCoin;

use crate::error::WalletError;

/// Spendability of a coin given its confirmation count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoinBucket {
    /// Still in the mempool.
    Unconfirmed,
    /// Mined, but shallower than the currency's threshold.
    Pending,
    /// Spendable.
    Confirmed,
}

impl CoinBucket {
    /// Bucket for a coin with `confirmations` under a threshold of `threshold`.
    pub fn classify(confirmations: u32, threshold: u32) -> Self {
        if confirmations == 0 {
            Self::Unconfirmed
        } else if confirmations < threshold {
            Self::Pending
        } else {
            Self::Confirmed
        }
    }
}

/// Totals per bucket plus the confirmed coins that back them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BalanceSnapshot {
    pub pending: Money,
    pub confirmed: Money,
    pub unconfirmed: Money,
    /// Coins in the confirmed bucket, in explorer order.
    pub coins: Vec<UnspentCoin>,
    total: Money,
}

impl BalanceSnapshot {
    /// Classify `coins` and total each bucket.
    pub fn from_coins(coins: Vec<UnspentCoin>, threshold: u32) -> Result<Self, WalletError> {
        let mut pending = Vec::new();
        let mut unconfirmed = Vec::new();
        let mut confirmed = Vec::new();
        for coin in coins {
            match CoinBucket::classify(coin.confirmations, threshold) {
                CoinBucket::Unconfirmed => unconfirmed.push(coin.amount),
                CoinBucket::Pending => pending.push(coin.amount),
                CoinBucket::Confirmed => confirmed.push(coin),
            }
        }

        let pending = Money::sum(pending)?;
        let confirmed_total = Money::sum(confirmed.iter().map(|c| c.amount))?;
        let total = pending
            .checked_add(confirmed_total)
            .ok_or(MoneyError::Overflow)?;
        Ok(Self {
            pending,
            confirmed: confirmed_total,
            unconfirmed: Money::sum(unconfirmed)?,
            coins: confirmed,
            total,
        })
    }

    /// Pending plus confirmed. Unconfirmed coins are not counted.
    pub fn total(&self) -> Money {
        self.total
    }
}

/// The wallet's last-known balance.
#[derive(Debug, Default)]
pub struct BalanceTracker {
    snapshot: RwLock<BalanceSnapshot>,
    refresh_lock: Mutex<()>,
}

impl BalanceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current snapshot.
    pub fn snapshot(&self) -> BalanceSnapshot {
        self.snapshot.read().clone()
    }

    pub fn confirmed_coins(&self) -> Vec<UnspentCoin> {
        self.snapshot.read().coins.clone()
    }

    /// Query unspent outputs for `address` and replace the snapshot.
    ///
    /// Concurrent refreshes of the same tracker run one after another. On
    /// failure the previous snapshot is kept.
    pub async fn refresh(
        &self,
        client: &dyn NetworkClient,
        address: &Address,
        currency: &dyn Currency,
    ) -> Result<BalanceSnapshot, WalletError> {
        let _guard = self.refresh_lock.lock().await;

        let coins = match client.unspent_coins(address).await {
            Ok(coins) => coins,
            Err(e) => {
                warn!(%address, error = %e, "unspent output query failed");
                return Err(WalletError::Query(e));
            }
        };
        let fetched = coins.len();
        let snapshot = BalanceSnapshot::from_coins(coins, currency.transaction_confirms())?;
        *self.snapshot.write() = snapshot.clone();

        info!(
            %address,
            fetched,
            confirmed = %snapshot.confirmed,
            pending = %snapshot.pending,
            unconfirmed = %snapshot.unconfirmed,
            "balance refreshed"
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::hashes::Hash;
    use bitcoin::{OutPoint, ScriptBuf, Txid};

    fn coin(byte: u8, units: u64, confirmations: u32) -> UnspentCoin {
        UnspentCoin::new(
            OutPoint::new(Txid::from_byte_array([byte; 32]), 0),
            Money::from_units(units),
            confirmations,
            ScriptBuf::new(),
        )
    }

    #[test]
    fn classify_boundaries() {
        assert_eq!(CoinBucket::classify(0, 6), CoinBucket::Unconfirmed);
        assert_eq!(CoinBucket::classify(1, 6), CoinBucket::Pending);
        assert_eq!(CoinBucket::classify(5, 6), CoinBucket::Pending);
        assert_eq!(CoinBucket::classify(6, 6), CoinBucket::Confirmed);
        assert_eq!(CoinBucket::classify(u32::MAX, 6), CoinBucket::Confirmed);
    }

    #[test]
    fn threshold_of_one_has_no_pending() {
        assert_eq!(CoinBucket::classify(0, 1), CoinBucket::Unconfirmed);
        assert_eq!(CoinBucket::classify(1, 1), CoinBucket::Confirmed);
    }

    #[test]
    fn snapshot_totals() {
        let snapshot = BalanceSnapshot::from_coins(
            vec![coin(1, 100, 0), coin(2, 200, 3), coin(3, 400, 6), coin(4, 800, 10)],
            6,
        )
        .unwrap();
        assert_eq!(snapshot.unconfirmed, Money::from_units(100));
        assert_eq!(snapshot.pending, Money::from_units(200));
        assert_eq!(snapshot.confirmed, Money::from_units(1_200));
        assert_eq!(snapshot.total(), Money::from_units(1_400));
        assert_eq!(snapshot.coins.len(), 2);
        assert!(snapshot.coins.iter().all(|c| c.confirmations >= 6));
    }

    #[test]
    fn empty_snapshot() {
        let snapshot = BalanceSnapshot::from_coins(Vec::new(), 6).unwrap();
        assert_eq!(snapshot, BalanceSnapshot::default());
        assert_eq!(snapshot.total(), Money::ZERO);
    }

    #[test]
    fn overflowing_bucket_is_an_error() {
        let result = BalanceSnapshot::from_coins(vec![coin(1, u64::MAX, 6), coin(2, 1, 6)], 6);
        assert!(matches!(result, Err(WalletError::Money(_))));
    }

    #[test]
    fn overflowing_total_is_an_error() {
        let result = BalanceSnapshot::from_coins(vec![coin(1, u64::MAX, 2), coin(2, 1, 6)], 6);
        assert_eq!(result, Err(WalletError::Money(MoneyError::Overflow)));
    }

    #[test]
    fn new_tracker_is_empty() {
        let tracker = BalanceTracker::new();
        assert_eq!(tracker.snapshot(), BalanceSnapshot::default());
        assert!(tracker.confirmed_coins().is_empty());
    }
}
