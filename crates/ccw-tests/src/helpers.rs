//! Shared test helpers: an in-memory explorer and wallet fixtures.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bitcoin::hashes::Hash;
use bitcoin::{OutPoint, ScriptBuf, Transaction, Txid};
use parking_lot::Mutex;

use ccw_core::address::Address;
use ccw_core::client::NetworkClient;
use ccw_core::constants::COIN;
use ccw_core::currency::{Bitcoin, Currency, FeeRate};
use ccw_core::error::TransportError;
use ccw_core::money::{AmountRules, DecimalAmount, Money};
use ccw_core::network::NetworkParams;
use ccw_core::types::UnspentCoin;
use ccw_wallet::{MasterKey, Wallet};

/// In-memory explorer.
///
/// Serves whatever coins were last set, accepts broadcasts unless told
/// otherwise, and counts calls.
#[derive(Default)]
pub struct MockClient {
    coins: Mutex<Vec<UnspentCoin>>,
    query_failure: Mutex<Option<TransportError>>,
    broadcast_failure: Mutex<Option<TransportError>>,
    broadcasts: Mutex<Vec<Transaction>>,
    queries: AtomicUsize,
}

impl MockClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_coins(coins: Vec<UnspentCoin>) -> Arc<Self> {
        let client = Self::new();
        client.set_coins(coins);
        client
    }

    pub fn set_coins(&self, coins: Vec<UnspentCoin>) {
        *self.coins.lock() = coins;
    }

    /// Make every following query fail with `error`, or succeed again with `None`.
    pub fn fail_queries(&self, error: Option<TransportError>) {
        *self.query_failure.lock() = error;
    }

    /// Make every following broadcast fail with `error`, or succeed again with `None`.
    pub fn fail_broadcasts(&self, error: Option<TransportError>) {
        *self.broadcast_failure.lock() = error;
    }

    /// Transactions accepted so far.
    pub fn broadcasts(&self) -> Vec<Transaction> {
        self.broadcasts.lock().clone()
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NetworkClient for MockClient {
    async fn unspent_coins(&self, _address: &Address) -> Result<Vec<UnspentCoin>, TransportError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        if let Some(e) = self.query_failure.lock().clone() {
            return Err(e);
        }
        Ok(self.coins.lock().clone())
    }

    async fn broadcast(&self, tx: &Transaction) -> Result<Txid, TransportError> {
        if let Some(e) = self.broadcast_failure.lock().clone() {
            return Err(e);
        }
        self.broadcasts.lock().push(tx.clone());
        Ok(tx.compute_txid())
    }
}

/// A currency with a flat fee and Bitcoin-like limits.
#[derive(Debug, Clone, Copy)]
pub struct FlatFee {
    pub fee: u64,
    pub confirms: u32,
}

impl FlatFee {
    /// 0.0001 per transaction, six confirmations.
    pub const STANDARD: Self = Self {
        fee: 10_000,
        confirms: 6,
    };
}

impl Currency for FlatFee {
    fn name(&self) -> &'static str {
        "Flat"
    }

    fn symbol(&self) -> &'static str {
        "FLT"
    }

    fn transaction_confirms(&self) -> u32 {
        self.confirms
    }

    fn bip44_coin_type(&self) -> u32 {
        0
    }

    fn amount_rules(&self) -> AmountRules {
        AmountRules {
            min_amount: DecimalAmount::new(1, 4),
            max_amount: DecimalAmount::new(21_000_000, 0),
            base_amount_unit: COIN,
        }
    }

    fn max_money(&self) -> Money {
        Money::from_units(21_000_000 * COIN)
    }

    fn fee_rate(&self) -> FeeRate {
        FeeRate {
            per_kilobyte: Money::ZERO,
            minimum: Money::from_units(self.fee),
        }
    }
}

/// A coin with a distinct outpoint per `tag`.
pub fn coin(tag: u8, units: u64, confirmations: u32) -> UnspentCoin {
    UnspentCoin::new(
        OutPoint::new(Txid::from_byte_array([tag; 32]), u32::from(tag)),
        Money::from_units(units),
        confirmations,
        ScriptBuf::new(),
    )
}

/// Deterministic master key for `tag`.
pub fn master_key(tag: u8, network: &NetworkParams) -> MasterKey {
    MasterKey::from_seed(&[tag; 32], network).unwrap()
}

/// Testnet wallet on a [`FlatFee`] currency backed by `client`.
pub fn flat_wallet(client: Arc<MockClient>) -> Wallet {
    let network = NetworkParams::bitcoin_testnet();
    Wallet::new(
        master_key(1, &network),
        network,
        Arc::new(FlatFee::STANDARD),
        client,
    )
    .unwrap()
}

/// Testnet wallet on [`Bitcoin`], whose fee depends on transaction size.
pub fn bitcoin_wallet(client: Arc<MockClient>) -> Wallet {
    let network = NetworkParams::bitcoin_testnet();
    Wallet::new(master_key(1, &network), network, Arc::new(Bitcoin), client).unwrap()
}

/// A valid testnet destination that is not the wallet's own address.
pub fn testnet_destination() -> Address {
    Address::parse(
        "mrCDrCybB6J1vRfbwM5hemdJz73FwDBC8r",
        &NetworkParams::bitcoin_testnet(),
    )
    .unwrap()
}

pub fn dec(s: &str) -> DecimalAmount {
    s.parse().unwrap()
}
