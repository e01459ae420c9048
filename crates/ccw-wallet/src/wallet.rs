//! Per-user wallet: one receiving address on one network, its balance, and
//! the operations a chat command needs.

use std::sync::Arc;

use bitcoin::Transaction;
use parking_lot::RwLock;
use tracing::{info, warn};

use ccw_core::address::Address;
use ccw_core::client::NetworkClient;
use ccw_core::currency::Currency;
use ccw_core::locale::Locale;
use ccw_core::money::{DecimalAmount, Money, convert_decimal_to_money};
use ccw_core::network::NetworkParams;

use crate::balance::{BalanceSnapshot, BalanceTracker};
use crate::broadcast::{self, BroadcastOutcome};
use crate::builder::{BuiltTransaction, TransactionBuilder};
use crate::error::WalletError;
use crate::keys::{KeyPath, MasterKey, derive_address, receiving_key_path};

/// Result of [`Wallet::send`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendOutcome {
    pub broadcast: BroadcastOutcome,
    /// Set when the balance refresh after an accepted broadcast failed.
    pub refresh_error: Option<WalletError>,
}

/// A user's wallet on a single network.
///
/// Cheap to share behind an `Arc`; every method takes `&self`.
pub struct Wallet {
    network: NetworkParams,
    currency: Arc<dyn Currency>,
    client: Arc<dyn NetworkClient>,
    master: MasterKey,
    key_path: KeyPath,
    address: Address,
    tracker: BalanceTracker,
    locale: RwLock<Locale>,
}

impl Wallet {
    /// Open a wallet, deriving its receiving address from `master`.
    pub fn new(
        master: MasterKey,
        network: NetworkParams,
        currency: Arc<dyn Currency>,
        client: Arc<dyn NetworkClient>,
    ) -> Result<Self, WalletError> {
        let key_path = receiving_key_path(&network, currency.as_ref());
        let address = derive_address(&master.derive(&key_path)?, &network);
        info!(network = network.name, %address, "wallet opened");
        Ok(Self {
            network,
            currency,
            client,
            master,
            key_path,
            address,
            tracker: BalanceTracker::new(),
            locale: RwLock::new(Locale::default()),
        })
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn network(&self) -> &NetworkParams {
        &self.network
    }

    pub fn currency(&self) -> &dyn Currency {
        self.currency.as_ref()
    }

    pub fn key_path(&self) -> &KeyPath {
        &self.key_path
    }

    pub fn locale(&self) -> Locale {
        *self.locale.read()
    }

    pub fn set_locale(&self, locale: Locale) {
        *self.locale.write() = locale;
    }

    /// Last-known balance.
    pub fn balance(&self) -> BalanceSnapshot {
        self.tracker.snapshot()
    }

    /// Pending plus confirmed, formatted.
    pub fn total_balance(&self) -> String {
        self.format_amount(self.balance().total())
    }

    pub fn pending_balance(&self) -> String {
        self.format_amount(self.balance().pending)
    }

    pub fn confirmed_balance(&self) -> String {
        self.format_amount(self.balance().confirmed)
    }

    pub fn unconfirmed_balance(&self) -> String {
        self.format_amount(self.balance().unconfirmed)
    }

    /// Re-query the explorer and replace the held balance.
    pub async fn refresh_balance(&self) -> Result<BalanceSnapshot, WalletError> {
        self.tracker
            .refresh(self.client.as_ref(), &self.address, self.currency.as_ref())
            .await
    }

    /// Parse a user-supplied destination for this wallet's network.
    pub fn parse_address(&self, s: &str) -> Result<Address, WalletError> {
        Ok(Address::parse(s.trim(), &self.network)?)
    }

    /// Build a signed payment of `amount` to `destination` from all
    /// confirmed coins. Does not change wallet state.
    pub fn build_transaction(
        &self,
        destination: &Address,
        amount: DecimalAmount,
    ) -> Result<BuiltTransaction, WalletError> {
        let destination = self.parse_address(destination.as_str())?;
        TransactionBuilder::new(self.currency.as_ref(), self.address.clone())
            .add_coins(self.tracker.confirmed_coins())
            .build(&destination, amount, &self.master, &self.key_path)
    }

    pub async fn broadcast(&self, tx: &Transaction) -> Result<BroadcastOutcome, WalletError> {
        broadcast::broadcast(self.client.as_ref(), tx).await
    }

    /// Build, broadcast, and refresh the balance once the network accepts.
    ///
    /// A failed refresh after acceptance does not undo the send; it is
    /// returned in [`SendOutcome::refresh_error`] and the stale balance is
    /// kept until the next refresh.
    pub async fn send(
        &self,
        destination: &Address,
        amount: DecimalAmount,
    ) -> Result<SendOutcome, WalletError> {
        let built = self.build_transaction(destination, amount)?;
        let broadcast = self.broadcast(&built.tx).await?;
        let mut refresh_error = None;
        if broadcast.is_accepted() {
            if let Err(e) = self.refresh_balance().await {
                warn!(address = %self.address, error = %e, "post-send refresh failed");
                refresh_error = Some(e);
            }
        }
        Ok(SendOutcome {
            broadcast,
            refresh_error,
        })
    }

    /// Fee actually paid by `tx`: held input value minus output value.
    ///
    /// `None` if any input spends a coin this wallet does not hold, or if
    /// the outputs exceed the inputs.
    pub fn get_fee(&self, tx: &Transaction) -> Option<Money> {
        let held = self.tracker.confirmed_coins();
        let inputs = tx
            .input
            .iter()
            .map(|input| {
                held.iter()
                    .find(|coin| coin.outpoint == input.previous_output)
                    .map(|coin| coin.amount)
            })
            .collect::<Option<Vec<_>>>()?;
        let input_total = Money::sum(inputs).ok()?;
        let output_total =
            Money::sum(tx.output.iter().map(|o| Money::from_units(o.value.to_sat()))).ok()?;
        input_total.checked_sub(output_total)
    }

    /// `amount` in the wallet's locale, with the currency symbol.
    pub fn format_amount(&self, amount: Money) -> String {
        self.currency.format_money(amount, &self.locale())
    }

    /// Format a decimal amount. Range and precision rules are not applied,
    /// but the value must be representable as [`Money`].
    pub fn format_decimal(&self, amount: DecimalAmount) -> Result<String, WalletError> {
        let money = convert_decimal_to_money(amount, &self.currency.amount_rules(), false)?;
        Ok(self.format_amount(money))
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("network", &self.network.name)
            .field("currency", &self.currency.name())
            .field("address", &self.address.as_str())
            .field("key_path", &self.key_path.to_string())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bitcoin::hashes::Hash;
    use bitcoin::{OutPoint, ScriptBuf, Txid};
    use ccw_core::currency::Monacoin;
    use ccw_core::error::{AddressError, MoneyError, TransportError};
    use ccw_core::types::UnspentCoin;

    /// Serves a fixed coin list and rejects every broadcast.
    struct Fixed(Vec<UnspentCoin>);

    #[async_trait]
    impl NetworkClient for Fixed {
        async fn unspent_coins(
            &self,
            _address: &Address,
        ) -> Result<Vec<UnspentCoin>, TransportError> {
            Ok(self.0.clone())
        }

        async fn broadcast(&self, _tx: &Transaction) -> Result<bitcoin::Txid, TransportError> {
            Err(TransportError::Http {
                status: 400,
                body: "rejected".into(),
            })
        }
    }

    fn coin(byte: u8, units: u64, confirmations: u32) -> UnspentCoin {
        UnspentCoin::new(
            OutPoint::new(Txid::from_byte_array([byte; 32]), 0),
            Money::from_units(units),
            confirmations,
            ScriptBuf::new(),
        )
    }

    fn wallet(coins: Vec<UnspentCoin>) -> Wallet {
        let network = NetworkParams::monacoin_mainnet();
        let master = MasterKey::from_seed(&[3u8; 32], &network).unwrap();
        Wallet::new(master, network, Arc::new(Monacoin), Arc::new(Fixed(coins))).unwrap()
    }

    #[test]
    fn address_uses_monacoin_prefix() {
        let w = wallet(Vec::new());
        assert!(w.address().as_str().starts_with('M'));
        assert_eq!(w.key_path().to_string(), "m/44'/22'/0'/0/0");
    }

    #[tokio::test]
    async fn refresh_and_format() {
        let w = wallet(vec![
            coin(1, 150_000_000, 6),
            coin(2, 25_000_000, 2),
            coin(3, 1_000_000, 0),
        ]);
        assert_eq!(w.total_balance(), "0.000000 MONA");

        w.refresh_balance().await.unwrap();
        assert_eq!(w.confirmed_balance(), "1.500000 MONA");
        assert_eq!(w.pending_balance(), "0.250000 MONA");
        assert_eq!(w.unconfirmed_balance(), "0.010000 MONA");
        assert_eq!(w.total_balance(), "1.750000 MONA");

        w.set_locale(Locale::DE_DE);
        assert_eq!(w.total_balance(), "1,750000 MONA");
    }

    #[tokio::test]
    async fn get_fee_requires_held_inputs() {
        let w = wallet(vec![coin(1, 150_000_000, 6)]);
        w.refresh_balance().await.unwrap();
        let dest = w.parse_address(w.address().as_str()).unwrap();
        let built = w.build_transaction(&dest, "1".parse().unwrap()).unwrap();
        assert_eq!(w.get_fee(&built.tx), Some(built.fee));

        let mut foreign = built.tx.clone();
        foreign.input[0].previous_output = OutPoint::new(Txid::from_byte_array([9; 32]), 0);
        assert_eq!(w.get_fee(&foreign), None);

        let mut overspent = built.tx.clone();
        overspent.output[0].value = bitcoin::Amount::from_sat(200_000_000);
        assert_eq!(w.get_fee(&overspent), None);
    }

    #[tokio::test]
    async fn rejected_send_keeps_balance() {
        let w = wallet(vec![coin(1, 150_000_000, 6)]);
        w.refresh_balance().await.unwrap();
        let dest = w.address().clone();
        let outcome = w.send(&dest, "1".parse().unwrap()).await.unwrap();
        assert_eq!(outcome.broadcast.error_message(), "rejected");
        assert_eq!(outcome.refresh_error, None);
        assert_eq!(w.balance().confirmed, Money::from_units(150_000_000));
    }

    #[test]
    fn foreign_destination_is_rejected() {
        let w = wallet(Vec::new());
        let err = w.parse_address("1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH").unwrap_err();
        assert!(matches!(
            err,
            WalletError::InvalidAddress(AddressError::WrongNetwork { .. })
        ));
    }

    #[test]
    fn format_decimal_skips_range_checks() {
        let w = wallet(Vec::new());
        assert_eq!(
            w.format_decimal("0.0000001".parse().unwrap()).unwrap(),
            "0.000000 MONA"
        );
        assert!(matches!(
            w.format_decimal("0.000000001".parse().unwrap()),
            Err(WalletError::Money(MoneyError::Precision { .. }))
        ));
    }
}
