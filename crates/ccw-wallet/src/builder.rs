//! Transaction builder: spends every confirmed coin to one destination, with
//! change back to the wallet.
//!
//! 1. Convert the requested amount under the currency's rules
//! 2. Compute the fee for all held coins and two outputs
//! 3. Add the payment and, when non-zero, the change output
//! 4. Sign every input and run the currency's policy check

use bitcoin::absolute::LockTime;
use bitcoin::transaction::Version;
use bitcoin::{Sequence, Transaction, TxIn, TxOut, Txid, Witness};
use tracing::{debug, warn};

use ccw_core::address::Address;
use ccw_core::check::TransactionCheck;
use ccw_core::currency::{Currency, FeeContext};
use ccw_core::error::MoneyError;
use ccw_core::money::{DecimalAmount, Money, convert_decimal_to_money};
use ccw_core::types::UnspentCoin;

use crate::error::WalletError;
use crate::keys::{KeyPath, MasterKey};

/// Outputs assumed when estimating the fee: payment and change.
const FEE_OUTPUT_COUNT: usize = 2;

/// A signed transaction that passed the policy check.
#[derive(Debug, Clone)]
pub struct BuiltTransaction {
    pub tx: Transaction,
    /// Coins spent, in input order.
    pub inputs: Vec<UnspentCoin>,
    pub destination: Address,
    pub payment: Money,
    /// Zero when no change output was added.
    pub change: Money,
    pub fee: Money,
}

impl BuiltTransaction {
    pub fn txid(&self) -> Txid {
        self.tx.compute_txid()
    }

    /// Sum of the spent coins.
    pub fn input_total(&self) -> Result<Money, MoneyError> {
        Money::sum(self.inputs.iter().map(|c| c.amount))
    }
}

/// Builder for the wallet's outgoing transactions.
///
/// # Example
/// ```ignore
/// let built = TransactionBuilder::new(&Monacoin, own_address)
///     .add_coins(tracker.confirmed_coins())
///     .build(&destination, "1.5".parse()?, &master, &path)?;
/// ```
pub struct TransactionBuilder<'a> {
    currency: &'a dyn Currency,
    change_address: Address,
    coins: Vec<UnspentCoin>,
}

impl<'a> TransactionBuilder<'a> {
    /// Create a builder that returns change to `change_address`.
    pub fn new(currency: &'a dyn Currency, change_address: Address) -> Self {
        Self {
            currency,
            change_address,
            coins: Vec::new(),
        }
    }

    /// Add coins to spend. All of them become inputs.
    pub fn add_coins(&mut self, coins: impl IntoIterator<Item = UnspentCoin>) -> &mut Self {
        self.coins.extend(coins);
        self
    }

    /// Build and sign a payment of `amount` to `destination`, using the key
    /// at `key_path` for every input.
    ///
    /// Amount errors from [`convert_decimal_to_money`] are returned as-is.
    pub fn build(
        &self,
        destination: &Address,
        amount: DecimalAmount,
        signer: &MasterKey,
        key_path: &KeyPath,
    ) -> Result<BuiltTransaction, WalletError> {
        let payment = convert_decimal_to_money(amount, &self.currency.amount_rules(), true)?;

        let inputs = self.coins.clone();
        let fee = self.currency.calculate_fee(&FeeContext {
            inputs: &inputs,
            output_count: FEE_OUTPUT_COUNT,
        });
        let have = Money::sum(inputs.iter().map(|c| c.amount))?;
        let need = payment.checked_add(fee).ok_or(MoneyError::Overflow)?;
        let change = have
            .checked_sub(need)
            .ok_or(WalletError::InsufficientFunds {
                have: have.units(),
                need: need.units(),
            })?;
        debug!(
            inputs = inputs.len(),
            %payment,
            %fee,
            %change,
            "building transaction"
        );

        let mut output = vec![TxOut {
            value: payment.to_amount(),
            script_pubkey: destination.script_pubkey(),
        }];
        if !change.is_zero() {
            output.push(TxOut {
                value: change.to_amount(),
                script_pubkey: self.change_address.script_pubkey(),
            });
        }

        let mut tx = Transaction {
            version: Version::ONE,
            lock_time: LockTime::ZERO,
            input: inputs
                .iter()
                .map(|coin| TxIn {
                    previous_output: coin.outpoint,
                    script_sig: Default::default(),
                    sequence: Sequence::MAX,
                    witness: Witness::new(),
                })
                .collect(),
            output,
        };
        signer.sign_inputs(key_path, &mut tx)?;

        match self.currency.verify_transaction(&tx) {
            TransactionCheck::Success => {}
            check => {
                warn!(%check, "transaction rejected by policy check");
                return Err(match check {
                    TransactionCheck::OutputTooLarge => WalletError::OutputTooLarge,
                    TransactionCheck::OutputTotalTooLarge => WalletError::OutputTotalTooLarge,
                    other => WalletError::TransactionValidation(other),
                });
            }
        }

        Ok(BuiltTransaction {
            tx,
            inputs,
            destination: destination.clone(),
            payment,
            change,
            fee,
        })
    }
}
