//! Context-free policy checks run on a finished transaction before it is
//! handed to the network.

use bitcoin::Transaction;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::constants::MAX_TRANSACTION_SIZE;
use crate::money::Money;

/// Outcome of [`check_transaction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionCheck {
    Success,
    NoInput,
    NoOutput,
    /// Serialized size exceeds [`MAX_TRANSACTION_SIZE`].
    TooLarge,
    /// A single output is worth more than the currency's money supply.
    OutputTooLarge,
    /// The outputs together are worth more than the money supply.
    OutputTotalTooLarge,
    DuplicateInputs,
    NullInputPrevOut,
}

impl TransactionCheck {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for TransactionCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Structural checks against a currency's `max_money`.
pub fn check_transaction(tx: &Transaction, max_money: Money) -> TransactionCheck {
    if tx.input.is_empty() {
        return TransactionCheck::NoInput;
    }
    if tx.output.is_empty() {
        return TransactionCheck::NoOutput;
    }
    if tx.total_size() > MAX_TRANSACTION_SIZE {
        return TransactionCheck::TooLarge;
    }

    let mut total = Money::ZERO;
    for output in &tx.output {
        let value = Money::from(output.value);
        if value > max_money {
            return TransactionCheck::OutputTooLarge;
        }
        total = match total.checked_add(value) {
            Some(t) if t <= max_money => t,
            _ => return TransactionCheck::OutputTotalTooLarge,
        };
    }

    let mut seen = HashSet::with_capacity(tx.input.len());
    for input in &tx.input {
        if !seen.insert(input.previous_output) {
            return TransactionCheck::DuplicateInputs;
        }
    }

    if tx.input.iter().any(|input| input.previous_output.is_null()) {
        return TransactionCheck::NullInputPrevOut;
    }

    TransactionCheck::Success
}
