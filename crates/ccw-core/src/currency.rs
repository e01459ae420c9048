//! Currency capabilities: confirmation depth, amount limits, fee policy,
//! transaction policy and display rules.
//!
//! Each supported currency is one [`Currency`] implementation, chosen when a
//! wallet is constructed. Callers never branch on which currency they hold.

use bitcoin::Transaction;
use std::fmt;

use crate::check::{TransactionCheck, check_transaction};
use crate::constants::{
    COIN, MONEY_DECIMALS, P2PKH_INPUT_SIZE, P2PKH_OUTPUT_SIZE, TRANSACTION_OVERHEAD,
};
use crate::locale::Locale;
use crate::money::{AmountRules, DecimalAmount, Money};
use crate::types::UnspentCoin;

/// Inputs to a fee computation: the candidate coins and the outputs the
/// transaction will carry.
#[derive(Debug, Clone, Copy)]
pub struct FeeContext<'a> {
    pub inputs: &'a [UnspentCoin],
    pub output_count: usize,
}

impl FeeContext<'_> {
    /// Estimated signed size of a P2PKH transaction, in bytes.
    pub fn estimated_size(&self) -> usize {
        TRANSACTION_OVERHEAD
            .saturating_add(self.inputs.len().saturating_mul(P2PKH_INPUT_SIZE))
            .saturating_add(self.output_count.saturating_mul(P2PKH_OUTPUT_SIZE))
    }
}

/// Size-proportional fee with a floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeRate {
    pub per_kilobyte: Money,
    pub minimum: Money,
}

impl FeeRate {
    /// Fee for `size` bytes, rounded up to the next base unit.
    pub fn fee_for_size(&self, size: usize) -> Money {
        let size = u128::try_from(size).unwrap_or(u128::MAX);
        let proportional = (u128::from(self.per_kilobyte.units()) * size).div_ceil(1_000);
        let proportional = Money::from_units(u64::try_from(proportional).unwrap_or(u64::MAX));
        proportional.max(self.minimum)
    }
}

/// Currency-specific behaviour consumed by the wallet.
pub trait Currency: Send + Sync + fmt::Debug {
    /// Human-readable name, e.g. `"Bitcoin"`.
    fn name(&self) -> &'static str;

    /// Ticker symbol appended to formatted amounts.
    fn symbol(&self) -> &'static str;

    /// Confirmations after which a coin is spendable.
    fn transaction_confirms(&self) -> u32;

    /// SLIP-44 registered coin type, used on the production network.
    fn bip44_coin_type(&self) -> u32;

    /// Limits on user-supplied amounts.
    fn amount_rules(&self) -> AmountRules;

    /// Total money supply; no output may exceed it.
    fn max_money(&self) -> Money;

    fn fee_rate(&self) -> FeeRate;

    /// Fee for a transaction spending `ctx.inputs` into `ctx.output_count` outputs.
    fn calculate_fee(&self, ctx: &FeeContext<'_>) -> Money {
        self.fee_rate().fee_for_size(ctx.estimated_size())
    }

    /// Policy check run before broadcast.
    fn verify_transaction(&self, tx: &Transaction) -> TransactionCheck {
        check_transaction(tx, self.max_money())
    }

    /// Fractional digits shown to users.
    fn display_decimals(&self) -> u32 {
        MONEY_DECIMALS
    }

    fn format_money(&self, amount: Money, locale: &Locale) -> String {
        format!(
            "{} {}",
            locale.format_fixed(amount.units(), MONEY_DECIMALS, self.display_decimals()),
            self.symbol()
        )
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Bitcoin;

impl Currency for Bitcoin {
    fn name(&self) -> &'static str {
        "Bitcoin"
    }

    fn symbol(&self) -> &'static str {
        "BTC"
    }

    fn transaction_confirms(&self) -> u32 {
        6
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
            per_kilobyte: Money::from_units(20_000),
            minimum: Money::from_units(1_000),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Litecoin;

impl Currency for Litecoin {
    fn name(&self) -> &'static str {
        "Litecoin"
    }

    fn symbol(&self) -> &'static str {
        "LTC"
    }

    fn transaction_confirms(&self) -> u32 {
        6
    }

    fn bip44_coin_type(&self) -> u32 {
        2
    }

    fn amount_rules(&self) -> AmountRules {
        AmountRules {
            min_amount: DecimalAmount::new(1, 3),
            max_amount: DecimalAmount::new(84_000_000, 0),
            base_amount_unit: COIN,
        }
    }

    fn max_money(&self) -> Money {
        Money::from_units(84_000_000 * COIN)
    }

    fn fee_rate(&self) -> FeeRate {
        FeeRate {
            per_kilobyte: Money::from_units(100_000),
            minimum: Money::from_units(100_000),
        }
    }
}

/// Monacoin. Amounts are accepted to 6 decimal places.
#[derive(Debug, Clone, Copy, Default)]
pub struct Monacoin;

impl Currency for Monacoin {
    fn name(&self) -> &'static str {
        "Monacoin"
    }

    fn symbol(&self) -> &'static str {
        "MONA"
    }

    fn transaction_confirms(&self) -> u32 {
        6
    }

    fn bip44_coin_type(&self) -> u32 {
        22
    }

    fn amount_rules(&self) -> AmountRules {
        AmountRules {
            min_amount: DecimalAmount::new(1, 3),
            max_amount: DecimalAmount::new(105_120_000, 0),
            base_amount_unit: 1_000_000,
        }
    }

    fn max_money(&self) -> Money {
        Money::from_units(105_120_000 * COIN)
    }

    fn fee_rate(&self) -> FeeRate {
        FeeRate {
            per_kilobyte: Money::from_units(100_000),
            minimum: Money::from_units(100_000),
        }
    }

    fn display_decimals(&self) -> u32 {
        6
    }
}
