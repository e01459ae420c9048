//! Monetary values: integral base-unit [`Money`] and exact user-facing
//! [`DecimalAmount`].
//!
//! Nothing in this module touches floating point. `Money` counts base units
//! (10^-8 of a coin). `DecimalAmount` keeps the digits a user typed as a
//! mantissa and a scale, so `0.000000005` stays exactly that until
//! [`convert_decimal_to_money`] decides whether it is acceptable.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::ops::Neg;
use std::str::FromStr;

use crate::constants::{COIN, MAX_DECIMAL_SCALE, MONEY_DECIMALS};
use crate::error::MoneyError;

/// A non-negative amount in base units.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
)]
#[serde(transparent)]
pub struct Money(u64);

impl Money {
    /// Zero base units.
    pub const ZERO: Self = Self(0);

    /// Create from a raw base-unit count.
    pub const fn from_units(units: u64) -> Self {
        Self(units)
    }

    /// Create from whole coins. Returns `None` on overflow.
    pub const fn from_coins(coins: u64) -> Option<Self> {
        match coins.checked_mul(COIN) {
            Some(units) => Some(Self(units)),
            None => None,
        }
    }

    /// Raw base-unit count.
    pub const fn units(self) -> u64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    /// Total of a sequence of amounts. An empty sequence sums to zero.
    ///
    /// Overflow is reported as [`MoneyError::Overflow`]; it means the input
    /// data is corrupt, so callers must not clamp it away.
    pub fn sum<I>(amounts: I) -> Result<Self, MoneyError>
    where
        I: IntoIterator<Item = Money>,
    {
        amounts.into_iter().try_fold(Self::ZERO, |acc, amount| {
            acc.checked_add(amount).ok_or(MoneyError::Overflow)
        })
    }

    /// Exact decimal value in whole coins.
    pub fn to_decimal(self) -> DecimalAmount {
        DecimalAmount::new(u128::from(self.0), MONEY_DECIMALS)
    }

    /// Convert to the `bitcoin` crate's amount type.
    pub fn to_amount(self) -> bitcoin::Amount {
        bitcoin::Amount::from_sat(self.0)
    }
}

impl From<bitcoin::Amount> for Money {
    fn from(amount: bitcoin::Amount) -> Self {
        Self(amount.to_sat())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.to_decimal().fmt(f)
    }
}

/// An exact decimal number: `mantissa / 10^scale`, with a sign.
///
/// Equality and ordering are numeric, so `1.0 == 1.00`.
#[derive(Clone, Copy, Debug)]
pub struct DecimalAmount {
    negative: bool,
    mantissa: u128,
    scale: u32,
}

impl DecimalAmount {
    pub const ZERO: Self = Self::new(0, 0);

    /// Create a non-negative decimal `mantissa / 10^scale`.
    ///
    /// # Panics
    /// If `scale` exceeds [`MAX_DECIMAL_SCALE`].
    pub const fn new(mantissa: u128, scale: u32) -> Self {
        assert!(scale <= MAX_DECIMAL_SCALE, "decimal scale out of range");
        Self {
            negative: false,
            mantissa,
            scale,
        }
    }

    pub fn is_negative(&self) -> bool {
        self.negative && self.mantissa != 0
    }

    /// Number of digits after the decimal point, as written.
    pub fn scale(&self) -> u32 {
        self.scale
    }

    fn int_part(&self) -> u128 {
        self.mantissa / pow10(self.scale)
    }

    fn frac_part(&self) -> u128 {
        self.mantissa % pow10(self.scale)
    }

    /// Whether this amount is an exact multiple of `1 / units_per_coin`.
    pub fn is_multiple_of_unit(&self, units_per_coin: u64) -> bool {
        divides_fraction(self.frac_part(), self.scale, u128::from(units_per_coin))
    }

    /// Value expressed in `10^-decimals` units, if that is an integer.
    ///
    /// Returns `None` for negative values, values finer than the unit, and
    /// values that overflow `u128`.
    pub fn to_units(&self, decimals: u32) -> Option<u128> {
        if self.is_negative() || decimals > MAX_DECIMAL_SCALE {
            return None;
        }
        if !divides_fraction(self.frac_part(), self.scale, pow10(decimals)) {
            return None;
        }
        let frac = self.frac_part();
        let frac_units = if self.scale >= decimals {
            frac / pow10(self.scale - decimals)
        } else {
            frac * pow10(decimals - self.scale)
        };
        self.int_part()
            .checked_mul(pow10(decimals))?
            .checked_add(frac_units)
    }

    /// Exact conversion to [`Money`], if representable.
    pub fn to_money(&self) -> Option<Money> {
        self.to_units(MONEY_DECIMALS)
            .and_then(|units| u64::try_from(units).ok())
            .map(Money::from_units)
    }
}

const fn pow10(exp: u32) -> u128 {
    10u128.pow(exp)
}

fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// `frac / 10^scale` is a multiple of `1 / unit` iff `frac * unit` is
/// divisible by `10^scale`, i.e. iff `10^scale / gcd(10^scale, unit)`
/// divides `frac`. Avoids the overflowing product.
fn divides_fraction(frac: u128, scale: u32, unit: u128) -> bool {
    if unit == 0 {
        return false;
    }
    let modulus = pow10(scale);
    frac % (modulus / gcd(modulus, unit)) == 0
}

fn cmp_magnitude(a: &DecimalAmount, b: &DecimalAmount) -> Ordering {
    a.int_part().cmp(&b.int_part()).then_with(|| {
        let fa = a.frac_part() * pow10(MAX_DECIMAL_SCALE - a.scale);
        let fb = b.frac_part() * pow10(MAX_DECIMAL_SCALE - b.scale);
        fa.cmp(&fb)
    })
}

impl Ord for DecimalAmount {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.is_negative(), other.is_negative()) {
            (false, true) => Ordering::Greater,
            (true, false) => Ordering::Less,
            (false, false) => cmp_magnitude(self, other),
            (true, true) => cmp_magnitude(other, self),
        }
    }
}

impl PartialOrd for DecimalAmount {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for DecimalAmount {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for DecimalAmount {}

impl Neg for DecimalAmount {
    type Output = Self;

    fn neg(self) -> Self {
        Self {
            negative: !self.negative,
            ..self
        }
    }
}

impl From<Money> for DecimalAmount {
    fn from(money: Money) -> Self {
        money.to_decimal()
    }
}

impl fmt::Display for DecimalAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_negative() {
            f.write_str("-")?;
        }
        let int = self.int_part();
        if self.scale == 0 {
            write!(f, "{int}")
        } else {
            write!(
                f,
                "{int}.{:0width$}",
                self.frac_part(),
                width = self.scale as usize
            )
        }
    }
}

impl FromStr for DecimalAmount {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let (int_digits, frac_digits) = digits.split_once('.').unwrap_or((digits, ""));

        if int_digits.is_empty() && frac_digits.is_empty() {
            return Err(MoneyError::Parse(format!("no digits in {s:?}")));
        }
        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(int_digits) || !all_digits(frac_digits) {
            return Err(MoneyError::Parse(format!("not a decimal number: {s:?}")));
        }

        let scale = u32::try_from(frac_digits.len())
            .ok()
            .filter(|scale| *scale <= MAX_DECIMAL_SCALE)
            .ok_or_else(|| MoneyError::Parse(format!("too many decimal places in {s:?}")))?;

        let mut mantissa: u128 = 0;
        for b in int_digits.bytes().chain(frac_digits.bytes()) {
            mantissa = mantissa
                .checked_mul(10)
                .and_then(|m| m.checked_add(u128::from(b - b'0')))
                .ok_or_else(|| MoneyError::Parse(format!("too many digits in {s:?}")))?;
        }

        Ok(Self {
            negative,
            mantissa,
            scale,
        })
    }
}

impl Serialize for DecimalAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DecimalAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Per-currency limits on user-supplied amounts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AmountRules {
    /// Smallest amount a user may send.
    pub min_amount: DecimalAmount,
    /// Largest amount a user may send.
    pub max_amount: DecimalAmount,
    /// Units per coin; amounts must be multiples of `1 / base_amount_unit`.
    pub base_amount_unit: u64,
}

/// Convert a user-facing decimal amount to [`Money`].
///
/// With `enforce_checks`, the amount must be a multiple of the currency's
/// smallest unit and lie within `[min_amount, max_amount]`. Without it those
/// checks are skipped (fee and change values are already known to be valid),
/// but an amount that `Money` cannot hold exactly is still rejected.
pub fn convert_decimal_to_money(
    amount: DecimalAmount,
    rules: &AmountRules,
    enforce_checks: bool,
) -> Result<Money, MoneyError> {
    if enforce_checks {
        if !amount.is_multiple_of_unit(rules.base_amount_unit) {
            return Err(MoneyError::Precision { amount });
        }
        if amount < rules.min_amount {
            return Err(MoneyError::BelowMinimum {
                amount,
                min: rules.min_amount,
            });
        }
        if amount > rules.max_amount {
            return Err(MoneyError::AboveMaximum {
                amount,
                max: rules.max_amount,
            });
        }
    }

    amount.to_money().ok_or_else(|| {
        if amount.is_negative() {
            MoneyError::BelowMinimum {
                amount,
                min: DecimalAmount::ZERO,
            }
        } else if !amount.is_multiple_of_unit(COIN) {
            MoneyError::Precision { amount }
        } else {
            MoneyError::Overflow
        }
    })
}
