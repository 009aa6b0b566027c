//! Money type for representing monetary values.
//!
//! Uses cents-based integer representation to avoid floating-point
//! precision issues that plague monetary calculations. Catalog JSON carries
//! prices as plain major-unit numbers; see [`major_units`].

use crate::CommerceError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported currencies.
///
/// Prices are quoted in the base currency ([`Currency::BASE`]); other
/// currencies are display currencies reached through an exchange rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Currency {
    #[default]
    USD,
    NGN,
}

impl Currency {
    /// Currency catalog prices are quoted in.
    pub const BASE: Currency = Currency::USD;

    /// Get the currency code (e.g., "USD").
    pub fn code(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::NGN => "NGN",
        }
    }

    /// Get the currency symbol (e.g., "$").
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::USD => "$",
            Currency::NGN => "\u{20a6}",
        }
    }

    /// Locale used to format amounts in this currency.
    pub fn locale(&self) -> &'static str {
        match self {
            Currency::USD => "en-US",
            Currency::NGN => "en-NG",
        }
    }

    /// Digit-group separator for this currency's locale.
    pub fn group_separator(&self) -> char {
        match self {
            Currency::USD | Currency::NGN => ',',
        }
    }

    /// Get the number of decimal places for this currency.
    pub fn decimal_places(&self) -> u32 {
        2
    }

    /// Whether this is the base currency.
    pub fn is_base(&self) -> bool {
        *self == Self::BASE
    }

    /// Parse a currency code string.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_uppercase().as_str() {
            "USD" => Some(Currency::USD),
            "NGN" => Some(Currency::NGN),
            _ => None,
        }
    }
}

impl std::str::FromStr for Currency {
    type Err = CommerceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s).ok_or_else(|| CommerceError::UnsupportedCurrency(s.to_string()))
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A monetary value with currency.
///
/// Amounts are stored in the smallest unit of the currency (e.g., cents for USD).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Money {
    /// Amount in smallest currency unit (e.g., cents).
    pub amount_cents: i64,
    /// The currency.
    pub currency: Currency,
}

impl Money {
    /// Create a new Money value from cents.
    pub fn new(amount_cents: i64, currency: Currency) -> Self {
        Self {
            amount_cents,
            currency,
        }
    }

    /// Create a Money value from a major-unit amount.
    ///
    /// ```
    /// use turbo_commerce::money::{Money, Currency};
    /// let price = Money::from_major(49.99, Currency::USD);
    /// assert_eq!(price.amount_cents, 4999);
    /// ```
    pub fn from_major(amount: f64, currency: Currency) -> Self {
        let multiplier = 10_i64.pow(currency.decimal_places());
        let amount_cents = (amount * multiplier as f64).round() as i64;
        Self::new(amount_cents, currency)
    }

    /// Create a zero amount in the given currency.
    pub fn zero(currency: Currency) -> Self {
        Self::new(0, currency)
    }

    /// Convert to a major-unit value.
    pub fn to_major(&self) -> f64 {
        let divisor = 10_i64.pow(self.currency.decimal_places());
        self.amount_cents as f64 / divisor as f64
    }

    /// Multiply by a quantity, saturating at the `i64` bounds.
    pub fn times(&self, quantity: u32) -> Money {
        Money::new(
            self.amount_cents.saturating_mul(i64::from(quantity)),
            self.currency,
        )
    }

    /// Convert into `target` at `rate` units of `target` per unit of `self`.
    pub fn convert(&self, rate: f64, target: Currency) -> Money {
        Money::from_major(self.to_major() * rate, target)
    }

    /// Format with no fraction digits and locale digit grouping
    /// (e.g., "$1,235", "₦150,000").
    ///
    /// Rounds half away from zero; negative amounts put the sign before the
    /// symbol.
    pub fn display_whole(&self) -> String {
        let whole = self.to_major().round();
        let sign = if whole < 0.0 { "-" } else { "" };
        let digits = format!("{:.0}", whole.abs());
        format!(
            "{}{}{}",
            sign,
            self.currency.symbol(),
            group_digits(&digits, self.currency.group_separator())
        )
    }
}

/// Insert `separator` every three digits from the right.
fn group_digits(digits: &str, separator: char) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(separator);
        }
        out.push(ch);
    }
    out
}

/// Serde adapter for prices written as plain numbers in the base currency.
///
/// Whole amounts are written as integers (`10`), others as floats (`49.99`).
pub mod major_units {
    use super::{Currency, Money};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(money: &Money, serializer: S) -> Result<S::Ok, S::Error> {
        let divisor = 10_i64.pow(money.currency.decimal_places());
        if money.amount_cents % divisor == 0 {
            (money.amount_cents / divisor).serialize(serializer)
        } else {
            money.to_major().serialize(serializer)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Money, D::Error> {
        let amount = f64::deserialize(deserializer)?;
        if !amount.is_finite() {
            return Err(serde::de::Error::custom("price must be a finite number"));
        }
        Ok(Money::from_major(amount, Currency::BASE))
    }

    /// Same as the parent module for `Option<Money>`.
    pub mod option {
        use super::Money;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            money: &Option<Money>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match money {
                Some(m) => super::serialize(m, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Money>, D::Error> {
            #[derive(Deserialize)]
            struct Wrapper(#[serde(with = "super")] Money);

            Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|Wrapper(m)| m))
        }
    }
}
