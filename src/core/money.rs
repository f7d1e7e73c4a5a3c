//! Money helpers - rounding, lenient numeric coercion, and display formatting.
//!
//! Every monetary value in the crate is a [`Decimal`]. Binary floating point is
//! only ever seen at the JSON boundary, where it is converted through its
//! shortest decimal representation before any arithmetic happens.

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use serde::{Deserialize, Deserializer, de};
use std::{fmt, str::FromStr};

/// Rounds a value to 2 decimal places, half-up (midpoint away from zero).
#[must_use]
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Applies a percentage to an amount without rounding.
///
/// Only for percentages in 0..=100; use [`checked_percent_of`] for
/// arbitrary input.
#[must_use]
pub fn percent_of(amount: Decimal, percent: Decimal) -> Decimal {
    amount * (percent / Decimal::ONE_HUNDRED)
}

/// [`percent_of`] returning `None` when the result does not fit a `Decimal`.
#[must_use]
pub fn checked_percent_of(amount: Decimal, percent: Decimal) -> Option<Decimal> {
    amount.checked_mul(percent.checked_div(Decimal::ONE_HUNDRED)?)
}

/// Rounds to the nearest integer, half-up, and narrows it to `T`.
///
/// `None` when the value does not fit.
#[must_use]
pub fn to_integer<T: TryFrom<i64>>(value: Decimal) -> Option<T> {
    value
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .and_then(|v| T::try_from(v).ok())
}

/// Coerces free-form user input into a decimal.
///
/// Blank or non-numeric input yields zero; drafts are frequently incomplete
/// and must still render.
#[must_use]
pub fn coerce_str(raw: &str) -> Decimal {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Decimal::ZERO;
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .unwrap_or(Decimal::ZERO)
}

/// Formats an amount the way French quotes display it, e.g. `1 234,56 €`.
#[must_use]
pub fn format_euro(amount: Decimal) -> String {
    let rounded = round2(amount);
    let plain = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, digit) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(*digit);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}{grouped},{frac_part} €")
}

/// Serde adapter accepting numbers, numeric strings, `null`, or garbage.
///
/// Use with `#[serde(default, deserialize_with = "money::lenient::deserialize")]`.
pub mod lenient {
    use super::{Decimal, Deserializer, FromStr, coerce_str, de, fmt};

    struct LenientDecimal;

    impl<'de> de::Visitor<'de> for LenientDecimal {
        type Value = Decimal;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a number, a numeric string, or null")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Decimal, E> {
            Ok(Decimal::from(v))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Decimal, E> {
            Ok(Decimal::from(v))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Decimal, E> {
            // `Display` for f64 prints the shortest round-tripping digits, so
            // 0.1 becomes exactly 0.1 rather than its binary expansion.
            Ok(Decimal::from_str(&v.to_string()).unwrap_or(Decimal::ZERO))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Decimal, E> {
            Ok(coerce_str(v))
        }

        fn visit_bool<E: de::Error>(self, _v: bool) -> Result<Decimal, E> {
            Ok(Decimal::ZERO)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Decimal, E> {
            Ok(Decimal::ZERO)
        }

        fn visit_none<E: de::Error>(self) -> Result<Decimal, E> {
            Ok(Decimal::ZERO)
        }

        fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Decimal, D::Error> {
            deserializer.deserialize_any(self)
        }
    }

    /// Deserializes a decimal, coercing anything unusable to zero.
    ///
    /// # Errors
    /// Only fails if the underlying deserializer itself fails.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
        deserializer.deserialize_any(LenientDecimal)
    }
}

/// Serde adapters for integers (positions, ids, versions) that may arrive as
/// strings.
///
/// Built on [`lenient`]: unusable input is 0, fractions round half-up, and
/// values out of range for the target type are 0 as well.
pub mod lenient_int {
    use super::{Decimal, Deserialize, Deserializer, lenient, to_integer};

    struct Lenient(Decimal);

    impl<'de> Deserialize<'de> for Lenient {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            lenient::deserialize(deserializer).map(Lenient)
        }
    }

    /// Deserializes an integer, coercing anything unusable to zero.
    ///
    /// # Errors
    /// Only fails if the underlying deserializer itself fails.
    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: TryFrom<i64> + Default,
    {
        let value = lenient::deserialize(deserializer)?;
        Ok(to_integer(value).unwrap_or_default())
    }

    /// Deserializes an optional database id. `null`, garbage and non-positive
    /// values are `None`.
    ///
    /// # Errors
    /// Only fails if the underlying deserializer itself fails.
    pub fn option<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
        let value = Option::<Lenient>::deserialize(deserializer)?;
        Ok(value
            .and_then(|Lenient(raw)| to_integer::<i64>(raw))
            .filter(|id| *id > 0))
    }
}
