//! Payment amounts held as integer cents, plus the lenient parsing and
//! display rules used by the payment inputs.

use std::fmt;
use std::iter::Sum;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

const GROUPING_SEPARATOR: char = ',';
const CURRENCY_SYMBOL: &str = "$";
const MASK_MARKER: char = 'x';
const MASK_VISIBLE: usize = 4;

/// A non-negative amount of money in cents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(i64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    /// Negative inputs clamp to zero.
    pub fn from_cents(cents: i64) -> Self {
        Self(cents.max(0))
    }

    pub fn cents(self) -> i64 {
        self.0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn saturating_add(self, other: Amount) -> Amount {
        Amount(self.0.saturating_add(other.0))
    }

    /// Parses user input the way the portal's numeric inputs do: anything
    /// other than digits and the first `.` is ignored, and fractions round
    /// half-up to cents. Returns `None` when no digit is present or the
    /// value overflows.
    pub fn parse(input: &str) -> Option<Amount> {
        let mut whole = String::new();
        let mut fraction = String::new();
        let mut seen_point = false;
        for ch in input.chars() {
            match ch {
                '0'..='9' if seen_point => fraction.push(ch),
                '0'..='9' => whole.push(ch),
                '.' if !seen_point => seen_point = true,
                _ => {}
            }
        }
        if whole.is_empty() && fraction.is_empty() {
            return None;
        }

        let whole_value: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().ok()?
        };
        let digits: Vec<i64> = fraction
            .chars()
            .filter_map(|ch| ch.to_digit(10).map(i64::from))
            .collect();
        let mut cents = digits.first().copied().unwrap_or(0) * 10 + digits.get(1).copied().unwrap_or(0);
        if digits.get(2).copied().unwrap_or(0) >= 5 {
            cents += 1;
        }

        whole_value
            .checked_mul(100)
            .and_then(|value| value.checked_add(cents))
            .map(Amount)
    }

    /// Like [`Amount::parse`] but treats unparseable input as zero.
    pub fn parse_or_zero(input: &str) -> Amount {
        Self::parse(input).unwrap_or(Amount::ZERO)
    }

    /// Renders `0,0.00`, or `$ 0,0.00` when `show_sign` is set.
    pub fn format(self, show_sign: bool) -> String {
        let whole = (self.0 / 100).to_string();
        let body = format!("{}.{:02}", group_digits(&whole), self.0 % 100);
        if show_sign {
            format!("{} {}", CURRENCY_SYMBOL, body)
        } else {
            body
        }
    }

    fn as_decimal(self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format(false))
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, Amount::saturating_add)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_decimal())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Number(f64),
    Text(String),
    Missing(()),
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawAmount::deserialize(deserializer)? {
            RawAmount::Number(value) if value.is_finite() => {
                Amount::from_cents((value * 100.0).round() as i64)
            }
            RawAmount::Number(_) | RawAmount::Missing(()) => Amount::ZERO,
            RawAmount::Text(text) => Amount::parse_or_zero(&text),
        })
    }
}

fn group_digits(digits: &str) -> String {
    let mut grouped = String::new();
    for (count, ch) in digits.chars().rev().enumerate() {
        if count != 0 && count % 3 == 0 {
            grouped.insert(0, GROUPING_SEPARATOR);
        }
        grouped.insert(0, ch);
    }
    grouped
}

/// Masks an account or routing number down to a marker plus its last four
/// characters. Empty input stays empty.
pub fn mask_number(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }
    let chars: Vec<char> = value.chars().collect();
    let start = chars.len().saturating_sub(MASK_VISIBLE);
    let mut masked = String::with_capacity(MASK_VISIBLE + 1);
    masked.push(MASK_MARKER);
    masked.extend(&chars[start..]);
    masked
}

/// Keeps only the characters a routing-number input accepts.
pub fn digits_only(input: &str) -> String {
    input.chars().filter(|ch| ch.is_ascii_digit()).collect()
}

/// Keeps only the characters an account-number input accepts.
pub fn digits_or_uppercase(input: &str) -> String {
    input
        .chars()
        .filter(|ch| ch.is_ascii_digit() || ch.is_ascii_uppercase())
        .collect()
}

/// Keeps only the characters a currency input accepts.
pub fn currency_input(input: &str) -> String {
    input
        .chars()
        .filter(|ch| ch.is_ascii_digit() || *ch == '.')
        .collect()
}
