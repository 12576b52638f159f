//! Currency amounts held as integer minor units.
//!
//! A [`Money`] never stores fractional minor units: every constructor and arithmetic
//! operation rounds to the nearest unit (half away from zero) before producing a new value.

use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::currency::Currency;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MoneyError {
    #[error("cannot {operation} {left} and {right} without an exchange rate")]
    CurrencyMismatch {
        operation: &'static str,
        left: String,
        right: String,
    },
    #[error("cannot divide by zero")]
    DivisionByZero,
    #[error("invalid amount: {value}")]
    InvalidAmount { value: String },
    #[error("ratios cannot be empty")]
    EmptyRatios,
    #[error("ratio at index {index} must be finite and non-negative")]
    InvalidRatio { index: usize },
    #[error("total ratio cannot be zero")]
    ZeroTotalRatio,
    #[error("amount overflows the minor unit range")]
    Overflow,
    #[error("exchange rate must be finite, got {rate}")]
    InvalidRate { rate: f64 },
}

/// Rendering options for [`Money::format`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOptions {
    pub show_symbol: bool,
    pub show_code: bool,
    pub locale: String,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            show_symbol: true,
            show_code: false,
            locale: String::from("es-ES"),
        }
    }
}

impl FormatOptions {
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    pub fn with_symbol(mut self, show_symbol: bool) -> Self {
        self.show_symbol = show_symbol;
        self
    }

    pub fn with_code(mut self, show_code: bool) -> Self {
        self.show_code = show_code;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Money {
    amount_minor: i64,
    currency: Currency,
}

impl Money {
    pub fn from_minor(amount_minor: i64, code: &str) -> Self {
        Self {
            amount_minor,
            currency: Currency::resolve(code),
        }
    }

    pub fn from_major(amount: f64, code: &str) -> Result<Self, MoneyError> {
        let currency = Currency::resolve(code);
        if !amount.is_finite() {
            return Err(MoneyError::InvalidAmount {
                value: amount.to_string(),
            });
        }
        let amount_minor = round_to_minor(amount * currency.minor_scale())?;
        Ok(Self {
            amount_minor,
            currency,
        })
    }

    pub fn zero(code: &str) -> Self {
        Self::from_minor(0, code)
    }

    /// Parse a decimal major amount such as `"123.45"`.
    pub fn from_string(text: &str, code: &str) -> Result<Self, MoneyError> {
        let amount: f64 = text.trim().parse().map_err(|_| MoneyError::InvalidAmount {
            value: text.to_owned(),
        })?;
        Self::from_major(amount, code)
    }

    pub const fn minor_amount(&self) -> i64 {
        self.amount_minor
    }

    pub fn major_amount(&self) -> f64 {
        self.amount_minor as f64 / self.currency.minor_scale()
    }

    pub const fn currency(&self) -> &Currency {
        &self.currency
    }

    pub fn currency_code(&self) -> &str {
        &self.currency.code
    }

    pub fn add(&self, other: &Self) -> Result<Self, MoneyError> {
        self.ensure_same_currency("add", other)?;
        let amount_minor = self
            .amount_minor
            .checked_add(other.amount_minor)
            .ok_or(MoneyError::Overflow)?;
        Ok(self.with_minor(amount_minor))
    }

    pub fn subtract(&self, other: &Self) -> Result<Self, MoneyError> {
        self.ensure_same_currency("subtract", other)?;
        let amount_minor = self
            .amount_minor
            .checked_sub(other.amount_minor)
            .ok_or(MoneyError::Overflow)?;
        Ok(self.with_minor(amount_minor))
    }

    pub fn multiply(&self, factor: f64) -> Result<Self, MoneyError> {
        if !factor.is_finite() {
            return Err(MoneyError::InvalidAmount {
                value: factor.to_string(),
            });
        }
        let amount_minor = round_to_minor(self.amount_minor as f64 * factor)?;
        Ok(self.with_minor(amount_minor))
    }

    pub fn divide(&self, divisor: f64) -> Result<Self, MoneyError> {
        if divisor == 0.0 {
            return Err(MoneyError::DivisionByZero);
        }
        if !divisor.is_finite() {
            return Err(MoneyError::InvalidAmount {
                value: divisor.to_string(),
            });
        }
        let amount_minor = round_to_minor(self.amount_minor as f64 / divisor)?;
        Ok(self.with_minor(amount_minor))
    }

    pub const fn is_zero(&self) -> bool {
        self.amount_minor == 0
    }

    pub const fn is_positive(&self) -> bool {
        self.amount_minor > 0
    }

    pub const fn is_negative(&self) -> bool {
        self.amount_minor < 0
    }

    /// Saturates at `i64::MAX` for `i64::MIN`.
    pub fn abs(&self) -> Self {
        self.with_minor(self.amount_minor.saturating_abs())
    }

    pub fn negate(&self) -> Self {
        self.with_minor(self.amount_minor.saturating_neg())
    }

    pub fn compare(&self, other: &Self) -> Result<Ordering, MoneyError> {
        self.ensure_same_currency("compare", other)?;
        Ok(self.amount_minor.cmp(&other.amount_minor))
    }

    /// Split the amount proportionally to `ratios`.
    ///
    /// Each share of the magnitude is floored first, then the leftover minor units are handed
    /// out one at a time starting from the first bucket, so the parts always sum to the
    /// original amount. Negative amounts split like their absolute value.
    pub fn allocate(&self, ratios: &[f64]) -> Result<Vec<Self>, MoneyError> {
        if ratios.is_empty() {
            return Err(MoneyError::EmptyRatios);
        }
        if let Some(index) = ratios
            .iter()
            .position(|ratio| !ratio.is_finite() || *ratio < 0.0)
        {
            return Err(MoneyError::InvalidRatio { index });
        }
        let total: f64 = ratios.iter().sum();
        if total == 0.0 {
            return Err(MoneyError::ZeroTotalRatio);
        }

        // Work on the magnitude in i128; each floored share is capped by what is left.
        let magnitude = i128::from(self.amount_minor).abs();
        let mut remaining = magnitude;
        let mut shares: Vec<i128> = ratios
            .iter()
            .map(|ratio| {
                let share = (magnitude as f64 * ratio / total).floor().max(0.0) as i128;
                let share = share.min(remaining);
                remaining -= share;
                share
            })
            .collect();

        let bucket_count = shares.len() as i128;
        let (base, extra) = (remaining / bucket_count, remaining % bucket_count);
        for (index, share) in shares.iter_mut().enumerate() {
            *share += base + i128::from((index as i128) < extra);
        }

        let sign = i128::from(self.amount_minor.signum());
        shares
            .into_iter()
            .map(|share| {
                i64::try_from(share * sign)
                    .map(|minor| self.with_minor(minor))
                    .map_err(|_| MoneyError::Overflow)
            })
            .collect()
    }

    /// Convert with an explicit rate expressed as target units per source unit.
    pub fn convert_to(&self, target_code: &str, rate: f64) -> Result<Self, MoneyError> {
        let target = Currency::resolve(target_code);
        if target.code == self.currency.code {
            return Ok(self.clone());
        }
        if !rate.is_finite() {
            return Err(MoneyError::InvalidRate { rate });
        }

        let amount_minor = round_to_minor(self.major_amount() * rate * target.minor_scale())?;
        Ok(Self {
            amount_minor,
            currency: target,
        })
    }

    pub fn format(&self, options: &FormatOptions) -> String {
        let mut formatted = String::new();
        if self.amount_minor < 0 {
            formatted.push('-');
        }
        if options.show_symbol {
            formatted.push_str(&self.currency.symbol);
        }
        formatted.push_str(&format_unsigned_minor(
            self.amount_minor.unsigned_abs(),
            self.currency.decimals,
            &options.locale,
        ));
        if options.show_code {
            formatted.push(' ');
            formatted.push_str(&self.currency.code);
        }
        formatted
    }

    fn with_minor(&self, amount_minor: i64) -> Self {
        Self {
            amount_minor,
            currency: self.currency.clone(),
        }
    }

    fn ensure_same_currency(&self, operation: &'static str, other: &Self) -> Result<(), MoneyError> {
        if self.currency.code == other.currency.code {
            return Ok(());
        }
        Err(MoneyError::CurrencyMismatch {
            operation,
            left: self.currency.code.clone(),
            right: other.currency.code.clone(),
        })
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format(&FormatOptions::default()))
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MoneyJson {
    amount_minor: i64,
    currency_code: String,
}

impl Serialize for Money {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        MoneyJson {
            amount_minor: self.amount_minor,
            currency_code: self.currency.code.clone(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let json = MoneyJson::deserialize(deserializer)?;
        Ok(Self::from_minor(json.amount_minor, &json.currency_code))
    }
}

fn round_to_minor(value: f64) -> Result<i64, MoneyError> {
    let rounded = value.round();
    if !rounded.is_finite() {
        return Err(MoneyError::InvalidAmount {
            value: value.to_string(),
        });
    }
    if rounded < i64::MIN as f64 || rounded >= i64::MAX as f64 {
        return Err(MoneyError::Overflow);
    }
    Ok(rounded as i64)
}

/// Grouping and decimal separators for a BCP 47 locale tag.
pub(crate) fn locale_separators(locale: &str) -> (char, char) {
    if locale.trim().to_ascii_lowercase().starts_with("en") {
        (',', '.')
    } else {
        ('.', ',')
    }
}

/// Render an unsigned minor amount with grouped thousands and exactly `decimals` digits.
pub(crate) fn format_unsigned_minor(amount_minor: u64, decimals: u8, locale: &str) -> String {
    let (group_separator, decimal_separator) = locale_separators(locale);
    let scale = 10_u64.pow(u32::from(decimals));
    let whole = (amount_minor / scale).to_string();
    let fraction = amount_minor % scale;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3 + 4);
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(group_separator);
        }
        grouped.push(digit);
    }

    if decimals > 0 {
        grouped.push(decimal_separator);
        grouped.push_str(&format!("{fraction:0width$}", width = usize::from(decimals)));
    }
    grouped
}

pub fn format_currency(amount_minor: i64, code: &str, options: &FormatOptions) -> String {
    Money::from_minor(amount_minor, code).format(options)
}

pub fn to_minor_units(amount: f64, code: &str) -> Result<i64, MoneyError> {
    Money::from_major(amount, code).map(|money| money.minor_amount())
}

pub fn from_minor_units(amount_minor: i64, code: &str) -> f64 {
    Money::from_minor(amount_minor, code).major_amount()
}
