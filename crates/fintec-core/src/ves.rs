use serde::Serialize;
use thiserror::Error;

use crate::currency::Currency;
use crate::money::{FormatOptions, Money, MoneyError};
use crate::rates::BcvRates;
use crate::UtcDateTime;

const VES_MIN_MAJOR: f64 = 0.01;
const VES_MAX_MAJOR: f64 = 100_000_000.0;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum VesError {
    #[error("BCV rates not available")]
    RatesUnavailable,
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Options for [`VesFormatter::format_ves`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VesFormatOptions {
    pub show_usd_equivalent: bool,
    pub locale: String,
}

impl Default for VesFormatOptions {
    fn default() -> Self {
        Self {
            show_usd_equivalent: false,
            locale: String::from("es-VE"),
        }
    }
}

/// Bolívar metadata together with the BCV rate in use.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VesInfo {
    #[serde(flatten)]
    pub currency: Currency,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bcv_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<UtcDateTime>,
}

/// Formats and converts bolívar amounts against the BCV rates it was given.
#[derive(Debug, Clone, Default)]
pub struct VesFormatter {
    bcv_rates: Option<BcvRates>,
}

impl VesFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bcv_rates(rates: BcvRates) -> Self {
        Self {
            bcv_rates: Some(rates),
        }
    }

    pub fn set_bcv_rates(&mut self, rates: BcvRates) {
        self.bcv_rates = Some(rates);
    }

    pub fn clear_bcv_rates(&mut self) {
        self.bcv_rates = None;
    }

    pub fn bcv_rates(&self) -> Option<&BcvRates> {
        self.bcv_rates.as_ref()
    }

    /// Render a bolívar amount, optionally followed by ` (~$X.XX)`.
    ///
    /// The annotation is silently omitted when no BCV rate is set.
    pub fn format_ves(&self, amount_minor: i64, options: &VesFormatOptions) -> String {
        let money = Money::from_minor(amount_minor, "VES");
        let formatted = money.format(&FormatOptions::default().with_locale(options.locale.as_str()));

        match (&self.bcv_rates, options.show_usd_equivalent) {
            (Some(rates), true) => {
                let usd = money.major_amount() / rates.usd;
                format!("{formatted} (~${usd:.2})")
            }
            _ => formatted,
        }
    }

    /// VES minor units to USD minor units.
    pub fn convert_ves_to_usd(&self, amount_minor: i64) -> Result<i64, VesError> {
        let rates = self.bcv_rates.as_ref().ok_or(VesError::RatesUnavailable)?;
        let ves_major = Money::from_minor(amount_minor, "VES").major_amount();
        Ok(Money::from_major(ves_major / rates.usd, "USD")?.minor_amount())
    }

    /// USD minor units to VES minor units.
    pub fn convert_usd_to_ves(&self, amount_minor: i64) -> Result<i64, VesError> {
        let rates = self.bcv_rates.as_ref().ok_or(VesError::RatesUnavailable)?;
        let usd = Money::from_minor(amount_minor, "USD");
        Ok(usd.convert_to("VES", rates.usd)?.minor_amount())
    }

    pub fn ves_info(&self) -> VesInfo {
        VesInfo {
            currency: Currency::resolve("VES"),
            bcv_rate: self.bcv_rates.as_ref().map(|rates| rates.usd),
            last_updated: self
                .bcv_rates
                .as_ref()
                .map(|rates| rates.provenance.last_updated),
        }
    }

    /// Format any currency, routing VES through [`Self::format_ves`].
    pub fn format_currency_with_bcv(
        &self,
        amount_minor: i64,
        code: &str,
        options: &VesFormatOptions,
    ) -> String {
        if code.trim().eq_ignore_ascii_case("VES") {
            return self.format_ves(amount_minor, options);
        }
        Money::from_minor(amount_minor, code)
            .format(&FormatOptions::default().with_locale(options.locale.as_str()))
    }
}

/// Whether the bolívar amount lies within 0.01 and 100,000,000 inclusive.
pub fn validate_ves_amount(amount_minor: i64) -> bool {
    let major = Money::from_minor(amount_minor, "VES").major_amount();
    (VES_MIN_MAJOR..=VES_MAX_MAJOR).contains(&major)
}

pub fn requires_bcv_validation(code: &str) -> bool {
    Currency::resolve(code).requires_bcv_rate
}
