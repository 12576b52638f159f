use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::money::{Money, MoneyError};
use crate::rates::BcvRatesService;
use crate::UtcDateTime;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConversionError {
    #[error("Exchange rate not found for {from} or {to}")]
    RateNotFound { from: String, to: String },
    #[error("Invalid amount for conversion: {amount}")]
    InvalidAmount { amount: f64 },
    #[error("exchange rate for {code} must be finite and positive, got {rate}")]
    InvalidRate { code: String, rate: f64 },
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Units of `currency` per US dollar.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRate {
    pub currency: String,
    pub rate: f64,
    pub last_updated: UtcDateTime,
    pub source: String,
}

/// Converts between currencies through USD using BCV-derived rates.
pub struct CurrencyConverter {
    bcv: Arc<BcvRatesService>,
    rates: RwLock<BTreeMap<String, ExchangeRate>>,
}

impl CurrencyConverter {
    pub fn new(bcv: Arc<BcvRatesService>) -> Self {
        Self {
            bcv,
            rates: RwLock::new(BTreeMap::new()),
        }
    }

    /// Refresh BCV rates and register USD, VES and, when published, EUR.
    pub async fn fetch_exchange_rates(&self) -> Vec<ExchangeRate> {
        let bcv = self.bcv.fetch_rates().await;
        let last_updated = bcv.provenance.last_updated;
        let source = bcv.provenance.source.clone();

        let mut fetched = vec![
            ExchangeRate {
                currency: String::from("USD"),
                rate: 1.0,
                last_updated,
                source: source.clone(),
            },
            ExchangeRate {
                currency: String::from("VES"),
                rate: bcv.usd,
                last_updated,
                source: source.clone(),
            },
        ];
        if let Some(eur) = bcv.eur {
            fetched.push(ExchangeRate {
                currency: String::from("EUR"),
                rate: bcv.usd / eur,
                last_updated,
                source,
            });
        }

        let mut rates = self.rates.write().await;
        for rate in &fetched {
            rates.insert(rate.currency.clone(), rate.clone());
        }
        fetched
    }

    pub async fn convert_currency(
        &self,
        amount: f64,
        from: &str,
        to: &str,
    ) -> Result<f64, ConversionError> {
        if !amount.is_finite() {
            return Err(ConversionError::InvalidAmount { amount });
        }
        let (from, to) = (normalize(from), normalize(to));
        if from == to {
            return Ok(amount);
        }

        let (from_rate, to_rate) = self.rate_pair(&from, &to).await?;
        Ok(amount / from_rate * to_rate)
    }

    pub async fn convert_money(&self, money: &Money, to: &str) -> Result<Money, ConversionError> {
        let to = normalize(to);
        if money.currency_code() == to {
            return Ok(money.clone());
        }

        let (from_rate, to_rate) = self.rate_pair(money.currency_code(), &to).await?;
        Ok(money.convert_to(&to, to_rate / from_rate)?)
    }

    pub async fn get_exchange_rate(&self, code: &str) -> Option<ExchangeRate> {
        self.rates.read().await.get(&normalize(code)).cloned()
    }

    pub async fn get_all_exchange_rates(&self) -> BTreeMap<String, ExchangeRate> {
        self.rates.read().await.clone()
    }

    /// Register a rate by hand; `source` defaults to `Manual`.
    pub async fn set_exchange_rate(
        &self,
        code: &str,
        rate: f64,
        source: Option<&str>,
    ) -> Result<(), ConversionError> {
        let code = normalize(code);
        if !rate.is_finite() || rate <= 0.0 {
            return Err(ConversionError::InvalidRate { code, rate });
        }

        let entry = ExchangeRate {
            currency: code.clone(),
            rate,
            last_updated: UtcDateTime::now(),
            source: source.unwrap_or("Manual").to_owned(),
        };
        self.rates.write().await.insert(code, entry);
        Ok(())
    }

    pub async fn clear_cache(&self) {
        self.rates.write().await.clear();
    }

    async fn rate_pair(&self, from: &str, to: &str) -> Result<(f64, f64), ConversionError> {
        let rates = self.rates.read().await;
        match (rates.get(from), rates.get(to)) {
            (Some(from_rate), Some(to_rate)) => Ok((from_rate.rate, to_rate.rate)),
            _ => Err(ConversionError::RateNotFound {
                from: from.to_owned(),
                to: to.to_owned(),
            }),
        }
    }
}

fn normalize(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}
