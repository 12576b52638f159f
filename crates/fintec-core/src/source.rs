use std::fmt::{Display, Formatter};
use std::str::FromStr;

use fintec_warehouse::HistoryTable;
use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Exchange-rate publishers tracked by the rate services and history store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateSource {
    /// Banco Central de Venezuela official rate.
    Bcv,
    /// Binance P2P USDT/VES market rate.
    Binance,
}

impl RateSource {
    pub const ALL: [Self; 2] = [Self::Bcv, Self::Binance];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bcv => "bcv",
            Self::Binance => "binance",
        }
    }

    /// Source label written on live records.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Bcv => "BCV",
            Self::Binance => "Binance P2P",
        }
    }

    pub const fn endpoint_path(self) -> &'static str {
        match self {
            Self::Bcv => "/api/bcv-rates",
            Self::Binance => "/api/binance-rates",
        }
    }

    pub const fn history_table(self) -> HistoryTable {
        match self {
            Self::Bcv => HistoryTable::BcvRateHistory,
            Self::Binance => HistoryTable::BinanceRateHistory,
        }
    }

    pub const fn retention_days(self) -> u32 {
        match self {
            Self::Bcv => 365,
            Self::Binance => 90,
        }
    }

    /// Source label stamped on values recovered from local history.
    pub const fn history_fallback_label(self) -> &'static str {
        match self {
            Self::Bcv => "BCV (fallback - history)",
            Self::Binance => "Binance P2P (fallback - history)",
        }
    }

    pub const fn static_fallback_label(self) -> &'static str {
        match self {
            Self::Bcv => "BCV (fallback - static)",
            Self::Binance => "Binance P2P (fallback - static)",
        }
    }
}

impl Display for RateSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RateSource {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "bcv" => Ok(Self::Bcv),
            "binance" => Ok(Self::Binance),
            other => Err(ValidationError::InvalidRateSource {
                value: other.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("BCV".parse::<RateSource>().expect("bcv"), RateSource::Bcv);
        assert_eq!(" binance ".parse::<RateSource>().expect("binance"), RateSource::Binance);
        assert!("dolartoday".parse::<RateSource>().is_err());
    }

    #[test]
    fn fallback_labels_are_recognised_as_fallback() {
        for source in RateSource::ALL {
            assert!(fintec_warehouse::is_fallback_source(source.history_fallback_label()));
            assert!(fintec_warehouse::is_fallback_source(source.static_fallback_label()));
            assert!(!fintec_warehouse::is_fallback_source(source.label()));
        }
    }
}
