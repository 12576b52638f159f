//! BCV versus Binance rate comparisons.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ComparisonError {
    #[error("rate '{field}' must be finite and positive, got {value}")]
    InvalidRate { field: &'static str, value: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateComparison {
    pub bcv_rate: f64,
    pub binance_rate: f64,
    /// Difference relative to the lower of the two rates.
    pub percentage_difference: f64,
    pub absolute_difference: f64,
    #[serde(rename = "isBCVHigher")]
    pub is_bcv_higher: bool,
    pub comparison_text: String,
}

pub fn calculate_rate_difference(
    bcv: f64,
    binance: f64,
) -> Result<RateComparison, ComparisonError> {
    let bcv = ensure_rate(bcv, "bcv")?;
    let binance = ensure_rate(binance, "binance")?;

    let absolute_difference = (bcv - binance).abs();
    let percentage_difference = absolute_difference / bcv.min(binance) * 100.0;
    let is_bcv_higher = bcv > binance;
    let comparison_text = if is_bcv_higher {
        format!("BCV es {percentage_difference:.1}% más alto que Binance")
    } else {
        format!("Binance es {percentage_difference:.1}% más alto que BCV")
    };

    Ok(RateComparison {
        bcv_rate: bcv,
        binance_rate: binance,
        percentage_difference,
        absolute_difference,
        is_bcv_higher,
        comparison_text,
    })
}

/// Compare BCV against the midpoint of the Binance sell and buy rates.
pub fn calculate_average_rate_difference(
    bcv: f64,
    binance_sell: f64,
    binance_buy: f64,
) -> Result<RateComparison, ComparisonError> {
    let sell = ensure_rate(binance_sell, "binance_sell")?;
    let buy = ensure_rate(binance_buy, "binance_buy")?;
    calculate_rate_difference(bcv, (sell + buy) / 2.0)
}

/// BCV EUR rate against the Binance USD midpoint.
pub fn calculate_eur_usd_rate_difference(
    bcv_eur: f64,
    binance_sell: f64,
    binance_buy: f64,
) -> Result<RateComparison, ComparisonError> {
    let mut comparison = calculate_average_rate_difference(bcv_eur, binance_sell, binance_buy)?;
    let percentage = comparison.percentage_difference;
    comparison.comparison_text = if comparison.is_bcv_higher {
        format!("BCV EUR es {percentage:.1}% más alto que Binance USD")
    } else {
        format!("Binance USD es {percentage:.1}% más alto que BCV EUR")
    };
    Ok(comparison)
}

pub fn format_percentage_difference(percentage: f64, is_bcv_higher: bool) -> String {
    let sign = if is_bcv_higher { '+' } else { '-' };
    format!("{sign}{percentage:.1}%")
}

fn ensure_rate(value: f64, field: &'static str) -> Result<f64, ComparisonError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ComparisonError::InvalidRate { field, value })
    }
}
