use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::ValidationError;

struct CurrencyEntry {
    code: &'static str,
    name: &'static str,
    symbol: &'static str,
    decimals: u8,
    requires_bcv_rate: bool,
}

const fn entry(
    code: &'static str,
    name: &'static str,
    symbol: &'static str,
    decimals: u8,
) -> CurrencyEntry {
    CurrencyEntry {
        code,
        name,
        symbol,
        decimals,
        requires_bcv_rate: false,
    }
}

const REGISTRY: &[CurrencyEntry] = &[
    entry("USD", "US Dollar", "$", 2),
    entry("EUR", "Euro", "€", 2),
    entry("GBP", "British Pound", "£", 2),
    entry("JPY", "Japanese Yen", "¥", 0),
    entry("CHF", "Swiss Franc", "Fr", 2),
    entry("CAD", "Canadian Dollar", "C$", 2),
    entry("AUD", "Australian Dollar", "A$", 2),
    entry("CNY", "Chinese Yuan", "¥", 2),
    entry("INR", "Indian Rupee", "₹", 2),
    entry("BRL", "Brazilian Real", "R$", 2),
    entry("MXN", "Mexican Peso", "$", 2),
    entry("ARS", "Argentine Peso", "$", 2),
    entry("CLP", "Chilean Peso", "$", 0),
    entry("COP", "Colombian Peso", "$", 0),
    entry("PEN", "Peruvian Sol", "S/", 2),
    CurrencyEntry {
        code: "VES",
        name: "Bolívar",
        symbol: "Bs.",
        decimals: 2,
        requires_bcv_rate: true,
    },
];

/// Currency metadata resolved from the built-in registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Currency {
    pub code: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    #[serde(default)]
    pub requires_bcv_rate: bool,
}

impl Currency {
    /// Case-insensitive registry lookup.
    ///
    /// Unknown codes are not an error: they resolve to a two-decimal currency whose name and
    /// symbol are the code itself.
    pub fn resolve(code: &str) -> Self {
        let normalized = code.trim().to_ascii_uppercase();
        match REGISTRY.iter().find(|entry| entry.code == normalized) {
            Some(entry) => Self::from_entry(entry),
            None => Self {
                name: normalized.clone(),
                symbol: normalized.clone(),
                code: normalized,
                decimals: 2,
                requires_bcv_rate: false,
            },
        }
    }

    pub fn is_known(code: &str) -> bool {
        let normalized = code.trim().to_ascii_uppercase();
        REGISTRY.iter().any(|entry| entry.code == normalized)
    }

    /// `10^decimals` as a float scale factor.
    pub fn minor_scale(&self) -> f64 {
        10_f64.powi(i32::from(self.decimals))
    }

    fn from_entry(entry: &CurrencyEntry) -> Self {
        Self {
            code: entry.code.to_owned(),
            name: entry.name.to_owned(),
            symbol: entry.symbol.to_owned(),
            decimals: entry.decimals,
            requires_bcv_rate: entry.requires_bcv_rate,
        }
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.code)
    }
}

/// Normalise a user supplied code and require three ASCII letters.
pub fn validate_code(value: &str) -> Result<String, ValidationError> {
    let normalized = value.trim().to_ascii_uppercase();
    if normalized.len() == 3 && normalized.chars().all(|ch| ch.is_ascii_alphabetic()) {
        Ok(normalized)
    } else {
        Err(ValidationError::InvalidCurrency {
            value: value.to_owned(),
        })
    }
}

pub fn supported_currencies() -> Vec<Currency> {
    REGISTRY.iter().map(Currency::from_entry).collect()
}

pub fn currency_decimals(code: &str) -> u8 {
    Currency::resolve(code).decimals
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        let ves = Currency::resolve(" ves ");
        assert_eq!(ves.code, "VES");
        assert_eq!(ves.symbol, "Bs.");
        assert!(ves.requires_bcv_rate);
    }

    #[test]
    fn unknown_codes_fall_back_to_two_decimals() {
        let xyz = Currency::resolve("xyz");
        assert_eq!(xyz.code, "XYZ");
        assert_eq!(xyz.name, "XYZ");
        assert_eq!(xyz.symbol, "XYZ");
        assert_eq!(xyz.decimals, 2);
        assert!(!Currency::is_known("xyz"));
    }

    #[test]
    fn zero_decimal_currencies() {
        for code in ["JPY", "CLP", "COP"] {
            assert_eq!(currency_decimals(code), 0, "{code}");
        }
        assert_eq!(supported_currencies().len(), 16);
    }

    #[test]
    fn validates_iso_shape() {
        assert_eq!(validate_code("usd").expect("valid"), "USD");
        assert!(validate_code("US").is_err());
        assert!(validate_code("U5D").is_err());
    }
}
