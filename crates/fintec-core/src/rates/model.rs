use serde::{Deserialize, Serialize};

use crate::UtcDateTime;

/// Why a rate result did not come from a fresh live fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackReason {
    /// Last in-memory result of this service.
    Cache,
    /// Latest record of the local rate history.
    History,
    /// Compiled-in constants.
    Static,
    /// The rates API answered with its own fallback payload.
    Upstream,
}

/// Provenance shared by every rate shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateProvenance {
    pub last_updated: UtcDateTime,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<FallbackReason>,
    /// Seconds between `last_updated` and the moment this result was produced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_age: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached: Option<bool>,
}

impl RateProvenance {
    pub fn live(source: impl Into<String>, last_updated: UtcDateTime) -> Self {
        Self {
            last_updated,
            source: source.into(),
            fallback: None,
            fallback_reason: None,
            data_age: None,
            cached: None,
        }
    }

    pub fn fallback(
        source: impl Into<String>,
        last_updated: UtcDateTime,
        reason: FallbackReason,
    ) -> Self {
        Self {
            last_updated,
            source: source.into(),
            fallback: Some(true),
            fallback_reason: Some(reason),
            data_age: None,
            cached: None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.fallback.unwrap_or(false)
    }

    /// Restamp as a fallback of `reason`, aged relative to `now`.
    pub(crate) fn mark_fallback(&mut self, reason: FallbackReason, now: UtcDateTime) {
        self.fallback = Some(true);
        self.fallback_reason = Some(reason);
        self.data_age = Some(self.last_updated.seconds_until(now));
    }
}

/// Official Banco Central de Venezuela rates, in bolívars per unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BcvRates {
    pub usd: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eur: Option<f64>,
    #[serde(flatten)]
    pub provenance: RateProvenance,
}

/// Min/avg/max of the P2P offers sampled on one side of the book.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateBand {
    pub min: f64,
    pub avg: f64,
    pub max: f64,
}

impl RateBand {
    pub const fn flat(rate: f64) -> Self {
        Self {
            min: rate,
            avg: rate,
            max: rate,
        }
    }
}

/// Binance P2P market rates, in bolívars per dollar-pegged unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinanceRates {
    pub usd_ves: f64,
    pub usdt_ves: f64,
    pub busd_ves: f64,
    pub sell_rate: RateBand,
    pub buy_rate: RateBand,
    pub spread: f64,
    pub prices_used: u32,
    #[serde(flatten)]
    pub provenance: RateProvenance,
}

/// Common view over the rate shapes for the fallback chain and history writes.
pub trait RateSnapshot {
    fn provenance(&self) -> &RateProvenance;

    fn provenance_mut(&mut self) -> &mut RateProvenance;

    /// Primary USD rate persisted to history.
    fn usd(&self) -> f64;

    fn eur(&self) -> Option<f64> {
        None
    }
}

impl RateSnapshot for BcvRates {
    fn provenance(&self) -> &RateProvenance {
        &self.provenance
    }

    fn provenance_mut(&mut self) -> &mut RateProvenance {
        &mut self.provenance
    }

    fn usd(&self) -> f64 {
        self.usd
    }

    fn eur(&self) -> Option<f64> {
        self.eur
    }
}

impl RateSnapshot for BinanceRates {
    fn provenance(&self) -> &RateProvenance {
        &self.provenance
    }

    fn provenance_mut(&mut self) -> &mut RateProvenance {
        &mut self.provenance
    }

    fn usd(&self) -> f64 {
        self.usd_ves
    }
}
