use std::fmt::Debug;

use fintec_warehouse::RateHistoryRecord;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::error::ensure_positive_rate;
use crate::http_client::HttpError;
use crate::rates::model::{
    BcvRates, BinanceRates, FallbackReason, RateBand, RateProvenance, RateSnapshot,
};
use crate::{RateSource, UtcDateTime, ValidationError};

/// Calendar day the compiled-in fallback rates were taken from.
pub const STATIC_RATES_AS_OF: &str = "2025-01-15";

pub const STATIC_BCV_USD: f64 = 57.50;
pub const STATIC_BCV_EUR: f64 = 62.80;
pub const STATIC_BINANCE_USD_VES: f64 = 57.50;
pub const STATIC_BINANCE_SPREAD: f64 = 1.00;

/// Why a live fetch was rejected.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("transport error: {0}")]
    Transport(#[from] HttpError),
    #[error("rates API answered HTTP {status}")]
    Status { status: u16 },
    #[error("malformed rates payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("rates payload carried no data ({reason})")]
    MissingData { reason: String },
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// Response wrapper of the internal rates endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub fallback: Option<bool>,
    #[serde(default)]
    pub cached: Option<bool>,
    #[serde(default)]
    pub cache_age: Option<u64>,
    #[serde(default)]
    pub data_age: Option<u64>,
    #[serde(default)]
    pub fallback_reason: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Source-specific decoding and fallback values for [`super::RateService`].
pub trait RateFeed: Send + Sync + 'static {
    type Rates: RateSnapshot + Clone + Debug + Send + Sync + 'static;

    const SOURCE: RateSource;

    /// Decode the `data` member of a live payload.
    fn parse_data(data: Value, now: UtcDateTime) -> Result<Self::Rates, FeedError>;

    /// Rebuild rates from a stored history record.
    fn from_history(record: &RateHistoryRecord, now: UtcDateTime) -> Result<Self::Rates, FeedError>;

    /// Compiled-in values used when every other tier is empty.
    fn static_rates(now: UtcDateTime) -> Self::Rates;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BcvFeed;

#[derive(Debug, Clone, Copy, Default)]
pub struct BinanceFeed;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BcvPayload {
    usd: f64,
    #[serde(default)]
    eur: Option<f64>,
    #[serde(default)]
    last_updated: Option<String>,
    #[serde(default)]
    source: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BinancePayload {
    usd_ves: f64,
    #[serde(default)]
    usdt_ves: Option<f64>,
    #[serde(default)]
    busd_ves: Option<f64>,
    #[serde(default)]
    sell_min: Option<f64>,
    #[serde(default)]
    sell_avg: Option<f64>,
    #[serde(default)]
    sell_max: Option<f64>,
    #[serde(default)]
    sell_rate: Option<f64>,
    #[serde(default)]
    buy_min: Option<f64>,
    #[serde(default)]
    buy_avg: Option<f64>,
    #[serde(default)]
    buy_max: Option<f64>,
    #[serde(default)]
    buy_rate: Option<f64>,
    #[serde(default)]
    spread: Option<f64>,
    #[serde(default)]
    prices_used: Option<u32>,
    #[serde(default, rename = "lastUpdated")]
    last_updated: Option<String>,
    #[serde(default)]
    source: Option<String>,
}

fn observed_at(last_updated: Option<&str>, now: UtcDateTime) -> UtcDateTime {
    last_updated
        .and_then(|value| UtcDateTime::parse_lenient(value).ok())
        .unwrap_or(now)
}

fn history_provenance(
    source: RateSource,
    record: &RateHistoryRecord,
    now: UtcDateTime,
) -> Result<RateProvenance, FeedError> {
    let observed = UtcDateTime::parse_lenient(&record.timestamp)?;
    let mut provenance =
        RateProvenance::fallback(source.history_fallback_label(), observed, FallbackReason::History);
    provenance.data_age = Some(observed.seconds_until(now));
    Ok(provenance)
}

impl RateFeed for BcvFeed {
    type Rates = BcvRates;

    const SOURCE: RateSource = RateSource::Bcv;

    fn parse_data(data: Value, now: UtcDateTime) -> Result<Self::Rates, FeedError> {
        let payload: BcvPayload = serde_json::from_value(data)?;
        let usd = ensure_positive_rate(payload.usd, "usd")?;
        let eur = payload
            .eur
            .map(|eur| ensure_positive_rate(eur, "eur"))
            .transpose()?;

        Ok(BcvRates {
            usd,
            eur,
            provenance: RateProvenance::live(
                payload
                    .source
                    .unwrap_or_else(|| Self::SOURCE.label().to_owned()),
                observed_at(payload.last_updated.as_deref(), now),
            ),
        })
    }

    fn from_history(record: &RateHistoryRecord, now: UtcDateTime) -> Result<Self::Rates, FeedError> {
        Ok(BcvRates {
            usd: ensure_positive_rate(record.usd, "usd")?,
            eur: record.eur,
            provenance: history_provenance(Self::SOURCE, record, now)?,
        })
    }

    fn static_rates(now: UtcDateTime) -> Self::Rates {
        BcvRates {
            usd: STATIC_BCV_USD,
            eur: Some(STATIC_BCV_EUR),
            provenance: RateProvenance::fallback(
                Self::SOURCE.static_fallback_label(),
                now,
                FallbackReason::Static,
            ),
        }
    }
}

impl RateFeed for BinanceFeed {
    type Rates = BinanceRates;

    const SOURCE: RateSource = RateSource::Binance;

    fn parse_data(data: Value, now: UtcDateTime) -> Result<Self::Rates, FeedError> {
        let payload: BinancePayload = serde_json::from_value(data)?;
        let usd_ves = ensure_positive_rate(payload.usd_ves, "usd_ves")?;
        let usdt_ves = ensure_positive_rate(payload.usdt_ves.unwrap_or(usd_ves), "usdt_ves")?;
        let busd_ves = ensure_positive_rate(payload.busd_ves.unwrap_or(usdt_ves), "busd_ves")?;

        let sell_side = payload.sell_rate.unwrap_or(usd_ves);
        let sell_rate = RateBand {
            min: payload.sell_min.unwrap_or(sell_side),
            avg: payload.sell_avg.unwrap_or(sell_side),
            max: payload.sell_max.unwrap_or(sell_side),
        };
        let buy_side = payload.buy_rate.unwrap_or(usd_ves);
        let buy_rate = RateBand {
            min: payload.buy_min.unwrap_or(buy_side),
            avg: payload.buy_avg.unwrap_or(buy_side),
            max: payload.buy_max.unwrap_or(buy_side),
        };
        let spread = payload
            .spread
            .unwrap_or_else(|| ((sell_rate.avg - buy_rate.avg) * 100.0).round() / 100.0);

        Ok(BinanceRates {
            usd_ves,
            usdt_ves,
            busd_ves,
            sell_rate,
            buy_rate,
            spread,
            prices_used: payload.prices_used.unwrap_or(0),
            provenance: RateProvenance::live(
                payload
                    .source
                    .unwrap_or_else(|| Self::SOURCE.label().to_owned()),
                observed_at(payload.last_updated.as_deref(), now),
            ),
        })
    }

    fn from_history(record: &RateHistoryRecord, now: UtcDateTime) -> Result<Self::Rates, FeedError> {
        let usd_ves = ensure_positive_rate(record.usd, "usd_ves")?;
        Ok(BinanceRates {
            usd_ves,
            usdt_ves: usd_ves,
            busd_ves: usd_ves,
            sell_rate: RateBand::flat(usd_ves),
            buy_rate: RateBand::flat(usd_ves),
            spread: 0.0,
            prices_used: 0,
            provenance: history_provenance(Self::SOURCE, record, now)?,
        })
    }

    fn static_rates(now: UtcDateTime) -> Self::Rates {
        let half_spread = STATIC_BINANCE_SPREAD / 2.0;
        BinanceRates {
            usd_ves: STATIC_BINANCE_USD_VES,
            usdt_ves: STATIC_BINANCE_USD_VES,
            busd_ves: STATIC_BINANCE_USD_VES,
            sell_rate: RateBand::flat(STATIC_BINANCE_USD_VES + half_spread),
            buy_rate: RateBand::flat(STATIC_BINANCE_USD_VES - half_spread),
            spread: STATIC_BINANCE_SPREAD,
            prices_used: 0,
            provenance: RateProvenance::fallback(
                Self::SOURCE.static_fallback_label(),
                now,
                FallbackReason::Static,
            ),
        }
    }
}
