use std::fmt::{Display, Formatter};

use serde::{Deserialize, Deserializer, Serialize};

/// Local tables holding one daily snapshot per rate source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryTable {
    BcvRateHistory,
    BinanceRateHistory,
}

impl HistoryTable {
    pub const ALL: [Self; 2] = [Self::BcvRateHistory, Self::BinanceRateHistory];

    /// SQL table name; shared with the remote mirror schema.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BcvRateHistory => "bcv_rate_history",
            Self::BinanceRateHistory => "binance_rate_history",
        }
    }
}

impl Display for HistoryTable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observed rate for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateHistoryRecord {
    /// Remote mirrors may hand back numeric identity columns.
    #[serde(deserialize_with = "deserialize_record_id")]
    pub id: String,
    /// `YYYY-MM-DD`, in the source's local calendar.
    pub date: String,
    pub usd: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eur: Option<f64>,
    /// RFC3339 UTC observation time.
    pub timestamp: String,
    pub source: String,
}

impl RateHistoryRecord {
    pub fn is_fallback(&self) -> bool {
        is_fallback_source(&self.source)
    }
}

fn deserialize_record_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Integer(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(value) => value,
        RawId::Integer(value) => value.to_string(),
    })
}

/// Whether a source label marks a degraded (non-live) observation.
pub fn is_fallback_source(source: &str) -> bool {
    source.to_ascii_lowercase().contains("fallback")
}

/// What an upsert did to the stored day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
    Inserted,
    Updated,
    /// A fallback observation arrived for a day that already has a real one.
    SkippedFallback,
}

pub(crate) fn is_day_key(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(index, byte)| index == 4 || index == 7 || byte.is_ascii_digit())
}
