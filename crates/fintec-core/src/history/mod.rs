//! Daily rate history per source, backed by the local warehouse and an optional remote
//! mirror.

mod trends;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use fintec_warehouse::{RateHistoryRecord, Warehouse, WarehouseError};
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, warn};
use uuid::Uuid;

pub use fintec_warehouse::UpsertOutcome as SaveOutcome;
pub use trends::{
    DailyTrends, PeriodTrends, RateTrend, TrendDirection, STABLE_THRESHOLD_PERCENT,
};

use crate::error::ensure_positive_rate;
use crate::mirror::{DisabledMirror, HistoryMirror};
use crate::{DayKey, RateSource, UtcDateTime, ValidationError};
use trends::round_to_cents;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error(transparent)]
    Warehouse(#[from] WarehouseError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// History service for one rate source.
pub struct RateHistory {
    source: RateSource,
    warehouse: Warehouse,
    mirror: Arc<dyn HistoryMirror>,
    retention_days: u32,
    remote_pulled: AtomicBool,
    pending_mirror: Mutex<JoinSet<()>>,
}

impl RateHistory {
    pub fn new(source: RateSource, warehouse: Warehouse) -> Self {
        Self {
            source,
            warehouse,
            mirror: Arc::new(DisabledMirror),
            retention_days: source.retention_days(),
            remote_pulled: AtomicBool::new(false),
            pending_mirror: Mutex::new(JoinSet::new()),
        }
    }

    pub fn with_mirror(mut self, mirror: Arc<dyn HistoryMirror>) -> Self {
        self.mirror = mirror;
        self
    }

    pub fn with_retention_days(mut self, retention_days: u32) -> Self {
        self.retention_days = retention_days;
        self
    }

    pub const fn source(&self) -> RateSource {
        self.source
    }

    pub const fn retention_days(&self) -> u32 {
        self.retention_days
    }

    pub fn save_rates(
        &self,
        usd: f64,
        eur: Option<f64>,
        source: &str,
    ) -> Result<SaveOutcome, HistoryError> {
        self.save_rates_at(usd, eur, source, UtcDateTime::now())
    }

    /// Store the observation for the Caracas day of `observed_at`.
    ///
    /// Any write that lands prunes records past the retention window and is then copied to
    /// the remote mirror in the background.
    pub fn save_rates_at(
        &self,
        usd: f64,
        eur: Option<f64>,
        source: &str,
        observed_at: UtcDateTime,
    ) -> Result<SaveOutcome, HistoryError> {
        let usd = round_to_cents(ensure_positive_rate(usd, "usd")?);
        let eur = eur
            .map(|value| ensure_positive_rate(value, "eur").map(round_to_cents))
            .transpose()?;
        let date = DayKey::in_caracas(observed_at).to_string();

        let record = RateHistoryRecord {
            id: Uuid::new_v4().to_string(),
            date: date.clone(),
            usd,
            eur,
            timestamp: observed_at.truncated_to_seconds().format_rfc3339(),
            source: source.to_owned(),
        };
        let table = self.source.history_table();
        let outcome = self.warehouse.upsert_rate(table, &record)?;
        if outcome == SaveOutcome::SkippedFallback {
            debug!(source = %self.source, %date, "kept stored live rate over fallback observation");
            return Ok(outcome);
        }

        let pruned = self.clean_old_records(self.retention_days)?;
        if pruned > 0 {
            debug!(source = %self.source, pruned, "pruned expired rate history");
        }

        if let Some(stored) = self.warehouse.rate_for_date(table, &date)? {
            self.mirror_in_background(stored);
        }
        Ok(outcome)
    }

    pub fn get_rates_for_date(
        &self,
        date: DayKey,
    ) -> Result<Option<RateHistoryRecord>, HistoryError> {
        let record = self
            .warehouse
            .rate_for_date(self.source.history_table(), &date.to_string())?;
        Ok(record)
    }

    pub fn get_todays_rates(&self) -> Result<Option<RateHistoryRecord>, HistoryError> {
        self.get_rates_for_date(DayKey::caracas_today())
    }

    pub fn get_yesterdays_rates(&self) -> Result<Option<RateHistoryRecord>, HistoryError> {
        self.get_rates_for_date(DayKey::caracas_today().minus_days(1))
    }

    /// Most recent observation by timestamp, whatever its day.
    pub fn latest(&self) -> Result<Option<RateHistoryRecord>, HistoryError> {
        Ok(self.warehouse.latest_rate(self.source.history_table())?)
    }

    /// Records from `days` days ago through today, oldest first.
    ///
    /// When the local store holds fewer than two records the remote mirror is consulted
    /// once per service lifetime and its records are merged locally before re-reading.
    pub async fn get_historical_rates(
        &self,
        days: u32,
    ) -> Result<Vec<RateHistoryRecord>, HistoryError> {
        let table = self.source.history_table();
        let today = DayKey::caracas_today();
        let from = today.minus_days(i64::from(days)).to_string();
        let to = today.to_string();

        let local = self.warehouse.rates_between(table, &from, &to)?;
        if local.len() >= 2
            || !self.mirror.is_enabled()
            || self.remote_pulled.swap(true, Ordering::SeqCst)
        {
            return Ok(local);
        }

        match self.mirror.fetch_since(table, &from).await {
            Ok(remote) => {
                let fetched = remote.len();
                for record in remote {
                    if let Err(error) = self.warehouse.upsert_rate(table, &record) {
                        warn!(source = %self.source, date = %record.date, %error, "skipped remote history record");
                    }
                }
                debug!(source = %self.source, fetched, "merged remote rate history");
                Ok(self.warehouse.rates_between(table, &from, &to)?)
            }
            Err(error) => {
                warn!(source = %self.source, %error, "remote history pull failed");
                Ok(local)
            }
        }
    }

    /// Delete records dated before today minus `keep_days`; returns the deleted count.
    pub fn clean_old_records(&self, keep_days: u32) -> Result<usize, HistoryError> {
        let cutoff = DayKey::caracas_today().minus_days(i64::from(keep_days));
        let deleted = self
            .warehouse
            .delete_before(self.source.history_table(), &cutoff.to_string())?;
        Ok(deleted)
    }

    pub fn clear_history(&self) -> Result<usize, HistoryError> {
        Ok(self.warehouse.clear(self.source.history_table())?)
    }

    /// Today's rates against yesterday's; `None` unless both days are stored.
    pub fn day_over_day_trends(&self) -> Result<Option<DailyTrends>, HistoryError> {
        let (Some(today), Some(yesterday)) =
            (self.get_todays_rates()?, self.get_yesterdays_rates()?)
        else {
            return Ok(None);
        };

        let eur = match (today.eur, yesterday.eur) {
            (Some(current), Some(previous)) => Some(RateTrend::between(current, previous)),
            _ => None,
        };
        Ok(Some(DailyTrends {
            usd: RateTrend::between(today.usd, yesterday.usd),
            eur,
        }))
    }

    /// Newest against oldest USD rate of the last `days` days.
    pub async fn window_trend(&self, days: u32) -> Result<Option<RateTrend>, HistoryError> {
        let records = self.get_historical_rates(days).await?;
        match (records.first(), records.last()) {
            (Some(oldest), Some(newest)) if records.len() >= 2 => {
                Ok(Some(RateTrend::between(newest.usd, oldest.usd)))
            }
            _ => Ok(None),
        }
    }

    /// One day, one week and one month windows; `None` when no window has two records.
    pub async fn multi_period_trends(&self) -> Result<Option<PeriodTrends>, HistoryError> {
        let trends = PeriodTrends {
            one_day: self.window_trend(1).await?,
            one_week: self.window_trend(7).await?,
            one_month: self.window_trend(30).await?,
        };
        Ok((!trends.is_empty()).then_some(trends))
    }

    /// Mean USD rate over the last `days` days, rounded to cents.
    pub async fn average_rate(&self, days: u32) -> Result<Option<f64>, HistoryError> {
        let records = self.get_historical_rates(days).await?;
        if records.is_empty() {
            return Ok(None);
        }
        let sum: f64 = records.iter().map(|record| record.usd).sum();
        Ok(Some(round_to_cents(sum / records.len() as f64)))
    }

    /// Wait up to `timeout` for background mirror writes to finish.
    ///
    /// Returns how many writes were still running when the timeout elapsed; those are
    /// aborted.
    pub async fn flush_mirror(&self, timeout: Duration) -> usize {
        let mut pending = std::mem::take(
            &mut *self
                .pending_mirror
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        if pending.is_empty() {
            return 0;
        }

        let drained = tokio::time::timeout(timeout, async {
            while let Some(joined) = pending.join_next().await {
                if let Err(error) = joined {
                    warn!(source = %self.source, %error, "remote history mirror task failed");
                }
            }
        })
        .await;
        if drained.is_ok() {
            return 0;
        }

        let abandoned = pending.len();
        warn!(source = %self.source, abandoned, "remote history writes did not finish in time");
        pending.abort_all();
        abandoned
    }

    fn mirror_in_background(&self, record: RateHistoryRecord) {
        if !self.mirror.is_enabled() {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!(source = %self.source, "no async runtime; remote mirror skipped");
            return;
        };

        let mirror = Arc::clone(&self.mirror);
        let table = self.source.history_table();
        let source = self.source;
        let mut pending = self
            .pending_mirror
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        while pending.try_join_next().is_some() {}
        pending.spawn_on(
            async move {
                if let Err(error) = mirror.upsert(table, &record).await {
                    warn!(%source, date = %record.date, %error, "remote history mirror failed");
                }
            },
            &runtime,
        );
    }
}
