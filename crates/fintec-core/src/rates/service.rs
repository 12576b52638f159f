use std::marker::PhantomData;
use std::sync::Arc;

use fintec_warehouse::is_fallback_source;
use tracing::{debug, warn};

use crate::cache::RateCache;
use crate::history::{PeriodTrends, RateHistory};
use crate::http_client::{HttpClient, HttpRequest, DEFAULT_TIMEOUT_MS};
use crate::rates::feed::{
    ApiEnvelope, BcvFeed, BinanceFeed, FeedError, RateFeed, STATIC_RATES_AS_OF,
};
use crate::rates::model::{FallbackReason, RateSnapshot};
use crate::{RateSource, UtcDateTime};

/// Fetches rates for one source and degrades through cache, history and static values.
///
/// `fetch_rates` never fails. Every result carries provenance telling the caller which
/// tier produced it.
pub struct RateService<F: RateFeed> {
    http: Arc<dyn HttpClient>,
    base_url: String,
    timeout_ms: u64,
    history: Option<Arc<RateHistory>>,
    cache: RateCache<F::Rates>,
    _feed: PhantomData<fn() -> F>,
}

pub type BcvRatesService = RateService<BcvFeed>;
pub type BinanceRatesService = RateService<BinanceFeed>;

impl<F: RateFeed> RateService<F> {
    pub fn new(http: Arc<dyn HttpClient>, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            history: None,
            cache: RateCache::new(),
            _feed: PhantomData,
        }
    }

    pub fn with_history(mut self, history: Arc<RateHistory>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub const fn source(&self) -> RateSource {
        F::SOURCE
    }

    pub fn history(&self) -> Option<&Arc<RateHistory>> {
        self.history.as_ref()
    }

    pub fn endpoint_url(&self) -> String {
        format!("{}{}", self.base_url, F::SOURCE.endpoint_path())
    }

    pub async fn fetch_rates(&self) -> F::Rates {
        let now = UtcDateTime::now();
        match self.fetch_live(now).await {
            Ok(rates) => {
                if !rates.provenance().is_fallback() {
                    self.persist(&rates);
                }
                self.cache.put(rates.clone()).await;
                rates
            }
            Err(error) => {
                debug!(source = %F::SOURCE, %error, "live rate fetch failed, falling back");
                self.fallback(now).await
            }
        }
    }

    pub async fn cached_rates(&self) -> Option<F::Rates> {
        self.cache.get().await
    }

    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }

    /// Multi-period trends from the history store; `None` without history or data.
    pub async fn trends(&self) -> Option<PeriodTrends> {
        let history = self.history.as_ref()?;
        match history.multi_period_trends().await {
            Ok(trends) => trends,
            Err(error) => {
                warn!(source = %F::SOURCE, %error, "could not compute rate trends");
                None
            }
        }
    }

    async fn fetch_live(&self, now: UtcDateTime) -> Result<F::Rates, FeedError> {
        let request = HttpRequest::get(self.endpoint_url())
            .accepting_json()
            .with_timeout_ms(self.timeout_ms);
        let response = self.http.execute(request).await?;
        if !response.is_success() {
            return Err(FeedError::Status {
                status: response.status,
            });
        }

        let envelope: ApiEnvelope = serde_json::from_str(&response.body)?;
        let Some(data) = envelope.data else {
            return Err(FeedError::MissingData {
                reason: envelope
                    .error
                    .unwrap_or_else(|| String::from("no data member")),
            });
        };

        let mut rates = F::parse_data(data, now)?;
        let upstream_fallback = envelope.fallback.unwrap_or(false)
            || !envelope.success
            || is_fallback_source(&rates.provenance().source);
        if upstream_fallback {
            debug!(
                source = %F::SOURCE,
                reason = envelope.fallback_reason.as_deref().unwrap_or("unspecified"),
                cache_age = ?envelope.cache_age,
                "rates API served its own fallback"
            );
            let provenance = rates.provenance_mut();
            provenance.mark_fallback(FallbackReason::Upstream, now);
            if let Some(age) = envelope.data_age {
                provenance.data_age = Some(age);
            }
            provenance.cached = envelope.cached;
        }
        Ok(rates)
    }

    async fn fallback(&self, now: UtcDateTime) -> F::Rates {
        if let Some(mut cached) = self.cache.get().await {
            debug!(source = %F::SOURCE, "serving cached rates");
            let provenance = cached.provenance_mut();
            provenance.mark_fallback(FallbackReason::Cache, now);
            provenance.cached = Some(true);
            return cached;
        }

        let rates = match self.from_history(now) {
            Some(rates) => {
                debug!(source = %F::SOURCE, "serving rates from local history");
                rates
            }
            None => {
                warn!(
                    source = %F::SOURCE,
                    as_of = STATIC_RATES_AS_OF,
                    "serving static fallback rates; values may be stale"
                );
                F::static_rates(now)
            }
        };
        self.cache.put(rates.clone()).await;
        rates
    }

    fn from_history(&self, now: UtcDateTime) -> Option<F::Rates> {
        let history = self.history.as_ref()?;
        let record = match history.latest() {
            Ok(record) => record?,
            Err(error) => {
                warn!(source = %F::SOURCE, %error, "could not read rate history");
                return None;
            }
        };
        match F::from_history(&record, now) {
            Ok(rates) => Some(rates),
            Err(error) => {
                warn!(source = %F::SOURCE, date = %record.date, %error, "unusable history record");
                None
            }
        }
    }

    fn persist(&self, rates: &F::Rates) {
        let Some(history) = self.history.as_ref() else {
            return;
        };
        if let Err(error) = history.save_rates(rates.usd(), rates.eur(), &rates.provenance().source)
        {
            warn!(source = %F::SOURCE, %error, "failed to save rates to history");
        }
    }
}
