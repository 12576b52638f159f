//! Environment-driven configuration and service wiring.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use fintec_warehouse::{Warehouse, WarehouseConfig};
use tracing::{debug, warn};

use crate::converter::CurrencyConverter;
use crate::history::RateHistory;
use crate::http_client::{HttpClient, NoopHttpClient, ReqwestHttpClient, DEFAULT_TIMEOUT_MS};
use crate::mirror::{DisabledMirror, HistoryMirror, PostgrestMirror};
use crate::rates::{BcvRatesService, BinanceRatesService};
use crate::RateSource;

pub const DEFAULT_RATES_BASE_URL: &str = "http://localhost:3000";

/// Remote history mirror credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorConfig {
    pub url: String,
    pub api_key: String,
}

/// Runtime settings for the rate services.
///
/// # Environment Variables
///
/// | Setting | Primary Env Var | Fallback Env Var |
/// |---------|-----------------|------------------|
/// | Rates API base URL | `FINTEC_RATES_BASE_URL` | `RATES_BASE_URL` |
/// | Request timeout (ms) | `FINTEC_HTTP_TIMEOUT_MS` | - |
/// | Mirror URL | `FINTEC_SUPABASE_URL` | `NEXT_PUBLIC_SUPABASE_URL` |
/// | Mirror key | `FINTEC_SUPABASE_KEY` | `NEXT_PUBLIC_SUPABASE_ANON_KEY` |
/// | Data directory | `FINTEC_HOME` | `$HOME/.fintec` |
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub rates_base_url: String,
    pub timeout_ms: u64,
    /// `None` unless both the URL and the key are set.
    pub mirror: Option<MirrorConfig>,
    pub warehouse: WarehouseConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            rates_base_url: String::from(DEFAULT_RATES_BASE_URL),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            mirror: None,
            warehouse: WarehouseConfig::default(),
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Resolve settings through `lookup` instead of the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |primary: &str, fallback: Option<&str>| {
            lookup(primary)
                .or_else(|| fallback.and_then(&lookup))
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let rates_base_url = read("FINTEC_RATES_BASE_URL", Some("RATES_BASE_URL"))
            .unwrap_or_else(|| String::from(DEFAULT_RATES_BASE_URL));
        let timeout_ms = match read("FINTEC_HTTP_TIMEOUT_MS", None) {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warn!(value = %raw, "ignoring invalid FINTEC_HTTP_TIMEOUT_MS");
                DEFAULT_TIMEOUT_MS
            }),
            None => DEFAULT_TIMEOUT_MS,
        };
        let mirror = match (
            read("FINTEC_SUPABASE_URL", Some("NEXT_PUBLIC_SUPABASE_URL")),
            read("FINTEC_SUPABASE_KEY", Some("NEXT_PUBLIC_SUPABASE_ANON_KEY")),
        ) {
            (Some(url), Some(api_key)) => Some(MirrorConfig { url, api_key }),
            _ => None,
        };
        let warehouse = match read("FINTEC_HOME", None) {
            Some(home) => WarehouseConfig::with_home(home),
            None => WarehouseConfig::default(),
        };

        Self {
            rates_base_url,
            timeout_ms,
            mirror,
            warehouse,
        }
    }
}

/// Fully wired services sharing one transport and one warehouse.
pub struct RateServices {
    pub bcv: Arc<BcvRatesService>,
    pub binance: Arc<BinanceRatesService>,
    pub converter: CurrencyConverter,
}

impl RateServices {
    pub fn history(&self, source: RateSource) -> Option<&Arc<RateHistory>> {
        match source {
            RateSource::Bcv => self.bcv.history(),
            RateSource::Binance => self.binance.history(),
        }
    }

    /// Wait up to `timeout` for both sources' background mirror writes; returns how many
    /// were abandoned.
    pub async fn flush_mirror(&self, timeout: Duration) -> usize {
        let flush = |source: RateSource| async move {
            match self.history(source) {
                Some(history) => history.flush_mirror(timeout).await,
                None => 0,
            }
        };
        let (bcv, binance) = tokio::join!(flush(RateSource::Bcv), flush(RateSource::Binance));
        bcv + binance
    }
}

enum HistoryStore {
    Configured,
    InMemory,
    Disabled,
    Provided(Warehouse),
}

/// Builds [`RateServices`] from a [`ServiceConfig`].
///
/// Building never fails: a history store that cannot be opened is logged and the
/// services run without the history tier.
pub struct RateServicesBuilder {
    config: ServiceConfig,
    offline: bool,
    http: Option<Arc<dyn HttpClient>>,
    history: HistoryStore,
}

impl Default for RateServicesBuilder {
    fn default() -> Self {
        Self::new(ServiceConfig::default())
    }
}

impl RateServicesBuilder {
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            config,
            offline: false,
            http: None,
            history: HistoryStore::Configured,
        }
    }

    pub fn from_env() -> Self {
        Self::new(ServiceConfig::from_env())
    }

    /// Use [`NoopHttpClient`] so every fetch degrades to local tiers.
    pub fn with_offline_mode(mut self) -> Self {
        self.offline = true;
        self
    }

    pub fn with_http_client(mut self, http: Arc<dyn HttpClient>) -> Self {
        self.http = Some(http);
        self
    }

    pub fn with_warehouse(mut self, warehouse: Warehouse) -> Self {
        self.history = HistoryStore::Provided(warehouse);
        self
    }

    pub fn with_in_memory_history(mut self) -> Self {
        self.history = HistoryStore::InMemory;
        self
    }

    pub fn without_history(mut self) -> Self {
        self.history = HistoryStore::Disabled;
        self
    }

    pub fn build(self) -> RateServices {
        let http: Arc<dyn HttpClient> = match (self.http, self.offline) {
            (Some(http), _) => http,
            (None, true) => Arc::new(NoopHttpClient),
            (None, false) => Arc::new(ReqwestHttpClient::new()),
        };

        let mirror: Arc<dyn HistoryMirror> = match &self.config.mirror {
            Some(mirror) if !self.offline => Arc::new(
                PostgrestMirror::new(Arc::clone(&http), mirror.url.clone(), mirror.api_key.clone())
                    .with_timeout_ms(self.config.timeout_ms),
            ),
            _ => Arc::new(DisabledMirror),
        };

        let warehouse = match self.history {
            HistoryStore::Provided(warehouse) => Some(warehouse),
            HistoryStore::Disabled => None,
            HistoryStore::InMemory => Warehouse::open_in_memory()
                .map_err(|error| warn!(%error, "in-memory rate history unavailable"))
                .ok(),
            HistoryStore::Configured => Warehouse::open(self.config.warehouse.clone())
                .map_err(|error| {
                    warn!(
                        %error,
                        path = %self.config.warehouse.db_path.display(),
                        "rate history unavailable; continuing without it"
                    )
                })
                .ok(),
        };

        let history_for = |source: RateSource| {
            warehouse.as_ref().map(|warehouse| {
                Arc::new(
                    RateHistory::new(source, warehouse.clone()).with_mirror(Arc::clone(&mirror)),
                )
            })
        };

        let mut bcv = BcvRatesService::new(Arc::clone(&http), self.config.rates_base_url.clone())
            .with_timeout_ms(self.config.timeout_ms);
        if let Some(history) = history_for(RateSource::Bcv) {
            bcv = bcv.with_history(history);
        }
        let mut binance =
            BinanceRatesService::new(Arc::clone(&http), self.config.rates_base_url.clone())
                .with_timeout_ms(self.config.timeout_ms);
        if let Some(history) = history_for(RateSource::Binance) {
            binance = binance.with_history(history);
        }

        debug!(
            base_url = %self.config.rates_base_url,
            history = warehouse.is_some(),
            mirror = mirror.is_enabled(),
            "rate services ready"
        );

        let bcv = Arc::new(bcv);
        RateServices {
            converter: CurrencyConverter::new(Arc::clone(&bcv)),
            bcv,
            binance: Arc::new(binance),
        }
    }
}
