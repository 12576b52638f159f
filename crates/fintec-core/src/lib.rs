//! # Fintec Core
//!
//! Money, currencies and exchange-rate services for household bookkeeping with first-class
//! support for the Venezuelan bolívar (VES).
//!
//! ## Overview
//!
//! - **Money** held as integer minor units, with allocation and locale-aware formatting
//! - **VES formatting** annotated with BCV dollar equivalents
//! - **Rate services** for the BCV official rate and the Binance P2P market rate that
//!   never fail, degrading through cache, history and static values
//! - **Rate history** per source in the local warehouse with an optional remote mirror
//! - **Currency converter** routing through USD, and BCV versus Binance comparisons
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`money`] | `Money` value type and formatting helpers |
//! | [`currency`] | Currency registry |
//! | [`ves`] | Bolívar formatter and BCV conversions |
//! | [`rates`] | Rate models, feeds and fallback services |
//! | [`history`] | Rate history service and trend analytics |
//! | [`mirror`] | Remote history mirror |
//! | [`converter`] | USD-routed currency converter |
//! | [`comparison`] | BCV versus Binance comparisons |
//! | [`config`] | Environment configuration and service wiring |
//! | [`http_client`] | HTTP transport abstraction |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fintec_core::{Money, RateServicesBuilder, VesFormatOptions, VesFormatter};
//!
//! #[tokio::main]
//! async fn main() {
//!     let services = RateServicesBuilder::from_env().build();
//!     let bcv = services.bcv.fetch_rates().await;
//!
//!     let formatter = VesFormatter::with_bcv_rates(bcv);
//!     let options = VesFormatOptions {
//!         show_usd_equivalent: true,
//!         ..VesFormatOptions::default()
//!     };
//!     println!("{}", formatter.format_ves(150_000, &options));
//!
//!     let lunch = Money::from_minor(4_500, "USD");
//!     println!("{}", lunch);
//! }
//! ```
//!
//! ```text
//! ┌──────────────┐   live    ┌──────────────────┐
//! │ RateService  │──────────▶│ HttpClient       │
//! └──────┬───────┘           └──────────────────┘
//!        │ cache / history / static
//!        ▼
//! ┌──────────────┐  spawn    ┌──────────────────┐
//! │ RateHistory  │──────────▶│ HistoryMirror    │
//! └──────┬───────┘           └──────────────────┘
//!        ▼
//! ┌──────────────┐
//! │ Warehouse    │
//! └──────────────┘
//! ```

pub mod cache;
pub mod comparison;
pub mod config;
pub mod converter;
pub mod currency;
pub mod domain;
pub mod error;
pub mod history;
pub mod http_client;
pub mod mirror;
pub mod money;
pub mod rates;
pub mod source;
pub mod ves;

pub use cache::RateCache;

pub use comparison::{
    calculate_average_rate_difference, calculate_eur_usd_rate_difference,
    calculate_rate_difference, format_percentage_difference, ComparisonError, RateComparison,
};

pub use config::{MirrorConfig, RateServices, RateServicesBuilder, ServiceConfig};

pub use converter::{ConversionError, CurrencyConverter, ExchangeRate};

pub use currency::{currency_decimals, supported_currencies, validate_code, Currency};

pub use domain::{DayKey, UtcDateTime};

pub use error::ValidationError;

pub use history::{
    DailyTrends, HistoryError, PeriodTrends, RateHistory, RateTrend, SaveOutcome, TrendDirection,
};

pub use http_client::{
    HttpClient, HttpError, HttpFuture, HttpMethod, HttpRequest, HttpResponse,
    NoopHttpClient, ReqwestHttpClient,
};

pub use mirror::{DisabledMirror, HistoryMirror, MirrorError, MirrorFuture, PostgrestMirror};

pub use money::{
    format_currency, from_minor_units, to_minor_units, FormatOptions, Money, MoneyError,
};

pub use rates::{
    BcvRates, BcvRatesService, BinanceRates, BinanceRatesService, FallbackReason, RateBand,
    RateProvenance, RateService, RateSnapshot, STATIC_RATES_AS_OF,
};

pub use source::RateSource;

pub use ves::{
    requires_bcv_validation, validate_ves_amount, VesError, VesFormatOptions, VesFormatter,
    VesInfo,
};

// Warehouse (re-exported from fintec-warehouse)
pub use fintec_warehouse::{
    HistoryTable, RateHistoryRecord, Warehouse, WarehouseConfig, WarehouseError,
};
