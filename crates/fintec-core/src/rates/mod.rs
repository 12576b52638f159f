//! Exchange-rate fetch services.
//!
//! Each service walks a fixed chain of tiers until one produces rates:
//!
//! | Tier | Produced when | `fallbackReason` |
//! |------|---------------|------------------|
//! | Live | the rates API answers a valid payload | unset, or `upstream` |
//! | Cache | a previous call produced rates | `cache` |
//! | History | the local history store has a record | `history` |
//! | Static | always | `static` |

pub mod feed;
pub mod model;
mod service;

pub use feed::{BcvFeed, BinanceFeed, FeedError, RateFeed, STATIC_RATES_AS_OF};
pub use model::{BcvRates, BinanceRates, FallbackReason, RateBand, RateProvenance, RateSnapshot};
pub use service::{BcvRatesService, BinanceRatesService, RateService};
