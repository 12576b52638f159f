//! Behavior-driven tests for the rate fallback chain
//!
//! These tests verify WHAT a caller receives from the rate services when the rates API,
//! the cache and the history store are in different states.

use std::sync::Arc;

use fintec_core::{
    BcvRatesService, BinanceRatesService, DayKey, FallbackReason, HttpResponse, RateHistory,
    RateSource, SaveOutcome, UtcDateTime, Warehouse,
};
use fintec_tests::{live_bcv, open_warehouse, ScriptedRatesApi};
use tempfile::tempdir;

fn history_for(source: RateSource, warehouse: &Warehouse) -> Arc<RateHistory> {
    Arc::new(RateHistory::new(source, warehouse.clone()))
}

// =============================================================================
// Rate Services: Live Tier
// =============================================================================

#[tokio::test]
async fn when_rates_api_answers_system_returns_live_rates_and_records_them() {
    // Given: A reachable rates API and an empty history store
    let temp = tempdir().expect("tempdir");
    let warehouse = open_warehouse(temp.path());
    let history = history_for(RateSource::Bcv, &warehouse);
    let service = BcvRatesService::new(ScriptedRatesApi::new(vec![live_bcv()]), "http://api.test")
        .with_history(history.clone());

    // When: The caller fetches BCV rates
    let rates = service.fetch_rates().await;

    // Then: The live values come back without fallback markers
    assert_eq!(rates.usd, 64.61);
    assert_eq!(rates.eur, Some(69.97));
    assert_eq!(rates.provenance.fallback, None);
    assert_eq!(rates.provenance.fallback_reason, None);

    // And: Today's record is in the history store
    let today = history
        .get_todays_rates()
        .expect("history read")
        .expect("today's record saved");
    assert_eq!(today.usd, 64.61);
    assert_eq!(today.source, "BCV");
}

// =============================================================================
// Rate Services: Fallback Ordering
// =============================================================================

#[tokio::test]
async fn when_api_fails_after_a_success_system_serves_the_cache_first() {
    // Given: One successful fetch followed by an outage
    let warehouse = Warehouse::open_in_memory().expect("warehouse");
    let service = BcvRatesService::new(ScriptedRatesApi::new(vec![live_bcv()]), "http://api.test")
        .with_history(history_for(RateSource::Bcv, &warehouse));
    service.fetch_rates().await;

    // When: The caller fetches again during the outage
    let rates = service.fetch_rates().await;

    // Then: The cached value is served and labelled as such
    assert_eq!(rates.usd, 64.61);
    assert_eq!(rates.provenance.fallback, Some(true));
    assert_eq!(rates.provenance.cached, Some(true));
    assert_eq!(rates.provenance.fallback_reason, Some(FallbackReason::Cache));
    assert!(rates.provenance.data_age.is_some());
}

#[tokio::test]
async fn when_api_fails_without_cache_system_serves_latest_history() {
    // Given: A history store holding two days and a service that never reached the API
    let warehouse = Warehouse::open_in_memory().expect("warehouse");
    let history = history_for(RateSource::Binance, &warehouse);
    let two_days_ago = UtcDateTime::now().minus_seconds(2 * 86_400);
    let yesterday = UtcDateTime::now().minus_seconds(86_400);
    history
        .save_rates_at(76.10, None, "Binance P2P", two_days_ago)
        .expect("seed");
    history
        .save_rates_at(77.40, None, "Binance P2P", yesterday)
        .expect("seed");
    let service = BinanceRatesService::new(ScriptedRatesApi::down(), "http://api.test")
        .with_history(history);

    // When: The caller fetches Binance rates
    let rates = service.fetch_rates().await;

    // Then: The most recent stored record is served as a history fallback
    assert_eq!(rates.usd_ves, 77.40);
    assert_eq!(rates.provenance.source, "Binance P2P (fallback - history)");
    assert_eq!(rates.provenance.fallback_reason, Some(FallbackReason::History));
    let age = rates.provenance.data_age.expect("age reported");
    assert!(age >= 86_400, "record is at least a day old, got {age}");
}

#[tokio::test]
async fn when_every_tier_is_empty_system_serves_static_rates() {
    // Given: No API, no cache and no history
    let service = BcvRatesService::new(ScriptedRatesApi::down(), "http://api.test");

    // When: The caller fetches BCV rates
    let rates = service.fetch_rates().await;

    // Then: The compiled-in constants are returned, clearly labelled
    assert_eq!(rates.usd, 57.50);
    assert_eq!(rates.eur, Some(62.80));
    assert_eq!(rates.provenance.fallback, Some(true));
    assert_eq!(rates.provenance.fallback_reason, Some(FallbackReason::Static));

    // And: The static result becomes the cache for the next call
    let cached = service.cached_rates().await.expect("cached");
    assert_eq!(cached.usd, 57.50);
}

#[tokio::test]
async fn when_payload_is_malformed_system_treats_it_as_a_failure() {
    // Given: An API answering garbage, then a payload without data, then a negative rate
    let api = ScriptedRatesApi::new(vec![
        Ok(HttpResponse::ok_json("<html>maintenance</html>")),
        Ok(HttpResponse::ok_json(r#"{"success":true}"#)),
        Ok(HttpResponse::ok_json(r#"{"success":true,"data":{"usd":-1}}"#)),
    ]);
    let service = BcvRatesService::new(api, "http://api.test");

    // When/Then: Every call degrades to a labelled fallback
    for _ in 0..3 {
        let rates = service.fetch_rates().await;
        assert_eq!(rates.provenance.fallback, Some(true));
        assert!(rates.usd > 0.0);
    }
}

// =============================================================================
// Rate History: Non-clobber
// =============================================================================

#[tokio::test]
async fn when_fallback_is_saved_over_live_record_system_keeps_the_live_record() {
    // Given: A live BCV record stored for today
    let warehouse = Warehouse::open_in_memory().expect("warehouse");
    let history = history_for(RateSource::Bcv, &warehouse);
    history
        .save_rates(64.61, Some(69.97), "BCV")
        .expect("live save");

    // When: A static fallback value is saved for the same day
    let outcome = history
        .save_rates(57.50, Some(62.80), "BCV (fallback - static)")
        .expect("fallback save");

    // Then: The write is skipped and the live value survives
    assert_eq!(outcome, SaveOutcome::SkippedFallback);
    let stored = history
        .get_rates_for_date(DayKey::caracas_today())
        .expect("read")
        .expect("record");
    assert_eq!(stored.usd, 64.61);
    assert_eq!(stored.source, "BCV");
}

#[tokio::test]
async fn when_live_record_arrives_after_fallback_system_replaces_it() {
    // Given: A fallback record stored for today
    let warehouse = Warehouse::open_in_memory().expect("warehouse");
    let history = history_for(RateSource::Bcv, &warehouse);
    history
        .save_rates(57.50, None, "BCV (fallback - history)")
        .expect("fallback save");

    // When: A live value is saved for the same day
    let outcome = history.save_rates(64.61, None, "BCV").expect("live save");

    // Then: The live value replaces the fallback
    assert_eq!(outcome, SaveOutcome::Updated);
    let stored = history.latest().expect("latest").expect("record");
    assert_eq!(stored.usd, 64.61);
}

// =============================================================================
// Rate History: Retention
// =============================================================================

#[tokio::test]
async fn when_records_age_past_retention_system_prunes_them_on_write() {
    // Given: A Binance history with a record older than its 90 day retention
    let warehouse = Warehouse::open_in_memory().expect("warehouse");
    let history = history_for(RateSource::Binance, &warehouse);
    assert_eq!(history.retention_days(), 90);
    let stale = UtcDateTime::now().minus_seconds(120 * 86_400);
    let old_day = DayKey::in_caracas(stale);
    warehouse
        .upsert_rate(
            RateSource::Binance.history_table(),
            &fintec_core::RateHistoryRecord {
                id: String::from("stale"),
                date: old_day.to_string(),
                usd: 40.0,
                eur: None,
                timestamp: stale.format_rfc3339(),
                source: String::from("Binance P2P"),
            },
        )
        .expect("seed stale record");

    // When: Today's rate is saved
    history.save_rates(77.40, None, "Binance P2P").expect("save");

    // Then: Only today's record remains
    assert!(history
        .get_rates_for_date(old_day)
        .expect("read")
        .is_none());
    assert_eq!(history.get_historical_rates(365).await.expect("history").len(), 1);
}
