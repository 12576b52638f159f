//! Remote copy of the rate history tables.
//!
//! The mirror is opportunistic: writes are fire-and-forget and reads only happen when the
//! local store is nearly empty. Nothing in the rate services waits on it.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use fintec_warehouse::{HistoryTable, RateHistoryRecord};
use thiserror::Error;

use crate::http_client::{HttpClient, HttpError, HttpRequest, DEFAULT_TIMEOUT_MS};

#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("remote mirror is not configured")]
    Disabled,
    #[error("remote mirror transport error: {0}")]
    Transport(#[from] HttpError),
    #[error("remote mirror answered HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("remote mirror payload could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type MirrorFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, MirrorError>> + Send + 'a>>;

/// Remote store keyed by `date`, one table per rate source.
pub trait HistoryMirror: Send + Sync {
    fn is_enabled(&self) -> bool;

    /// Insert or merge the record for `record.date`.
    fn upsert<'a>(
        &'a self,
        table: HistoryTable,
        record: &'a RateHistoryRecord,
    ) -> MirrorFuture<'a, ()>;

    /// Records with `date >= since`, oldest first.
    fn fetch_since<'a>(
        &'a self,
        table: HistoryTable,
        since: &'a str,
    ) -> MirrorFuture<'a, Vec<RateHistoryRecord>>;
}

/// Mirror used when no remote credentials are configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledMirror;

impl HistoryMirror for DisabledMirror {
    fn is_enabled(&self) -> bool {
        false
    }

    fn upsert<'a>(
        &'a self,
        _table: HistoryTable,
        _record: &'a RateHistoryRecord,
    ) -> MirrorFuture<'a, ()> {
        Box::pin(async { Err(MirrorError::Disabled) })
    }

    fn fetch_since<'a>(
        &'a self,
        _table: HistoryTable,
        _since: &'a str,
    ) -> MirrorFuture<'a, Vec<RateHistoryRecord>> {
        Box::pin(async { Err(MirrorError::Disabled) })
    }
}

/// PostgREST (Supabase) tables reached through the shared [`HttpClient`].
#[derive(Clone)]
pub struct PostgrestMirror {
    http: Arc<dyn HttpClient>,
    base_url: String,
    api_key: String,
    timeout_ms: u64,
}

impl PostgrestMirror {
    pub fn new(
        http: Arc<dyn HttpClient>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            api_key: api_key.into(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    fn table_url(&self, table: HistoryTable) -> String {
        format!("{}/rest/v1/{}", self.base_url, table.as_str())
    }

    fn authorized(&self, request: HttpRequest) -> HttpRequest {
        request
            .with_postgrest_key(&self.api_key)
            .with_timeout_ms(self.timeout_ms)
    }
}

impl HistoryMirror for PostgrestMirror {
    fn is_enabled(&self) -> bool {
        !self.base_url.is_empty() && !self.api_key.is_empty()
    }

    fn upsert<'a>(
        &'a self,
        table: HistoryTable,
        record: &'a RateHistoryRecord,
    ) -> MirrorFuture<'a, ()> {
        Box::pin(async move {
            let body = serde_json::to_string(record)?;
            let request = self.authorized(
                HttpRequest::post(format!("{}?on_conflict=date", self.table_url(table)))
                    .with_header("prefer", "resolution=merge-duplicates")
                    .with_json_body(body),
            );

            let response = self.http.execute(request).await?;
            if !response.is_success() {
                return Err(MirrorError::Status {
                    status: response.status,
                    body: response.body_excerpt(),
                });
            }
            Ok(())
        })
    }

    fn fetch_since<'a>(
        &'a self,
        table: HistoryTable,
        since: &'a str,
    ) -> MirrorFuture<'a, Vec<RateHistoryRecord>> {
        Box::pin(async move {
            let url = format!(
                "{}?select=*&date=gte.{}&order=date.asc",
                self.table_url(table),
                urlencoding::encode(since)
            );
            let request = self.authorized(HttpRequest::get(url).accepting_json());

            let response = self.http.execute(request).await?;
            if !response.is_success() {
                return Err(MirrorError::Status {
                    status: response.status,
                    body: response.body_excerpt(),
                });
            }
            Ok(serde_json::from_str(&response.body)?)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::http_client::{HttpFuture, HttpResponse};

    struct RecordingHttpClient {
        response: HttpResponse,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl RecordingHttpClient {
        fn answering(status: u16, body: &str) -> Arc<Self> {
            Arc::new(Self {
                response: HttpResponse::with_status(status, body),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn last_request(&self) -> HttpRequest {
            self.requests
                .lock()
                .expect("lock")
                .last()
                .cloned()
                .expect("a request was sent")
        }
    }

    impl HttpClient for RecordingHttpClient {
        fn execute<'a>(&'a self, request: HttpRequest) -> HttpFuture<'a> {
            self.requests.lock().expect("lock").push(request);
            let response = self.response.clone();
            Box::pin(async move { Ok(response) })
        }
    }

    fn record() -> RateHistoryRecord {
        RateHistoryRecord {
            id: String::from("7d3f"),
            date: String::from("2025-03-09"),
            usd: 64.61,
            eur: Some(69.97),
            timestamp: String::from("2025-03-09T14:00:00Z"),
            source: String::from("BCV"),
        }
    }

    #[tokio::test]
    async fn upsert_merges_on_date() {
        let http = RecordingHttpClient::answering(201, "");
        let mirror = PostgrestMirror::new(http.clone(), "https://db.test/", "anon");

        mirror
            .upsert(HistoryTable::BcvRateHistory, &record())
            .await
            .expect("upsert");

        let request = http.last_request();
        assert_eq!(
            request.url,
            "https://db.test/rest/v1/bcv_rate_history?on_conflict=date"
        );
        assert_eq!(
            request.headers.get("prefer").map(String::as_str),
            Some("resolution=merge-duplicates")
        );
        assert_eq!(request.headers.get("apikey").map(String::as_str), Some("anon"));
        assert_eq!(
            request.headers.get("authorization").map(String::as_str),
            Some("Bearer anon")
        );
        let body: serde_json::Value =
            serde_json::from_str(request.body.as_deref().expect("body")).expect("json body");
        assert_eq!(body["date"], "2025-03-09");
    }

    #[tokio::test]
    async fn fetch_filters_by_start_date() {
        let http = RecordingHttpClient::answering(
            200,
            r#"[{"id":1,"date":"2025-03-08","usd":64.1,"eur":null,"timestamp":"2025-03-08T14:00:00+00:00","source":"BCV","created_at":"x"}]"#,
        );
        let mirror = PostgrestMirror::new(http.clone(), "https://db.test", "anon");

        let records = mirror
            .fetch_since(HistoryTable::BcvRateHistory, "2025-03-01")
            .await
            .expect("fetch");

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "1");
        assert_eq!(records[0].eur, None);
        assert_eq!(
            http.last_request().url,
            "https://db.test/rest/v1/bcv_rate_history?select=*&date=gte.2025-03-01&order=date.asc"
        );
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let http = RecordingHttpClient::answering(401, "invalid api key");
        let mirror = PostgrestMirror::new(http, "https://db.test", "anon");

        let err = mirror
            .upsert(HistoryTable::BinanceRateHistory, &record())
            .await
            .expect_err("unauthorized");

        assert!(matches!(err, MirrorError::Status { status: 401, .. }));
    }

    #[test]
    fn mirror_without_credentials_is_disabled() {
        let mirror = PostgrestMirror::new(RecordingHttpClient::answering(200, "[]"), "", "");
        assert!(!mirror.is_enabled());
        assert!(!DisabledMirror.is_enabled());
    }
}
