//! Shared fixtures for the behaviour suites: scripted rates API transports and warehouse
//! helpers.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fintec_core::{
    HttpClient, HttpError, HttpFuture, HttpMethod, HttpRequest, HttpResponse, Warehouse,
    WarehouseConfig,
};

pub const LIVE_BCV_BODY: &str =
    r#"{"success":true,"data":{"usd":64.61,"eur":69.97,"source":"BCV"}}"#;

pub fn live_bcv() -> Result<HttpResponse, HttpError> {
    Ok(HttpResponse::ok_json(LIVE_BCV_BODY))
}

/// File-backed warehouse under `home`.
pub fn open_warehouse(home: &Path) -> Warehouse {
    Warehouse::open(WarehouseConfig::with_home(home)).expect("warehouse opens")
}

/// Answers each request with the next scripted result, then with transport errors.
pub struct ScriptedRatesApi {
    script: Mutex<Vec<Result<HttpResponse, HttpError>>>,
}

impl ScriptedRatesApi {
    pub fn new(script: Vec<Result<HttpResponse, HttpError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into_iter().rev().collect()),
        })
    }

    pub fn down() -> Arc<Self> {
        Self::new(Vec::new())
    }
}

impl HttpClient for ScriptedRatesApi {
    fn execute<'a>(&'a self, _request: HttpRequest) -> HttpFuture<'a> {
        let next = self
            .script
            .lock()
            .expect("script lock")
            .pop()
            .unwrap_or_else(|| {
                Err(HttpError::connect(
                    "http://localhost:3000",
                    "connection refused",
                ))
            });
        Box::pin(async move { next })
    }
}

/// Serves live BCV rates on GET and accepts mirror POSTs after `latency`.
pub struct LiveApiWithSlowMirror {
    latency: Duration,
    mirror_posts: AtomicUsize,
}

impl LiveApiWithSlowMirror {
    pub fn new(latency: Duration) -> Arc<Self> {
        Arc::new(Self {
            latency,
            mirror_posts: AtomicUsize::new(0),
        })
    }

    /// Mirror writes that completed.
    pub fn mirror_posts(&self) -> usize {
        self.mirror_posts.load(Ordering::SeqCst)
    }
}

impl HttpClient for LiveApiWithSlowMirror {
    fn execute<'a>(&'a self, request: HttpRequest) -> HttpFuture<'a> {
        Box::pin(async move {
            if request.method == HttpMethod::Post {
                tokio::time::sleep(self.latency).await;
                self.mirror_posts.fetch_add(1, Ordering::SeqCst);
                return Ok(HttpResponse::with_status(201, ""));
            }
            Ok(HttpResponse::ok_json(LIVE_BCV_BODY))
        })
    }
}
