//! Shared test utilities

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use voice_router::clock::ManualClock;
use voice_router::config::RouterConfig;
use voice_router::providers::RateProvider;
use voice_router::voice::Speaker;
use voice_router::{CurrencyCode, DomainHandler, Error, Recognizer, Result, Router};

/// Friday 2026-10-16, noon UTC
#[must_use]
pub fn friday_noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

/// Clock frozen at [`friday_noon`]
#[must_use]
pub fn test_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(friday_noon()))
}

/// Records every query it is handed
#[derive(Default)]
pub struct RecordingHandler {
    queries: Mutex<Vec<String>>,
    /// Simulated handling time, applied to the clock
    busy_for: Option<(Arc<ManualClock>, Duration)>,
}

impl RecordingHandler {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A handler that takes `duration` of clock time to answer
    #[must_use]
    pub fn busy(clock: Arc<ManualClock>, duration: Duration) -> Arc<Self> {
        Arc::new(Self {
            queries: Mutex::new(Vec::new()),
            busy_for: Some((clock, duration)),
        })
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().expect("lock").clone()
    }

    pub fn count(&self) -> usize {
        self.queries.lock().expect("lock").len()
    }
}

#[async_trait]
impl DomainHandler for RecordingHandler {
    async fn handle(&self, query: &str) -> Result<()> {
        self.queries.lock().expect("lock").push(query.to_string());
        if let Some((clock, duration)) = &self.busy_for {
            clock.advance(*duration);
        }
        Ok(())
    }
}

/// Always fails
pub struct FailingHandler;

#[async_trait]
impl DomainHandler for FailingHandler {
    async fn handle(&self, _query: &str) -> Result<()> {
        Err(Error::Provider("service unavailable".to_string()))
    }
}

/// Always panics
pub struct PanickingHandler;

#[async_trait]
impl DomainHandler for PanickingHandler {
    async fn handle(&self, query: &str) -> Result<()> {
        panic!("handler blew up on {query}");
    }
}

/// Counts buffer resets
#[derive(Default)]
pub struct CountingRecognizer {
    resets: AtomicUsize,
}

impl CountingRecognizer {
    pub fn resets(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }
}

impl Recognizer for CountingRecognizer {
    fn reset(&self) -> Result<()> {
        self.resets.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Captures everything spoken
#[derive(Default)]
pub struct RecordingSpeaker {
    spoken: Mutex<Vec<String>>,
}

impl RecordingSpeaker {
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().expect("lock").clone()
    }

    pub fn last(&self) -> Option<String> {
        self.spoken.lock().expect("lock").last().cloned()
    }
}

#[async_trait]
impl Speaker for RecordingSpeaker {
    async fn speak(&self, text: &str) -> Result<()> {
        self.spoken.lock().expect("lock").push(text.to_string());
        Ok(())
    }
}

/// Fixed rate table with scripted failures
#[derive(Default)]
pub struct FakeRateProvider {
    rates: HashMap<(CurrencyCode, CurrencyCode), f64>,
    fail_first: usize,
    calls: Mutex<Vec<(CurrencyCode, CurrencyCode)>>,
}

impl FakeRateProvider {
    #[must_use]
    pub fn with_rate(mut self, from: CurrencyCode, to: CurrencyCode, rate: f64) -> Self {
        self.rates.insert((from, to), rate);
        self
    }

    /// Fail the first `n` calls regardless of the pair
    #[must_use]
    pub const fn failing_first(mut self, n: usize) -> Self {
        self.fail_first = n;
        self
    }

    pub fn calls(&self) -> Vec<(CurrencyCode, CurrencyCode)> {
        self.calls.lock().expect("lock").clone()
    }
}

#[async_trait]
impl RateProvider for FakeRateProvider {
    fn name(&self) -> &str {
        "fake"
    }

    async fn fetch_rate(&self, from: CurrencyCode, to: CurrencyCode) -> Result<f64> {
        let call = {
            let mut calls = self.calls.lock().expect("lock");
            calls.push((from, to));
            calls.len()
        };

        if call <= self.fail_first {
            return Err(Error::Provider("scripted failure".to_string()));
        }

        self.rates
            .get(&(from, to))
            .copied()
            .ok_or_else(|| Error::Provider(format!("no rate for {from}->{to}")))
    }
}

/// Router wired to recording fakes on a manual clock
pub struct Harness {
    pub router: Router,
    pub clock: Arc<ManualClock>,
    pub weather: Arc<RecordingHandler>,
    pub fx: Arc<RecordingHandler>,
    pub recognizer: Arc<CountingRecognizer>,
}

impl Harness {
    #[must_use]
    pub fn new() -> Self {
        let clock = test_clock();
        Self::with_handlers(clock, RecordingHandler::new(), RecordingHandler::new())
    }

    #[must_use]
    pub fn with_handlers(
        clock: Arc<ManualClock>,
        weather: Arc<RecordingHandler>,
        fx: Arc<RecordingHandler>,
    ) -> Self {
        let recognizer = Arc::new(CountingRecognizer::default());
        let router = Router::builder(weather.clone(), fx.clone())
            .config(RouterConfig::default())
            .clock(clock.clone())
            .recognizer(recognizer.clone())
            .build();

        Self {
            router,
            clock,
            weather,
            fx,
            recognizer,
        }
    }

    pub async fn say(&self, text: &str) -> voice_router::RouteOutcome {
        self.router.on_transcript_final(text, Some(0.9)).await
    }

    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }
}
