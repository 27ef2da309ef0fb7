//! Conversational router
//!
//! Turns finalized transcripts into domain dispatches. Every event passes the
//! same fixed gate sequence:
//!
//! ```text
//! echo suppression → normalize → short-utterance filter → debounce
//!   → sleep command → wake / implicit wake → sleeping gate
//!   → wake-prefix strip → keyword slice → classify → handler
//!   → suppression, recognizer reset, keep-awake
//! ```
//!
//! Gates that drop an event log it and return a [`RouteOutcome`]; nothing is
//! ever raised to the transcript producer.

pub mod classify;
pub mod normalize;
pub mod session;
pub mod wake;

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::FutureExt;
use serde::Serialize;
use tokio::sync::Mutex;

pub use classify::{Domain, Intent, IntentClassifier};
pub use normalize::normalize;
pub use session::{ConversationState, RouterSession};
pub use wake::{PhraseMatch, PhraseMatcher};

use crate::Result;
use crate::clock::{Clock, SystemClock};
use crate::config::RouterConfig;

/// Shortest utterance, in characters, that passes without a domain signal
const MIN_CHARS: usize = 3;

/// Fewest words that pass without a domain signal
const MIN_WORDS: usize = 2;

/// One finalized recognition
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptEvent {
    pub text: String,
    pub confidence: Option<f32>,
    pub received_at: DateTime<Utc>,
}

/// Speech recognizer control surface
pub trait Recognizer: Send + Sync {
    /// Discard buffered audio and partial hypotheses
    ///
    /// # Errors
    ///
    /// Returns error if the recognizer cannot be reset; the router logs it
    fn reset(&self) -> Result<()>;
}

/// A domain handler (weather, fx)
///
/// Handlers do their own I/O and speech output and report nothing back
/// beyond success or failure.
#[async_trait]
pub trait DomainHandler: Send + Sync {
    /// Serve one query
    ///
    /// # Errors
    ///
    /// Returns error if the handler could not answer; the router logs it
    async fn handle(&self, query: &str) -> Result<()>;
}

/// Why an event was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// Arrived while synthesized speech may still be echoing
    EchoSuppressed,
    /// Too short and no wake or domain signal
    TooShort,
    /// Repeat of the previous utterance within the debounce window
    Debounced,
    /// Assistant asleep and nothing woke it
    Asleep,
}

/// What the router did with an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RouteOutcome {
    /// Dropped by a gate
    Dropped { reason: DropReason },
    /// A sleep command put the assistant to sleep
    SleepAcknowledged,
    /// A bare wake phrase opened the wake window
    WakeAcknowledged,
    /// Awake but the utterance matched no domain
    Unrouted { query: String },
    /// Handed to a domain handler
    Dispatched { domain: Domain, query: String },
}

impl RouteOutcome {
    const fn dropped(reason: DropReason) -> Self {
        Self::Dropped { reason }
    }

    /// Whether a handler was invoked
    #[must_use]
    pub const fn is_dispatched(&self) -> bool {
        matches!(self, Self::Dispatched { .. })
    }
}

/// Serialized transcript router
pub struct Router {
    session: Mutex<RouterSession>,
    clock: Arc<dyn Clock>,
    wake: PhraseMatcher,
    sleep: PhraseMatcher,
    classifier: IntentClassifier,
    weather: Arc<dyn DomainHandler>,
    fx: Arc<dyn DomainHandler>,
    recognizer: Option<Arc<dyn Recognizer>>,
}

impl Router {
    /// Start building a router around the two domain handlers
    #[must_use]
    pub fn builder(weather: Arc<dyn DomainHandler>, fx: Arc<dyn DomainHandler>) -> RouterBuilder {
        RouterBuilder {
            weather,
            fx,
            config: RouterConfig::default(),
            clock: Arc::new(SystemClock),
            recognizer: None,
        }
    }

    /// Entry point for the speech recognizer: one call per finalized utterance
    pub async fn on_transcript_final(&self, text: &str, confidence: Option<f32>) -> RouteOutcome {
        let event = TranscriptEvent {
            text: text.to_string(),
            confidence,
            received_at: self.clock.now(),
        };
        self.route(&event).await
    }

    /// Route one event
    ///
    /// The session lock is held for the whole event, handler included, so
    /// concurrent events are processed strictly one after another.
    pub async fn route(&self, event: &TranscriptEvent) -> RouteOutcome {
        let mut session = self.session.lock().await;
        let at = event.received_at;

        if session.is_suppressed_at(at) {
            tracing::debug!(text = %event.text.trim(), "suppressed during speech playback");
            return RouteOutcome::dropped(DropReason::EchoSuppressed);
        }

        let mut text = normalize(&event.text);
        tracing::debug!(%text, confidence = ?event.confidence, "transcript");

        let wake_like = self.wake.matches(&text);
        let relevant = self.classifier.is_relevant(&text);
        let sleep_like = self.sleep.matches(&text);

        if !(wake_like || relevant || sleep_like)
            && (text.chars().count() < MIN_CHARS || normalize::word_count(&text) < MIN_WORDS)
        {
            tracing::debug!(%text, "ignored short utterance");
            return RouteOutcome::dropped(DropReason::TooShort);
        }

        if session.is_duplicate(&text, at) {
            tracing::debug!(%text, "debounced");
            return RouteOutcome::dropped(DropReason::Debounced);
        }

        if sleep_like {
            session.sleep();
            tracing::info!(%text, "sleep");
            return RouteOutcome::SleepAcknowledged;
        }

        if wake_like || relevant {
            let woke = session.wake(at);
            if wake_like || woke {
                self.reset_recognizer();
            }

            if let Some(hit) = self.wake.match_prefix(&text) {
                if hit.rest.is_empty() {
                    tracing::info!(phrase = hit.phrase, "wake");
                    return RouteOutcome::WakeAcknowledged;
                }
                text = hit.rest.to_string();
            }
        }

        if !session.is_awake_at(at) {
            tracing::info!(%text, "ignored while sleeping");
            return RouteOutcome::dropped(DropReason::Asleep);
        }

        let query = self.classifier.slice_from_keyword(&text).to_string();
        let domain = self.classifier.classify(&query);

        let handler = match domain {
            Domain::Weather => {
                let slots = self.classifier.weather_slots().extract(&query);
                tracing::debug!(city = ?slots.city, when = ?slots.when, "weather slots");
                &self.weather
            }
            Domain::Fx => &self.fx,
            Domain::Unknown => {
                tracing::info!(%query, "unknown domain");
                return RouteOutcome::Unrouted { query };
            }
        };

        tracing::info!(%domain, %query, "dispatching");
        session.touch_activity();

        match AssertUnwindSafe(handler.handle(&query)).catch_unwind().await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(%domain, error = %e, "handler failed"),
            Err(_) => tracing::error!(%domain, "handler panicked"),
        }

        session.finish_dispatch();
        self.reset_recognizer();

        RouteOutcome::Dispatched { domain, query }
    }

    /// Drop transcripts for `duration`, e.g. while the caller plays speech
    pub async fn suppress_for(&self, duration: Duration) {
        self.session.lock().await.suppress_for(duration);
    }

    /// Whether the wake window is open
    pub async fn is_awake(&self) -> bool {
        self.session.lock().await.is_awake()
    }

    /// Snapshot of the conversation record
    pub async fn state(&self) -> ConversationState {
        self.session.lock().await.state().clone()
    }

    /// Classifier used for routing
    #[must_use]
    pub const fn classifier(&self) -> &IntentClassifier {
        &self.classifier
    }

    fn reset_recognizer(&self) {
        if let Some(recognizer) = &self.recognizer {
            if let Err(e) = recognizer.reset() {
                tracing::warn!(error = %e, "recognizer reset failed");
            }
        }
    }
}

/// Builder for [`Router`]
pub struct RouterBuilder {
    weather: Arc<dyn DomainHandler>,
    fx: Arc<dyn DomainHandler>,
    config: RouterConfig,
    clock: Arc<dyn Clock>,
    recognizer: Option<Arc<dyn Recognizer>>,
}

impl RouterBuilder {
    /// Phrases and timing windows
    #[must_use]
    pub fn config(mut self, config: RouterConfig) -> Self {
        self.config = config;
        self
    }

    /// Time source
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Recognizer to reset after wake transitions and dispatches
    #[must_use]
    pub fn recognizer(mut self, recognizer: Arc<dyn Recognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    #[must_use]
    pub fn build(self) -> Router {
        Router {
            session: Mutex::new(RouterSession::new(&self.config, self.clock.clone())),
            clock: self.clock,
            wake: PhraseMatcher::new(&self.config.wake_phrases),
            sleep: PhraseMatcher::new(&self.config.sleep_phrases),
            classifier: IntentClassifier::default(),
            weather: self.weather,
            fx: self.fx,
            recognizer: self.recognizer,
        }
    }
}
