//! Voice Router - conversational command router for speech transcripts
//!
//! Sits between a streaming speech recognizer and a set of domain handlers:
//! - Wake/sleep state machine with a timed wake window
//! - Echo suppression while synthesized speech plays
//! - Debounce of repeated recognitions
//! - Keyword and heuristic domain classification (weather, fx)
//! - Rule-based slot extraction (city, date, currency pair, amount)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │              Speech recognizer (external)            │
//! └────────────────────┬────────────────────────────────┘
//!                      │ finalized transcripts
//! ┌────────────────────▼────────────────────────────────┐
//! │                      Router                          │
//! │  Echo  │  Debounce  │  Wake/Sleep  │  Classifier     │
//! └──────────┬──────────────────────────────┬───────────┘
//!            │                              │
//! ┌──────────▼──────────┐        ┌──────────▼──────────┐
//! │   Weather handler   │        │     FX handler      │
//! │   WeatherAPI        │        │   Frankfurter, ...  │
//! └─────────────────────┘        └─────────────────────┘
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod handlers;
pub mod providers;
pub mod router;
pub mod slots;
pub mod voice;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::{Error, Result};
pub use handlers::{FxQueryHandler, WeatherQueryHandler};
pub use router::{
    Domain, DomainHandler, DropReason, Intent, IntentClassifier, Recognizer, RouteOutcome, Router,
    RouterBuilder, TranscriptEvent,
};
pub use slots::{AllowedPairs, CurrencyCode};
pub use voice::Speaker;
