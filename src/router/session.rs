//! Conversation state: wake window, echo suppression and debounce
//!
//! All three mechanisms are read-then-write sequences on shared timestamps,
//! so they live together in one record owned by the router and are only
//! touched while the router's lock is held.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::clock::{Clock, after};
use crate::config::RouterConfig;

/// Mutable per-process conversation record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationState {
    /// Awake while this lies in the future; `None` means asleep
    pub awake_until: Option<DateTime<Utc>>,
    /// Last accepted normalized utterance
    pub last_text: String,
    /// When `last_text` was accepted
    pub last_text_at: Option<DateTime<Utc>>,
    /// Transcripts are dropped until this instant
    pub tts_suppress_until: Option<DateTime<Utc>>,
}

/// Timing windows used by the session
#[derive(Debug, Clone, Copy)]
struct Windows {
    wake: Duration,
    debounce: Duration,
    post_tts_suppress: Duration,
    activity: Duration,
    grace: Duration,
}

/// Wake/sleep state machine, echo suppressor and debounce filter
pub struct RouterSession {
    state: ConversationState,
    windows: Windows,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for RouterSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouterSession")
            .field("state", &self.state)
            .field("windows", &self.windows)
            .finish_non_exhaustive()
    }
}

impl RouterSession {
    /// Start asleep, unsuppressed, with no remembered utterance
    #[must_use]
    pub fn new(config: &RouterConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: ConversationState::default(),
            windows: Windows {
                wake: config.wake_window,
                debounce: config.debounce_window,
                post_tts_suppress: config.post_tts_suppress,
                activity: config.keep_awake_on_activity,
                grace: config.post_tts_grace,
            },
            clock,
        }
    }

    /// Current time from the injected clock
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Snapshot of the state record
    #[must_use]
    pub const fn state(&self) -> &ConversationState {
        &self.state
    }

    // -- wake state machine ---------------------------------------------------

    /// Whether the assistant accepts commands at `at`
    #[must_use]
    pub fn is_awake_at(&self, at: DateTime<Utc>) -> bool {
        self.state.awake_until.is_some_and(|until| until > at)
    }

    /// Whether the assistant accepts commands now
    #[must_use]
    pub fn is_awake(&self) -> bool {
        self.is_awake_at(self.now())
    }

    /// Open (or extend) the wake window from `at`
    ///
    /// Returns `true` when this is a sleeping→awake transition.
    pub fn wake(&mut self, at: DateTime<Utc>) -> bool {
        let was_asleep = !self.is_awake_at(at);
        self.extend_awake(after(at, self.windows.wake));
        if was_asleep {
            tracing::info!("awake");
        }
        was_asleep
    }

    /// Keep awake for the activity window before a dispatch
    pub fn touch_activity(&mut self) {
        let until = after(self.now(), self.windows.activity);
        self.extend_awake(until);
    }

    /// Fall asleep immediately
    pub fn sleep(&mut self) {
        self.state.awake_until = None;
    }

    fn extend_awake(&mut self, until: DateTime<Utc>) {
        self.state.awake_until = Some(self.state.awake_until.map_or(until, |cur| cur.max(until)));
    }

    // -- echo suppression -----------------------------------------------------

    /// Drop transcripts for `duration` from now; never shortens a pending window
    pub fn suppress_for(&mut self, duration: Duration) {
        let until = after(self.now(), duration);
        self.state.tts_suppress_until = Some(
            self.state
                .tts_suppress_until
                .map_or(until, |cur| cur.max(until)),
        );
    }

    /// Whether a transcript received at `at` falls inside a suppression window
    #[must_use]
    pub fn is_suppressed_at(&self, at: DateTime<Utc>) -> bool {
        self.state.tts_suppress_until.is_some_and(|until| at < until)
    }

    // -- debounce ---------------------------------------------------------------

    /// Whether `text` repeats the last accepted utterance within the window
    ///
    /// A non-duplicate is recorded as the new last utterance.
    pub fn is_duplicate(&mut self, text: &str, at: DateTime<Utc>) -> bool {
        let within_window = self.state.last_text_at.is_some_and(|last| {
            (at - last)
                .to_std()
                .is_ok_and(|elapsed| elapsed < self.windows.debounce)
        });

        if within_window && self.state.last_text == text {
            return true;
        }

        self.state.last_text = text.to_string();
        self.state.last_text_at = Some(at);
        false
    }

    /// Forget the last utterance so the next one is never a duplicate
    pub fn clear_last_text(&mut self) {
        self.state.last_text.clear();
        self.state.last_text_at = None;
    }

    // -- post-dispatch bookkeeping --------------------------------------------

    /// Suppress the echo of the handler's speech, forget the last utterance
    /// and keep the conversation open for the grace window
    pub fn finish_dispatch(&mut self) {
        self.suppress_for(self.windows.post_tts_suppress);
        self.clear_last_text();
        let until = after(self.now(), self.windows.grace);
        self.extend_awake(until);
    }
}
